use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::AppError;

/// Bounded retry policy for gateway order-id collisions
///
/// Only `AppError::OrderConflict` is retried, each time with a fresh
/// candidate id. Any other error stops the loop immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_millis(200),
        }
    }
}

/// Result of a retried gateway call
#[derive(Debug)]
pub enum RetryOutcome<T> {
    Succeeded {
        value: T,
        attempts: u32,
        /// Order id the gateway finally accepted
        order_id: String,
    },
    Exhausted {
        attempts: u32,
        last_error: AppError,
    },
}

impl<T> RetryOutcome<T> {
    /// Collapse into a plain result; exhaustion becomes a gateway error
    pub fn into_result(self) -> Result<(T, String), AppError> {
        match self {
            Self::Succeeded {
                value, order_id, ..
            } => Ok((value, order_id)),
            Self::Exhausted {
                attempts,
                last_error,
            } => Err(AppError::Gateway(format!(
                "Order id still rejected after {} attempts: {}",
                attempts, last_error
            ))),
        }
    }
}

/// Four random hex characters
pub fn random_token() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    uuid[..4].to_string()
}

/// Candidate gateway order id for the given attempt (1-based)
pub fn candidate_order_id(order_key: &str, attempt: u32, token: &str) -> String {
    if attempt <= 1 {
        format!("{} {}", order_key, token)
    } else {
        format!("{} v{} {}", order_key, attempt, token)
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Run `call` with successive candidate order ids until the gateway
    /// accepts one, a non-conflict error occurs or attempts run out.
    ///
    /// Non-conflict errors are returned as `Err`; only collisions can
    /// exhaust the policy.
    pub async fn run<T, F, Fut>(
        &self,
        order_key: &str,
        mut call: F,
    ) -> Result<RetryOutcome<T>, AppError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                sleep(self.delay).await;
            }

            let order_id = candidate_order_id(order_key, attempt, &random_token());
            match call(order_id.clone()).await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(order_key = %order_key, order_id = %order_id, attempt, "Gateway accepted order id after retry");
                    }
                    return Ok(RetryOutcome::Succeeded {
                        value,
                        attempts: attempt,
                        order_id,
                    });
                }
                Err(e) if e.is_order_conflict() => {
                    warn!(order_key = %order_key, order_id = %order_id, attempt, "Order id already used, retrying");
                    last_error = Some(e);
                }
                Err(e) => {
                    error!(order_key = %order_key, error = %e, "Link creation failed");
                    return Err(e);
                }
            }
        }

        Ok(RetryOutcome::Exhausted {
            attempts: max_attempts,
            last_error: last_error
                .unwrap_or_else(|| AppError::internal("retry loop ended without an attempt")),
        })
    }
}
