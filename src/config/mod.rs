use crate::core::{AppError, Result};
use crate::modules::gateways::{GatewayCredentials, RetryPolicy};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub mod server;
pub mod store;

pub use server::ServerConfig;
pub use store::{StoreConfig, StoreSchema};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub gateway: GatewayConfig,
    pub sweep: SweepConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    /// `json` switches the subscriber to structured output
    pub log_format: String,
    /// Payment reference treated as paid without asking the gateway (test mode only)
    pub test_payment_ref: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub terminal_key: String,
    pub password: String,
    pub base_url: String,
    pub session_url: String,
    pub success_url: String,
    pub fail_url: String,
    pub taxation: String,
    pub tax: String,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    /// Parallel status checks per deal
    pub status_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Local hour of the first daily run
    pub run_hour: u32,
    pub deal_concurrency: usize,
    pub installment_concurrency: usize,
    pub cache_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub admin_api_key: String,
}

pub(crate) fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub(crate) fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", key))),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    /// Filter directives used when `RUST_LOG` is not set
    pub fn log_filter(&self) -> String {
        let level = match self.log_level.trim() {
            "" => "info",
            level => level,
        };
        format!("splitpay={},actix_web=info", level)
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Ok(GatewayConfig {
            terminal_key: env::var("GATEWAY_TERMINAL_KEY").map_err(|_| {
                AppError::Configuration("GATEWAY_TERMINAL_KEY not set".to_string())
            })?,
            password: env::var("GATEWAY_PASSWORD")
                .map_err(|_| AppError::Configuration("GATEWAY_PASSWORD not set".to_string()))?,
            base_url: env_or("GATEWAY_BASE_URL", "https://securepay.tinkoff.ru/v2"),
            session_url: env_or(
                "GATEWAY_SESSION_URL",
                "https://securepay.tinkoff.ru/platform/api/v1/pf/session",
            ),
            success_url: env_or("GATEWAY_SUCCESS_URL", ""),
            fail_url: env_or("GATEWAY_FAIL_URL", ""),
            taxation: env_or("GATEWAY_TAXATION", "usn_income"),
            tax: env_or("GATEWAY_TAX", "none"),
            retry_attempts: parse_env("GATEWAY_RETRY_ATTEMPTS", 10)?,
            retry_delay_ms: parse_env("GATEWAY_RETRY_DELAY_MS", 200)?,
            status_concurrency: parse_env("GATEWAY_STATUS_CONCURRENCY", 4)?,
        })
    }

    pub fn credentials(&self) -> GatewayCredentials {
        GatewayCredentials {
            terminal_key: self.terminal_key.clone(),
            password: self.password.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env_or("APP_ENV", "development"),
                log_level: env_or("LOG_LEVEL", "info"),
                log_format: env_or("LOG_FORMAT", "plain"),
                test_payment_ref: env::var("TEST_PAYMENT_REF")
                    .ok()
                    .filter(|v| !v.trim().is_empty()),
            },
            server: ServerConfig::from_env()?,
            store: StoreConfig::from_env()?,
            gateway: GatewayConfig::from_env()?,
            sweep: SweepConfig {
                run_hour: parse_env("SWEEP_RUN_HOUR", 1)?,
                deal_concurrency: parse_env("SWEEP_DEAL_CONCURRENCY", 4)?,
                installment_concurrency: parse_env("SWEEP_INSTALLMENT_CONCURRENCY", 2)?,
                cache_path: PathBuf::from(env_or("SWEEP_CACHE_PATH", "files/cache_periods.json")),
            },
            security: SecurityConfig {
                admin_api_key: env::var("ADMIN_API_KEY")
                    .map_err(|_| AppError::Configuration("ADMIN_API_KEY not set".to_string()))?,
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.sweep.run_hour >= 24 {
            return Err(AppError::Configuration(
                "Sweep run hour must be between 0 and 23".to_string(),
            ));
        }

        if self.sweep.deal_concurrency == 0
            || self.sweep.installment_concurrency == 0
            || self.gateway.status_concurrency == 0
        {
            return Err(AppError::Configuration(
                "Concurrency limits must be greater than 0".to_string(),
            ));
        }

        if self.gateway.retry_attempts == 0 {
            return Err(AppError::Configuration(
                "Gateway retry attempts must be greater than 0".to_string(),
            ));
        }

        if self.store.page_size == 0 {
            return Err(AppError::Configuration(
                "Store page size must be greater than 0".to_string(),
            ));
        }

        if self.security.admin_api_key.trim().is_empty() {
            return Err(AppError::Configuration(
                "Admin API key must not be empty".to_string(),
            ));
        }

        if self.app.test_payment_ref.is_some() && self.app.env == "production" {
            tracing::warn!("TEST_PAYMENT_REF is set in production; matching links will read as paid");
        }

        Ok(())
    }
}
