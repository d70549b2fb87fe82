// Scripted payment gateway
//
// Link creation follows a queue of scripted responses and accepts once the
// queue is empty. Statuses, session lookups and failing references are set
// per payment reference.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use splitpay::core::{AppError, Result};
use splitpay::modules::gateways::{
    GatewayCredentials, GeneratedLink, LinkGenerator, LinkRequest, PaymentStatus,
};

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum CreateScript {
    /// Reject the order id as already processed
    Conflict,
    /// Fail with a gateway error
    Fail(String),
    Accept,
}

#[derive(Default)]
pub struct GatewayStub {
    script: Mutex<VecDeque<CreateScript>>,
    statuses: Mutex<HashMap<String, PaymentStatus>>,
    failing_refs: Mutex<HashSet<String>>,
    sessions: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<LinkRequest>>,
    next_ref: AtomicU32,
    status_calls: AtomicUsize,
}

#[allow(dead_code)]
impl GatewayStub {
    pub fn new() -> Self {
        Self {
            next_ref: AtomicU32::new(5000),
            ..Default::default()
        }
    }

    pub fn script(&self, steps: impl IntoIterator<Item = CreateScript>) {
        self.script.lock().unwrap().extend(steps);
    }

    pub fn set_status(&self, payment_ref: &str, status: PaymentStatus) {
        self.statuses
            .lock()
            .unwrap()
            .insert(payment_ref.to_string(), status);
    }

    pub fn fail_status(&self, payment_ref: &str) {
        self.failing_refs
            .lock()
            .unwrap()
            .insert(payment_ref.to_string());
    }

    pub fn set_session(&self, token: &str, payment_ref: &str) {
        self.sessions
            .lock()
            .unwrap()
            .insert(token.to_string(), payment_ref.to_string());
    }

    /// Every create request received, including rejected ones
    pub fn requests(&self) -> Vec<LinkRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkGenerator for GatewayStub {
    async fn create_link(&self, request: &LinkRequest) -> Result<GeneratedLink> {
        self.requests.lock().unwrap().push(request.clone());

        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(CreateScript::Accept);

        match step {
            CreateScript::Conflict => Err(AppError::OrderConflict(
                "Order with this number has already been processed".to_string(),
            )),
            CreateScript::Fail(message) => Err(AppError::Gateway(message)),
            CreateScript::Accept => {
                let payment_ref = self.next_ref.fetch_add(1, Ordering::SeqCst).to_string();
                let url = format!("https://pay.test/new/tok{}", payment_ref);
                self.set_status(&payment_ref, PaymentStatus::New);
                Ok(GeneratedLink {
                    gateway_order_id: payment_ref,
                    url,
                })
            }
        }
    }

    async fn get_status(
        &self,
        _credentials: &GatewayCredentials,
        gateway_order_id: &str,
    ) -> Result<PaymentStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing_refs.lock().unwrap().contains(gateway_order_id) {
            return Err(AppError::Gateway("gateway unavailable".to_string()));
        }

        Ok(self
            .statuses
            .lock()
            .unwrap()
            .get(gateway_order_id)
            .copied()
            .unwrap_or(PaymentStatus::Unknown))
    }

    async fn get_session_info(&self, session_token: &str) -> Result<Option<String>> {
        Ok(self.sessions.lock().unwrap().get(session_token).cloned())
    }

    fn name(&self) -> &str {
        "stub"
    }
}
