use async_trait::async_trait;

use crate::core::Result;
use crate::modules::gateways::models::{
    GatewayCredentials, GeneratedLink, LinkRequest, PaymentStatus,
};

/// Payment gateway contract for creating checkout links and checking payments
#[async_trait]
pub trait LinkGenerator: Send + Sync {
    /// Open a checkout session.
    ///
    /// A rejected order identifier (already used) must come back as
    /// `AppError::OrderConflict` so callers can retry with a new one; any
    /// other failure is reported as a gateway error carrying the gateway's
    /// own detail.
    async fn create_link(&self, request: &LinkRequest) -> Result<GeneratedLink>;

    /// Current payment status of a session by its gateway reference
    async fn get_status(
        &self,
        credentials: &GatewayCredentials,
        gateway_order_id: &str,
    ) -> Result<PaymentStatus>;

    /// Resolve the gateway reference behind a payment-page token, if the gateway knows it
    async fn get_session_info(&self, session_token: &str) -> Result<Option<String>>;

    /// Gateway name for logging
    fn name(&self) -> &str;
}
