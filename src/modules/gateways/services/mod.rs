pub mod gateway_trait;
pub mod link_retry;
pub mod terminal_gateway;

pub use gateway_trait::LinkGenerator;
pub use link_retry::{candidate_order_id, random_token, RetryOutcome, RetryPolicy};
pub use terminal_gateway::TerminalGatewayClient;
