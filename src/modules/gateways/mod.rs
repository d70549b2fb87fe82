pub mod models;
pub mod services;

pub use models::{
    CustomerContact, GatewayCredentials, GeneratedLink, LineItem, LinkRequest, PaymentMethod,
    PaymentObject, PaymentStatus,
};
pub use services::{LinkGenerator, RetryOutcome, RetryPolicy, TerminalGatewayClient};
