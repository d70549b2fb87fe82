pub mod link_request;
pub mod payment_status;

pub use link_request::{
    CustomerContact, GatewayCredentials, GeneratedLink, LineItem, LinkRequest, PaymentMethod,
    PaymentObject,
};
pub use payment_status::PaymentStatus;
