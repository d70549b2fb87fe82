pub mod payment_overview;

pub use payment_overview::{OrderQuery, PaymentOverview};
