pub mod controllers;
pub mod models;
pub mod services;

pub use models::{OrderQuery, PaymentOverview};
pub use services::CabinetService;
