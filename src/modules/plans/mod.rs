pub mod models;
pub mod services;

pub use models::{InstallmentEntry, InstallmentPlan};
pub use services::PlanParser;
