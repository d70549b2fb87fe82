pub mod cabinet;
pub mod deals;
pub mod gateways;
pub mod health;
pub mod links;
pub mod orchestration;
pub mod plans;
pub mod reconciliation;
pub mod store;
pub mod sweep;
