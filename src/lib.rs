//! Installment billing engine
//!
//! Reconciles deal installment plans against generated payment links,
//! creates or reuses gateway checkout links and sweeps all deals daily for
//! overdue unpaid installments.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

// Re-export commonly used types
pub use modules::cabinet;
pub use modules::gateways;
pub use modules::orchestration;
pub use modules::plans;
pub use modules::reconciliation;
pub use modules::sweep;
