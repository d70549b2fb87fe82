pub mod due_date;
pub mod link_orchestrator;

pub use due_date::resolve_due_date;
pub use link_orchestrator::LinkOrchestrator;
