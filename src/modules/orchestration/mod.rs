pub mod models;
pub mod services;

pub use models::{LinkLabel, LinkResolution, OrchestratorSettings};
pub use services::{resolve_due_date, LinkOrchestrator};
