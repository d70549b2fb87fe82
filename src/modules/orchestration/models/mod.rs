pub mod link_resolution;

pub use link_resolution::{LinkLabel, LinkResolution, OrchestratorSettings};
