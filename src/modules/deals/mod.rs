pub mod models;
pub mod repositories;

pub use models::{Deal, Program};
pub use repositories::DealRepository;
