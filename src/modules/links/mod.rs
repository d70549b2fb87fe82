pub mod models;
pub mod repositories;

pub use models::{session_token, LinkRecord};
pub use repositories::{LinkRepository, LinkStore};
