pub mod auth;

pub use auth::{AdminKeyAuth, ADMIN_KEY_HEADER};
