pub mod controllers;
pub mod models;
pub mod services;

pub use models::{ExpiresUserOrder, ExpirySnapshot, SweepTrigger};
pub use services::{DashboardLink, ExpiryCache, SweepScheduler, SweepSettings};
