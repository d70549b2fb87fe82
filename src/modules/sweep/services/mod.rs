pub mod expiry_cache;
pub mod sweep_scheduler;

pub use expiry_cache::ExpiryCache;
pub use sweep_scheduler::{delay_until_run, DashboardLink, SweepGuard, SweepScheduler, SweepSettings};
