pub mod expires_user_order;

pub use expires_user_order::{ExpiresUserOrder, ExpirySnapshot, SweepTrigger};
