pub mod clock;
pub mod dates;
pub mod error;
pub mod fields;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{AppError, Result};
pub use fields::{Fields, Record};
