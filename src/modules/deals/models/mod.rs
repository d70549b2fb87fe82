pub mod deal;
pub mod program;

pub use deal::Deal;
pub use program::Program;
