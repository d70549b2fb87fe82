pub mod cabinet_controller;

pub use cabinet_controller::configure;
