pub mod cabinet_service;

pub use cabinet_service::CabinetService;
