// Shared test helpers
#![allow(dead_code, unused_imports)]

pub mod gateway_stub;
pub mod memory_store;

pub use gateway_stub::{CreateScript, GatewayStub};
pub use memory_store::MemoryStore;
pub use test_data::{Harness, TestDataFactory, CUSTOMER_ID, PRODUCT_NAME, PROGRAM_ID};
