pub mod nocodb;
pub mod record_store;

pub use nocodb::{NocoDbClient, RecordIdField};
pub use record_store::{MatchMode, RecordStore, RecordStream};
