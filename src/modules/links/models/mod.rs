pub mod link_record;

pub use link_record::{session_token, LinkRecord};
