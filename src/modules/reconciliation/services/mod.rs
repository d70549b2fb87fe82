pub mod matcher;

pub use matcher::{find_link_for_entry, match_links, LinkMatch, ReconciliationMatcher, StatusResolver};
