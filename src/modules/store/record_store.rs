use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::core::{Fields, Record};

/// Lazily produced sequence of records; consumers may stop early
pub type RecordStream<'a> = BoxStream<'a, Record>;

/// How `find_one` locates a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Server-side equality filter
    Exact,
    /// Server-side `like` filter
    Partial,
    /// Walk every record and compare the field text client-side
    ScanAll,
}

/// Generic contract over the external record store.
///
/// Connectivity and decoding failures never surface as errors here: reads
/// come back empty or `None`, writes come back `false`/`None`. Callers
/// treat absence as "cannot proceed" and report it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every record of a table, page by page
    fn list_all<'a>(&'a self, table: &'a str) -> RecordStream<'a>;

    /// Records whose `field` equals `value`, page by page
    fn list_where<'a>(&'a self, table: &'a str, field: &'a str, value: &'a str)
        -> RecordStream<'a>;

    async fn find_one(
        &self,
        table: &str,
        field: &str,
        value: &str,
        mode: MatchMode,
    ) -> Option<Record>;

    async fn find_by_id(&self, table: &str, id: &str) -> Option<Record>;

    /// Patch fields of an existing record; `true` when the store confirmed the write
    async fn update(&self, table: &str, id: &str, fields: Fields) -> bool;

    /// Insert a record and return its id
    async fn create(&self, table: &str, fields: Fields) -> Option<String>;

    /// Store-internal table identifier, used to build operator deep links
    async fn table_id(&self, _table: &str) -> Option<String> {
        None
    }
}
