// In-memory record store
//
// Mirrors the store contract: reads of missing records come back as None,
// writes report success as a bool. Listing yields a snapshot so callers can
// stop early without holding the lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use splitpay::core::{Fields, Record};
use splitpay::modules::store::{MatchMode, RecordStore, RecordStream};

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Record>>>,
    table_ids: Mutex<HashMap<String, String>>,
    next_id: AtomicU64,
    fail_writes: AtomicBool,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(100),
            ..Default::default()
        }
    }

    /// Insert a record with a fixed id
    pub fn seed(&self, table: &str, id: &str, fields: Fields) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(Record::new(id, fields));
    }

    pub fn set_table_id(&self, table: &str, table_id: &str) {
        self.table_ids
            .lock()
            .unwrap()
            .insert(table.to_string(), table_id.to_string());
    }

    /// Make every create/update report failure
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn records(&self, table: &str) -> Vec<Record> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn record(&self, table: &str, id: &str) -> Option<Record> {
        self.records(table).into_iter().find(|r| r.id == id)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn list_all<'a>(&'a self, table: &'a str) -> RecordStream<'a> {
        stream::iter(self.records(table)).boxed()
    }

    fn list_where<'a>(
        &'a self,
        table: &'a str,
        field: &'a str,
        value: &'a str,
    ) -> RecordStream<'a> {
        let matching: Vec<Record> = self
            .records(table)
            .into_iter()
            .filter(|r| r.fields.get_string(field) == value)
            .collect();
        stream::iter(matching).boxed()
    }

    async fn find_one(
        &self,
        table: &str,
        field: &str,
        value: &str,
        mode: MatchMode,
    ) -> Option<Record> {
        self.records(table).into_iter().find(|r| {
            let text = r.fields.get_string(field);
            match mode {
                MatchMode::Exact => text == value,
                MatchMode::Partial => text.contains(value),
                MatchMode::ScanAll => text.trim() == value.trim(),
            }
        })
    }

    async fn find_by_id(&self, table: &str, id: &str) -> Option<Record> {
        self.record(table, id)
    }

    async fn update(&self, table: &str, id: &str, fields: Fields) -> bool {
        if self.fail_writes.load(Ordering::SeqCst) {
            return false;
        }
        let mut tables = self.tables.lock().unwrap();
        let Some(record) = tables
            .get_mut(table)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
        else {
            return false;
        };
        for (key, value) in fields.into_inner() {
            record.fields.insert(key, value);
        }
        true
    }

    async fn create(&self, table: &str, fields: Fields) -> Option<String> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return None;
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        self.seed(table, &id, fields);
        Some(id)
    }

    async fn table_id(&self, table: &str) -> Option<String> {
        self.table_ids.lock().unwrap().get(table).cloned()
    }
}
