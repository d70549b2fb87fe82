use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::core::Fields;
use crate::modules::links::models::link_record::{LinkRecord, ORDER_KEY_FIELD, PAYMENT_REF_FIELD};
use crate::modules::store::{MatchMode, RecordStore};

/// Persistence contract for generated payment links
///
/// Like the underlying store, failures come back as `None`/`false`/empty
/// instead of errors.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Insert a link record and return its id
    async fn create(&self, link: &LinkRecord) -> Option<String>;

    /// Overwrite every field of an existing link record
    async fn update(&self, link: &LinkRecord) -> bool;

    /// Record the gateway reference on an existing link record
    async fn confirm_payment_ref(&self, id: &str, payment_ref: &str) -> bool;

    /// First link record of a deal
    async fn find_by_order(&self, order_key: &str) -> Option<LinkRecord>;

    /// All link records of a deal
    async fn list_by_order(&self, order_key: &str) -> Vec<LinkRecord>;
}

/// `LinkStore` over the links table of the record store
pub struct LinkRepository {
    store: Arc<dyn RecordStore>,
    table: String,
}

impl LinkRepository {
    pub fn new(store: Arc<dyn RecordStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }
}

#[async_trait]
impl LinkStore for LinkRepository {
    async fn create(&self, link: &LinkRecord) -> Option<String> {
        let id = self.store.create(&self.table, link.to_fields()).await;
        match &id {
            Some(id) => debug!(order_key = %link.order_key, link_id = %id, "Link record created"),
            None => warn!(order_key = %link.order_key, "Failed to create link record"),
        }
        id
    }

    async fn update(&self, link: &LinkRecord) -> bool {
        if link.id.is_empty() {
            warn!(order_key = %link.order_key, "Cannot update a link record without an id");
            return false;
        }
        self.store
            .update(&self.table, &link.id, link.to_fields())
            .await
    }

    async fn confirm_payment_ref(&self, id: &str, payment_ref: &str) -> bool {
        let fields = Fields::new().with(PAYMENT_REF_FIELD, payment_ref);
        let updated = self.store.update(&self.table, id, fields).await;
        if !updated {
            warn!(link_id = %id, payment_ref = %payment_ref, "Failed to store payment reference");
        }
        updated
    }

    async fn find_by_order(&self, order_key: &str) -> Option<LinkRecord> {
        self.store
            .find_one(&self.table, ORDER_KEY_FIELD, order_key, MatchMode::Exact)
            .await
            .map(|record| LinkRecord::from_record(&record))
    }

    async fn list_by_order(&self, order_key: &str) -> Vec<LinkRecord> {
        self.store
            .list_where(&self.table, ORDER_KEY_FIELD, order_key)
            .filter(|record| futures_util::future::ready(!record.id.is_empty()))
            .map(|record| LinkRecord::from_record(&record))
            .collect()
            .await
    }
}
