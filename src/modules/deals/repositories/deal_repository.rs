use std::sync::Arc;

use futures_util::stream::{BoxStream, StreamExt};
use tracing::{info, warn};

use crate::config::StoreSchema;
use crate::core::{dates, AppError, Fields, Result};
use crate::modules::deals::models::{Deal, Program};
use crate::modules::gateways::CustomerContact;
use crate::modules::store::{MatchMode, RecordStore};

/// Read access to deals and the records they reference, plus the single
/// write the engine performs on a deal: rewriting its installment plan.
pub struct DealRepository {
    store: Arc<dyn RecordStore>,
    schema: StoreSchema,
}

impl DealRepository {
    pub fn new(store: Arc<dyn RecordStore>, schema: StoreSchema) -> Self {
        Self { store, schema }
    }

    pub fn schema(&self) -> &StoreSchema {
        &self.schema
    }

    /// Look up a deal by its business key
    pub async fn find_by_number(&self, deal_number: &str) -> Result<Deal> {
        self.store
            .find_one(
                &self.schema.deals_table,
                &self.schema.deal_number_field,
                deal_number,
                MatchMode::Exact,
            )
            .await
            .map(|record| Deal::from_record(&record, &self.schema))
            .ok_or_else(|| AppError::not_found(format!("Deal {} not found", deal_number)))
    }

    /// Every deal in the store, lazily paginated
    pub fn stream_all(&self) -> BoxStream<'_, Deal> {
        self.store
            .list_all(&self.schema.deals_table)
            .map(|record| Deal::from_record(&record, &self.schema))
            .boxed()
    }

    /// Program referenced by the deal; requires both a name and an item code
    pub async fn find_program(&self, deal: &Deal) -> Option<Program> {
        let id = deal.program_id.as_deref()?;
        let record = self.store.find_by_id(&self.schema.programs_table, id).await?;
        let fields = &record.fields;

        if !fields.contains(&self.schema.program_name_field)
            || !fields.contains(&self.schema.program_item_code_field)
        {
            warn!(deal = %deal.deal_number, program_id = %id, "Program record is incomplete");
            return None;
        }

        Some(Program {
            id: record.id.clone(),
            name: fields.get_string(&self.schema.program_name_field),
            item_code: fields.get_string(&self.schema.program_item_code_field),
            start_date: dates::parse_date(&fields.get_string(&self.schema.program_start_field)),
        })
    }

    /// Customer referenced by the deal; requires name, phone and email
    pub async fn find_customer(&self, deal: &Deal) -> Option<CustomerContact> {
        let id = deal.customer_id.as_deref()?;
        let record = self.store.find_by_id(&self.schema.customers_table, id).await?;
        let fields = &record.fields;

        let complete = [
            &self.schema.customer_name_field,
            &self.schema.customer_phone_field,
            &self.schema.customer_email_field,
        ]
        .iter()
        .all(|key| fields.contains(key));

        if !complete {
            warn!(deal = %deal.deal_number, customer_id = %id, "Customer record is incomplete");
            return None;
        }

        Some(CustomerContact::new(
            fields.get_string(&self.schema.customer_name_field),
            &fields.get_string(&self.schema.customer_phone_field),
            &fields.get_string(&self.schema.customer_email_field),
        ))
    }

    /// Persist a rewritten installment plan
    pub async fn update_plan(&self, deal: &Deal, plan: &str) -> bool {
        let fields = Fields::new().with(self.schema.plan_field.as_str(), plan);
        let updated = self
            .store
            .update(&self.schema.deals_table, &deal.id, fields)
            .await;

        if updated {
            info!(deal = %deal.deal_number, "Installment plan updated");
        } else {
            warn!(deal = %deal.deal_number, "Failed to update installment plan");
        }
        updated
    }

    /// Store-internal id of the deals table
    pub async fn deals_table_id(&self) -> Option<String> {
        self.store.table_id(&self.schema.deals_table).await
    }
}
