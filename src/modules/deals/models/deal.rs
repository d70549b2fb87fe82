use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::StoreSchema;
use crate::core::{dates, AppError, Record, Result};

/// A sellable order with a total price and an optional installment plan.
///
/// Values are kept as the store delivered them; typed access validates
/// lazily so one malformed deal never prevents reading the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    /// Business key shared with link records
    pub deal_number: String,
    pub total_price_raw: String,
    pub pay_by_raw: String,
    /// Raw installment plan, empty for single-payment deals
    pub installment_plan: String,
    pub program_id: Option<String>,
    pub customer_id: Option<String>,
}

impl Deal {
    pub fn from_record(record: &Record, schema: &StoreSchema) -> Self {
        let fields = &record.fields;
        Self {
            id: record.id.clone(),
            deal_number: fields.get_string(&schema.deal_number_field).trim().to_string(),
            total_price_raw: fields.get_string(&schema.total_price_field).trim().to_string(),
            pay_by_raw: fields.get_string(&schema.pay_by_field).trim().to_string(),
            installment_plan: fields.get_string(&schema.plan_field),
            program_id: fields.get_link_id(&schema.program_field),
            customer_id: fields.get_link_id(&schema.customer_field),
        }
    }

    /// Total price; missing or non-numeric values are data errors
    pub fn total_price(&self) -> Result<i64> {
        if self.total_price_raw.is_empty() {
            return Err(AppError::validation(format!(
                "Amount due is not set (deal {})",
                self.deal_number
            )));
        }
        self.total_price_raw.parse().map_err(|_| {
            AppError::validation(format!(
                "Amount due '{}' is not a whole number (deal {})",
                self.total_price_raw, self.deal_number
            ))
        })
    }

    /// Pay-by date as text; blank is a data error
    pub fn pay_by(&self) -> Result<&str> {
        if self.pay_by_raw.is_empty() {
            return Err(AppError::validation(format!(
                "Payment date is not set (deal {})",
                self.deal_number
            )));
        }
        Ok(&self.pay_by_raw)
    }

    pub fn pay_by_date(&self) -> Option<NaiveDate> {
        dates::parse_date(&self.pay_by_raw)
    }

    pub fn has_plan(&self) -> bool {
        !self.installment_plan.trim().is_empty()
    }
}
