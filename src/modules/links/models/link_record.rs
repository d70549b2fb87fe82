use serde::{Deserialize, Serialize};

use crate::core::{dates, Fields, Record};

pub const ORDER_KEY_FIELD: &str = "OrderId";
pub const DATE_FIELD: &str = "Date";
pub const EXPIRATION_FIELD: &str = "Expiration Date";
pub const PRICE_FIELD: &str = "Price";
pub const URL_FIELD: &str = "Link";
pub const PAYMENT_REF_FIELD: &str = "PaymentId";

/// A generated payment link persisted next to its due date and amount
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Store id; empty until the record has been created
    pub id: String,
    /// Deal business key
    pub order_key: String,
    /// Due date in display form
    pub date: String,
    pub expiration_date: String,
    pub amount: Option<i64>,
    pub url: Option<String>,
    /// Gateway reference; absent until the gateway confirmed the link
    pub payment_ref: Option<String>,
}

impl LinkRecord {
    pub fn from_record(record: &Record) -> Self {
        let fields = &record.fields;
        Self {
            id: record.id.clone(),
            order_key: fields.get_string(ORDER_KEY_FIELD).trim().to_string(),
            date: dates::to_display(&fields.get_string(DATE_FIELD)),
            expiration_date: fields.get_string(EXPIRATION_FIELD),
            amount: fields.get_int(PRICE_FIELD),
            url: fields.get_non_empty(URL_FIELD),
            payment_ref: fields.get_non_empty(PAYMENT_REF_FIELD),
        }
    }

    /// Store representation; dates are written as yyyy-MM-dd
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new()
            .with(ORDER_KEY_FIELD, self.order_key.as_str())
            .with(DATE_FIELD, dates::to_store(&self.date))
            .with(EXPIRATION_FIELD, dates::to_store(&self.expiration_date))
            .with(URL_FIELD, self.url.clone().unwrap_or_default())
            .with(PAYMENT_REF_FIELD, self.payment_ref.clone());

        if let Some(amount) = self.amount {
            fields.insert(PRICE_FIELD, amount);
        }
        fields
    }

    /// Has both a URL and an amount, so it can take part in reconciliation
    pub fn is_usable(&self) -> bool {
        self.url.is_some() && self.amount.is_some()
    }

    /// References with dashes were issued by a different acquirer
    pub fn is_foreign(&self) -> bool {
        self.payment_ref
            .as_deref()
            .map(|r| r.contains('-'))
            .unwrap_or(false)
    }

    /// Payment-form token of the link URL
    pub fn session_token(&self) -> Option<String> {
        session_token(self.url.as_deref()?)
    }
}

/// Last path segment of a payment URL, ignoring query and fragment
pub fn session_token(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let token = path.trim_end_matches('/').rsplit('/').next()?;

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
