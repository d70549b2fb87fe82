use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An overdue installment the gateway does not report as paid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiresUserOrder {
    pub order_key: String,
    /// Deep link to the deal in the record store UI
    pub operator_link: Option<String>,
    /// Due date, dd.MM.yyyy
    pub due_date: String,
    pub amount: i64,
    pub payment_url: Option<String>,
}

/// Sweep result as published to readers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirySnapshot {
    /// Bumped on every replacement; 0 until the first sweep finished
    pub version: u64,
    pub generated_at: Option<NaiveDateTime>,
    pub orders: Vec<ExpiresUserOrder>,
}

/// Result of asking for a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "orders", rename_all = "snake_case")]
pub enum SweepTrigger {
    /// Sweep ran; number of overdue installments found
    Completed(usize),
    AlreadyRunning,
}
