use serde::{Deserialize, Serialize};

use crate::modules::reconciliation::PaymentViewModel;

/// What the payer sees when opening a deal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "payment", rename_all = "snake_case")]
pub enum PaymentOverview {
    /// Every installment is paid
    Paid,
    View(PaymentViewModel),
}

/// Deal lookup by business key
#[derive(Debug, Clone, Deserialize)]
pub struct OrderQuery {
    pub order_number: String,
}
