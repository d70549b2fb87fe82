use serde::Serialize;

use crate::modules::gateways::{GatewayCredentials, PaymentMethod, PaymentObject, RetryPolicy};

/// What the payer should see after an installment was orchestrated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "url", rename_all = "snake_case")]
pub enum LinkResolution {
    /// Send the payer to this checkout URL
    Redirect(String),
    /// Nothing left to pay for this installment
    Paid,
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub credentials: GatewayCredentials,
    pub retry: RetryPolicy,
    /// Payment reference that always counts as paid; test mode only
    pub test_payment_ref: Option<String>,
}

/// Receipt classification and product label of a generated link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkLabel {
    pub name: String,
    pub payment_method: PaymentMethod,
    pub payment_object: PaymentObject,
}

impl LinkLabel {
    /// A deal paid in one installment is a full prepayment for the goods and
    /// carries its index in the label; installments of a longer plan are
    /// plain prepayments named after the product.
    pub fn for_installment(product_name: &str, position: usize, total: usize) -> Self {
        if total == 1 {
            Self {
                name: format!("Prepayment No {}/{} for {}", position, total, product_name),
                payment_method: PaymentMethod::FullPrepayment,
                payment_object: PaymentObject::Commodity,
            }
        } else {
            Self {
                name: product_name.to_string(),
                payment_method: PaymentMethod::Prepayment,
                payment_object: PaymentObject::Payment,
            }
        }
    }
}
