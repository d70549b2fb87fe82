use serde::{Deserialize, Serialize};

use crate::core::{AppError, Result};

/// Fiscal payment method of a receipt line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    FullPrepayment,
    Prepayment,
    Advance,
    FullPayment,
    PartialPayment,
    Credit,
    CreditPayment,
}

impl PaymentMethod {
    pub fn code(&self) -> &'static str {
        match self {
            Self::FullPrepayment => "full_prepayment",
            Self::Prepayment => "prepayment",
            Self::Advance => "advance",
            Self::FullPayment => "full_payment",
            Self::PartialPayment => "partial_payment",
            Self::Credit => "credit",
            Self::CreditPayment => "credit_payment",
        }
    }
}

/// Fiscal subject of a receipt line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentObject {
    Commodity,
    Excise,
    Job,
    Service,
    GamblingBet,
    GamblingPrize,
    Lottery,
    LotteryPrize,
    IntellectualActivity,
    Payment,
    AgentCommission,
    Composite,
    Another,
}

impl PaymentObject {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Commodity => "commodity",
            Self::Excise => "excise",
            Self::Job => "job",
            Self::Service => "service",
            Self::GamblingBet => "gambling_bet",
            Self::GamblingPrize => "gambling_prize",
            Self::Lottery => "lottery",
            Self::LotteryPrize => "lottery_prize",
            Self::IntellectualActivity => "intellectual_activity",
            Self::Payment => "payment",
            Self::AgentCommission => "agent_commission",
            Self::Composite => "composite",
            Self::Another => "another",
        }
    }
}

/// Terminal credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCredentials {
    pub terminal_key: String,
    pub password: String,
}

/// Payer contact details printed on the receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl CustomerContact {
    /// Phone keeps digits only; email loses embedded whitespace
    pub fn new(name: String, phone: &str, email: &str) -> Self {
        Self {
            name,
            phone: phone.chars().filter(|c| c.is_ascii_digit()).collect(),
            email: email.chars().filter(|c| !c.is_whitespace()).collect(),
        }
    }
}

/// Single receipt position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    /// Whole currency units
    pub price: i64,
    pub quantity: u32,
    pub measure: String,
    pub item_code: String,
}

impl LineItem {
    pub fn new(name: impl Into<String>, price: i64, item_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price,
            quantity: 1,
            measure: "pcs".to_string(),
            item_code: item_code.into(),
        }
    }

    /// Unit price in minor units
    pub fn price_minor(&self) -> Result<i64> {
        self.price
            .checked_mul(100)
            .ok_or_else(|| self.out_of_range())
    }

    /// Line total in minor units
    pub fn amount_minor(&self) -> Result<i64> {
        self.price_minor()?
            .checked_mul(i64::from(self.quantity))
            .ok_or_else(|| self.out_of_range())
    }

    fn out_of_range(&self) -> AppError {
        AppError::validation(format!(
            "Amount {} x {} for '{}' is out of range",
            self.price, self.quantity, self.name
        ))
    }
}

/// Everything the gateway needs to open a checkout session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRequest {
    /// Candidate gateway order identifier
    pub order_id: String,
    pub customer: CustomerContact,
    pub product: LineItem,
    /// Session deadline (`yyyy-MM-ddTHH:mm:ss`)
    pub expiration_date: String,
    pub payment_method: PaymentMethod,
    pub payment_object: PaymentObject,
}

/// Checkout session the gateway accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedLink {
    /// Gateway-assigned payment reference
    pub gateway_order_id: String,
    pub url: String,
}
