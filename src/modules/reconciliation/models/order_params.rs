use serde::Serialize;

use crate::modules::deals::Deal;
use crate::modules::gateways::PaymentStatus;
use crate::modules::links::{session_token, LinkRecord};
use crate::modules::plans::InstallmentEntry;

/// Working state of one installment while it is matched and orchestrated
#[derive(Debug, Clone, PartialEq)]
pub struct OrderParams {
    /// Due date in display form; may be blank or unparsable
    pub due_date: String,
    pub amount: i64,
    pub payment_ref: Option<String>,
    pub url: Option<String>,
    /// Id of the persisted link record, if there is one
    pub link_id: Option<String>,
    pub order_key: String,
    pub deal: Deal,
}

impl OrderParams {
    /// Installment that has no link record yet
    pub fn from_entry(deal: &Deal, entry: &InstallmentEntry) -> Self {
        Self {
            due_date: entry.due_date.clone(),
            amount: entry.amount,
            payment_ref: entry.payment_ref.clone(),
            url: None,
            link_id: None,
            order_key: deal.deal_number.clone(),
            deal: deal.clone(),
        }
    }

    /// Installment backed by a link record; the plan's reference fills in
    /// when the link has not been confirmed yet
    pub fn from_link(deal: &Deal, link: &LinkRecord, plan_ref: Option<String>) -> Self {
        Self {
            due_date: link.date.clone(),
            amount: link.amount.unwrap_or_default(),
            payment_ref: link.payment_ref.clone().or(plan_ref),
            url: link.url.clone(),
            link_id: Some(link.id.clone()).filter(|id| !id.is_empty()),
            order_key: deal.deal_number.clone(),
            deal: deal.clone(),
        }
    }

    pub fn session_token(&self) -> Option<String> {
        session_token(self.url.as_deref()?)
    }

    /// Plan entry this installment corresponds to
    pub fn entry(&self) -> InstallmentEntry {
        InstallmentEntry {
            due_date: self.due_date.clone(),
            amount: self.amount,
            payment_ref: self.payment_ref.clone(),
        }
    }
}

/// Plan entry together with its position in the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSlot {
    pub position: usize,
    pub entry: InstallmentEntry,
}

/// An installment with its payment status; `None` means no link exists yet
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInstallment {
    pub position: usize,
    pub params: OrderParams,
    pub status: Option<PaymentStatus>,
}

impl ResolvedInstallment {
    pub fn is_paid(&self) -> bool {
        self.status.map(|s| s.is_paid()).unwrap_or(false)
    }
}

/// Outcome of matching a plan against the links of its deal
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    pub matched: Vec<ResolvedInstallment>,
    pub residual: Vec<PlanSlot>,
}

impl MatchResult {
    /// Every installment is linked and paid
    pub fn all_paid(&self) -> bool {
        self.residual.is_empty()
            && !self.matched.is_empty()
            && self.matched.iter().all(ResolvedInstallment::is_paid)
    }

    /// Matched and residual installments together, in plan order
    pub fn into_installments(self, deal: &Deal) -> Vec<ResolvedInstallment> {
        let mut installments = self.matched;
        installments.extend(self.residual.into_iter().map(|slot| ResolvedInstallment {
            position: slot.position,
            params: OrderParams::from_entry(deal, &slot.entry),
            status: None,
        }));
        installments.sort_by_key(|i| i.position);
        installments
    }
}

/// One row of the payment view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentLine {
    pub date: String,
    pub amount: i64,
    pub is_paid: bool,
}

/// What the presentation layer renders for an unpaid deal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentViewModel {
    pub order_key: String,
    pub total_amount: i64,
    pub payments: Vec<PaymentLine>,
}

impl PaymentViewModel {
    pub fn from_installments(
        order_key: &str,
        total_amount: i64,
        installments: &[ResolvedInstallment],
    ) -> Self {
        Self {
            order_key: order_key.to_string(),
            total_amount,
            payments: installments
                .iter()
                .map(|i| PaymentLine {
                    date: i.params.due_date.clone(),
                    amount: i.params.amount,
                    is_paid: i.is_paid(),
                })
                .collect(),
        }
    }
}
