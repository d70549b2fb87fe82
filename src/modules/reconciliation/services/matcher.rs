use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, warn};

use crate::core::{dates, AppError, Result};
use crate::modules::deals::Deal;
use crate::modules::gateways::PaymentStatus;
use crate::modules::links::LinkRecord;
use crate::modules::plans::{InstallmentEntry, InstallmentPlan};
use crate::modules::reconciliation::models::{
    MatchResult, OrderParams, PlanSlot, ResolvedInstallment,
};

/// Resolves the payment status of an installment that already has a link.
///
/// May fill in `params.payment_ref` when it has to be recovered from the
/// link's payment session.
#[async_trait]
pub trait StatusResolver: Send + Sync {
    async fn resolve_status(&self, params: &mut OrderParams) -> Result<PaymentStatus>;
}

/// A link record paired with the plan slot it consumed
#[derive(Debug, Clone, PartialEq)]
pub struct LinkMatch {
    pub link: LinkRecord,
    pub slot: PlanSlot,
}

/// Pair every usable link with exactly one plan entry.
///
/// An entry matches a link on calendar day and amount, and on payment
/// reference when both carry one (`test_ref` on the link matches any).
/// A link that matches no entry or more than one is a consistency error.
/// Entries left over are returned in plan order.
pub fn match_links(
    deal: &Deal,
    plan: &InstallmentPlan,
    links: &[LinkRecord],
    test_ref: Option<&str>,
) -> Result<(Vec<LinkMatch>, Vec<PlanSlot>)> {
    let mut remaining: Vec<PlanSlot> = plan
        .iter()
        .cloned()
        .enumerate()
        .map(|(position, entry)| PlanSlot { position, entry })
        .collect();

    if let Some(slot) = remaining.iter().find(|slot| slot.entry.amount < 0) {
        return Err(AppError::validation(format!(
            "Installment amount {} is negative (deal {})",
            slot.entry.amount, deal.deal_number
        )));
    }

    let mut matches = Vec::new();

    for link in links.iter().filter(|link| link.is_usable()) {
        let amount = link.amount.unwrap_or_default();
        if amount < 0 {
            return Err(AppError::validation(format!(
                "Link amount {} is negative (deal {})",
                amount, deal.deal_number
            )));
        }

        let hits: Vec<usize> = remaining
            .iter()
            .enumerate()
            .filter(|(_, slot)| entry_matches_link(&slot.entry, link, test_ref))
            .map(|(i, _)| i)
            .collect();

        if hits.len() != 1 {
            warn!(
                order_key = %deal.deal_number,
                link_id = %link.id,
                matches = hits.len(),
                "Link does not map to exactly one installment"
            );
            return Err(AppError::consistency(format!(
                "Installment count does not match link count for this deal (deal {})",
                deal.deal_number
            )));
        }

        let slot = remaining.remove(hits[0]);
        matches.push(LinkMatch {
            link: link.clone(),
            slot,
        });
    }

    Ok((matches, remaining))
}

fn entry_matches_link(entry: &InstallmentEntry, link: &LinkRecord, test_ref: Option<&str>) -> bool {
    let Some(amount) = link.amount else {
        return false;
    };
    if !entry.matches(&link.date, amount) {
        return false;
    }

    match (entry.payment_ref.as_deref(), link.payment_ref.as_deref()) {
        (Some(plan_ref), Some(link_ref)) => plan_ref == link_ref || Some(link_ref) == test_ref,
        _ => true,
    }
}

/// Link record that belongs to a plan entry: by payment reference when the
/// entry has one, otherwise by calendar day and amount
pub fn find_link_for_entry<'a>(
    entry: &InstallmentEntry,
    links: &'a [LinkRecord],
) -> Option<&'a LinkRecord> {
    match entry.payment_ref.as_deref() {
        Some(payment_ref) => links
            .iter()
            .find(|link| link.payment_ref.as_deref() == Some(payment_ref)),
        None => links.iter().find(|link| {
            link.amount == Some(entry.amount) && dates::same_day(&link.date, &entry.due_date)
        }),
    }
}

/// Matches a deal's plan against its links and resolves each matched link's
/// payment status, a bounded number at a time
pub struct ReconciliationMatcher {
    resolver: Arc<dyn StatusResolver>,
    concurrency: usize,
    test_payment_ref: Option<String>,
}

impl ReconciliationMatcher {
    pub fn new(
        resolver: Arc<dyn StatusResolver>,
        concurrency: usize,
        test_payment_ref: Option<String>,
    ) -> Self {
        Self {
            resolver,
            concurrency: concurrency.max(1),
            test_payment_ref,
        }
    }

    pub async fn reconcile(
        &self,
        deal: &Deal,
        plan: &InstallmentPlan,
        links: &[LinkRecord],
    ) -> Result<MatchResult> {
        let (matches, residual) =
            match_links(deal, plan, links, self.test_payment_ref.as_deref())?;

        debug!(
            order_key = %deal.deal_number,
            matched = matches.len(),
            residual = residual.len(),
            "Plan matched against links"
        );

        let matched: Vec<ResolvedInstallment> = stream::iter(matches)
            .map(|m| {
                let resolver = self.resolver.clone();
                let position = m.slot.position;
                let mut params = OrderParams::from_link(deal, &m.link, m.slot.entry.payment_ref);
                async move {
                    let status = resolver.resolve_status(&mut params).await?;
                    Ok::<_, AppError>(ResolvedInstallment {
                        position,
                        params,
                        status: Some(status),
                    })
                }
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        Ok(MatchResult { matched, residual })
    }

    /// Resolve installments that carry a payment reference in the plan but
    /// had no link to match against
    pub async fn resolve_referenced(
        &self,
        installments: Vec<ResolvedInstallment>,
    ) -> Result<Vec<ResolvedInstallment>> {
        stream::iter(installments)
            .map(|mut installment| {
                let resolver = self.resolver.clone();
                async move {
                    if installment.status.is_none() && installment.params.payment_ref.is_some() {
                        let status = resolver.resolve_status(&mut installment.params).await?;
                        installment.status = Some(status);
                    }
                    Ok::<_, AppError>(installment)
                }
            })
            .buffered(self.concurrency)
            .try_collect()
            .await
    }
}
