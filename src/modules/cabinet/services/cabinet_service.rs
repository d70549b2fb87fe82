use std::sync::Arc;

use tracing::{info, instrument};

use crate::core::{dates, AppError, Result};
use crate::modules::cabinet::models::PaymentOverview;
use crate::modules::deals::Deal;
use crate::modules::links::LinkRecord;
use crate::modules::orchestration::{LinkOrchestrator, LinkResolution};
use crate::modules::plans::PlanParser;
use crate::modules::reconciliation::{
    OrderParams, PaymentViewModel, ReconciliationMatcher, ResolvedInstallment, StatusResolver,
};

/// Payer-facing flows: show what is owed for a deal and send the payer to
/// the checkout of the next unpaid installment.
pub struct CabinetService {
    orchestrator: Arc<LinkOrchestrator>,
    matcher: ReconciliationMatcher,
}

impl CabinetService {
    pub fn new(orchestrator: Arc<LinkOrchestrator>, status_concurrency: usize) -> Self {
        let test_payment_ref = orchestrator.settings().test_payment_ref.clone();
        let matcher = ReconciliationMatcher::new(
            orchestrator.clone(),
            status_concurrency,
            test_payment_ref,
        );
        Self {
            orchestrator,
            matcher,
        }
    }

    /// Payment view of a deal, or `Paid` when nothing is left to pay
    #[instrument(skip(self))]
    pub async fn payment_overview(&self, order_number: &str) -> Result<PaymentOverview> {
        let deal = self.load_deal(order_number).await?;
        let total = deal.total_price()?;
        deal.pay_by()?;

        let installments = self.installments(&deal, total).await?;

        if !installments.is_empty() && installments.iter().all(ResolvedInstallment::is_paid) {
            info!("Deal is fully paid");
            return Ok(PaymentOverview::Paid);
        }

        Ok(PaymentOverview::View(PaymentViewModel::from_installments(
            &deal.deal_number,
            total,
            &installments,
        )))
    }

    /// Resolve or create the link of the first unpaid installment in plan order;
    /// an installment the gateway reports as paid moves on to the next one
    #[instrument(skip(self))]
    pub async fn pay(&self, order_number: &str) -> Result<LinkResolution> {
        let deal = self.load_deal(order_number).await?;
        let total = deal.total_price()?;
        if !deal.has_plan() {
            deal.pay_by()?;
        }

        let installments = self.installments(&deal, total).await?;
        let count = installments.len();

        let unpaid = installments
            .into_iter()
            .enumerate()
            .filter(|(_, installment)| !installment.is_paid());

        for (index, installment) in unpaid {
            match self
                .orchestrator
                .resolve_or_create(installment.params, index + 1, count)
                .await?
            {
                LinkResolution::Paid => continue,
                resolution => return Ok(resolution),
            }
        }

        Ok(LinkResolution::Paid)
    }

    async fn load_deal(&self, order_number: &str) -> Result<Deal> {
        let order_number = order_number.trim();
        if order_number.is_empty() {
            return Err(AppError::validation("Deal number is required"));
        }
        self.orchestrator.deals().find_by_number(order_number).await
    }

    /// Every installment of the deal with its status, in plan order
    async fn installments(&self, deal: &Deal, total: i64) -> Result<Vec<ResolvedInstallment>> {
        if deal.has_plan() {
            let plan = PlanParser::parse_for_total(&deal.installment_plan, total)?;
            let links = self
                .orchestrator
                .links()
                .list_by_order(&deal.deal_number)
                .await;
            reject_foreign(deal, &links)?;

            let result = self.matcher.reconcile(deal, &plan, &links).await?;
            self.matcher
                .resolve_referenced(result.into_installments(deal))
                .await
        } else {
            Ok(vec![self.single_installment(deal, total).await?])
        }
    }

    /// A deal without a plan is one installment due on its pay-by date
    async fn single_installment(&self, deal: &Deal, total: i64) -> Result<ResolvedInstallment> {
        if total < 0 {
            return Err(AppError::validation(format!(
                "Amount due cannot be negative (deal {})",
                deal.deal_number
            )));
        }

        let link = self
            .orchestrator
            .links()
            .find_by_order(&deal.deal_number)
            .await;
        if let Some(link) = &link {
            reject_foreign(deal, std::slice::from_ref(link))?;
        }

        let mut params = OrderParams {
            due_date: dates::to_display(&deal.pay_by_raw),
            amount: total,
            payment_ref: link.as_ref().and_then(|l| l.payment_ref.clone()),
            url: link.as_ref().and_then(|l| l.url.clone()),
            link_id: link.as_ref().map(|l| l.id.clone()).filter(|id| !id.is_empty()),
            order_key: deal.deal_number.clone(),
            deal: deal.clone(),
        };

        let status = if params.url.is_some() {
            Some(self.orchestrator.resolve_status(&mut params).await?)
        } else {
            None
        };

        Ok(ResolvedInstallment {
            position: 0,
            params,
            status,
        })
    }
}

fn reject_foreign(deal: &Deal, links: &[LinkRecord]) -> Result<()> {
    if links.iter().any(LinkRecord::is_foreign) {
        return Err(AppError::validation(format!(
            "Links for this deal were issued by another acquirer (deal {})",
            deal.deal_number
        )));
    }
    Ok(())
}
