use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument, warn};

use super::due_date::resolve_due_date;
use crate::core::{dates, AppError, Clock, Result};
use crate::modules::deals::DealRepository;
use crate::modules::gateways::{GeneratedLink, LineItem, LinkGenerator, LinkRequest, PaymentStatus};
use crate::modules::links::{LinkRecord, LinkStore};
use crate::modules::orchestration::models::{LinkLabel, LinkResolution, OrchestratorSettings};
use crate::modules::plans::PlanParser;
use crate::modules::reconciliation::{OrderParams, StatusResolver};

/// Decides per installment whether to report it paid, reuse its checkout
/// link or generate a new one, and keeps link records and the deal's plan
/// in step with what the gateway issued.
pub struct LinkOrchestrator {
    deals: Arc<DealRepository>,
    links: Arc<dyn LinkStore>,
    gateway: Arc<dyn LinkGenerator>,
    clock: Arc<dyn Clock>,
    settings: OrchestratorSettings,
}

impl LinkOrchestrator {
    pub fn new(
        deals: Arc<DealRepository>,
        links: Arc<dyn LinkStore>,
        gateway: Arc<dyn LinkGenerator>,
        clock: Arc<dyn Clock>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            deals,
            links,
            gateway,
            clock,
            settings,
        }
    }

    pub fn deals(&self) -> &Arc<DealRepository> {
        &self.deals
    }

    pub fn links(&self) -> &Arc<dyn LinkStore> {
        &self.links
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    fn is_test_ref(&self, payment_ref: &str) -> bool {
        self.settings.test_payment_ref.as_deref() == Some(payment_ref)
    }

    /// Pay the installment at `position` (1-based) of `total`
    #[instrument(skip(self, params), fields(order_key = %params.order_key, due_date = %params.due_date, amount = params.amount))]
    pub async fn resolve_or_create(
        &self,
        mut params: OrderParams,
        position: usize,
        total: usize,
    ) -> Result<LinkResolution> {
        if params.amount < 0 {
            return Err(AppError::validation(format!(
                "Amount due cannot be negative (deal {})",
                params.order_key
            )));
        }

        if params.payment_ref.is_none() && params.url.is_none() {
            let url = self.create_link(&params, position, total).await?;
            return Ok(LinkResolution::Redirect(url));
        }

        let status = self.resolve_status(&mut params).await?;

        if status.is_paid() {
            info!("Installment already paid");
            return Ok(LinkResolution::Paid);
        }

        if !status.needs_new_link() {
            if let Some(url) = &params.url {
                info!(status = %status, "Reusing existing payment link");
                return Ok(LinkResolution::Redirect(url.clone()));
            }
        }

        info!(status = %status, "Regenerating payment link");
        let url = self.create_link(&params, position, total).await?;
        Ok(LinkResolution::Redirect(url))
    }

    /// Generate a checkout link, persist it and write its reference into the plan
    pub async fn create_link(
        &self,
        params: &OrderParams,
        position: usize,
        total: usize,
    ) -> Result<String> {
        let deal = &params.deal;

        let program = self.deals.find_program(deal).await.ok_or_else(|| {
            AppError::validation(format!(
                "Program name or article is not set (deal {})",
                params.order_key
            ))
        })?;
        let customer = self.deals.find_customer(deal).await.ok_or_else(|| {
            AppError::validation(format!(
                "Customer name, phone or email is not set (deal {})",
                params.order_key
            ))
        })?;

        let today = self.clock.today();
        let due = resolve_due_date(&params.due_date, program.start_date, today);
        let due_text = dates::format_display(due);
        let label = LinkLabel::for_installment(&program.name, position, total);

        let template = LinkRequest {
            order_id: String::new(),
            customer,
            product: LineItem::new(label.name, params.amount, program.item_code),
            expiration_date: dates::to_expiration(&due_text),
            payment_method: label.payment_method,
            payment_object: label.payment_object,
        };

        let outcome = self
            .settings
            .retry
            .run(&params.order_key, |order_id| {
                let gateway = self.gateway.clone();
                let mut request = template.clone();
                request.order_id = order_id;
                async move { gateway.create_link(&request).await }
            })
            .await?;

        let (generated, order_id) = outcome.into_result().map_err(|e| {
            error!(error = %e, "Gateway kept rejecting order ids");
            e
        })?;

        info!(
            order_id = %order_id,
            payment_ref = %generated.gateway_order_id,
            gateway = %self.gateway.name(),
            "Payment link generated"
        );

        self.persist_link(params, &due_text, &generated).await?;
        self.record_in_plan(params, &generated.gateway_order_id).await;

        Ok(generated.url)
    }

    /// Two-phase write: the link record first, then its gateway reference
    async fn persist_link(
        &self,
        params: &OrderParams,
        due_text: &str,
        generated: &GeneratedLink,
    ) -> Result<()> {
        let date = if params.due_date.trim().is_empty() {
            due_text.to_string()
        } else {
            params.due_date.clone()
        };

        let record = LinkRecord {
            id: params.link_id.clone().unwrap_or_default(),
            order_key: params.order_key.clone(),
            date,
            expiration_date: due_text.to_string(),
            amount: Some(params.amount),
            url: Some(generated.url.clone()),
            payment_ref: None,
        };

        let link_id = if record.id.is_empty() {
            self.links.create(&record).await
        } else if self.links.update(&record).await {
            Some(record.id.clone())
        } else {
            None
        };

        let Some(link_id) = link_id else {
            error!("Payment link was generated but could not be stored");
            return Err(AppError::store(format!(
                "Payment link could not be saved (deal {})",
                params.order_key
            )));
        };

        if !self
            .links
            .confirm_payment_ref(&link_id, &generated.gateway_order_id)
            .await
        {
            warn!(link_id = %link_id, "Payment reference not stored; it will be recovered from the payment session");
        }

        Ok(())
    }

    async fn record_in_plan(&self, params: &OrderParams, payment_ref: &str) {
        let deal = &params.deal;
        if !deal.has_plan() {
            return;
        }

        let Some(plan) =
            PlanParser::rewrite_payment_ref(&deal.installment_plan, &params.entry(), payment_ref)
        else {
            return;
        };

        if plan != deal.installment_plan {
            self.deals.update_plan(deal, &plan).await;
        }
    }

    /// Recover a missing reference from the link's payment session and
    /// remember it on the link record
    async fn recover_payment_ref(&self, params: &mut OrderParams) -> Option<String> {
        let token = params.session_token()?;

        let payment_ref = match self.gateway.get_session_info(&token).await {
            Ok(Some(payment_ref)) => payment_ref,
            Ok(None) => {
                warn!(order_key = %params.order_key, "Payment session has no payment id");
                return None;
            }
            Err(e) => {
                warn!(order_key = %params.order_key, error = %e, "Payment session lookup failed");
                return None;
            }
        };

        match &params.link_id {
            Some(link_id) => {
                self.links.confirm_payment_ref(link_id, &payment_ref).await;
            }
            None => {
                let record = LinkRecord {
                    id: String::new(),
                    order_key: params.order_key.clone(),
                    date: params.due_date.clone(),
                    expiration_date: params.due_date.clone(),
                    amount: Some(params.amount),
                    url: params.url.clone(),
                    payment_ref: Some(payment_ref.clone()),
                };
                params.link_id = self.links.create(&record).await;
            }
        }

        params.payment_ref = Some(payment_ref.clone());
        Some(payment_ref)
    }
}

#[async_trait]
impl StatusResolver for LinkOrchestrator {
    async fn resolve_status(&self, params: &mut OrderParams) -> Result<PaymentStatus> {
        let payment_ref = match params.payment_ref.clone() {
            Some(payment_ref) => payment_ref,
            None => match self.recover_payment_ref(params).await {
                Some(payment_ref) => payment_ref,
                None => return Ok(PaymentStatus::Unknown),
            },
        };

        if self.is_test_ref(&payment_ref) {
            return Ok(PaymentStatus::Done);
        }

        self.gateway
            .get_status(&self.settings.credentials, &payment_ref)
            .await
    }
}
