use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime};
use futures_util::stream::{self, StreamExt};
use tokio::time::{interval, sleep};
use tracing::{debug, error, info, warn};

use super::expiry_cache::ExpiryCache;
use crate::core::{dates, Clock, Result};
use crate::modules::deals::{Deal, DealRepository};
use crate::modules::gateways::{GatewayCredentials, LinkGenerator};
use crate::modules::links::{LinkRecord, LinkStore};
use crate::modules::plans::{InstallmentEntry, PlanParser};
use crate::modules::reconciliation::find_link_for_entry;
use crate::modules::sweep::models::{ExpiresUserOrder, SweepTrigger};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Where operator deep links point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardLink {
    /// `scheme://host` of the record store
    pub origin: String,
    pub main_db: String,
}

impl DashboardLink {
    pub fn row_url(&self, table_id: &str, row_id: &str) -> String {
        format!(
            "{}/dashboard/#/nc/{}/{}?rowId={}",
            self.origin, self.main_db, table_id, row_id
        )
    }
}

#[derive(Debug, Clone)]
pub struct SweepSettings {
    /// Local hour of the daily run
    pub run_hour: u32,
    pub deal_concurrency: usize,
    pub installment_concurrency: usize,
    pub cache_path: PathBuf,
    pub dashboard: Option<DashboardLink>,
    pub test_payment_ref: Option<String>,
}

/// Marks a sweep as running until dropped
pub struct SweepGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for SweepGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Daily job that collects overdue unpaid installments across all deals
///
/// Runs at `run_hour` local time and then every 24 hours. Only one sweep
/// runs at a time; a trigger while one is in progress is refused.
pub struct SweepScheduler {
    deals: Arc<DealRepository>,
    links: Arc<dyn LinkStore>,
    gateway: Arc<dyn LinkGenerator>,
    clock: Arc<dyn Clock>,
    cache: Arc<ExpiryCache>,
    credentials: GatewayCredentials,
    settings: SweepSettings,
    running: Arc<AtomicBool>,
}

/// Time to wait from `now` until the next `run_hour:00`
pub fn delay_until_run(now: NaiveDateTime, run_hour: u32) -> Duration {
    let at = NaiveTime::from_hms_opt(run_hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let mut next = now.date().and_time(at);
    if now > next {
        next += chrono::Duration::days(1);
    }
    (next - now).to_std().unwrap_or_default()
}

impl SweepScheduler {
    pub fn new(
        deals: Arc<DealRepository>,
        links: Arc<dyn LinkStore>,
        gateway: Arc<dyn LinkGenerator>,
        clock: Arc<dyn Clock>,
        cache: Arc<ExpiryCache>,
        credentials: GatewayCredentials,
        settings: SweepSettings,
    ) -> Self {
        Self {
            deals,
            links,
            gateway,
            clock,
            cache,
            credentials,
            settings,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cache(&self) -> &Arc<ExpiryCache> {
        &self.cache
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Start the daily schedule; spawn this as a background task
    pub async fn start(self: Arc<Self>) {
        let delay = delay_until_run(self.clock.now(), self.settings.run_hour);
        info!(
            run_hour = self.settings.run_hour,
            first_run_in_secs = delay.as_secs(),
            "Starting overdue installment sweep"
        );
        sleep(delay).await;

        let mut ticker = interval(DAY);
        loop {
            ticker.tick().await;

            match self.trigger().await {
                Ok(SweepTrigger::Completed(count)) => {
                    info!(overdue = count, "Scheduled sweep finished");
                }
                Ok(SweepTrigger::AlreadyRunning) => {
                    warn!("Skipping scheduled sweep, a manual sweep is still running");
                }
                Err(e) => {
                    error!(error = %e, "Scheduled sweep failed");
                }
            }
        }
    }

    /// Claim the sweep slot; `None` while another sweep runs
    pub fn try_begin(&self) -> Option<SweepGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SweepGuard {
                flag: self.running.clone(),
            })
    }

    /// Run one sweep now unless one is already running
    pub async fn trigger(&self) -> Result<SweepTrigger> {
        match self.try_begin() {
            Some(guard) => self.run_guarded(guard).await.map(SweepTrigger::Completed),
            None => Ok(SweepTrigger::AlreadyRunning),
        }
    }

    /// Run one sweep while holding the slot
    pub async fn run_guarded(&self, guard: SweepGuard) -> Result<usize> {
        let result = self.run_cycle().await;
        drop(guard);
        result
    }

    async fn run_cycle(&self) -> Result<usize> {
        let now = self.clock.now();
        info!("Sweep started");

        let row_link = match &self.settings.dashboard {
            Some(dashboard) => self
                .deals
                .deals_table_id()
                .await
                .map(|table_id| (dashboard, table_id)),
            None => None,
        };

        let per_deal: Vec<Vec<ExpiresUserOrder>> = self
            .deals
            .stream_all()
            .map(|deal| {
                let operator_link = row_link
                    .as_ref()
                    .map(|(dashboard, table_id)| dashboard.row_url(table_id, &deal.id));
                async move { self.check_deal(deal, now, operator_link).await }
            })
            .buffer_unordered(self.settings.deal_concurrency.max(1))
            .collect()
            .await;

        let mut orders: Vec<ExpiresUserOrder> = per_deal.into_iter().flatten().collect();
        orders.sort_by(|a, b| {
            a.order_key
                .cmp(&b.order_key)
                .then_with(|| dates::parse_date(&a.due_date).cmp(&dates::parse_date(&b.due_date)))
        });

        let count = orders.len();
        let snapshot = self.cache.replace(orders, now);
        info!(version = snapshot.version, overdue = count, "Sweep snapshot published");

        if let Err(e) = self.cache.persist(&self.settings.cache_path).await {
            warn!(path = %self.settings.cache_path.display(), error = %e, "Failed to persist sweep snapshot");
        }

        Ok(count)
    }

    async fn check_deal(
        &self,
        deal: Deal,
        now: NaiveDateTime,
        operator_link: Option<String>,
    ) -> Vec<ExpiresUserOrder> {
        let entries = match self.overdue_entries(&deal, now) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(order_key = %deal.deal_number, error = %e, "Skipping malformed deal");
                return Vec::new();
            }
        };
        if entries.is_empty() {
            return Vec::new();
        }

        let links = self.links.list_by_order(&deal.deal_number).await;
        if links.is_empty() {
            debug!(order_key = %deal.deal_number, "Overdue deal has no links yet");
            return Vec::new();
        }

        let single_payment = !deal.has_plan();
        let links = &links;
        let deal = &deal;
        let operator_link = &operator_link;

        stream::iter(entries)
            .map(|entry| async move {
                let link = if single_payment {
                    links.first()
                } else {
                    find_link_for_entry(&entry, links)
                };
                let Some(link) = link else {
                    return None;
                };
                self.check_installment(deal, entry, link, operator_link.clone())
                    .await
            })
            .buffer_unordered(self.settings.installment_concurrency.max(1))
            .filter_map(|order| async move { order })
            .collect()
            .await
    }

    /// Entries whose due date started before `now`; a deal without a plan is
    /// one entry due on its pay-by date. Malformed plan segments are skipped.
    fn overdue_entries(&self, deal: &Deal, now: NaiveDateTime) -> Result<Vec<InstallmentEntry>> {
        let total = deal.total_price()?;

        let entries = if deal.has_plan() {
            PlanParser::parse_lenient(&deal.installment_plan).into_entries()
        } else {
            let Some(pay_by) = deal.pay_by_date() else {
                return Ok(Vec::new());
            };
            vec![InstallmentEntry::new(dates::format_display(pay_by), total)]
        };

        Ok(entries
            .into_iter()
            .filter(|entry| {
                dates::parse_date(&entry.due_date)
                    .map(|due| due.and_time(NaiveTime::MIN) < now)
                    .unwrap_or(false)
            })
            .collect())
    }

    async fn check_installment(
        &self,
        deal: &Deal,
        entry: InstallmentEntry,
        link: &LinkRecord,
        operator_link: Option<String>,
    ) -> Option<ExpiresUserOrder> {
        let payment_ref = link.payment_ref.as_deref()?;
        if self.settings.test_payment_ref.as_deref() == Some(payment_ref) {
            return None;
        }

        let status = match self.gateway.get_status(&self.credentials, payment_ref).await {
            Ok(status) => status,
            Err(e) => {
                warn!(order_key = %deal.deal_number, payment_ref = %payment_ref, error = %e, "Status check failed, skipping installment");
                return None;
            }
        };

        if status.is_paid() {
            return None;
        }

        Some(ExpiresUserOrder {
            order_key: deal.deal_number.clone(),
            operator_link,
            due_date: entry.due_date,
            amount: entry.amount,
            payment_url: link.url.clone(),
        })
    }
}
