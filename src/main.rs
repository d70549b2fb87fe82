use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use splitpay::config::{AppConfig, Config};
use splitpay::core::{Clock, SystemClock};
use splitpay::modules::cabinet::{self, CabinetService};
use splitpay::modules::deals::DealRepository;
use splitpay::modules::gateways::{LinkGenerator, TerminalGatewayClient};
use splitpay::modules::health;
use splitpay::modules::links::{LinkRepository, LinkStore};
use splitpay::modules::orchestration::{LinkOrchestrator, OrchestratorSettings};
use splitpay::modules::store::RecordStore;
use splitpay::modules::sweep::{self, DashboardLink, ExpiryCache, SweepScheduler, SweepSettings};

fn init_tracing(app: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| app.log_filter().into());

    if app.log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.app);
    config.validate().context("Configuration validation failed")?;

    tracing::info!("Starting installment billing service");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());
    if config.app.test_payment_ref.is_some() {
        tracing::warn!("Test payment reference is enabled");
    }

    // Record store clients
    let main_store: Arc<dyn RecordStore> = Arc::new(config.store.main_client()?);
    let data_store: Arc<dyn RecordStore> = Arc::new(config.store.data_client()?);

    let deals = Arc::new(DealRepository::new(
        main_store,
        config.store.schema.clone(),
    ));
    let links: Arc<dyn LinkStore> = Arc::new(LinkRepository::new(
        data_store,
        config.store.schema.links_table.clone(),
    ));
    let gateway: Arc<dyn LinkGenerator> = Arc::new(TerminalGatewayClient::new(&config.gateway));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let orchestrator = Arc::new(LinkOrchestrator::new(
        deals.clone(),
        links.clone(),
        gateway.clone(),
        clock.clone(),
        OrchestratorSettings {
            credentials: config.gateway.credentials(),
            retry: config.gateway.retry_policy(),
            test_payment_ref: config.app.test_payment_ref.clone(),
        },
    ));
    let cabinet_service = Arc::new(CabinetService::new(
        orchestrator,
        config.gateway.status_concurrency,
    ));

    // Sweep snapshot survives restarts
    let cache = Arc::new(ExpiryCache::load(&config.sweep.cache_path).await);
    let dashboard = config.store.dashboard_origin().map(|origin| DashboardLink {
        origin,
        main_db: config.store.main_db.clone(),
    });
    let scheduler = Arc::new(SweepScheduler::new(
        deals,
        links,
        gateway,
        clock,
        cache,
        config.gateway.credentials(),
        SweepSettings {
            run_hour: config.sweep.run_hour,
            deal_concurrency: config.sweep.deal_concurrency,
            installment_concurrency: config.sweep.installment_concurrency,
            cache_path: config.sweep.cache_path.clone(),
            dashboard,
            test_payment_ref: config.app.test_payment_ref.clone(),
        },
    ));

    actix_web::rt::spawn(scheduler.clone().start());

    // Start HTTP server
    let bind_address = config.server.bind_address();
    let admin_key = config.security.admin_api_key.clone();
    let server = HttpServer::new(move || {
        let admin_key = admin_key.clone();
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(cabinet_service.clone()))
            .app_data(web::Data::new(scheduler.clone()))
            .configure(health::controllers::configure)
            .configure(cabinet::controllers::configure)
            .configure(move |cfg| sweep::controllers::configure(cfg, &admin_key))
    })
    .workers(config.server.workers)
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await?;
    Ok(())
}
