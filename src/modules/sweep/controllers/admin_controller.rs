use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{error, info};

use crate::core::error::AppError;
use crate::middleware::AdminKeyAuth;
use crate::modules::sweep::services::SweepScheduler;

/// Latest sweep snapshot
/// GET /admin/expires
pub async fn list_expires(
    scheduler: web::Data<Arc<SweepScheduler>>,
) -> Result<HttpResponse, AppError> {
    let snapshot = scheduler.cache().snapshot();
    Ok(HttpResponse::Ok().json(snapshot.as_ref()))
}

/// Start a sweep in the background
/// POST /admin/expires/refresh
pub async fn refresh_expires(
    scheduler: web::Data<Arc<SweepScheduler>>,
) -> Result<HttpResponse, AppError> {
    let Some(guard) = scheduler.try_begin() else {
        return Ok(HttpResponse::Conflict().json(json!({ "state": "already_running" })));
    };

    let scheduler = scheduler.get_ref().clone();
    actix_web::rt::spawn(async move {
        match scheduler.run_guarded(guard).await {
            Ok(count) => info!(overdue = count, "Manual sweep finished"),
            Err(e) => error!(error = %e, "Manual sweep failed"),
        }
    });

    Ok(HttpResponse::Accepted().json(json!({ "state": "started" })))
}

/// Configure admin routes behind the admin key
pub fn configure(cfg: &mut web::ServiceConfig, admin_key: &str) {
    cfg.service(
        web::scope("/admin")
            .wrap(AdminKeyAuth::new(admin_key))
            .route("/expires", web::get().to(list_expires))
            .route("/expires/refresh", web::post().to(refresh_expires)),
    );
}
