use std::sync::Arc;

use actix_web::{web, Either, HttpResponse};

use crate::core::error::AppError;
use crate::modules::cabinet::models::OrderQuery;
use crate::modules::cabinet::services::CabinetService;

/// Payment overview of a deal
/// GET /cabinet?order_number=...
pub async fn payment_overview(
    service: web::Data<Arc<CabinetService>>,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse, AppError> {
    let overview = service.payment_overview(&query.order_number).await?;
    Ok(HttpResponse::Ok().json(overview))
}

/// Checkout link for the next unpaid installment
/// POST /cabinet/pay (JSON or form body with `order_number`)
pub async fn pay(
    service: web::Data<Arc<CabinetService>>,
    body: Either<web::Json<OrderQuery>, web::Form<OrderQuery>>,
) -> Result<HttpResponse, AppError> {
    let request = match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    };

    let resolution = service.pay(&request.order_number).await?;
    Ok(HttpResponse::Ok().json(resolution))
}

/// Configure cabinet routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cabinet")
            .route("", web::get().to(payment_overview))
            .route("/pay", web::post().to(pay)),
    );
}
