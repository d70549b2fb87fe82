// Admin API tests

#[path = "../helpers/mod.rs"]
mod helpers;

use std::time::Duration;

use actix_web::{http::StatusCode, test, web, App};
use helpers::{Harness, TestDataFactory};
use serde_json::Value;
use splitpay::middleware::ADMIN_KEY_HEADER;
use splitpay::modules::gateways::PaymentStatus;
use splitpay::modules::sweep;
use tempfile::TempDir;

const ADMIN_KEY: &str = "s3cret-admin";

fn seeded() -> Harness {
    let h = Harness::new(TestDataFactory::day(2024, 4, 10));
    h.add_program(None);
    h.add_deal("2", "D-2", "700", "2024-03-01", "");
    h.add_link("21", "D-2", "2024-03-01", 700, Some("https://pay.test/a/t6000"), Some("6000"));
    h.gateway.set_status("6000", PaymentStatus::New);
    h
}

/// Status of a call whether the service answered or failed in middleware
macro_rules! status_of {
    ($app:expr, $req:expr) => {
        match test::try_call_service($app, $req).await {
            Ok(resp) => resp.status(),
            Err(err) => err.as_response_error().status_code(),
        }
    };
}

#[actix_web::test]
async fn test_admin_routes_require_key() {
    let dir = TempDir::new().unwrap();
    let h = seeded();
    let scheduler = h.scheduler(&dir.path().join("expires.json"));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(scheduler))
            .configure(|cfg| sweep::controllers::configure(cfg, ADMIN_KEY)),
    )
    .await;

    let req = test::TestRequest::get().uri("/admin/expires").to_request();
    assert_eq!(status_of!(&app, req), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/admin/expires/refresh")
        .insert_header((ADMIN_KEY_HEADER, "wrong"))
        .to_request();
    assert_eq!(status_of!(&app, req), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_list_returns_latest_snapshot() {
    let dir = TempDir::new().unwrap();
    let h = seeded();
    let scheduler = h.scheduler(&dir.path().join("expires.json"));
    scheduler.trigger().await.unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(scheduler))
            .configure(|cfg| sweep::controllers::configure(cfg, ADMIN_KEY)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/admin/expires")
        .insert_header((ADMIN_KEY_HEADER, ADMIN_KEY))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["version"], 1);
    assert_eq!(body["orders"][0]["order_key"], "D-2");
    assert_eq!(body["orders"][0]["amount"], 700);
    assert_eq!(body["orders"][0]["payment_url"], "https://pay.test/a/t6000");
}

#[actix_web::test]
async fn test_refresh_runs_sweep_in_background() {
    let dir = TempDir::new().unwrap();
    let h = seeded();
    let scheduler = h.scheduler(&dir.path().join("expires.json"));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(scheduler.clone()))
            .configure(|cfg| sweep::controllers::configure(cfg, ADMIN_KEY)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/admin/expires/refresh")
        .insert_header((ADMIN_KEY_HEADER, ADMIN_KEY))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["state"], "started");

    for _ in 0..100 {
        if scheduler.cache().snapshot().version > 0 && !scheduler.is_running() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(scheduler.cache().snapshot().orders.len(), 1);
    assert!(!scheduler.is_running());
}

#[actix_web::test]
async fn test_refresh_refused_while_running() {
    let dir = TempDir::new().unwrap();
    let h = seeded();
    let scheduler = h.scheduler(&dir.path().join("expires.json"));
    let _guard = scheduler.try_begin().unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(scheduler.clone()))
            .configure(|cfg| sweep::controllers::configure(cfg, ADMIN_KEY)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/admin/expires/refresh")
        .insert_header((ADMIN_KEY_HEADER, ADMIN_KEY))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["state"], "already_running");
    assert_eq!(scheduler.cache().snapshot().version, 0);
}
