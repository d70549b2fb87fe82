// Order id collision handling
//
// Drives link creation through the cabinet against a gateway that rejects
// candidate order ids before accepting one.

#[path = "../helpers/mod.rs"]
mod helpers;

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use helpers::{CreateScript, Harness, TestDataFactory};
use splitpay::core::AppError;
use splitpay::modules::gateways::{RetryOutcome, RetryPolicy};
use splitpay::modules::orchestration::LinkResolution;

fn harness() -> Harness {
    let h = Harness::new(TestDataFactory::day(2024, 2, 1));
    h.add_program(None);
    h.add_deal("1", "D-7", "1000", "2024-03-01", "");
    h
}

fn is_hex_token(text: &str) -> bool {
    text.len() == 4 && text.chars().all(|c| c.is_ascii_hexdigit())
}

#[tokio::test]
async fn test_conflicting_order_ids_are_versioned() {
    let h = harness();
    h.gateway
        .script([CreateScript::Conflict, CreateScript::Conflict, CreateScript::Accept]);

    let resolution = h.cabinet.pay("D-7").await.unwrap();
    assert_eq!(
        resolution,
        LinkResolution::Redirect("https://pay.test/new/tok5000".to_string())
    );

    let requests = h.gateway.requests();
    assert_eq!(requests.len(), 3);

    let first: Vec<&str> = requests[0].order_id.split(' ').collect();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0], "D-7");
    assert!(is_hex_token(first[1]));

    assert!(requests[1].order_id.starts_with("D-7 v2 "));

    let third: Vec<&str> = requests[2].order_id.split(' ').collect();
    assert_eq!(third[..2], ["D-7", "v3"]);
    assert!(is_hex_token(third[2]));

    // Only the accepted link is stored
    let links = h.link_records("D-7");
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].payment_ref.as_deref(), Some("5000"));
}

#[tokio::test]
async fn test_exhausted_retries_store_nothing() {
    let h = harness();
    h.gateway.script(std::iter::repeat(CreateScript::Conflict).take(10));

    let result = h.cabinet.pay("D-7").await;

    assert!(matches!(result, Err(AppError::Gateway(_))));
    assert_eq!(h.gateway.requests().len(), 10);
    assert!(h.link_records("D-7").is_empty());
}

#[tokio::test]
async fn test_other_gateway_errors_are_not_retried() {
    let h = harness();
    h.gateway
        .script([CreateScript::Fail("Terminal blocked".to_string())]);

    let result = h.cabinet.pay("D-7").await;

    match result {
        Err(AppError::Gateway(message)) => assert_eq!(message, "Terminal blocked"),
        other => panic!("expected gateway error, got {:?}", other),
    }
    assert_eq!(h.gateway.requests().len(), 1);
}

#[tokio::test]
async fn test_policy_reports_attempts() {
    let policy = RetryPolicy::new(5, Duration::from_millis(1));
    let calls = AtomicU32::new(0);

    let outcome = policy
        .run("D-9", |order_id| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 4 {
                    Err(AppError::OrderConflict(order_id))
                } else {
                    Ok(order_id.len())
                }
            }
        })
        .await
        .unwrap();

    match outcome {
        RetryOutcome::Succeeded {
            attempts, order_id, ..
        } => {
            assert_eq!(attempts, 4);
            assert!(order_id.starts_with("D-9 v4 "));
        }
        RetryOutcome::Exhausted { .. } => panic!("policy should have succeeded"),
    }
}
