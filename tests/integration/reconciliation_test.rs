// Reconciliation integration tests
//
// Matches deal plans against stored link records and resolves statuses
// through the orchestrator against the scripted gateway.

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::{Harness, TestDataFactory};
use splitpay::core::AppError;
use splitpay::modules::deals::Deal;
use splitpay::modules::gateways::PaymentStatus;
use splitpay::modules::links::models::link_record::PAYMENT_REF_FIELD;
use splitpay::modules::plans::PlanParser;
use splitpay::modules::reconciliation::{match_links, ReconciliationMatcher};

const TWO_PART_PLAN: &str = "01.03.2024 500 5001,01.04.2024 500";

async fn setup(test_ref: Option<&str>, plan: &str) -> (Harness, Deal) {
    let h = Harness::with_test_ref(TestDataFactory::day(2024, 2, 1), test_ref);
    h.add_program(None);
    h.add_deal("1", "D-1", "1000", "2024-04-01", plan);
    let deal = h.deals.find_by_number("D-1").await.unwrap();
    (h, deal)
}

fn matcher(h: &Harness) -> ReconciliationMatcher {
    ReconciliationMatcher::new(h.orchestrator.clone(), 2, h.test_payment_ref.clone())
}

#[tokio::test]
async fn test_link_matched_to_its_installment() {
    let (h, deal) = setup(None, TWO_PART_PLAN).await;
    h.add_link("10", "D-1", "2024-03-01", 500, Some("https://pay.test/a/tok1"), Some("5001"));
    h.gateway.set_status("5001", PaymentStatus::Done);

    let plan = PlanParser::parse_for_total(&deal.installment_plan, 1000).unwrap();
    let links = h.links.list_by_order("D-1").await;
    let result = matcher(&h).reconcile(&deal, &plan, &links).await.unwrap();

    assert_eq!(result.matched.len(), 1);
    assert_eq!(result.matched[0].position, 0);
    assert_eq!(result.matched[0].status, Some(PaymentStatus::Done));
    assert_eq!(result.matched[0].params.link_id.as_deref(), Some("10"));
    assert_eq!(result.residual.len(), 1);
    assert_eq!(result.residual[0].position, 1);
    assert!(!result.all_paid());

    let installments = result.into_installments(&deal);
    assert_eq!(installments.len(), 2);
    assert!(installments[0].is_paid());
    assert_eq!(installments[1].params.due_date, "01.04.2024");
    assert_eq!(installments[1].status, None);
}

#[tokio::test]
async fn test_all_installments_paid() {
    let (h, deal) = setup(None, "01.03.2024 500 5001,01.04.2024 500 5002").await;
    h.add_link("10", "D-1", "2024-03-01", 500, Some("https://pay.test/a/tok1"), Some("5001"));
    h.add_link("11", "D-1", "2024-04-01", 500, Some("https://pay.test/a/tok2"), Some("5002"));
    h.gateway.set_status("5001", PaymentStatus::Done);
    h.gateway.set_status("5002", PaymentStatus::Done);

    let plan = PlanParser::parse(&deal.installment_plan).unwrap();
    let links = h.links.list_by_order("D-1").await;
    let result = matcher(&h).reconcile(&deal, &plan, &links).await.unwrap();

    assert!(result.all_paid());
    assert_eq!(h.gateway.status_calls(), 2);
}

#[tokio::test]
async fn test_link_matching_two_entries_is_inconsistent() {
    let (h, deal) = setup(None, "01.03.2024 500,01.03.2024 500").await;
    h.add_link("10", "D-1", "2024-03-01", 500, Some("https://pay.test/a/tok1"), None);

    let plan = PlanParser::parse(&deal.installment_plan).unwrap();
    let links = h.links.list_by_order("D-1").await;
    let result = match_links(&deal, &plan, &links, None);

    assert!(matches!(result, Err(AppError::Consistency(_))));
}

#[tokio::test]
async fn test_link_matching_no_entry_is_inconsistent() {
    let (h, deal) = setup(None, TWO_PART_PLAN).await;
    h.add_link("10", "D-1", "2024-03-01", 500, Some("https://pay.test/a/tok1"), Some("5001"));
    // Same installment issued twice
    h.add_link("11", "D-1", "2024-03-01", 500, Some("https://pay.test/a/tok9"), Some("5009"));

    let plan = PlanParser::parse(&deal.installment_plan).unwrap();
    let links = h.links.list_by_order("D-1").await;
    let result = matcher(&h).reconcile(&deal, &plan, &links).await;

    match result {
        Err(AppError::Consistency(message)) => {
            assert!(message.contains("Installment count does not match link count"))
        }
        other => panic!("expected consistency error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unusable_links_are_ignored() {
    let (h, deal) = setup(None, TWO_PART_PLAN).await;
    // No URL yet: phase one of a link write never completed
    h.add_link("10", "D-1", "2024-03-01", 500, None, None);

    let plan = PlanParser::parse(&deal.installment_plan).unwrap();
    let links = h.links.list_by_order("D-1").await;
    let (matched, residual) = match_links(&deal, &plan, &links, None).unwrap();

    assert!(matched.is_empty());
    assert_eq!(residual.len(), 2);
}

#[tokio::test]
async fn test_negative_installment_rejected() {
    let (h, deal) = setup(None, "01.03.2024 -500,01.04.2024 1500").await;

    let plan = PlanParser::parse(&deal.installment_plan).unwrap();
    let links = h.links.list_by_order("D-1").await;
    let result = match_links(&deal, &plan, &links, None);

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_test_ref_counts_as_paid_without_gateway() {
    let (h, deal) = setup(Some("TESTPAY"), TWO_PART_PLAN).await;
    h.add_link("10", "D-1", "2024-03-01", 500, Some("https://pay.test/a/tok1"), Some("TESTPAY"));

    let plan = PlanParser::parse(&deal.installment_plan).unwrap();
    let links = h.links.list_by_order("D-1").await;
    let result = matcher(&h).reconcile(&deal, &plan, &links).await.unwrap();

    assert_eq!(result.matched.len(), 1);
    assert_eq!(result.matched[0].status, Some(PaymentStatus::Done));
    assert_eq!(h.gateway.status_calls(), 0);
}

#[tokio::test]
async fn test_missing_ref_recovered_from_session() {
    let (h, deal) = setup(None, "01.03.2024 500,01.04.2024 500").await;
    h.add_link("10", "D-1", "2024-03-01", 500, Some("https://pay.test/a/tokXY"), None);
    h.gateway.set_session("tokXY", "6001");
    h.gateway.set_status("6001", PaymentStatus::InProcess);

    let plan = PlanParser::parse(&deal.installment_plan).unwrap();
    let links = h.links.list_by_order("D-1").await;
    let result = matcher(&h).reconcile(&deal, &plan, &links).await.unwrap();

    assert_eq!(result.matched[0].params.payment_ref.as_deref(), Some("6001"));
    let stored = h.data.record(&h.schema.links_table, "10").unwrap();
    assert_eq!(stored.fields.get_string(PAYMENT_REF_FIELD), "6001");
}

#[tokio::test]
async fn test_unrecoverable_ref_reports_unknown() {
    let (h, deal) = setup(None, "01.03.2024 500,01.04.2024 500").await;
    h.add_link("10", "D-1", "2024-03-01", 500, Some("https://pay.test/a/tokZZ"), None);

    let plan = PlanParser::parse(&deal.installment_plan).unwrap();
    let links = h.links.list_by_order("D-1").await;
    let result = matcher(&h).reconcile(&deal, &plan, &links).await.unwrap();

    assert_eq!(result.matched[0].status, Some(PaymentStatus::Unknown));
    assert_eq!(h.gateway.status_calls(), 0);
}
