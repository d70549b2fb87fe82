// Plan parser tests
//
// Property tests for the plan text format plus the payment reference
// rewrite cases the orchestrator depends on.

use proptest::prelude::*;
use splitpay::core::AppError;
use splitpay::modules::plans::{InstallmentEntry, PlanParser};

fn segment_strategy() -> impl Strategy<Value = (u32, u32, i32, i64, Option<u32>)> {
    (
        1u32..=28,
        1u32..=12,
        2020i32..=2030,
        0i64..=1_000_000,
        proptest::option::of(1000u32..=999_999),
    )
}

fn render(segments: &[(u32, u32, i32, i64, Option<u32>)]) -> String {
    segments
        .iter()
        .map(|(d, m, y, amount, payment_ref)| match payment_ref {
            Some(r) => format!("{:02}.{:02}.{} {} {}", d, m, y, amount, r),
            None => format!("{:02}.{:02}.{} {}", d, m, y, amount),
        })
        .collect::<Vec<_>>()
        .join(",")
}

proptest! {
    #[test]
    fn canonical_plans_format_back_to_themselves(segments in prop::collection::vec(segment_strategy(), 1..8)) {
        let raw = render(&segments);
        let plan = PlanParser::parse(&raw).unwrap();

        prop_assert_eq!(plan.len(), segments.len());
        prop_assert_eq!(PlanParser::format(&plan), raw);
    }

    #[test]
    fn plan_total_must_equal_amount_due(segments in prop::collection::vec(segment_strategy(), 1..8)) {
        let raw = render(&segments);
        let sum: i64 = segments.iter().map(|s| s.3).sum();

        let plan = PlanParser::parse_for_total(&raw, sum).unwrap();
        prop_assert_eq!(plan.total().unwrap(), sum);

        let mismatch = PlanParser::parse_for_total(&raw, sum + 1);
        prop_assert!(matches!(mismatch, Err(AppError::Validation(_))));
    }

    #[test]
    fn normalize_is_idempotent(segments in prop::collection::vec(segment_strategy(), 1..6)) {
        let raw = render(&segments).replace(',', " , ");
        let once = PlanParser::normalize(&raw).unwrap();
        prop_assert_eq!(PlanParser::normalize(&once).unwrap(), once);
    }
}

#[test]
fn test_store_dates_are_displayed() {
    let plan = PlanParser::parse("2024-03-01 500, 2024-04-01 500 8812").unwrap();
    assert_eq!(
        PlanParser::format(&plan),
        "01.03.2024 500,01.04.2024 500 8812"
    );
}

#[test]
fn test_empty_plan_accepts_any_total() {
    let plan = PlanParser::parse_for_total("", 1000).unwrap();
    assert!(plan.is_empty());
}

#[test]
fn test_plan_total_overflow_rejected() {
    let raw = format!("01.03.2024 {},01.04.2024 1", i64::MAX);
    let result = PlanParser::parse_for_total(&raw, 1000);
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[test]
fn test_lenient_parse_survives_bad_segment() {
    let plan = PlanParser::parse_lenient("01.03.2024 abc,01.04.2024 500 5001");
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.entries[0].payment_ref.as_deref(), Some("5001"));

    // The strict parser still refuses the same text
    assert!(PlanParser::parse("01.03.2024 abc,01.04.2024 500 5001").is_err());
}

#[test]
fn test_too_many_tokens_rejected() {
    let result = PlanParser::parse("01.03.2024 500 1 2");
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[test]
fn test_rewrite_fills_empty_slot() {
    let raw = "01.03.2024 500,01.04.2024 500";
    let entry = InstallmentEntry::new("01.03.2024", 500);

    let rewritten = PlanParser::rewrite_payment_ref(raw, &entry, "9001").unwrap();
    assert_eq!(rewritten, "01.03.2024 500 9001,01.04.2024 500");
}

#[test]
fn test_rewrite_replaces_stale_ref() {
    let raw = "01.03.2024 500 4410, 01.04.2024 500";
    let entry = InstallmentEntry::new("01.03.2024", 500).with_ref("4410");

    let rewritten = PlanParser::rewrite_payment_ref(raw, &entry, "4411").unwrap();
    assert_eq!(rewritten, "01.03.2024 500 4411, 01.04.2024 500");
}

#[test]
fn test_rewrite_prefers_slot_with_current_ref() {
    // Two identical installments; only the second carries the stale ref
    let raw = "01.03.2024 500,01.03.2024 500 77";
    let entry = InstallmentEntry::new("01.03.2024", 500).with_ref("77");

    let rewritten = PlanParser::rewrite_payment_ref(raw, &entry, "78").unwrap();
    assert_eq!(rewritten, "01.03.2024 500,01.03.2024 500 78");
}

#[test]
fn test_rewrite_matches_across_date_forms() {
    let raw = "2024-03-01 500";
    let entry = InstallmentEntry::new("01.03.2024", 500);

    let rewritten = PlanParser::rewrite_payment_ref(raw, &entry, "12").unwrap();
    assert_eq!(rewritten, "2024-03-01 500 12");
}

#[test]
fn test_rewrite_without_matching_segment() {
    let entry = InstallmentEntry::new("02.03.2024", 500);
    assert!(PlanParser::rewrite_payment_ref("01.03.2024 500", &entry, "1").is_none());
}
