use chrono::{Duration, NaiveDate};

use crate::core::dates;

/// Longest time ahead a gateway session may stay open
pub const MAX_VALIDITY_DAYS: i64 = 90;

/// Default deadline for out-of-window dates, one day inside the limit
pub const FALLBACK_DAYS: i64 = MAX_VALIDITY_DAYS - 1;

/// Deadline for a new checkout session.
///
/// A requested date inside `[today, today + 90d]` is kept. Anything else,
/// including blank or unparsable text, moves to the product start date if
/// that lies in `[today, today + 89d)`, or to `today + 89d`.
pub fn resolve_due_date(
    requested: &str,
    product_start: Option<NaiveDate>,
    today: NaiveDate,
) -> NaiveDate {
    let horizon = today + Duration::days(MAX_VALIDITY_DAYS);

    if let Some(date) = dates::parse_date(requested) {
        if date >= today && date <= horizon {
            return date;
        }
    }

    let fallback = today + Duration::days(FALLBACK_DAYS);
    match product_start {
        Some(start) if start >= today && start < fallback => start,
        _ => fallback,
    }
}
