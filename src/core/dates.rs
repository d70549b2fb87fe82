use chrono::{NaiveDate, NaiveDateTime};

/// Canonical display form used inside installment plans and views (dd.MM.yyyy)
pub const DISPLAY_FORMAT: &str = "%d.%m.%Y";

/// Form the record store keeps link dates in (yyyy-MM-dd)
pub const STORE_FORMAT: &str = "%Y-%m-%d";

/// The gateway evaluates deadlines in Moscow time (UTC+3)
const GATEWAY_OFFSET_SUFFIX: &str = "+03:00";

const DATE_TIME_PATTERNS: [&str; 3] = ["%Y.%m.%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_PATTERNS: [&str; 2] = ["%d.%m.%Y", "%Y-%m-%d"];

/// Parse a date string in any of the formats the store and operators produce.
///
/// Returns `None` for empty or unrecognised input; callers decide whether
/// to pass the raw text through or treat it as missing.
pub fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.contains('T') || text.contains(':') {
        // Drop fractional seconds and offsets, the store only cares about the wall clock
        let head: String = text.chars().take(19).collect();
        return DATE_TIME_PATTERNS
            .iter()
            .find_map(|pattern| NaiveDateTime::parse_from_str(&head, pattern).ok());
    }

    DATE_PATTERNS
        .iter()
        .find_map(|pattern| NaiveDate::parse_from_str(text, pattern).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    parse_date_time(text).map(|dt| dt.date())
}

pub fn format_display(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

pub fn format_store(date: NaiveDate) -> String {
    date.format(STORE_FORMAT).to_string()
}

/// Best-effort conversion to dd.MM.yyyy; unparsable text is returned unchanged
pub fn to_display(text: &str) -> String {
    parse_date(text)
        .map(format_display)
        .unwrap_or_else(|| text.trim().to_string())
}

/// Best-effort conversion to yyyy-MM-dd; unparsable text is returned unchanged
pub fn to_store(text: &str) -> String {
    parse_date(text)
        .map(format_store)
        .unwrap_or_else(|| text.trim().to_string())
}

/// Link sessions expire shortly before midnight of the due day
pub fn to_expiration(text: &str) -> String {
    parse_date(text)
        .map(|date| format!("{}T23:55:00", format_store(date)))
        .unwrap_or_else(|| text.trim().to_string())
}

/// Format a deadline the way the gateway expects it: local wall clock with an explicit offset
pub fn to_gateway_deadline(text: &str) -> String {
    match parse_date_time(text) {
        Some(dt) => format!("{}{}", dt.format("%Y-%m-%dT%H:%M:%S"), GATEWAY_OFFSET_SUFFIX),
        None => format!("{}{}", text.trim(), GATEWAY_OFFSET_SUFFIX),
    }
}

/// Compare two date strings by calendar day, falling back to text equality
/// when either side is not a recognisable date.
pub fn same_day(left: &str, right: &str) -> bool {
    match (parse_date(left), parse_date(right)) {
        (Some(l), Some(r)) => l == r,
        _ => left.trim() == right.trim(),
    }
}
