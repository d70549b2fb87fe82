use tracing::warn;

use crate::core::{dates, AppError, Result};
use crate::modules::plans::models::{InstallmentEntry, InstallmentPlan};

const ENTRY_SEPARATOR: char = ',';

/// Parser and writer for the installment plan mini-language.
///
/// A plan is a comma-separated list of `<date> <amount>[ <paymentRef>]`
/// entries. Dates are normalized to dd.MM.yyyy where they parse and kept
/// verbatim where they do not.
pub struct PlanParser;

impl PlanParser {
    /// Parse a raw plan; blank input is a single-payment deal (empty plan)
    pub fn parse(raw: &str) -> Result<InstallmentPlan> {
        let mut entries = Vec::new();

        for segment in raw.split(ENTRY_SEPARATOR) {
            if segment.trim().is_empty() {
                continue;
            }
            entries.push(Self::parse_segment(segment)?);
        }

        Ok(InstallmentPlan::new(entries))
    }

    /// Parse what can be parsed; malformed segments are logged and dropped
    pub fn parse_lenient(raw: &str) -> InstallmentPlan {
        let entries = raw
            .split(ENTRY_SEPARATOR)
            .filter(|segment| !segment.trim().is_empty())
            .filter_map(|segment| match Self::parse_segment(segment) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(segment = %segment.trim(), error = %e, "Skipping malformed installment");
                    None
                }
            })
            .collect();

        InstallmentPlan::new(entries)
    }

    /// Parse and enforce that the entries add up to the deal total
    pub fn parse_for_total(raw: &str, total_price: i64) -> Result<InstallmentPlan> {
        let plan = Self::parse(raw)?;

        if plan.is_empty() {
            return Ok(plan);
        }

        let sum = plan.total()?;
        if sum != total_price {
            return Err(AppError::validation(format!(
                "Installment plan sums to {} but the amount due is {}",
                sum, total_price
            )));
        }

        Ok(plan)
    }

    /// Canonical text of a plan
    pub fn format(plan: &InstallmentPlan) -> String {
        plan.iter()
            .map(InstallmentEntry::to_segment)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn normalize(raw: &str) -> Result<String> {
        Ok(Self::format(&Self::parse(raw)?))
    }

    /// Write `new_ref` into the segment that carries `entry`.
    ///
    /// The segment is found by calendar day and amount; when several match,
    /// the one holding the entry's current reference wins, then the first
    /// one without a reference. Every other segment is kept byte for byte.
    /// Returns `None` when no segment matches.
    pub fn rewrite_payment_ref(
        raw: &str,
        entry: &InstallmentEntry,
        new_ref: &str,
    ) -> Option<String> {
        let segments: Vec<&str> = raw.split(ENTRY_SEPARATOR).collect();
        let parsed: Vec<Option<InstallmentEntry>> = segments
            .iter()
            .map(|segment| Self::parse_segment(segment).ok())
            .collect();

        let candidates: Vec<usize> = parsed
            .iter()
            .enumerate()
            .filter_map(|(i, p)| match p {
                Some(p) if p.matches(&entry.due_date, entry.amount) => Some(i),
                _ => None,
            })
            .collect();

        let by_ref = entry.payment_ref.as_deref().and_then(|current| {
            candidates.iter().copied().find(|&i| {
                parsed[i].as_ref().and_then(|p| p.payment_ref.as_deref()) == Some(current)
            })
        });
        let without_ref = candidates.iter().copied().find(|&i| {
            parsed[i]
                .as_ref()
                .map(|p| p.payment_ref.is_none())
                .unwrap_or(false)
        });

        let Some(target) = by_ref.or(without_ref).or(candidates.first().copied()) else {
            warn!(due_date = %entry.due_date, amount = entry.amount, "No plan segment matches installment");
            return None;
        };

        let rewritten: Vec<String> = segments
            .iter()
            .enumerate()
            .map(|(i, segment)| {
                if i == target {
                    Self::replace_ref(segment, new_ref)
                } else {
                    (*segment).to_string()
                }
            })
            .collect();

        Some(rewritten.join(","))
    }

    fn parse_segment(segment: &str) -> Result<InstallmentEntry> {
        let tokens: Vec<&str> = segment.split_whitespace().collect();

        if tokens.len() < 2 || tokens.len() > 3 {
            return Err(AppError::validation(format!(
                "Installment '{}' must be '<date> <amount>[ <payment id>]'",
                segment.trim()
            )));
        }

        let amount: i64 = tokens[1].parse().map_err(|_| {
            AppError::validation(format!(
                "Installment amount '{}' is not a whole number",
                tokens[1]
            ))
        })?;

        Ok(InstallmentEntry {
            due_date: dates::to_display(tokens[0]),
            amount,
            payment_ref: tokens.get(2).map(|r| r.to_string()),
        })
    }

    /// Keep the segment's surrounding whitespace and its date/amount text,
    /// swap or append the third token
    fn replace_ref(segment: &str, new_ref: &str) -> String {
        let body = segment.trim();
        let leading = &segment[..segment.len() - segment.trim_start().len()];
        let trailing = &segment[segment.trim_end().len()..];

        let head = &body[..Self::head_end(body)];
        format!("{}{} {}{}", leading, head, new_ref, trailing)
    }

    /// Byte offset just past the second token
    fn head_end(body: &str) -> usize {
        let mut tokens_seen = 0;
        let mut in_token = false;

        for (i, c) in body.char_indices() {
            if c.is_whitespace() {
                if in_token {
                    tokens_seen += 1;
                    if tokens_seen == 2 {
                        return i;
                    }
                }
                in_token = false;
            } else {
                in_token = true;
            }
        }
        body.len()
    }
}
