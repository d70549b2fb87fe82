use serde::{Deserialize, Serialize};

use crate::core::{dates, AppError, Result};

/// One scheduled partial payment of a deal's plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentEntry {
    /// Due date in display form (dd.MM.yyyy), or the raw token when it is not a date
    pub due_date: String,
    pub amount: i64,
    /// Gateway reference written back once a link exists
    pub payment_ref: Option<String>,
}

impl InstallmentEntry {
    pub fn new(due_date: impl Into<String>, amount: i64) -> Self {
        Self {
            due_date: due_date.into(),
            amount,
            payment_ref: None,
        }
    }

    pub fn with_ref(mut self, payment_ref: impl Into<String>) -> Self {
        self.payment_ref = Some(payment_ref.into());
        self
    }

    /// Same calendar day and same amount
    pub fn matches(&self, due_date: &str, amount: i64) -> bool {
        self.amount == amount && dates::same_day(&self.due_date, due_date)
    }

    /// Serialized `<date> <amount>[ <ref>]` segment
    pub fn to_segment(&self) -> String {
        match &self.payment_ref {
            Some(payment_ref) => format!("{} {} {}", self.due_date, self.amount, payment_ref),
            None => format!("{} {}", self.due_date, self.amount),
        }
    }
}

/// Ordered installment entries of one deal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    pub entries: Vec<InstallmentEntry>,
}

impl InstallmentPlan {
    pub fn new(entries: Vec<InstallmentEntry>) -> Self {
        Self { entries }
    }

    /// Sum of all amounts; overflowing the amount range is a data error
    pub fn total(&self) -> Result<i64> {
        self.entries
            .iter()
            .try_fold(0i64, |acc, e| acc.checked_add(e.amount))
            .ok_or_else(|| AppError::validation("Installment amounts are out of range"))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InstallmentEntry> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<InstallmentEntry> {
        self.entries
    }
}

impl IntoIterator for InstallmentPlan {
    type Item = InstallmentEntry;
    type IntoIter = std::vec::IntoIter<InstallmentEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
