pub mod installment;

pub use installment::{InstallmentEntry, InstallmentPlan};
