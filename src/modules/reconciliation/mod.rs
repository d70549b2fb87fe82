pub mod models;
pub mod services;

pub use models::{
    MatchResult, OrderParams, PaymentLine, PaymentViewModel, PlanSlot, ResolvedInstallment,
};
pub use services::{
    find_link_for_entry, match_links, LinkMatch, ReconciliationMatcher, StatusResolver,
};
