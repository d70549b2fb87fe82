pub mod order_params;

pub use order_params::{
    MatchResult, OrderParams, PaymentLine, PaymentViewModel, PlanSlot, ResolvedInstallment,
};
