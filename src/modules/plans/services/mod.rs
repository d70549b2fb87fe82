pub mod plan_parser;

pub use plan_parser::PlanParser;
