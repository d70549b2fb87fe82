use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Product a deal sells; names the gateway line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: String,
    pub name: String,
    pub item_code: String,
    /// Start of the program, preferred as a link deadline when it is close enough
    pub start_date: Option<NaiveDate>,
}
