use serde::{Deserialize, Serialize};

/// Payment state of a gateway checkout session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    New,
    InProcess,
    Done,
    Canceled,
    AuthFail,
    Unknown,
    TimeLong,
}

impl PaymentStatus {
    /// Map the gateway's status code
    pub fn from_gateway_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "NEW" => Self::New,
            "FORM_SHOWED" => Self::InProcess,
            "CONFIRMED" => Self::Done,
            "CANCELED" | "REJECTED" => Self::Canceled,
            "AUTH_FAIL" => Self::AuthFail,
            "DEADLINE_EXPIRED" => Self::TimeLong,
            _ => Self::Unknown,
        }
    }

    /// Installment fully paid; never regenerate its link
    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// The existing link is stale and a new one has to be generated
    pub fn needs_new_link(&self) -> bool {
        matches!(
            self,
            Self::Canceled | Self::AuthFail | Self::Unknown | Self::TimeLong
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProcess => "in_process",
            Self::Done => "done",
            Self::Canceled => "canceled",
            Self::AuthFail => "auth_fail",
            Self::Unknown => "unknown",
            Self::TimeLong => "time_long",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
