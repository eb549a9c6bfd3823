//! Payment status as read from the external POS.
//!
//! The engine never computes or captures payment; it only gates on this
//! two-valued status attached to the lane session.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Due,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Due => "DUE",
            PaymentStatus::Paid => "PAID",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DUE" => Ok(PaymentStatus::Due),
            "PAID" => Ok(PaymentStatus::Paid),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
