use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::order::ParseEnumError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Deposit,
    Final,
}

impl PaymentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentKind::Deposit => "deposit",
            PaymentKind::Final => "final",
        }
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentKind {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "deposit" => Ok(PaymentKind::Deposit),
            "final" => Ok(PaymentKind::Final),
            other => Err(ParseEnumError {
                kind: "payment kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Money received against an order.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Payment {
    pub id: i32,
    pub order_id: i32,
    pub hub_id: i32,
    pub kind: PaymentKind,
    pub amount_cents: i64,
    pub currency: String,
    pub reference: Option<String>,
    pub recorded_by: Option<i32>,
    pub created_at: NaiveDateTime,
}

/// Payment details captured by staff. A missing amount falls back to what
/// the order says is owed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewPayment {
    pub amount_cents: Option<i64>,
    pub reference: Option<String>,
}

impl NewPayment {
    pub fn new(amount_cents: Option<i64>) -> Self {
        Self {
            amount_cents,
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}
