use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Client or staff confirmation to proceed with an order.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PurchaseOrder {
    pub id: i32,
    pub order_id: i32,
    pub hub_id: i32,
    pub po_number: String,
    pub files: Vec<String>,
    pub deposit_required: bool,
    pub deposit_percent: Option<i32>,
    pub deposit_cents: Option<i64>,
    /// Bank slips or cheque images proving the deposit.
    pub deposit_proof_files: Vec<String>,
    pub submitted_by_client: bool,
    pub created_by: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Deposit requirement attached to a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DepositTerms {
    pub required: bool,
    pub percent: Option<i32>,
}

impl DepositTerms {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn percent(percent: i32) -> Self {
        Self {
            required: true,
            percent: Some(percent),
        }
    }
}

/// Payload required to record a purchase order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPurchaseOrder {
    pub po_number: String,
    pub files: Vec<String>,
    pub deposit: DepositTerms,
    pub submitted_by_client: bool,
}

impl NewPurchaseOrder {
    pub fn new(po_number: impl Into<String>, files: Vec<String>) -> Self {
        Self {
            po_number: po_number.into(),
            files,
            deposit: DepositTerms::none(),
            submitted_by_client: false,
        }
    }

    pub fn with_deposit(mut self, deposit: DepositTerms) -> Self {
        self.deposit = deposit;
        self
    }

    pub fn from_client(mut self) -> Self {
        self.submitted_by_client = true;
        self
    }
}
