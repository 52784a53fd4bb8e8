use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Priced proposal sent to the client for an order.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Quotation {
    pub id: i32,
    pub order_id: i32,
    pub hub_id: i32,
    pub total_cents: i64,
    pub currency: String,
    pub deposit_required: bool,
    pub deposit_percent: Option<i32>,
    /// Reference to the quotation document in the file store.
    pub file_url: Option<String>,
    pub notes: Option<String>,
    /// Client response: `None` while pending, then set exactly once.
    pub accepted: Option<bool>,
    pub rejection_reason: Option<String>,
    pub client_comment: Option<String>,
    pub responded_at: Option<NaiveDateTime>,
    /// Staff user that issued the quotation.
    pub created_by: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Quotation {
    pub fn is_answered(&self) -> bool {
        self.accepted.is_some()
    }
}

/// Payload required to issue a quotation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuotation {
    pub total_cents: i64,
    pub currency: String,
    pub deposit_required: bool,
    pub deposit_percent: Option<i32>,
    pub file_url: Option<String>,
    pub notes: Option<String>,
}

impl NewQuotation {
    pub fn new(total_cents: i64, currency: impl Into<String>) -> Self {
        Self {
            total_cents,
            currency: currency.into(),
            deposit_required: false,
            deposit_percent: None,
            file_url: None,
            notes: None,
        }
    }

    /// Require a deposit of `percent` of the total.
    pub fn with_deposit(mut self, percent: i32) -> Self {
        self.deposit_required = true;
        self.deposit_percent = Some(percent);
        self
    }

    pub fn with_file_url(mut self, file_url: impl Into<String>) -> Self {
        self.file_url = Some(file_url.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// The client's one-time answer to a quotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotationResponse {
    pub accepted: bool,
    pub rejection_reason: Option<String>,
    pub client_comment: Option<String>,
}

impl QuotationResponse {
    pub fn accept() -> Self {
        Self {
            accepted: true,
            rejection_reason: None,
            client_comment: None,
        }
    }

    pub fn reject(reason: Option<String>) -> Self {
        Self {
            accepted: false,
            rejection_reason: reason,
            client_comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.client_comment = Some(comment.into());
        self
    }
}
