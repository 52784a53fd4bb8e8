use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::order::ParseEnumError;

/// Canonical action codes recorded in the order history.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    OrderCreated,
    StatusChanged,
    StageAdvanced,
    QuotationCreated,
    QuotationAcceptedByClient,
    QuotationRejectedByClient,
    PoCreated,
    PoUploadedByClient,
    DepositProofUploaded,
    DepositConfirmed,
    DeliveryNoteCreated,
    FinalPaymentReceived,
    OrderCancelled,
}

impl HistoryAction {
    pub const ALL: [HistoryAction; 13] = [
        HistoryAction::OrderCreated,
        HistoryAction::StatusChanged,
        HistoryAction::StageAdvanced,
        HistoryAction::QuotationCreated,
        HistoryAction::QuotationAcceptedByClient,
        HistoryAction::QuotationRejectedByClient,
        HistoryAction::PoCreated,
        HistoryAction::PoUploadedByClient,
        HistoryAction::DepositProofUploaded,
        HistoryAction::DepositConfirmed,
        HistoryAction::DeliveryNoteCreated,
        HistoryAction::FinalPaymentReceived,
        HistoryAction::OrderCancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HistoryAction::OrderCreated => "order_created",
            HistoryAction::StatusChanged => "status_changed",
            HistoryAction::StageAdvanced => "stage_advanced",
            HistoryAction::QuotationCreated => "quotation_created",
            HistoryAction::QuotationAcceptedByClient => "quotation_accepted_by_client",
            HistoryAction::QuotationRejectedByClient => "quotation_rejected_by_client",
            HistoryAction::PoCreated => "po_created",
            HistoryAction::PoUploadedByClient => "po_uploaded_by_client",
            HistoryAction::DepositProofUploaded => "deposit_proof_uploaded",
            HistoryAction::DepositConfirmed => "deposit_confirmed",
            HistoryAction::DeliveryNoteCreated => "delivery_note_created",
            HistoryAction::FinalPaymentReceived => "final_payment_received",
            HistoryAction::OrderCancelled => "order_cancelled",
        }
    }
}

impl HistoryAction {
    /// Timeline caption of the action.
    pub fn label(self) -> &'static str {
        match self {
            HistoryAction::OrderCreated => "Order submitted",
            HistoryAction::StatusChanged => "Status changed",
            HistoryAction::StageAdvanced => "Stage advanced",
            HistoryAction::QuotationCreated => "Quotation issued",
            HistoryAction::QuotationAcceptedByClient => "Quotation accepted",
            HistoryAction::QuotationRejectedByClient => "Quotation rejected",
            HistoryAction::PoCreated => "Purchase order created",
            HistoryAction::PoUploadedByClient => "Purchase order uploaded",
            HistoryAction::DepositProofUploaded => "Deposit proof uploaded",
            HistoryAction::DepositConfirmed => "Deposit confirmed",
            HistoryAction::DeliveryNoteCreated => "Delivery note issued",
            HistoryAction::FinalPaymentReceived => "Final payment received",
            HistoryAction::OrderCancelled => "Order cancelled",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryAction {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        HistoryAction::ALL
            .into_iter()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| ParseEnumError {
                kind: "history action",
                value: value.to_string(),
            })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Staff,
    Client,
    System,
}

impl ActorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActorKind::Staff => "staff",
            ActorKind::Client => "client",
            ActorKind::System => "system",
        }
    }
}

impl FromStr for ActorKind {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "staff" => Ok(ActorKind::Staff),
            "client" => Ok(ActorKind::Client),
            "system" => Ok(ActorKind::System),
            other => Err(ParseEnumError {
                kind: "actor kind",
                value: other.to_string(),
            }),
        }
    }
}

/// Who performed a transition. Only staff carry a user id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HistoryActor {
    pub kind: ActorKind,
    pub id: Option<i32>,
    pub name: Option<String>,
}

impl HistoryActor {
    pub fn staff(user_id: i32, name: impl Into<String>) -> Self {
        Self {
            kind: ActorKind::Staff,
            id: Some(user_id),
            name: Some(name.into()),
        }
    }

    pub fn client(name: impl Into<String>) -> Self {
        Self {
            kind: ActorKind::Client,
            id: None,
            name: Some(name.into()),
        }
    }

    pub fn system() -> Self {
        Self {
            kind: ActorKind::System,
            id: None,
            name: None,
        }
    }
}

/// Append-only ledger row describing one transition.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HistoryEntry {
    pub id: i32,
    pub order_id: i32,
    pub hub_id: i32,
    pub actor: HistoryActor,
    pub action: HistoryAction,
    /// Snapshot of what changed.
    pub payload: Value,
    pub created_at: NaiveDateTime,
}

impl HistoryEntry {
    /// Reads a string field out of the payload snapshot.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
    pub order_id: i32,
    pub hub_id: i32,
    pub actor: HistoryActor,
    pub action: HistoryAction,
    pub payload: Value,
}
