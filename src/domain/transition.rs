//! Commands accepted by the workflow store and what it hands back.

use serde::Serialize;

use crate::domain::delivery_note::{DeliveryNote, NewDeliveryNote};
use crate::domain::history::{HistoryActor, HistoryEntry};
use crate::domain::order::{Order, OrderStage, OrderStatus};
use crate::domain::payment::{NewPayment, Payment};
use crate::domain::purchase_order::{NewPurchaseOrder, PurchaseOrder};
use crate::domain::quotation::{NewQuotation, Quotation, QuotationResponse};
use crate::domain::workflow::{Operation, Plan};

/// Change requested against a single order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionCommand {
    SetStatus(OrderStatus),
    CreateQuotation(NewQuotation),
    RespondToQuotation {
        quotation_id: i32,
        response: QuotationResponse,
    },
    CreatePurchaseOrder(NewPurchaseOrder),
    SubmitDepositProof {
        purchase_order_id: i32,
        files: Vec<String>,
    },
    ConfirmDeposit(NewPayment),
    AdvanceStage(OrderStage),
    CreateDeliveryNote {
        note: NewDeliveryNote,
        advance_to: Option<OrderStage>,
    },
    RecordFinalPayment(NewPayment),
    Cancel,
}

impl TransitionCommand {
    /// Workflow operation checked against the transition table.
    pub fn operation(&self) -> Operation {
        match self {
            TransitionCommand::SetStatus(status) => Operation::SetStatus(*status),
            TransitionCommand::CreateQuotation(_) => Operation::CreateQuotation,
            TransitionCommand::RespondToQuotation { response, .. } if response.accepted => {
                Operation::AcceptQuotation
            }
            TransitionCommand::RespondToQuotation { .. } => Operation::RejectQuotation,
            TransitionCommand::CreatePurchaseOrder(po) => Operation::CreatePurchaseOrder {
                deposit_required: po.deposit.required,
                by_client: po.submitted_by_client,
            },
            TransitionCommand::SubmitDepositProof { .. } => Operation::SubmitDepositProof,
            TransitionCommand::ConfirmDeposit(_) => Operation::ConfirmDeposit,
            TransitionCommand::AdvanceStage(stage) => Operation::AdvanceStage(*stage),
            TransitionCommand::CreateDeliveryNote { advance_to, .. } => {
                Operation::CreateDeliveryNote {
                    advance_to: *advance_to,
                }
            }
            TransitionCommand::RecordFinalPayment(_) => Operation::RecordFinalPayment,
            TransitionCommand::Cancel => Operation::Cancel,
        }
    }
}

/// A command addressed to an order of a hub on behalf of an actor.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRequest {
    pub order_id: i32,
    pub hub_id: i32,
    pub actor: HistoryActor,
    pub command: TransitionCommand,
    /// Free text stored with the history entry.
    pub note: Option<String>,
}

impl TransitionRequest {
    pub fn new(order: &Order, actor: HistoryActor, command: TransitionCommand) -> Self {
        Self {
            order_id: order.id,
            hub_id: order.hub_id,
            actor,
            command,
            note: None,
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note.filter(|value| !value.trim().is_empty());
        self
    }
}

/// Sub-record written together with the order change.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum TransitionRecord {
    None,
    Quotation(Quotation),
    PurchaseOrder(PurchaseOrder),
    DeliveryNote(DeliveryNote),
    Payment(Payment),
}

/// Result of a committed transition.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    /// `(status, stage)` the order had before the change.
    pub previous: Plan,
    pub order: Order,
    pub record: TransitionRecord,
    pub history: HistoryEntry,
}

impl TransitionOutcome {
    pub fn status_changed(&self) -> bool {
        self.previous.status != self.order.status
    }

    pub fn stage_changed(&self) -> bool {
        self.previous.stage != self.order.stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::purchase_order::DepositTerms;

    #[test]
    fn responses_map_to_accept_or_reject() {
        let accept = TransitionCommand::RespondToQuotation {
            quotation_id: 1,
            response: QuotationResponse::accept(),
        };
        let reject = TransitionCommand::RespondToQuotation {
            quotation_id: 1,
            response: QuotationResponse::reject(Some("budget".to_string())),
        };

        assert_eq!(accept.operation(), Operation::AcceptQuotation);
        assert_eq!(reject.operation(), Operation::RejectQuotation);
    }

    #[test]
    fn purchase_order_operation_carries_deposit_and_origin() {
        let command = TransitionCommand::CreatePurchaseOrder(
            NewPurchaseOrder::new("PO-1", vec!["/uploads/po.pdf".to_string()])
                .with_deposit(DepositTerms::percent(30))
                .from_client(),
        );

        assert_eq!(
            command.operation(),
            Operation::CreatePurchaseOrder {
                deposit_required: true,
                by_client: true
            }
        );
    }

    #[test]
    fn blank_notes_are_dropped() {
        let request = TransitionRequest {
            order_id: 1,
            hub_id: 1,
            actor: HistoryActor::system(),
            command: TransitionCommand::Cancel,
            note: None,
        };

        assert_eq!(request.clone().with_note(Some("  ".into())).note, None);
        assert_eq!(
            request.with_note(Some("call first".into())).note.as_deref(),
            Some("call first")
        );
    }
}
