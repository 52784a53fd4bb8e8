//! Transition table for the order lifecycle.
//!
//! [`plan`] is the only place that decides whether an operation is legal
//! from an order's current `(status, stage)` and what the order looks like
//! afterwards. The repository evaluates it inside the same transaction that
//! applies the result, so every caller is checked against the state the
//! store holds at execution time.

use serde::Serialize;
use thiserror::Error;

use crate::domain::history::HistoryAction;
use crate::domain::order::{OrderStage, OrderStatus};

/// Operation attempted against an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SetStatus(OrderStatus),
    CreateQuotation,
    AcceptQuotation,
    RejectQuotation,
    CreatePurchaseOrder { deposit_required: bool, by_client: bool },
    SubmitDepositProof,
    ConfirmDeposit,
    AdvanceStage(OrderStage),
    CreateDeliveryNote { advance_to: Option<OrderStage> },
    RecordFinalPayment,
    Cancel,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::SetStatus(_) => "set_status",
            Operation::CreateQuotation => "create_quotation",
            Operation::AcceptQuotation => "accept_quotation",
            Operation::RejectQuotation => "reject_quotation",
            Operation::CreatePurchaseOrder { .. } => "create_purchase_order",
            Operation::SubmitDepositProof => "submit_deposit_proof",
            Operation::ConfirmDeposit => "confirm_deposit",
            Operation::AdvanceStage(_) => "advance_stage",
            Operation::CreateDeliveryNote { .. } => "create_delivery_note",
            Operation::RecordFinalPayment => "record_final_payment",
            Operation::Cancel => "cancel",
        }
    }

    /// History code written when the operation is applied.
    pub fn history_action(self) -> HistoryAction {
        match self {
            Operation::SetStatus(_) => HistoryAction::StatusChanged,
            Operation::CreateQuotation => HistoryAction::QuotationCreated,
            Operation::AcceptQuotation => HistoryAction::QuotationAcceptedByClient,
            Operation::RejectQuotation => HistoryAction::QuotationRejectedByClient,
            Operation::CreatePurchaseOrder {
                by_client: true, ..
            } => HistoryAction::PoUploadedByClient,
            Operation::CreatePurchaseOrder { .. } => HistoryAction::PoCreated,
            Operation::SubmitDepositProof => HistoryAction::DepositProofUploaded,
            Operation::ConfirmDeposit => HistoryAction::DepositConfirmed,
            Operation::AdvanceStage(_) => HistoryAction::StageAdvanced,
            Operation::CreateDeliveryNote { .. } => HistoryAction::DeliveryNoteCreated,
            Operation::RecordFinalPayment => HistoryAction::FinalPaymentReceived,
            Operation::Cancel => HistoryAction::OrderCancelled,
        }
    }
}

/// Facts about an order that the table needs besides `(status, stage)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkflowContext {
    pub status: OrderStatus,
    pub stage: OrderStage,
    pub deposit_paid: bool,
    pub final_payment_received: bool,
    pub has_purchase_order: bool,
    /// An accepted quotation with a document locks cancellation.
    pub has_accepted_quotation_file: bool,
    /// Whether the quotation targeted by a response was already answered.
    pub quotation_answered: bool,
}

impl WorkflowContext {
    pub fn new(status: OrderStatus, stage: OrderStage) -> Self {
        Self {
            status,
            stage,
            ..Self::default()
        }
    }
}

/// Resulting `(status, stage)` of a legal operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub status: OrderStatus,
    pub stage: OrderStage,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot {operation} while the order is at stage {stage}")]
    InvalidTransition {
        operation: &'static str,
        stage: OrderStage,
    },
    #[error("cannot {operation}: the order is {status}")]
    Terminal {
        operation: &'static str,
        status: OrderStatus,
    },
    #[error("stage cannot move back from {from} to {to}")]
    StageRegression { from: OrderStage, to: OrderStage },
    #[error("delivery notes cannot move the order to {0}")]
    InvalidDeliveryStage(OrderStage),
    #[error("the quotation has already been answered")]
    QuotationAlreadyAnswered,
    #[error("the order can no longer be cancelled")]
    CancellationLocked,
    #[error("the deposit has already been confirmed")]
    DepositAlreadyConfirmed,
    #[error("the final payment has already been recorded")]
    FinalPaymentAlreadyRecorded,
    #[error("the order has no purchase order")]
    MissingPurchaseOrder,
    #[error("a deposit percentage is required")]
    DepositPercentMissing,
    #[error("the payment amount cannot be derived from the order")]
    PaymentAmountMissing,
}

/// Decide the outcome of `operation` from `context`.
pub fn plan(context: &WorkflowContext, operation: Operation) -> Result<Plan, TransitionError> {
    let current = Plan {
        status: context.status,
        stage: context.stage,
    };

    if context.status.is_terminal() {
        return match operation {
            Operation::SetStatus(status) if status == context.status => Ok(current),
            _ => Err(TransitionError::Terminal {
                operation: operation.name(),
                status: context.status,
            }),
        };
    }

    let require = |allowed: bool| {
        if allowed {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition {
                operation: operation.name(),
                stage: context.stage,
            })
        }
    };

    match operation {
        Operation::SetStatus(status) => match status.mapped_stage() {
            None => Ok(Plan {
                status,
                stage: context.stage,
            }),
            Some(target) if target >= context.stage => Ok(Plan {
                status,
                stage: target,
            }),
            Some(_) if status == context.status => Ok(current),
            Some(target) => Err(TransitionError::StageRegression {
                from: context.stage,
                to: target,
            }),
        },
        Operation::CreateQuotation => {
            require(context.stage <= OrderStage::QuotationSent)?;
            Ok(current)
        }
        Operation::AcceptQuotation | Operation::RejectQuotation => {
            if context.quotation_answered {
                return Err(TransitionError::QuotationAlreadyAnswered);
            }
            require(context.stage <= OrderStage::QuotationSent)?;
            if operation == Operation::AcceptQuotation {
                Ok(Plan {
                    status: OrderStatus::Approved,
                    stage: OrderStage::QuotationAccepted,
                })
            } else {
                // The order stays quoted, even when the quotation was issued early.
                Ok(Plan {
                    status: OrderStatus::QuotationSent,
                    stage: context.stage.max(OrderStage::QuotationSent),
                })
            }
        }
        Operation::CreatePurchaseOrder {
            deposit_required,
            by_client,
        } => {
            if by_client {
                require(context.stage >= OrderStage::QuotationAccepted)?;
            }
            let target = if deposit_required {
                OrderStage::AwaitingDeposit
            } else {
                OrderStage::InManufacturing
            };
            Ok(Plan {
                status: OrderStatus::Approved,
                stage: context.stage.max(target),
            })
        }
        Operation::SubmitDepositProof => {
            if !context.has_purchase_order {
                return Err(TransitionError::MissingPurchaseOrder);
            }
            require(context.stage >= OrderStage::QuotationAccepted)?;
            Ok(current)
        }
        Operation::ConfirmDeposit => {
            if context.deposit_paid {
                return Err(TransitionError::DepositAlreadyConfirmed);
            }
            require(context.stage >= OrderStage::AwaitingDeposit)?;
            Ok(Plan {
                status: context.status,
                stage: context.stage.max(OrderStage::DepositReceived),
            })
        }
        Operation::AdvanceStage(target) => {
            if target < context.stage {
                return Err(TransitionError::StageRegression {
                    from: context.stage,
                    to: target,
                });
            }
            require(target != context.stage)?;
            Ok(Plan {
                status: status_following_stage(target, context.status),
                stage: target,
            })
        }
        Operation::CreateDeliveryNote { advance_to } => {
            require(context.stage >= OrderStage::InManufacturing)?;
            match advance_to {
                None => Ok(current),
                Some(
                    target @ (OrderStage::ReadyForDelivery
                    | OrderStage::DeliveryNoteSent
                    | OrderStage::Delivered),
                ) => Ok(Plan {
                    status: context.status,
                    stage: context.stage.max(target),
                }),
                Some(other) => Err(TransitionError::InvalidDeliveryStage(other)),
            }
        }
        Operation::RecordFinalPayment => {
            if context.final_payment_received {
                return Err(TransitionError::FinalPaymentAlreadyRecorded);
            }
            require(context.stage >= OrderStage::DeliveryNoteSent)?;
            if context.stage >= OrderStage::Delivered {
                Ok(Plan {
                    status: OrderStatus::Completed,
                    stage: OrderStage::CompletedDelivered,
                })
            } else {
                Ok(current)
            }
        }
        Operation::Cancel => {
            if context.stage >= OrderStage::PoPrepared || context.has_accepted_quotation_file {
                return Err(TransitionError::CancellationLocked);
            }
            Ok(Plan {
                status: OrderStatus::Cancelled,
                stage: context.stage,
            })
        }
    }
}

/// Status an order carries once staff move it to `stage`.
fn status_following_stage(stage: OrderStage, current: OrderStatus) -> OrderStatus {
    if stage == OrderStage::CompletedDelivered {
        OrderStatus::Completed
    } else if stage >= OrderStage::QuotationAccepted {
        OrderStatus::Approved
    } else if stage == OrderStage::QuotationSent {
        OrderStatus::QuotationSent
    } else {
        current
    }
}

/// Names of the operations that are legal from `context`.
pub fn allowed_operations(context: &WorkflowContext) -> Vec<&'static str> {
    let mut candidates: Vec<Operation> = OrderStatus::ALL
        .into_iter()
        .map(Operation::SetStatus)
        .collect();
    candidates.extend([
        Operation::CreateQuotation,
        Operation::AcceptQuotation,
        Operation::RejectQuotation,
        Operation::CreatePurchaseOrder {
            deposit_required: false,
            by_client: false,
        },
        Operation::SubmitDepositProof,
        Operation::ConfirmDeposit,
        Operation::CreateDeliveryNote { advance_to: None },
        Operation::RecordFinalPayment,
        Operation::Cancel,
    ]);
    candidates.extend(OrderStage::ALL.into_iter().map(Operation::AdvanceStage));

    legal_names(context, candidates)
}

/// Names of the operations a client may currently perform.
pub fn allowed_client_operations(context: &WorkflowContext) -> Vec<&'static str> {
    legal_names(
        context,
        [
            Operation::AcceptQuotation,
            Operation::RejectQuotation,
            Operation::CreatePurchaseOrder {
                deposit_required: false,
                by_client: true,
            },
            Operation::SubmitDepositProof,
            Operation::Cancel,
        ],
    )
}

fn legal_names(
    context: &WorkflowContext,
    candidates: impl IntoIterator<Item = Operation>,
) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    for operation in candidates {
        if plan(context, operation).is_ok() && !names.contains(&operation.name()) {
            names.push(operation.name());
        }
    }
    names
}
