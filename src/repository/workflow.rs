use chrono::{NaiveDateTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use pushkind_common::repository::errors::RepositoryError;
use serde_json::{Map, Value, json};

use crate::{
    domain::{
        history::{HistoryEntry as DomainHistoryEntry, NewHistoryEntry},
        order::{DEFAULT_CURRENCY, Order as DomainOrder, deposit_amount},
        payment::{NewPayment as DomainNewPayment, PaymentKind},
        transition::{TransitionCommand, TransitionOutcome, TransitionRecord, TransitionRequest},
        workflow::{self, Plan, TransitionError, WorkflowContext},
    },
    models::{
        delivery_note::{DeliveryNote as DbDeliveryNote, NewDeliveryNote as DbNewDeliveryNote},
        encode_json,
        history::{HistoryEntry as DbHistoryEntry, NewHistoryEntry as DbNewHistoryEntry},
        order::{Order as DbOrder, OrderChanges},
        payment::{NewPayment as DbNewPayment, Payment as DbPayment},
        purchase_order::{NewPurchaseOrder as DbNewPurchaseOrder, PurchaseOrder as DbPurchaseOrder},
        quotation::{
            NewQuotation as DbNewQuotation, Quotation as DbQuotation,
            QuotationResponse as DbQuotationResponse,
        },
    },
    repository::{
        DieselRepository, WorkflowResult, WorkflowStore, WorkflowStoreError, order::load_order,
    },
};

impl WorkflowStore for DieselRepository {
    fn transition_order(&self, request: &TransitionRequest) -> WorkflowResult<TransitionOutcome> {
        use crate::schema::{order_history, orders};

        let mut conn = self.conn()?;

        conn.immediate_transaction::<TransitionOutcome, WorkflowStoreError, _>(|conn| {
            let order = orders::table
                .filter(orders::id.eq(request.order_id))
                .filter(orders::hub_id.eq(request.hub_id))
                .first::<DbOrder>(conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?;
            let order = load_order(conn, order)?;

            let context = workflow_context(conn, &order, &request.command)?;
            let plan = workflow::plan(&context, request.command.operation())?;
            let previous = Plan {
                status: order.status,
                stage: order.stage,
            };

            let now = Utc::now().naive_utc();
            let mut changes = OrderChanges {
                status: Some(plan.status.as_str().to_string()),
                stage: Some(plan.stage.as_str().to_string()),
                updated_at: Some(now),
                ..OrderChanges::default()
            };

            let record = apply_command(conn, request, &order, &mut changes, now)?;

            let updated = diesel::update(orders::table.filter(orders::id.eq(order.id)))
                .set(&changes)
                .get_result::<DbOrder>(conn)?;
            let updated = load_order(conn, updated)?;

            let entry = NewHistoryEntry {
                order_id: order.id,
                hub_id: order.hub_id,
                actor: request.actor.clone(),
                action: request.command.operation().history_action(),
                payload: history_payload(&previous, &plan, request.note.as_deref(), &record),
            };

            let history = diesel::insert_into(order_history::table)
                .values(&DbNewHistoryEntry::from(&entry))
                .get_result::<DbHistoryEntry>(conn)?;

            Ok(TransitionOutcome {
                previous,
                order: updated,
                record,
                history: DomainHistoryEntry::from(history),
            })
        })
    }
}

/// Gather the facts the transition table needs about the stored order.
fn workflow_context(
    conn: &mut SqliteConnection,
    order: &DomainOrder,
    command: &TransitionCommand,
) -> WorkflowResult<WorkflowContext> {
    use crate::schema::{purchase_orders, quotations};

    let has_purchase_order = diesel::select(exists(
        purchase_orders::table.filter(purchase_orders::order_id.eq(order.id)),
    ))
    .get_result::<bool>(conn)?;

    let has_accepted_quotation_file = diesel::select(exists(
        quotations::table
            .filter(quotations::order_id.eq(order.id))
            .filter(quotations::accepted.eq(true))
            .filter(quotations::file_url.is_not_null()),
    ))
    .get_result::<bool>(conn)?;

    let quotation_answered = match command {
        TransitionCommand::RespondToQuotation { quotation_id, .. } => {
            find_quotation(conn, order.id, *quotation_id)?
                .accepted
                .is_some()
        }
        _ => false,
    };

    Ok(WorkflowContext {
        status: order.status,
        stage: order.stage,
        deposit_paid: order.deposit_paid,
        final_payment_received: order.final_payment_received,
        has_purchase_order,
        has_accepted_quotation_file,
        quotation_answered,
    })
}

fn find_quotation(
    conn: &mut SqliteConnection,
    order_id: i32,
    quotation_id: i32,
) -> WorkflowResult<DbQuotation> {
    use crate::schema::quotations;

    Ok(quotations::table
        .filter(quotations::id.eq(quotation_id))
        .filter(quotations::order_id.eq(order_id))
        .first::<DbQuotation>(conn)
        .optional()?
        .ok_or(RepositoryError::NotFound)?)
}

/// Write the sub-record of `request` and fill the order columns it touches.
fn apply_command(
    conn: &mut SqliteConnection,
    request: &TransitionRequest,
    order: &DomainOrder,
    changes: &mut OrderChanges,
    now: NaiveDateTime,
) -> WorkflowResult<TransitionRecord> {
    use crate::schema::{delivery_notes, purchase_orders, quotations};

    let actor_id = request.actor.id;

    let record = match &request.command {
        TransitionCommand::SetStatus(_)
        | TransitionCommand::AdvanceStage(_)
        | TransitionCommand::Cancel => TransitionRecord::None,
        TransitionCommand::CreateQuotation(new_quotation) => {
            let created = diesel::insert_into(quotations::table)
                .values(&DbNewQuotation::from_domain(
                    order.id,
                    order.hub_id,
                    actor_id,
                    new_quotation,
                ))
                .get_result::<DbQuotation>(conn)?;
            TransitionRecord::Quotation(created.into())
        }
        TransitionCommand::RespondToQuotation {
            quotation_id,
            response,
        } => {
            // Only an unanswered quotation may be written.
            let target = quotations::table
                .filter(quotations::id.eq(*quotation_id))
                .filter(quotations::order_id.eq(order.id))
                .filter(quotations::accepted.is_null());

            let updated = diesel::update(target)
                .set(&DbQuotationResponse {
                    accepted: Some(response.accepted),
                    rejection_reason: response.rejection_reason.as_deref(),
                    client_comment: response.client_comment.as_deref(),
                    responded_at: Some(now),
                    updated_at: now,
                })
                .get_result::<DbQuotation>(conn)
                .optional()?
                .ok_or(TransitionError::QuotationAlreadyAnswered)?;

            if response.accepted {
                changes.total_cents = Some(Some(updated.total_cents));
                changes.currency = Some(Some(updated.currency.clone()));
                if updated.deposit_required {
                    changes.deposit_percent = Some(updated.deposit_percent);
                    changes.deposit_cents = Some(
                        updated
                            .deposit_percent
                            .map(|percent| deposit_amount(updated.total_cents, percent)),
                    );
                } else {
                    changes.deposit_percent = Some(None);
                    changes.deposit_cents = Some(None);
                }
            }

            TransitionRecord::Quotation(updated.into())
        }
        TransitionCommand::CreatePurchaseOrder(new_po) => {
            let (percent, deposit_cents) = if new_po.deposit.required {
                let percent = new_po
                    .deposit
                    .percent
                    .or(order.deposit_percent)
                    .ok_or(TransitionError::DepositPercentMissing)?;
                let cents = order
                    .total_cents
                    .map(|total| deposit_amount(total, percent));
                (Some(percent), cents)
            } else {
                (None, None)
            };

            let mut row = DbNewPurchaseOrder::from_domain(
                order.id,
                order.hub_id,
                actor_id,
                deposit_cents,
                new_po,
            );
            row.deposit_percent = percent;

            let created = diesel::insert_into(purchase_orders::table)
                .values(&row)
                .get_result::<DbPurchaseOrder>(conn)?;

            // The most recent purchase order defines the deposit terms.
            changes.deposit_percent = Some(percent);
            changes.deposit_cents = Some(deposit_cents);

            TransitionRecord::PurchaseOrder(created.into())
        }
        TransitionCommand::SubmitDepositProof {
            purchase_order_id,
            files,
        } => {
            let target = purchase_orders::table
                .filter(purchase_orders::id.eq(*purchase_order_id))
                .filter(purchase_orders::order_id.eq(order.id));

            let existing = target
                .clone()
                .first::<DbPurchaseOrder>(conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?;

            let mut proof: Vec<String> = crate::models::decode_json(
                &existing.deposit_proof_files,
                "purchase_orders.deposit_proof_files",
            );
            proof.extend(files.iter().cloned());

            let updated = diesel::update(target)
                .set((
                    purchase_orders::deposit_proof_files.eq(encode_json(&proof)),
                    purchase_orders::updated_at.eq(now),
                ))
                .get_result::<DbPurchaseOrder>(conn)?;

            TransitionRecord::PurchaseOrder(updated.into())
        }
        TransitionCommand::ConfirmDeposit(payment) => {
            let created = insert_payment(
                conn,
                order,
                PaymentKind::Deposit,
                payment,
                order.deposit_cents,
                actor_id,
            )?;
            changes.deposit_paid = Some(true);
            changes.deposit_paid_at = Some(Some(now));
            TransitionRecord::Payment(created.into())
        }
        TransitionCommand::CreateDeliveryNote { note, .. } => {
            let created = diesel::insert_into(delivery_notes::table)
                .values(&DbNewDeliveryNote::from_domain(
                    order.id,
                    order.hub_id,
                    actor_id,
                    note,
                ))
                .get_result::<DbDeliveryNote>(conn)?;
            TransitionRecord::DeliveryNote(created.into())
        }
        TransitionCommand::RecordFinalPayment(payment) => {
            let created = insert_payment(
                conn,
                order,
                PaymentKind::Final,
                payment,
                outstanding_balance(order),
                actor_id,
            )?;
            changes.final_payment_received = Some(true);
            changes.final_payment_received_at = Some(Some(now));
            TransitionRecord::Payment(created.into())
        }
    };

    Ok(record)
}

fn insert_payment(
    conn: &mut SqliteConnection,
    order: &DomainOrder,
    kind: PaymentKind,
    payment: &DomainNewPayment,
    fallback_amount: Option<i64>,
    recorded_by: Option<i32>,
) -> WorkflowResult<DbPayment> {
    use crate::schema::payments;

    let amount_cents = payment
        .amount_cents
        .or(fallback_amount)
        .ok_or(TransitionError::PaymentAmountMissing)?;
    let currency = order.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);

    let created = diesel::insert_into(payments::table)
        .values(&DbNewPayment {
            order_id: order.id,
            hub_id: order.hub_id,
            kind: kind.as_str(),
            amount_cents,
            currency,
            reference: payment.reference.as_deref(),
            recorded_by,
        })
        .get_result::<DbPayment>(conn)?;

    Ok(created)
}

/// Quoted total minus a confirmed deposit.
fn outstanding_balance(order: &DomainOrder) -> Option<i64> {
    let total = order.total_cents?;
    let paid = if order.deposit_paid {
        order.deposit_cents.unwrap_or(0)
    } else {
        0
    };
    Some(total - paid)
}

fn history_payload(
    previous: &Plan,
    plan: &Plan,
    note: Option<&str>,
    record: &TransitionRecord,
) -> Value {
    let mut payload = Map::new();
    payload.insert("previousStatus".into(), json!(previous.status));
    payload.insert("newStatus".into(), json!(plan.status));
    payload.insert("previousStage".into(), json!(previous.stage));
    payload.insert("newStage".into(), json!(plan.stage));
    payload.insert("note".into(), json!(note));

    match record {
        TransitionRecord::None => {}
        TransitionRecord::Quotation(quotation) => {
            payload.insert("quotationId".into(), json!(quotation.id));
            payload.insert("totalCents".into(), json!(quotation.total_cents));
            payload.insert("currency".into(), json!(quotation.currency));
            if quotation.accepted == Some(false) {
                payload.insert("rejectionReason".into(), json!(quotation.rejection_reason));
            }
            if let Some(comment) = &quotation.client_comment {
                payload.insert("clientComment".into(), json!(comment));
            }
        }
        TransitionRecord::PurchaseOrder(po) => {
            payload.insert("purchaseOrderId".into(), json!(po.id));
            payload.insert("poNumber".into(), json!(po.po_number));
            payload.insert("depositRequired".into(), json!(po.deposit_required));
            payload.insert("depositCents".into(), json!(po.deposit_cents));
            payload.insert("fileCount".into(), json!(po.files.len()));
            payload.insert(
                "depositProofCount".into(),
                json!(po.deposit_proof_files.len()),
            );
        }
        TransitionRecord::DeliveryNote(note) => {
            payload.insert("deliveryNoteId".into(), json!(note.id));
            payload.insert("dnNumber".into(), json!(note.dn_number));
            payload.insert("itemCount".into(), json!(note.items.len()));
        }
        TransitionRecord::Payment(payment) => {
            payload.insert("paymentId".into(), json!(payment.id));
            payload.insert("amountCents".into(), json!(payment.amount_cents));
            payload.insert("currency".into(), json!(payment.currency));
            payload.insert("reference".into(), json!(payment.reference));
        }
    }

    Value::Object(payload)
}
