//! Purchase orders, deposit proofs and deposit confirmation.

use serde::Serialize;
use serde_json::json;

use crate::dispatch::Dispatcher;
use crate::domain::payment::{NewPayment, Payment};
use crate::domain::purchase_order::{NewPurchaseOrder, PurchaseOrder};
use crate::domain::transition::{TransitionCommand, TransitionRecord};
use crate::repository::{
    CustomerReader, DocumentReader, NotificationWriter, OrderReader, UserReader, WorkflowStore,
};
use crate::services::access::{Actor, Capability, load_authorized};
use crate::services::notifications::{
    Announcement, Notice, announce, email_client, email_staff,
};
use crate::services::orders::OrderView;
use crate::services::quotations::format_money;
use crate::services::{ServiceError, ServiceResult, apply_transition};

#[derive(Debug, Serialize)]
pub struct PurchaseOrderReceipt {
    pub purchase_order: PurchaseOrder,
    pub order: OrderView,
}

#[derive(Debug, Serialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub order: OrderView,
}

fn validate_purchase_order(purchase_order: &NewPurchaseOrder) -> ServiceResult<NewPurchaseOrder> {
    let po_number = purchase_order.po_number.trim();
    if po_number.is_empty() {
        return Err(ServiceError::Form("PO number is required".to_string()));
    }
    if purchase_order.files.is_empty() {
        return Err(ServiceError::Form(
            "at least one PO file is required".to_string(),
        ));
    }
    if let Some(percent) = purchase_order.deposit.percent {
        if !(1..=100).contains(&percent) {
            return Err(ServiceError::Form(
                "deposit percentage must be between 1 and 100".to_string(),
            ));
        }
    }

    Ok(NewPurchaseOrder {
        po_number: po_number.to_string(),
        ..purchase_order.clone()
    })
}

pub(crate) fn validate_payment(payment: NewPayment) -> ServiceResult<NewPayment> {
    if payment.amount_cents.is_some_and(|amount| amount <= 0) {
        return Err(ServiceError::Form(
            "payment amount must be positive".to_string(),
        ));
    }
    Ok(NewPayment {
        reference: payment
            .reference
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()),
        ..payment
    })
}

/// Record a purchase order submitted by the client or entered by staff.
///
/// The order moves to `awaiting_deposit` when a deposit is required and to
/// `in_manufacturing` otherwise, never backwards.
pub fn create_purchase_order<R>(
    repo: &R,
    dispatcher: &Dispatcher,
    actor: &Actor,
    order_id: i32,
    purchase_order: NewPurchaseOrder,
) -> ServiceResult<PurchaseOrderReceipt>
where
    R: OrderReader + WorkflowStore + UserReader + NotificationWriter + CustomerReader + ?Sized,
{
    let mut purchase_order = validate_purchase_order(&purchase_order)?;
    let (order, authorized) =
        load_authorized(repo, actor, Capability::SubmitPurchaseOrder, order_id)?;
    purchase_order.submitted_by_client = authorized.by_client();

    let outcome = apply_transition(
        repo,
        &order,
        &authorized,
        TransitionCommand::CreatePurchaseOrder(purchase_order),
        None,
    )?;
    let TransitionRecord::PurchaseOrder(purchase_order) = outcome.record else {
        return Err(ServiceError::Internal(
            "purchase order was not recorded".to_string(),
        ));
    };
    let order = outcome.order;

    let mut staff_notice = Notice::new(
        format!("Purchase order {} for order #{}", purchase_order.po_number, order.id),
        format!("{} submitted purchase order {}", actor.name(), purchase_order.po_number),
    )
    .with("purchaseOrderId", json!(purchase_order.id));
    if purchase_order.submitted_by_client {
        staff_notice = staff_notice.action("review_po");
    }

    let currency = order.currency.clone().unwrap_or_default();
    let deposit = purchase_order
        .deposit_cents
        .map(|cents| format_money(cents, &currency));
    let client_notice = match (&deposit, purchase_order.deposit_required) {
        (Some(amount), true) => Some(
            Notice::new(
                "Deposit required",
                format!(
                    "Please pay the deposit of {amount} for order #{} and upload the proof.",
                    order.id
                ),
            )
            .action("upload_deposit_proof")
            .with("purchaseOrderId", json!(purchase_order.id)),
        ),
        _ if !purchase_order.submitted_by_client => Some(Notice::new(
            "Purchase order recorded",
            format!(
                "Purchase order {} was recorded for order #{}",
                purchase_order.po_number, order.id
            ),
        )),
        _ => None,
    };

    let mut announcement = Announcement::new(&order, "po_created")
        .to_staff(staff_notice)
        .from_actor(actor);
    if let Some(notice) = client_notice {
        announcement = announcement.to_client(notice);
    }
    announce(repo, dispatcher, announcement);

    email_client(
        repo,
        dispatcher,
        &order,
        &format!("Purchase order {} received", purchase_order.po_number),
        "po_received",
        json!({
            "orderId": order.id,
            "poNumber": purchase_order.po_number,
            "depositRequired": purchase_order.deposit_required,
            "depositAmount": deposit,
        }),
    );

    Ok(PurchaseOrderReceipt {
        purchase_order,
        order: OrderView::from(order),
    })
}

/// Attach deposit proof files to a purchase order.
pub fn submit_deposit_proof<R>(
    repo: &R,
    dispatcher: &Dispatcher,
    actor: &Actor,
    purchase_order_id: i32,
    files: Vec<String>,
) -> ServiceResult<PurchaseOrder>
where
    R: OrderReader
        + DocumentReader
        + WorkflowStore
        + UserReader
        + NotificationWriter
        + CustomerReader
        + ?Sized,
{
    if files.is_empty() {
        return Err(ServiceError::Form(
            "at least one proof file is required".to_string(),
        ));
    }

    let purchase_order = repo
        .get_purchase_order(purchase_order_id)?
        .ok_or(ServiceError::NotFound)?;
    let (order, authorized) = load_authorized(
        repo,
        actor,
        Capability::SubmitDepositProof,
        purchase_order.order_id,
    )?;

    let outcome = apply_transition(
        repo,
        &order,
        &authorized,
        TransitionCommand::SubmitDepositProof {
            purchase_order_id,
            files,
        },
        None,
    )?;
    let TransitionRecord::PurchaseOrder(purchase_order) = outcome.record else {
        return Err(ServiceError::Internal(
            "deposit proof was not recorded".to_string(),
        ));
    };
    let order = outcome.order;

    announce(
        repo,
        dispatcher,
        Announcement::new(&order, "deposit_proof_uploaded")
            .to_staff(
                Notice::new(
                    format!("Deposit proof for order #{}", order.id),
                    format!(
                        "{} uploaded a deposit proof for purchase order {}",
                        actor.name(),
                        purchase_order.po_number
                    ),
                )
                .action("verify_deposit")
                .with("purchaseOrderId", json!(purchase_order.id)),
            )
            .from_actor(actor),
    );
    email_staff(
        repo,
        dispatcher,
        &order,
        &format!("Deposit proof for order #{}", order.id),
        "deposit_proof_received",
        json!({
            "orderId": order.id,
            "poNumber": purchase_order.po_number,
            "files": purchase_order.deposit_proof_files,
        }),
    );

    Ok(purchase_order)
}

/// Staff confirm the deposit has arrived.
pub fn confirm_deposit<R>(
    repo: &R,
    dispatcher: &Dispatcher,
    actor: &Actor,
    order_id: i32,
    payment: NewPayment,
) -> ServiceResult<PaymentReceipt>
where
    R: OrderReader + WorkflowStore + UserReader + NotificationWriter + CustomerReader + ?Sized,
{
    let payment = validate_payment(payment)?;
    let (order, authorized) = load_authorized(repo, actor, Capability::ManageOrder, order_id)?;

    let outcome = apply_transition(
        repo,
        &order,
        &authorized,
        TransitionCommand::ConfirmDeposit(payment),
        None,
    )?;
    let TransitionRecord::Payment(payment) = outcome.record else {
        return Err(ServiceError::Internal(
            "deposit payment was not recorded".to_string(),
        ));
    };
    let order = outcome.order;
    let amount = format_money(payment.amount_cents, &payment.currency);

    announce(
        repo,
        dispatcher,
        Announcement::new(&order, "deposit_confirmed")
            .to_staff(Notice::new(
                format!("Deposit confirmed for order #{}", order.id),
                format!("{} confirmed a deposit of {amount}", actor.name()),
            ))
            .to_client(Notice::new(
                "Deposit received",
                format!("We received your deposit of {amount} for order #{}", order.id),
            ))
            .from_actor(actor),
    );
    email_client(
        repo,
        dispatcher,
        &order,
        &format!("Deposit received for order #{}", order.id),
        "deposit_confirmed",
        json!({ "orderId": order.id, "amount": amount, "reference": payment.reference }),
    );

    Ok(PaymentReceipt {
        payment,
        order: OrderView::from(order),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::testing::recording;
    use crate::domain::notification::Recipient;
    use crate::domain::order::{OrderStage, OrderStatus};
    use crate::domain::payment::PaymentKind;
    use crate::domain::purchase_order::DepositTerms;
    use crate::domain::workflow::TransitionError;
    use crate::repository::WorkflowStoreError;
    use crate::repository::mock::FakeRepo;
    use crate::services::test_support::{
        at, client_actor, expect_fan_out, fixed_datetime, outcome, sample_order,
        sample_purchase_order, staff_actor,
    };

    fn po_files() -> Vec<String> {
        vec!["/uploads/1/po.pdf".to_string()]
    }

    #[test]
    fn client_purchase_order_with_deposit_asks_for_proof() {
        let mut repo = FakeRepo::new();
        let (dispatcher, _, _) = recording();
        let rows = expect_fan_out(&mut repo);
        let mut before = at(
            sample_order(7, 1, 5),
            OrderStatus::Approved,
            OrderStage::QuotationAccepted,
        );
        before.total_cents = Some(1_000_000);
        before.currency = Some("AED".to_string());

        let found = before.clone();
        repo.orders
            .expect_find_order()
            .returning(move |_| Ok(Some(found.clone())));
        repo.workflow
            .expect_transition_order()
            .times(1)
            .withf(|request| {
                matches!(
                    &request.command,
                    TransitionCommand::CreatePurchaseOrder(po)
                        if po.submitted_by_client && po.po_number == "PO-1"
                )
            })
            .returning(move |request| {
                let mut after = at(
                    before.clone(),
                    OrderStatus::Approved,
                    OrderStage::AwaitingDeposit,
                );
                after.deposit_percent = Some(30);
                after.deposit_cents = Some(300_000);
                let record = TransitionRecord::PurchaseOrder(sample_purchase_order(4, &after));
                Ok(outcome(request, &before, after, record))
            });

        let receipt = create_purchase_order(
            &repo,
            &dispatcher,
            &client_actor(1, 5),
            7,
            NewPurchaseOrder::new(" PO-1 ", po_files()).with_deposit(DepositTerms::percent(30)),
        )
        .expect("purchase order created");

        assert_eq!(receipt.order.order.stage, OrderStage::AwaitingDeposit);
        let rows = rows.lock().expect("rows");
        assert!(rows.iter().any(|row| {
            matches!(row.recipient, Recipient::Staff(_)) && row.metadata["actionType"] == "review_po"
        }));
        let client = rows
            .iter()
            .find(|row| row.recipient == Recipient::Client(5))
            .expect("client notified");
        assert_eq!(client.metadata["actionType"], "upload_deposit_proof");
        assert!(client.body.contains("3000.00 AED"));
    }

    #[test]
    fn purchase_orders_without_files_or_number_never_reach_the_store() {
        let mut repo = FakeRepo::new();
        let (dispatcher, _, _) = recording();
        repo.workflow.expect_transition_order().never();

        for purchase_order in [
            NewPurchaseOrder::new("PO-1", Vec::new()),
            NewPurchaseOrder::new("  ", po_files()),
            NewPurchaseOrder::new("PO-1", po_files()).with_deposit(DepositTerms::percent(0)),
        ] {
            let result = create_purchase_order(
                &repo,
                &dispatcher,
                &client_actor(1, 5),
                7,
                purchase_order,
            );
            assert!(matches!(result, Err(ServiceError::Form(_))));
        }
    }

    #[test]
    fn purchase_orders_of_other_clients_are_forbidden() {
        let mut repo = FakeRepo::new();
        let (dispatcher, _, _) = recording();
        repo.orders
            .expect_find_order()
            .returning(|_| Ok(Some(sample_order(7, 1, 6))));

        let result = create_purchase_order(
            &repo,
            &dispatcher,
            &client_actor(1, 5),
            7,
            NewPurchaseOrder::new("PO-1", po_files()),
        );

        assert!(matches!(result, Err(ServiceError::Forbidden)));
    }

    #[test]
    fn deposit_proof_needs_files_and_flags_staff() {
        let repo = FakeRepo::new();
        let (dispatcher, _, _) = recording();
        assert!(matches!(
            submit_deposit_proof(&repo, &dispatcher, &client_actor(1, 5), 4, Vec::new()),
            Err(ServiceError::Form(_))
        ));

        let mut repo = FakeRepo::new();
        let rows = expect_fan_out(&mut repo);
        let before = at(
            sample_order(7, 1, 5),
            OrderStatus::Approved,
            OrderStage::AwaitingDeposit,
        );
        let stored = sample_purchase_order(4, &before);

        repo.documents
            .expect_get_purchase_order()
            .returning(move |_| Ok(Some(stored.clone())));
        let found = before.clone();
        repo.orders
            .expect_find_order()
            .returning(move |_| Ok(Some(found.clone())));
        repo.workflow
            .expect_transition_order()
            .returning(move |request| {
                let mut po = sample_purchase_order(4, &before);
                po.deposit_proof_files = vec!["/uploads/1/slip.jpg".to_string()];
                Ok(outcome(
                    request,
                    &before,
                    before.clone(),
                    TransitionRecord::PurchaseOrder(po),
                ))
            });

        let po = submit_deposit_proof(
            &repo,
            &dispatcher,
            &client_actor(1, 5),
            4,
            vec!["/uploads/1/slip.jpg".to_string()],
        )
        .expect("proof stored");

        assert_eq!(po.deposit_proof_files.len(), 1);
        let rows = rows.lock().expect("rows");
        assert!(rows.iter().all(|row| row.metadata["actionType"] == "verify_deposit"));
    }

    #[test]
    fn confirming_a_deposit_twice_is_a_conflict() {
        let mut repo = FakeRepo::new();
        let (dispatcher, _, _) = recording();
        repo.orders
            .expect_find_order()
            .returning(|_| Ok(Some(sample_order(7, 1, 5))));
        repo.workflow.expect_transition_order().returning(|_| {
            Err(WorkflowStoreError::Transition(
                TransitionError::DepositAlreadyConfirmed,
            ))
        });

        let result = confirm_deposit(&repo, &dispatcher, &staff_actor(1), 7, NewPayment::default());

        assert!(matches!(
            result,
            Err(ServiceError::Transition(
                TransitionError::DepositAlreadyConfirmed
            ))
        ));
    }

    #[test]
    fn confirmed_deposits_notify_the_client() {
        let mut repo = FakeRepo::new();
        let (dispatcher, _, mailer) = recording();
        let rows = expect_fan_out(&mut repo);
        let before = at(
            sample_order(7, 1, 5),
            OrderStatus::Approved,
            OrderStage::AwaitingDeposit,
        );

        let found = before.clone();
        repo.orders
            .expect_find_order()
            .returning(move |_| Ok(Some(found.clone())));
        repo.workflow
            .expect_transition_order()
            .withf(|request| {
                request.command
                    == TransitionCommand::ConfirmDeposit(
                        NewPayment::new(None).with_reference("TT-9"),
                    )
            })
            .returning(move |request| {
                let mut after = at(
                    before.clone(),
                    OrderStatus::Approved,
                    OrderStage::DepositReceived,
                );
                after.deposit_paid = true;
                let payment = Payment {
                    id: 1,
                    order_id: 7,
                    hub_id: 1,
                    kind: PaymentKind::Deposit,
                    amount_cents: 300_000,
                    currency: "AED".to_string(),
                    reference: Some("TT-9".to_string()),
                    recorded_by: Some(1),
                    created_at: fixed_datetime(),
                };
                Ok(outcome(request, &before, after, TransitionRecord::Payment(payment)))
            });

        let receipt = confirm_deposit(
            &repo,
            &dispatcher,
            &staff_actor(1),
            7,
            NewPayment {
                amount_cents: None,
                reference: Some(" TT-9 ".to_string()),
            },
        )
        .expect("confirmed");

        assert!(receipt.order.order.deposit_paid);
        assert!(
            rows.lock()
                .expect("rows")
                .iter()
                .any(|row| row.recipient == Recipient::Client(5))
        );
        assert_eq!(
            mailer.messages.lock().expect("mail")[0].template,
            "deposit_confirmed"
        );
    }

    #[test]
    fn payments_must_be_positive() {
        assert!(matches!(
            validate_payment(NewPayment::new(Some(0))),
            Err(ServiceError::Form(_))
        ));
        assert_eq!(
            validate_payment(NewPayment::new(Some(10)).with_reference("  "))
                .expect("valid")
                .reference,
            None
        );
    }
}
