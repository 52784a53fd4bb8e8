use serde::Serialize;
use serde_json::json;

use crate::dispatch::Dispatcher;
use crate::domain::delivery_note::{DeliveryItem, DeliveryNote, NewDeliveryNote};
use crate::domain::order::{OrderStage, OrderStatus};
use crate::domain::payment::NewPayment;
use crate::domain::transition::{TransitionCommand, TransitionRecord};
use crate::repository::{
    CustomerReader, NotificationWriter, OrderReader, UserReader, WorkflowStore,
};
use crate::services::access::{Actor, Capability, load_authorized};
use crate::services::notifications::{Announcement, Notice, announce, email_client};
use crate::services::orders::OrderView;
use crate::services::purchase_orders::{PaymentReceipt, validate_payment};
use crate::services::quotations::format_money;
use crate::services::{ServiceError, ServiceResult, apply_transition};

#[derive(Debug, Serialize)]
pub struct DeliveryNoteReceipt {
    pub delivery_note: DeliveryNote,
    pub order: OrderView,
}

fn validate_delivery_note(note: &NewDeliveryNote) -> ServiceResult<NewDeliveryNote> {
    let dn_number = note.dn_number.trim();
    if dn_number.is_empty() {
        return Err(ServiceError::Form("DN number is required".to_string()));
    }
    if note.items.is_empty() {
        return Err(ServiceError::Form(
            "a delivery note needs at least one item".to_string(),
        ));
    }

    let items = note
        .items
        .iter()
        .map(|item| {
            let name = item.name.trim();
            if name.is_empty() || item.quantity < 1 {
                return Err(ServiceError::Form(format!(
                    "invalid delivery line `{name}` x {}",
                    item.quantity
                )));
            }
            Ok(DeliveryItem {
                name: name.to_string(),
                quantity: item.quantity,
            })
        })
        .collect::<ServiceResult<Vec<_>>>()?;

    Ok(NewDeliveryNote {
        dn_number: dn_number.to_string(),
        items,
        ..note.clone()
    })
}

/// Issue a delivery note, optionally moving the order to a delivery stage.
pub fn create_delivery_note<R>(
    repo: &R,
    dispatcher: &Dispatcher,
    actor: &Actor,
    order_id: i32,
    note: NewDeliveryNote,
    advance_to: Option<OrderStage>,
) -> ServiceResult<DeliveryNoteReceipt>
where
    R: OrderReader + WorkflowStore + UserReader + NotificationWriter + CustomerReader + ?Sized,
{
    let note = validate_delivery_note(&note)?;
    let (order, authorized) = load_authorized(repo, actor, Capability::ManageOrder, order_id)?;

    let outcome = apply_transition(
        repo,
        &order,
        &authorized,
        TransitionCommand::CreateDeliveryNote { note, advance_to },
        None,
    )?;
    let TransitionRecord::DeliveryNote(delivery_note) = outcome.record else {
        return Err(ServiceError::Internal(
            "delivery note was not recorded".to_string(),
        ));
    };
    let order = outcome.order;

    announce(
        repo,
        dispatcher,
        Announcement::new(&order, "delivery_note_created")
            .to_staff(Notice::new(
                format!("Delivery note {} issued", delivery_note.dn_number),
                format!("{} issued it for order #{}", actor.name(), order.id),
            ))
            .to_client(
                Notice::new(
                    format!("Delivery note {}", delivery_note.dn_number),
                    format!(
                        "Order #{} is {}",
                        order.id,
                        order.stage.label().to_lowercase()
                    ),
                )
                .with("deliveryNoteId", json!(delivery_note.id)),
            )
            .from_actor(actor),
    );
    email_client(
        repo,
        dispatcher,
        &order,
        &format!("Delivery note {} for order #{}", delivery_note.dn_number, order.id),
        "delivery_note_sent",
        json!({
            "orderId": order.id,
            "dnNumber": delivery_note.dn_number,
            "items": delivery_note.items,
            "files": delivery_note.files,
        }),
    );

    Ok(DeliveryNoteReceipt {
        delivery_note,
        order: OrderView::from(order),
    })
}

/// Record the final payment; a delivered order is completed by it.
pub fn record_final_payment<R>(
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
        TransitionCommand::RecordFinalPayment(payment),
        None,
    )?;
    let TransitionRecord::Payment(payment) = outcome.record else {
        return Err(ServiceError::Internal(
            "final payment was not recorded".to_string(),
        ));
    };
    let order = outcome.order;
    let amount = format_money(payment.amount_cents, &payment.currency);
    let completed = order.status == OrderStatus::Completed;

    let client_body = if completed {
        format!(
            "We received {amount}. Order #{} is complete, thank you!",
            order.id
        )
    } else {
        format!("We received the final payment of {amount} for order #{}", order.id)
    };

    announce(
        repo,
        dispatcher,
        Announcement::new(&order, "final_payment_received")
            .to_staff(Notice::new(
                format!("Final payment for order #{}", order.id),
                format!("{} recorded {amount}", actor.name()),
            ))
            .to_client(Notice::new("Payment received", client_body))
            .from_actor(actor),
    );
    email_client(
        repo,
        dispatcher,
        &order,
        &format!("Payment received for order #{}", order.id),
        "final_payment_received",
        json!({ "orderId": order.id, "amount": amount, "completed": completed }),
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
    use crate::domain::payment::{Payment, PaymentKind};
    use crate::domain::workflow::TransitionError;
    use crate::repository::WorkflowStoreError;
    use crate::repository::mock::FakeRepo;
    use crate::services::test_support::{
        at, client_actor, expect_fan_out, fixed_datetime, outcome, sample_order, staff_actor,
    };

    fn crate_line() -> DeliveryItem {
        DeliveryItem {
            name: "Steel frame".to_string(),
            quantity: 2,
        }
    }

    #[test]
    fn delivery_notes_need_a_number_and_items() {
        let mut repo = FakeRepo::new();
        let (dispatcher, _, _) = recording();
        repo.workflow.expect_transition_order().never();

        for note in [
            NewDeliveryNote::new(" ", vec![crate_line()]),
            NewDeliveryNote::new("DN-1", Vec::new()),
            NewDeliveryNote::new(
                "DN-1",
                vec![DeliveryItem {
                    name: "Bolt".to_string(),
                    quantity: 0,
                }],
            ),
        ] {
            let result =
                create_delivery_note(&repo, &dispatcher, &staff_actor(1), 7, note, None);
            assert!(matches!(result, Err(ServiceError::Form(_))));
        }
    }

    #[test]
    fn clients_cannot_issue_delivery_notes() {
        let mut repo = FakeRepo::new();
        let (dispatcher, _, _) = recording();
        repo.orders
            .expect_find_order()
            .returning(|_| Ok(Some(sample_order(7, 1, 5))));

        let result = create_delivery_note(
            &repo,
            &dispatcher,
            &client_actor(1, 5),
            7,
            NewDeliveryNote::new("DN-1", vec![crate_line()]),
            None,
        );

        assert!(matches!(result, Err(ServiceError::Forbidden)));
    }

    #[test]
    fn delivery_note_advances_and_notifies_the_client() {
        let mut repo = FakeRepo::new();
        let (dispatcher, _, mailer) = recording();
        let rows = expect_fan_out(&mut repo);
        let before = at(
            sample_order(7, 1, 5),
            OrderStatus::Approved,
            OrderStage::QualityCheck,
        );

        let found = before.clone();
        repo.orders
            .expect_find_order()
            .returning(move |_| Ok(Some(found.clone())));
        repo.workflow
            .expect_transition_order()
            .withf(|request| {
                matches!(
                    &request.command,
                    TransitionCommand::CreateDeliveryNote {
                        note,
                        advance_to: Some(OrderStage::DeliveryNoteSent),
                    } if note.dn_number == "DN-1"
                )
            })
            .returning(move |request| {
                let after = at(
                    before.clone(),
                    OrderStatus::Approved,
                    OrderStage::DeliveryNoteSent,
                );
                let note = DeliveryNote {
                    id: 2,
                    order_id: 7,
                    hub_id: 1,
                    dn_number: "DN-1".to_string(),
                    items: vec![crate_line()],
                    files: Vec::new(),
                    delivered_at: None,
                    created_by: Some(1),
                    created_at: fixed_datetime(),
                };
                Ok(outcome(request, &before, after, TransitionRecord::DeliveryNote(note)))
            });

        let receipt = create_delivery_note(
            &repo,
            &dispatcher,
            &staff_actor(1),
            7,
            NewDeliveryNote::new(" DN-1 ", vec![crate_line()]),
            Some(OrderStage::DeliveryNoteSent),
        )
        .expect("delivery note created");

        assert_eq!(receipt.order.order.stage, OrderStage::DeliveryNoteSent);
        assert!(
            rows.lock()
                .expect("rows")
                .iter()
                .any(|row| row.recipient == Recipient::Client(5)
                    && row.metadata["deliveryNoteId"] == 2)
        );
        assert_eq!(
            mailer.messages.lock().expect("mail")[0].template,
            "delivery_note_sent"
        );
    }

    #[test]
    fn final_payment_on_a_delivered_order_completes_it() {
        let mut repo = FakeRepo::new();
        let (dispatcher, _, _) = recording();
        let rows = expect_fan_out(&mut repo);
        let before = at(
            sample_order(7, 1, 5),
            OrderStatus::Approved,
            OrderStage::Delivered,
        );

        let found = before.clone();
        repo.orders
            .expect_find_order()
            .returning(move |_| Ok(Some(found.clone())));
        repo.workflow
            .expect_transition_order()
            .returning(move |request| {
                let mut after = at(
                    before.clone(),
                    OrderStatus::Completed,
                    OrderStage::CompletedDelivered,
                );
                after.final_payment_received = true;
                let payment = Payment {
                    id: 5,
                    order_id: 7,
                    hub_id: 1,
                    kind: PaymentKind::Final,
                    amount_cents: 700_000,
                    currency: "AED".to_string(),
                    reference: None,
                    recorded_by: Some(1),
                    created_at: fixed_datetime(),
                };
                Ok(outcome(request, &before, after, TransitionRecord::Payment(payment)))
            });

        let receipt = record_final_payment(
            &repo,
            &dispatcher,
            &staff_actor(1),
            7,
            NewPayment::new(Some(700_000)),
        )
        .expect("recorded");

        assert_eq!(receipt.order.order.status, OrderStatus::Completed);
        assert_eq!(receipt.order.progress, 100);
        let rows = rows.lock().expect("rows");
        let client = rows
            .iter()
            .find(|row| row.recipient == Recipient::Client(5))
            .expect("client notified");
        assert!(client.body.contains("7000.00 AED"));
        assert!(client.body.contains("complete"));
    }

    #[test]
    fn early_final_payment_is_rejected() {
        let mut repo = FakeRepo::new();
        let (dispatcher, _, _) = recording();
        repo.orders
            .expect_find_order()
            .returning(|_| Ok(Some(sample_order(7, 1, 5))));
        repo.workflow.expect_transition_order().returning(|_| {
            Err(WorkflowStoreError::Transition(
                TransitionError::InvalidTransition {
                    operation: "record_final_payment",
                    stage: OrderStage::Received,
                },
            ))
        });

        let result = record_final_payment(
            &repo,
            &dispatcher,
            &staff_actor(1),
            7,
            NewPayment::default(),
        );

        assert!(matches!(
            result,
            Err(ServiceError::Transition(
                TransitionError::InvalidTransition { .. }
            ))
        ));
    }
}
