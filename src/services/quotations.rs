use serde::Serialize;
use serde_json::json;

use crate::dispatch::Dispatcher;
use crate::domain::order::MAX_AMOUNT_CENTS;
use crate::domain::quotation::{NewQuotation, Quotation, QuotationResponse};
use crate::domain::transition::{TransitionCommand, TransitionRecord};
use crate::domain::workflow::TransitionError;
use crate::repository::{
    CustomerReader, DocumentReader, NotificationWriter, OrderReader, UserReader, WorkflowStore,
};
use crate::services::access::{Actor, Capability, load_authorized, resolve_token_client};
use crate::services::notifications::{
    Announcement, Notice, announce, email_client, email_staff,
};
use crate::services::orders::OrderView;
use crate::services::{ServiceError, ServiceResult, apply_transition};

/// Quotation after the client's answer, with the order it moved.
#[derive(Debug, Serialize)]
pub struct QuotationAnswer {
    pub quotation: Quotation,
    pub order: OrderView,
}

fn validate_quotation(quotation: &NewQuotation) -> ServiceResult<()> {
    if quotation.total_cents < 0 {
        return Err(ServiceError::Form("total cannot be negative".to_string()));
    }
    if quotation.total_cents > MAX_AMOUNT_CENTS {
        return Err(ServiceError::Form("total is too large".to_string()));
    }
    let currency = quotation.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ServiceError::Form(format!(
            "`{currency}` is not a currency code"
        )));
    }
    if quotation.deposit_required {
        match quotation.deposit_percent {
            Some(percent) if (1..=100).contains(&percent) => {}
            _ => {
                return Err(ServiceError::Form(
                    "deposit percentage must be between 1 and 100".to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// Issue a quotation for an order. Staff only; the stage moves on the answer.
pub fn create_quotation<R>(
    repo: &R,
    dispatcher: &Dispatcher,
    actor: &Actor,
    order_id: i32,
    quotation: NewQuotation,
) -> ServiceResult<Quotation>
where
    R: OrderReader + WorkflowStore + UserReader + NotificationWriter + CustomerReader + ?Sized,
{
    validate_quotation(&quotation)?;
    let (order, authorized) = load_authorized(repo, actor, Capability::ManageOrder, order_id)?;

    let outcome = apply_transition(
        repo,
        &order,
        &authorized,
        TransitionCommand::CreateQuotation(quotation),
        None,
    )?;
    let TransitionRecord::Quotation(quotation) = outcome.record else {
        return Err(ServiceError::Internal(
            "quotation was not recorded".to_string(),
        ));
    };
    let order = outcome.order;
    let amount = format_money(quotation.total_cents, &quotation.currency);

    announce(
        repo,
        dispatcher,
        Announcement::new(&order, "quotation_created")
            .to_staff(Notice::new(
                format!("Quotation issued for order #{}", order.id),
                format!("{} quoted {amount}", actor.name()),
            ))
            .to_client(
                Notice::new(
                    "You have a new quotation",
                    format!("Order #{} was quoted at {amount}", order.id),
                )
                .action("review_quotation")
                .with("quotationId", json!(quotation.id)),
            )
            .from_actor(actor),
    );
    email_client(
        repo,
        dispatcher,
        &order,
        &format!("Quotation for order #{}", order.id),
        "quotation_sent",
        json!({
            "orderId": order.id,
            "quotationId": quotation.id,
            "total": amount,
            "depositPercent": quotation.deposit_percent,
            "fileUrl": quotation.file_url,
        }),
    );

    Ok(quotation)
}

/// Record the client's one and only answer to a quotation.
pub fn respond_to_quotation<R>(
    repo: &R,
    dispatcher: &Dispatcher,
    actor: &Actor,
    quotation_id: i32,
    response: QuotationResponse,
) -> ServiceResult<QuotationAnswer>
where
    R: OrderReader
        + DocumentReader
        + WorkflowStore
        + UserReader
        + NotificationWriter
        + CustomerReader
        + ?Sized,
{
    let quotation = repo
        .get_quotation(quotation_id)?
        .ok_or(ServiceError::NotFound)?;
    let (order, authorized) = load_authorized(
        repo,
        actor,
        Capability::RespondToQuotation,
        quotation.order_id,
    )?;
    if quotation.is_answered() {
        return Err(TransitionError::QuotationAlreadyAnswered.into());
    }

    let response = QuotationResponse {
        rejection_reason: trimmed(response.rejection_reason),
        client_comment: trimmed(response.client_comment),
        ..response
    };
    let accepted = response.accepted;
    let comment = response.client_comment.clone();

    let outcome = apply_transition(
        repo,
        &order,
        &authorized,
        TransitionCommand::RespondToQuotation {
            quotation_id,
            response,
        },
        comment,
    )?;
    let TransitionRecord::Quotation(quotation) = outcome.record else {
        return Err(ServiceError::Internal(
            "quotation response was not recorded".to_string(),
        ));
    };
    let order = outcome.order;

    let announcement = Announcement::new(&order, "quotation_responded");
    let announcement = if accepted {
        announcement
            .to_staff(
                Notice::new(
                    format!("Quotation accepted for order #{}", order.id),
                    format!(
                        "{} accepted the quotation. The client may now upload the purchase order.",
                        actor.name()
                    ),
                )
                .action("await_po"),
            )
            .to_client(
                Notice::new(
                    "Please upload your purchase order",
                    format!(
                        "Thank you for accepting the quotation for order #{}.",
                        order.id
                    ),
                )
                .action("upload_po"),
            )
    } else {
        let reason = quotation
            .rejection_reason
            .clone()
            .unwrap_or_else(|| "no reason given".to_string());
        announcement.to_staff(
            Notice::new(
                format!("Quotation rejected for order #{}", order.id),
                format!("{} rejected the quotation: {reason}", actor.name()),
            )
            .action("revise_quotation")
            .with("rejectionReason", json!(quotation.rejection_reason)),
        )
    };
    announce(repo, dispatcher, announcement);

    let data = json!({
        "orderId": order.id,
        "quotationId": quotation.id,
        "accepted": accepted,
        "rejectionReason": quotation.rejection_reason,
        "clientComment": quotation.client_comment,
    });
    let verdict = if accepted { "accepted" } else { "rejected" };
    email_staff(
        repo,
        dispatcher,
        &order,
        &format!("Quotation {verdict} for order #{}", order.id),
        "quotation_response_staff",
        data.clone(),
    );
    email_client(
        repo,
        dispatcher,
        &order,
        &format!("You {verdict} the quotation for order #{}", order.id),
        "quotation_response_client",
        data,
    );

    Ok(QuotationAnswer {
        quotation,
        order: OrderView::from(order),
    })
}

/// Answer a quotation through the public tracking link of its order.
pub fn respond_by_token<R>(
    repo: &R,
    dispatcher: &Dispatcher,
    token: &str,
    quotation_id: i32,
    response: QuotationResponse,
) -> ServiceResult<QuotationAnswer>
where
    R: OrderReader
        + DocumentReader
        + WorkflowStore
        + UserReader
        + NotificationWriter
        + CustomerReader
        + ?Sized,
{
    let (actor, order) = resolve_token_client(repo, token)?;

    let belongs = repo
        .get_quotation(quotation_id)?
        .is_some_and(|quotation| quotation.order_id == order.id);
    if !belongs {
        return Err(ServiceError::NotFound);
    }

    respond_to_quotation(repo, dispatcher, &actor, quotation_id, response)
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `1234567` with `AED` becomes `12345.67 AED`.
pub fn format_money(cents: i64, currency: &str) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{sign}{}.{:02} {currency}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::testing::recording;
    use crate::domain::customer::Customer;
    use crate::domain::notification::Recipient;
    use crate::domain::order::{OrderStage, OrderStatus};
    use crate::repository::mock::FakeRepo;
    use crate::services::test_support::{
        at, client_actor, expect_fan_out, fixed_datetime, outcome, sample_order, sample_quotation, staff_actor,
    };

    fn answered(mut quotation: Quotation, response: &QuotationResponse) -> Quotation {
        quotation.accepted = Some(response.accepted);
        quotation.rejection_reason = response.rejection_reason.clone();
        quotation.client_comment = response.client_comment.clone();
        quotation.responded_at = Some(fixed_datetime());
        quotation
    }

    #[test]
    fn staff_issue_quotations_and_the_client_is_asked_to_review() {
        let mut repo = FakeRepo::new();
        let (dispatcher, _, mailer) = recording();
        let rows = expect_fan_out(&mut repo);
        let before = sample_order(7, 1, 5);

        let found = before.clone();
        repo.orders
            .expect_find_order()
            .returning(move |_| Ok(Some(found.clone())));
        repo.workflow
            .expect_transition_order()
            .withf(|request| matches!(request.command, TransitionCommand::CreateQuotation(_)))
            .returning(move |request| {
                let quotation = sample_quotation(3, &before);
                Ok(outcome(
                    request,
                    &before,
                    before.clone(),
                    TransitionRecord::Quotation(quotation),
                ))
            });

        let quotation = create_quotation(
            &repo,
            &dispatcher,
            &staff_actor(1),
            7,
            NewQuotation::new(1_000_000, "AED").with_deposit(30),
        )
        .expect("quotation created");

        assert_eq!(quotation.id, 3);
        let rows = rows.lock().expect("rows");
        let client_row = rows
            .iter()
            .find(|row| row.recipient == Recipient::Client(5))
            .expect("client notified");
        assert_eq!(client_row.metadata["actionType"], "review_quotation");
        assert_eq!(client_row.metadata["quotationId"], 3);
        assert_eq!(mailer.messages.lock().expect("mail")[0].template, "quotation_sent");
    }

    #[test]
    fn quotation_terms_are_validated_first() {
        let repo = FakeRepo::new();
        let (dispatcher, _, _) = recording();

        let mut no_percent = NewQuotation::new(1000, "AED");
        no_percent.deposit_required = true;

        for quotation in [
            NewQuotation::new(-1, "AED"),
            NewQuotation::new(1000, "dirham"),
            no_percent,
            NewQuotation::new(1000, "AED").with_deposit(120),
            NewQuotation::new(MAX_AMOUNT_CENTS + 1, "AED").with_deposit(30),
        ] {
            let result = create_quotation(&repo, &dispatcher, &staff_actor(1), 7, quotation);
            assert!(matches!(result, Err(ServiceError::Form(_))));
        }
    }

    #[test]
    fn rejection_keeps_the_order_and_tells_staff_the_reason() {
        let mut repo = FakeRepo::new();
        let (dispatcher, events, mailer) = recording();
        let rows = expect_fan_out(&mut repo);
        let before = at(
            sample_order(7, 1, 5),
            OrderStatus::QuotationSent,
            OrderStage::QuotationSent,
        );
        let quotation = sample_quotation(3, &before);

        let open = quotation.clone();
        repo.documents
            .expect_get_quotation()
            .returning(move |_| Ok(Some(open.clone())));
        let found = before.clone();
        repo.orders
            .expect_find_order()
            .returning(move |_| Ok(Some(found.clone())));
        repo.workflow
            .expect_transition_order()
            .times(1)
            .returning(move |request| {
                let TransitionCommand::RespondToQuotation { response, .. } = &request.command
                else {
                    panic!("unexpected command");
                };
                let record = TransitionRecord::Quotation(answered(quotation.clone(), response));
                Ok(outcome(request, &before, before.clone(), record))
            });

        let answer = respond_to_quotation(
            &repo,
            &dispatcher,
            &client_actor(1, 5),
            3,
            QuotationResponse::reject(Some(" budget ".to_string())),
        )
        .expect("answered");

        assert_eq!(answer.quotation.accepted, Some(false));
        assert_eq!(answer.order.order.status, OrderStatus::QuotationSent);
        assert_eq!(answer.order.order.stage, OrderStage::QuotationSent);

        let rows = rows.lock().expect("rows");
        assert!(rows.iter().all(|row| matches!(row.recipient, Recipient::Staff(_))));
        assert!(rows.iter().all(|row| row.body.contains("budget")));
        assert_eq!(events.events.lock().expect("events").len(), 1);
        // two admins and the client
        assert_eq!(mailer.messages.lock().expect("mail").len(), 3);
    }

    #[test]
    fn acceptance_asks_the_client_for_a_purchase_order() {
        let mut repo = FakeRepo::new();
        let (dispatcher, _, _) = recording();
        let rows = expect_fan_out(&mut repo);
        let before = at(
            sample_order(7, 1, 5),
            OrderStatus::QuotationSent,
            OrderStage::QuotationSent,
        );
        let quotation = sample_quotation(3, &before);

        let open = quotation.clone();
        repo.documents
            .expect_get_quotation()
            .returning(move |_| Ok(Some(open.clone())));
        let found = before.clone();
        repo.orders
            .expect_find_order()
            .returning(move |_| Ok(Some(found.clone())));
        repo.workflow
            .expect_transition_order()
            .returning(move |request| {
                let after = at(
                    before.clone(),
                    OrderStatus::Approved,
                    OrderStage::QuotationAccepted,
                );
                let record = TransitionRecord::Quotation(answered(
                    quotation.clone(),
                    &QuotationResponse::accept(),
                ));
                Ok(outcome(request, &before, after, record))
            });

        let answer = respond_to_quotation(
            &repo,
            &dispatcher,
            &client_actor(1, 5),
            3,
            QuotationResponse::accept(),
        )
        .expect("answered");

        assert_eq!(answer.order.order.stage, OrderStage::QuotationAccepted);
        let rows = rows.lock().expect("rows");
        assert!(rows.iter().any(|row| {
            row.recipient == Recipient::Client(5) && row.metadata["actionType"] == "upload_po"
        }));
        assert!(rows.iter().any(|row| {
            matches!(row.recipient, Recipient::Staff(_)) && row.metadata["actionType"] == "await_po"
        }));
    }

    #[test]
    fn answered_quotations_fail_fast() {
        let mut repo = FakeRepo::new();
        let (dispatcher, _, _) = recording();
        let order = sample_order(7, 1, 5);
        let mut quotation = sample_quotation(3, &order);
        quotation.accepted = Some(true);

        repo.documents
            .expect_get_quotation()
            .returning(move |_| Ok(Some(quotation.clone())));
        repo.orders
            .expect_find_order()
            .returning(move |_| Ok(Some(order.clone())));
        repo.workflow.expect_transition_order().never();

        let result = respond_to_quotation(
            &repo,
            &dispatcher,
            &client_actor(1, 5),
            3,
            QuotationResponse::reject(None),
        );

        assert!(matches!(
            result,
            Err(ServiceError::Transition(
                TransitionError::QuotationAlreadyAnswered
            ))
        ));
    }

    #[test]
    fn staff_cannot_answer_for_the_client() {
        let mut repo = FakeRepo::new();
        let (dispatcher, _, _) = recording();
        let order = sample_order(7, 1, 5);
        let quotation = sample_quotation(3, &order);

        repo.documents
            .expect_get_quotation()
            .returning(move |_| Ok(Some(quotation.clone())));
        repo.orders
            .expect_find_order()
            .returning(move |_| Ok(Some(order.clone())));

        let result = respond_to_quotation(
            &repo,
            &dispatcher,
            &staff_actor(1),
            3,
            QuotationResponse::accept(),
        );

        assert!(matches!(result, Err(ServiceError::Forbidden)));
    }

    #[test]
    fn tokens_only_reach_quotations_of_their_order() {
        let mut repo = FakeRepo::new();
        let (dispatcher, _, _) = recording();
        let order = sample_order(7, 1, 5);
        let foreign = sample_quotation(3, &sample_order(8, 1, 5));

        repo.orders
            .expect_get_order_by_token()
            .returning(move |_| Ok(Some(order.clone())));
        repo.customers
            .expect_get_customer_by_id()
            .returning(|id, hub_id| {
                Ok(Some(Customer {
                    id,
                    hub_id,
                    name: "Client".into(),
                    email: "client@example.com".into(),
                }))
            });
        repo.documents
            .expect_get_quotation()
            .returning(move |_| Ok(Some(foreign.clone())));

        let result = respond_by_token(
            &repo,
            &dispatcher,
            "token7",
            3,
            QuotationResponse::accept(),
        );

        assert!(matches!(result, Err(ServiceError::NotFound)));
    }

    #[test]
    fn money_is_rendered_from_minor_units() {
        assert_eq!(format_money(1_000_000, "AED"), "10000.00 AED");
        assert_eq!(format_money(305, "USD"), "3.05 USD");
        assert_eq!(format_money(-50, "EUR"), "-0.50 EUR");
    }
}
