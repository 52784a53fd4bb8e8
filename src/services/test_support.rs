use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use pushkind_common::domain::auth::AuthenticatedUser;
use serde_json::{Value, json};

use crate::domain::customer::Customer;
use crate::domain::history::{HistoryAction, HistoryActor, HistoryEntry};
use crate::domain::notification::NewNotification;
use crate::domain::order::{Order, OrderItem, OrderStage, OrderStatus};
use crate::domain::purchase_order::PurchaseOrder;
use crate::domain::quotation::Quotation;
use crate::domain::transition::{TransitionOutcome, TransitionRecord, TransitionRequest};
use crate::domain::user::User;
use crate::domain::workflow::Plan;
use crate::repository::mock::FakeRepo;
use crate::services::access::{Actor, ClientActor, StaffActor};

pub fn fixed_datetime() -> NaiveDateTime {
    match NaiveDate::from_ymd_opt(2024, 1, 1) {
        Some(date) => date.and_hms_opt(0, 0, 0).unwrap_or_default(),
        None => NaiveDateTime::default(),
    }
}

pub fn user_with_roles(roles: &[&str]) -> AuthenticatedUser {
    AuthenticatedUser {
        sub: "1".to_string(),
        email: "user@example.com".to_string(),
        hub_id: 1,
        name: "User".to_string(),
        roles: roles.iter().map(|role| role.to_string()).collect(),
        exp: 0,
    }
}

pub fn staff_actor(hub_id: i32) -> Actor {
    Actor::Staff(StaffActor {
        user_id: 1,
        hub_id,
        name: "Staff".to_string(),
        email: "staff@example.com".to_string(),
    })
}

pub fn client_actor(hub_id: i32, customer_id: i32) -> Actor {
    Actor::Client(ClientActor {
        customer_id,
        hub_id,
        name: "Client".to_string(),
        email: "client@example.com".to_string(),
    })
}

pub fn admin(id: i32, hub_id: i32) -> User {
    User {
        id,
        hub_id,
        name: format!("Admin {id}"),
        email: format!("admin{id}@example.com"),
        is_admin: true,
    }
}

pub fn sample_order(id: i32, hub_id: i32, customer_id: i32) -> Order {
    Order {
        id,
        hub_id,
        customer_id,
        public_token: format!("token{id}"),
        status: OrderStatus::Pending,
        stage: OrderStage::Received,
        notes: None,
        attachments: Vec::new(),
        total_cents: None,
        currency: None,
        deposit_percent: None,
        deposit_cents: None,
        deposit_paid: false,
        deposit_paid_at: None,
        final_payment_received: false,
        final_payment_received_at: None,
        items: vec![OrderItem {
            name: "Steel frame".to_string(),
            description: None,
            quantity: 2,
        }],
        created_at: fixed_datetime(),
        updated_at: fixed_datetime(),
    }
}

pub fn at(mut order: Order, status: OrderStatus, stage: OrderStage) -> Order {
    order.status = status;
    order.stage = stage;
    order
}

pub fn sample_quotation(id: i32, order: &Order) -> Quotation {
    Quotation {
        id,
        order_id: order.id,
        hub_id: order.hub_id,
        total_cents: 1_000_000,
        currency: "AED".to_string(),
        deposit_required: true,
        deposit_percent: Some(30),
        file_url: None,
        notes: None,
        accepted: None,
        rejection_reason: None,
        client_comment: None,
        responded_at: None,
        created_by: Some(1),
        created_at: fixed_datetime(),
        updated_at: fixed_datetime(),
    }
}

pub fn sample_purchase_order(id: i32, order: &Order) -> PurchaseOrder {
    PurchaseOrder {
        id,
        order_id: order.id,
        hub_id: order.hub_id,
        po_number: "PO-1".to_string(),
        files: vec!["/uploads/1/po.pdf".to_string()],
        deposit_required: true,
        deposit_percent: Some(30),
        deposit_cents: Some(300_000),
        deposit_proof_files: Vec::new(),
        submitted_by_client: true,
        created_by: None,
        created_at: fixed_datetime(),
        updated_at: fixed_datetime(),
    }
}

/// Outcome the store would return for `request` moving `before` to `after`.
pub fn outcome(
    request: &TransitionRequest,
    before: &Order,
    after: Order,
    record: TransitionRecord,
) -> TransitionOutcome {
    TransitionOutcome {
        previous: Plan {
            status: before.status,
            stage: before.stage,
        },
        history: HistoryEntry {
            id: 1,
            order_id: before.id,
            hub_id: before.hub_id,
            actor: request.actor.clone(),
            action: request.command.operation().history_action(),
            payload: json!({
                "previousStatus": before.status,
                "newStatus": after.status,
                "previousStage": before.stage,
                "newStage": after.stage,
            }),
            created_at: fixed_datetime(),
        },
        order: after,
        record,
    }
}

pub fn sample_customer(id: i32, hub_id: i32) -> Customer {
    Customer {
        id,
        hub_id,
        name: "Client".to_string(),
        email: "client@example.com".to_string(),
    }
}

pub fn history_entry(
    id: i32,
    action: HistoryAction,
    payload: Value,
    created_at: NaiveDateTime,
) -> HistoryEntry {
    HistoryEntry {
        id,
        order_id: 7,
        hub_id: 1,
        actor: HistoryActor::staff(1, "Staff"),
        action,
        payload,
        created_at,
    }
}

/// Accept every fan-out write: two admins, one customer. Returns the stored rows.
pub fn expect_fan_out(repo: &mut FakeRepo) -> Arc<Mutex<Vec<NewNotification>>> {
    let rows = Arc::new(Mutex::new(Vec::new()));

    repo.users
        .expect_list_admins()
        .returning(|hub_id| Ok(vec![admin(1, hub_id), admin(2, hub_id)]));
    repo.customers
        .expect_get_customer_by_id()
        .returning(|id, hub_id| Ok(Some(sample_customer(id, hub_id))));

    let stored = rows.clone();
    repo.notification_writer
        .expect_create_notifications()
        .returning(move |new_rows| {
            stored.lock().expect("rows lock").extend_from_slice(new_rows);
            Ok(new_rows.len())
        });

    rows
}
