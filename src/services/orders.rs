//! Order submission, staff status and stage changes, cancellation and the
//! read side: lists, detail pages, the public tracking view and timelines.

use pushkind_common::pagination::DEFAULT_ITEMS_PER_PAGE;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::dispatch::Dispatcher;
use crate::domain::delivery_note::DeliveryNote;
use crate::domain::history::{HistoryAction, HistoryEntry};
use crate::domain::order::{
    NewOrder, Order, OrderItem, OrderListQuery, OrderStage, OrderStatus, tracking_url,
};
use crate::domain::payment::Payment;
use crate::domain::purchase_order::PurchaseOrder;
use crate::domain::quotation::Quotation;
use crate::domain::transition::TransitionCommand;
use crate::domain::workflow::{
    Plan, WorkflowContext, allowed_client_operations, allowed_operations,
};
use crate::repository::{
    CustomerReader, DocumentReader, HistoryReader, NotificationWriter, OrderReader, OrderWriter,
    UserReader, WorkflowStore,
};
use crate::services::access::{Actor, Capability, load_authorized};
use crate::services::notifications::{Announcement, Notice, announce, email_client};
use crate::services::{ServiceError, ServiceResult, apply_transition};

/// What a client submits when requesting an order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderRequest {
    pub items: Vec<OrderItem>,
    pub notes: Option<String>,
    /// File references already stored by the file store.
    pub attachments: Vec<String>,
}

/// Returned to the client right after submission.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    pub order_id: i32,
    pub public_token: String,
    pub tracking_url: String,
}

/// Order together with the values derived from its stage.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub status_label: &'static str,
    pub stage_label: &'static str,
    pub progress: u8,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            status_label: order.status.label(),
            stage_label: order.stage.label(),
            progress: order.progress_percent(),
            order,
        }
    }
}

/// Query parameters of the order lists.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
    pub stage: Option<String>,
    pub search: Option<String>,
    pub page: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct OrderPage {
    pub orders: Vec<OrderView>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    pub search: Option<String>,
}

/// One replayed history entry.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TimelineEntry {
    pub action: HistoryAction,
    pub label: &'static str,
    pub actor_name: Option<String>,
    /// `(status, stage)` the entry left the order in, when it recorded one.
    pub status: Option<OrderStatus>,
    pub stage: Option<OrderStage>,
    pub progress: Option<u8>,
    pub note: Option<String>,
    pub at: chrono::NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub order: OrderView,
    pub quotations: Vec<Quotation>,
    pub purchase_orders: Vec<PurchaseOrder>,
    pub delivery_notes: Vec<DeliveryNote>,
    pub payments: Vec<Payment>,
    pub timeline: Vec<TimelineEntry>,
    /// Operations the viewer may attempt from the current state.
    pub allowed_operations: Vec<&'static str>,
}

/// One step of the progress bar on the tracking page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StageStep {
    pub stage: OrderStage,
    pub label: &'static str,
    pub done: bool,
    pub current: bool,
}

/// What the holder of a public token sees.
#[derive(Debug, Serialize)]
pub struct TrackingView {
    pub order: OrderView,
    pub steps: Vec<StageStep>,
    /// Quotation still waiting for the client's answer.
    pub open_quotation: Option<Quotation>,
    pub timeline: Vec<TimelineEntry>,
}

fn validate_items(items: &[OrderItem]) -> ServiceResult<Vec<OrderItem>> {
    if items.is_empty() {
        return Err(ServiceError::Form(
            "at least one item is required".to_string(),
        ));
    }

    items
        .iter()
        .map(|item| {
            let name = item.name.trim();
            if name.is_empty() {
                return Err(ServiceError::Form("item name is required".to_string()));
            }
            if item.quantity < 1 {
                return Err(ServiceError::Form(format!(
                    "quantity of `{name}` must be at least 1"
                )));
            }
            Ok(OrderItem {
                name: name.to_string(),
                description: item
                    .description
                    .as_deref()
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string),
                quantity: item.quantity,
            })
        })
        .collect()
}

/// Register a new order for the calling client.
pub fn create_order<R>(
    repo: &R,
    dispatcher: &Dispatcher,
    actor: &Actor,
    request: OrderRequest,
    tracking_base: &str,
) -> ServiceResult<OrderReceipt>
where
    R: OrderWriter + UserReader + NotificationWriter + CustomerReader + ?Sized,
{
    let Actor::Client(client) = actor else {
        return Err(ServiceError::Forbidden);
    };

    let items = validate_items(&request.items)?;
    let mut new_order = NewOrder::new(client.hub_id, client.customer_id, items)
        .with_attachments(request.attachments);
    if let Some(notes) = request.notes.as_deref().map(str::trim) {
        if !notes.is_empty() {
            new_order = new_order.with_notes(notes);
        }
    }

    let order = repo.create_order(&new_order, &actor.history_actor())?;
    log::info!(
        "Order {} created by customer {} of hub {}",
        order.id,
        client.customer_id,
        order.hub_id
    );

    let tracking = tracking_url(tracking_base, &order.public_token);

    announce(
        repo,
        dispatcher,
        Announcement::new(&order, "order_created").to_staff(
            Notice::new(
                format!("New order #{}", order.id),
                format!(
                    "{} requested {} item(s)",
                    client.name,
                    order.items.len()
                ),
            )
            .action("review_order"),
        ),
    );
    email_client(
        repo,
        dispatcher,
        &order,
        "We received your request",
        "order_received",
        json!({ "orderId": order.id, "trackingUrl": tracking }),
    );

    Ok(OrderReceipt {
        order_id: order.id,
        public_token: order.public_token,
        tracking_url: tracking,
    })
}

/// Move an order to `status` on behalf of staff.
pub fn set_status<R>(
    repo: &R,
    dispatcher: &Dispatcher,
    actor: &Actor,
    order_id: i32,
    status: OrderStatus,
    note: Option<String>,
) -> ServiceResult<Order>
where
    R: OrderReader + WorkflowStore + UserReader + NotificationWriter + CustomerReader + ?Sized,
{
    let (order, authorized) = load_authorized(repo, actor, Capability::ManageOrder, order_id)?;
    let outcome = apply_transition(
        repo,
        &order,
        &authorized,
        TransitionCommand::SetStatus(status),
        note.clone(),
    )?;
    let order = outcome.order;

    let mut client_notice = Notice::new(
        "Your order status changed",
        format!("Order #{} is now {}", order.id, order.status.label()),
    );
    if let Some(note) = note.as_deref().filter(|value| !value.trim().is_empty()) {
        client_notice = client_notice.with("note", json!(note));
    }

    announce(
        repo,
        dispatcher,
        Announcement::new(&order, "order_updated")
            .to_staff(Notice::new(
                format!("Order #{} status updated", order.id),
                format!(
                    "{} set order #{} to {}",
                    actor.name(),
                    order.id,
                    order.status.label()
                ),
            ))
            .to_client(client_notice)
            .from_actor(actor),
    );
    email_client(
        repo,
        dispatcher,
        &order,
        &format!("Order #{} is {}", order.id, order.status.label()),
        "order_status_changed",
        json!({
            "orderId": order.id,
            "previousStatus": outcome.previous.status,
            "status": order.status,
            "stage": order.stage,
            "note": note,
        }),
    );

    Ok(order)
}

/// Move an order forward to `stage` on behalf of staff.
pub fn advance_stage<R>(
    repo: &R,
    dispatcher: &Dispatcher,
    actor: &Actor,
    order_id: i32,
    stage: OrderStage,
    note: Option<String>,
) -> ServiceResult<Order>
where
    R: OrderReader + WorkflowStore + UserReader + NotificationWriter + CustomerReader + ?Sized,
{
    let (order, authorized) = load_authorized(repo, actor, Capability::ManageOrder, order_id)?;
    let outcome = apply_transition(
        repo,
        &order,
        &authorized,
        TransitionCommand::AdvanceStage(stage),
        note,
    )?;
    let order = outcome.order;

    announce(
        repo,
        dispatcher,
        Announcement::new(&order, "order_updated")
            .to_staff(Notice::new(
                format!("Order #{} moved to {}", order.id, order.stage.label()),
                format!("{} advanced the order", actor.name()),
            ))
            .to_client(Notice::new(
                "Your order progressed",
                format!(
                    "Order #{} is now at \"{}\" ({}%)",
                    order.id,
                    order.stage.label(),
                    order.progress_percent()
                ),
            ))
            .from_actor(actor),
    );
    email_client(
        repo,
        dispatcher,
        &order,
        &format!("Order #{}: {}", order.id, order.stage.label()),
        "order_stage_changed",
        json!({
            "orderId": order.id,
            "stage": order.stage,
            "progress": order.progress_percent(),
        }),
    );

    Ok(order)
}

/// Withdraw an order before a purchase order is prepared.
pub fn cancel_order<R>(
    repo: &R,
    dispatcher: &Dispatcher,
    actor: &Actor,
    order_id: i32,
    note: Option<String>,
) -> ServiceResult<Order>
where
    R: OrderReader + WorkflowStore + UserReader + NotificationWriter + CustomerReader + ?Sized,
{
    let (order, authorized) = load_authorized(repo, actor, Capability::CancelOrder, order_id)?;
    let outcome = apply_transition(repo, &order, &authorized, TransitionCommand::Cancel, note)?;
    let order = outcome.order;

    let mut announcement = Announcement::new(&order, "order_cancelled")
        .to_staff(Notice::new(
            format!("Order #{} cancelled", order.id),
            format!("{} cancelled the order", actor.name()),
        ))
        .from_actor(actor);
    if actor.is_staff() {
        announcement = announcement.to_client(Notice::new(
            "Your order was cancelled",
            format!("Order #{} has been cancelled", order.id),
        ));
    }
    announce(repo, dispatcher, announcement);
    email_client(
        repo,
        dispatcher,
        &order,
        &format!("Order #{} cancelled", order.id),
        "order_cancelled",
        json!({ "orderId": order.id }),
    );

    Ok(order)
}

/// Orders visible to the actor: the whole hub for staff, their own for clients.
pub fn list_orders<R>(repo: &R, actor: &Actor, filter: OrderFilter) -> ServiceResult<OrderPage>
where
    R: OrderReader + ?Sized,
{
    let page = filter.page.unwrap_or(1).max(1);
    let mut query = OrderListQuery::new(actor.hub_id()).paginate(page, DEFAULT_ITEMS_PER_PAGE);

    if let Actor::Client(client) = actor {
        query = query.customer_id(client.customer_id);
    }
    if let Some(status) = non_blank(&filter.status) {
        let status = status
            .parse::<OrderStatus>()
            .map_err(|err| ServiceError::Form(err.to_string()))?;
        query = query.status(status);
    }
    if let Some(stage) = non_blank(&filter.stage) {
        let stage = stage
            .parse::<OrderStage>()
            .map_err(|err| ServiceError::Form(err.to_string()))?;
        query = query.stage(stage);
    }
    let search = non_blank(&filter.search).map(str::to_string);
    if let Some(term) = &search {
        query = query.search(term);
    }

    let (total, orders) = repo.list_orders(query)?;

    Ok(OrderPage {
        orders: orders.into_iter().map(OrderView::from).collect(),
        page,
        total_pages: total.div_ceil(DEFAULT_ITEMS_PER_PAGE),
        total,
        search,
    })
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Everything shown on the order page.
pub fn load_order_detail<R>(repo: &R, actor: &Actor, order_id: i32) -> ServiceResult<OrderDetail>
where
    R: OrderReader + DocumentReader + HistoryReader + ?Sized,
{
    let (order, _) = load_authorized(repo, actor, Capability::ViewOrder, order_id)?;

    let quotations = repo.list_quotations(order.id, order.hub_id)?;
    let purchase_orders = repo.list_purchase_orders(order.id, order.hub_id)?;
    let delivery_notes = repo.list_delivery_notes(order.id, order.hub_id)?;
    let payments = repo.list_payments(order.id, order.hub_id)?;
    let history = repo.list_history(order.id, order.hub_id)?;

    let context = workflow_context(&order, &quotations, &purchase_orders);
    let mut allowed = if actor.is_staff() {
        allowed_operations(&context)
    } else {
        allowed_client_operations(&context)
    };
    if !quotations.iter().any(|quotation| !quotation.is_answered()) {
        allowed.retain(|name| !matches!(*name, "accept_quotation" | "reject_quotation"));
    }

    Ok(OrderDetail {
        order: OrderView::from(order),
        quotations,
        purchase_orders,
        delivery_notes,
        payments,
        timeline: replay_timeline(&history),
        allowed_operations: allowed,
    })
}

/// Workflow facts of `order` derived from its documents.
pub fn workflow_context(
    order: &Order,
    quotations: &[Quotation],
    purchase_orders: &[PurchaseOrder],
) -> WorkflowContext {
    WorkflowContext {
        status: order.status,
        stage: order.stage,
        deposit_paid: order.deposit_paid,
        final_payment_received: order.final_payment_received,
        has_purchase_order: !purchase_orders.is_empty(),
        has_accepted_quotation_file: quotations
            .iter()
            .any(|quotation| quotation.accepted == Some(true) && quotation.file_url.is_some()),
        quotation_answered: false,
    }
}

/// Public tracking view of the order behind `token`.
pub fn track_order<R>(repo: &R, token: &str) -> ServiceResult<TrackingView>
where
    R: OrderReader + DocumentReader + HistoryReader + ?Sized,
{
    let order = repo
        .get_order_by_token(token.trim())?
        .ok_or(ServiceError::NotFound)?;

    let open_quotation = repo
        .list_quotations(order.id, order.hub_id)?
        .into_iter()
        .filter(|quotation| !quotation.is_answered())
        .max_by_key(|quotation| quotation.id);
    let history = repo.list_history(order.id, order.hub_id)?;

    Ok(TrackingView {
        steps: stage_steps(order.stage),
        open_quotation,
        timeline: replay_timeline(&history),
        order: OrderView::from(order),
    })
}

/// Progress bar steps with everything up to `current` marked done.
pub fn stage_steps(current: OrderStage) -> Vec<StageStep> {
    OrderStage::ALL
        .into_iter()
        .map(|stage| StageStep {
            stage,
            label: stage.label(),
            done: stage <= current,
            current: stage == current,
        })
        .collect()
}

/// Rebuild the timeline of an order from its history entries, oldest first.
pub fn replay_timeline(entries: &[HistoryEntry]) -> Vec<TimelineEntry> {
    let mut ordered: Vec<&HistoryEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| (entry.created_at, entry.id));

    ordered
        .into_iter()
        .map(|entry| {
            let status = entry
                .payload_str("newStatus")
                .and_then(|value| value.parse::<OrderStatus>().ok());
            let stage = entry
                .payload_str("newStage")
                .and_then(|value| value.parse::<OrderStage>().ok());

            TimelineEntry {
                action: entry.action,
                label: entry.action.label(),
                actor_name: entry.actor.name.clone(),
                status,
                stage,
                progress: stage.map(OrderStage::progress_percent),
                note: entry.payload_str("note").map(str::to_string),
                at: entry.created_at,
            }
        })
        .collect()
}

/// `(status, stage)` the order holds after replaying `timeline`.
pub fn replayed_state(timeline: &[TimelineEntry]) -> Option<Plan> {
    timeline
        .iter()
        .rev()
        .find_map(|entry| match (entry.status, entry.stage) {
            (Some(status), Some(stage)) => Some(Plan { status, stage }),
            _ => None,
        })
}
