//! Notification fan-out after committed transitions, and the inbox.

use pushkind_common::pagination::DEFAULT_ITEMS_PER_PAGE;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::dispatch::{Dispatcher, EmailMessage, LiveEvent, company_channel};
use crate::domain::notification::{
    NewNotification, Notification, NotificationListQuery, Recipient,
};
use crate::domain::order::Order;
use crate::repository::{CustomerReader, NotificationReader, NotificationWriter, UserReader};
use crate::services::ServiceResult;
use crate::services::access::Actor;

/// Text of a notification for one audience.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub metadata: Map<String, Value>,
}

impl Notice {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            metadata: Map::new(),
        }
    }

    /// Flag the notice as asking the recipient to do `action_type`.
    pub fn action(mut self, action_type: &str) -> Self {
        self.metadata
            .insert("actionType".to_string(), json!(action_type));
        self.metadata.insert("actionRequired".to_string(), json!(true));
        self
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Everything to tell about one committed change of an order.
#[derive(Debug, Clone)]
pub struct Announcement<'a> {
    pub order: &'a Order,
    /// Live event name.
    pub event: &'static str,
    pub staff: Option<Notice>,
    pub client: Option<Notice>,
    /// Staff member behind the change; their own copy is stored as read.
    pub originator: Option<i32>,
}

impl<'a> Announcement<'a> {
    pub fn new(order: &'a Order, event: &'static str) -> Self {
        Self {
            order,
            event,
            staff: None,
            client: None,
            originator: None,
        }
    }

    pub fn to_staff(mut self, notice: Notice) -> Self {
        self.staff = Some(notice);
        self
    }

    pub fn to_client(mut self, notice: Notice) -> Self {
        self.client = Some(notice);
        self
    }

    pub fn from_actor(mut self, actor: &Actor) -> Self {
        self.originator = actor.staff_user_id();
        self
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanOutReport {
    pub notifications: usize,
    pub event_emitted: bool,
}

/// Staff ids notified about orders of `hub_id`, each at most once.
fn staff_recipients<R>(repo: &R, hub_id: i32, originator: Option<i32>) -> Vec<i32>
where
    R: UserReader + ?Sized,
{
    let mut ids: Vec<i32> = match repo.list_admins(hub_id) {
        Ok(admins) => admins.into_iter().map(|admin| admin.id).collect(),
        Err(err) => {
            log::error!("Failed to load admins of hub {hub_id}: {err}");
            Vec::new()
        }
    };

    if let Some(originator) = originator {
        ids.push(originator);
    }

    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(*id));
    ids
}

fn notification(order: &Order, recipient: Recipient, notice: &Notice, is_read: bool) -> NewNotification {
    let mut metadata = notice.metadata.clone();
    metadata.insert("orderId".to_string(), json!(order.id));
    metadata.insert("status".to_string(), json!(order.status));
    metadata.insert("stage".to_string(), json!(order.stage));

    NewNotification {
        hub_id: order.hub_id,
        recipient,
        order_id: Some(order.id),
        title: notice.title.clone(),
        body: notice.body.clone(),
        is_read,
        metadata: Value::Object(metadata),
    }
}

/// Write the notification rows and emit the live event of a change.
///
/// Failures are logged and reported; they never undo the change.
pub fn announce<R>(repo: &R, dispatcher: &Dispatcher, announcement: Announcement<'_>) -> FanOutReport
where
    R: UserReader + NotificationWriter + ?Sized,
{
    let order = announcement.order;
    let mut rows = Vec::new();

    if let Some(notice) = &announcement.staff {
        for user_id in staff_recipients(repo, order.hub_id, announcement.originator) {
            let is_read = announcement.originator == Some(user_id);
            rows.push(notification(order, Recipient::Staff(user_id), notice, is_read));
        }
    }

    if let Some(notice) = &announcement.client {
        rows.push(notification(
            order,
            Recipient::Client(order.customer_id),
            notice,
            false,
        ));
    }

    let notifications = match repo.create_notifications(&rows) {
        Ok(count) => count,
        Err(err) => {
            log::error!(
                "Failed to store notifications for order {}: {err}",
                order.id
            );
            0
        }
    };

    let title = announcement
        .staff
        .as_ref()
        .or(announcement.client.as_ref())
        .map(|notice| notice.title.clone());
    let event = LiveEvent::for_order(announcement.event, order, json!({ "title": title }));
    let event_emitted = dispatcher.emit(&company_channel(order.hub_id), &event);

    FanOutReport {
        notifications,
        event_emitted,
    }
}

/// Email the client that owns `order`, best effort.
pub fn email_client<R>(
    repo: &R,
    dispatcher: &Dispatcher,
    order: &Order,
    subject: &str,
    template: &str,
    data: Value,
) -> bool
where
    R: CustomerReader + ?Sized,
{
    match repo.get_customer_by_id(order.customer_id, order.hub_id) {
        Ok(Some(customer)) => {
            dispatcher.send_email(&EmailMessage::new(customer.email, subject, template, data))
        }
        Ok(None) => {
            log::warn!("Order {} has no customer to email", order.id);
            false
        }
        Err(err) => {
            log::error!("Failed to load customer of order {}: {err}", order.id);
            false
        }
    }
}

/// Email every admin of the order's hub, best effort. Returns the number sent.
pub fn email_staff<R>(
    repo: &R,
    dispatcher: &Dispatcher,
    order: &Order,
    subject: &str,
    template: &str,
    data: Value,
) -> usize
where
    R: UserReader + ?Sized,
{
    let admins = match repo.list_admins(order.hub_id) {
        Ok(admins) => admins,
        Err(err) => {
            log::error!("Failed to load admins of hub {}: {err}", order.hub_id);
            return 0;
        }
    };

    admins
        .into_iter()
        .filter(|admin| {
            dispatcher.send_email(&EmailMessage::new(
                admin.email.clone(),
                subject,
                template,
                data.clone(),
            ))
        })
        .count()
}

/// Query parameters accepted by the inbox endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct InboxQuery {
    pub page: Option<usize>,
    #[serde(default)]
    pub unread: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxPage {
    pub notifications: Vec<Notification>,
    pub page: usize,
    pub total_pages: usize,
    pub unread: usize,
}

/// Notifications addressed to the actor, newest first.
pub fn load_inbox<R>(repo: &R, actor: &Actor, query: InboxQuery) -> ServiceResult<InboxPage>
where
    R: NotificationReader + ?Sized,
{
    let page = query.page.unwrap_or(1).max(1);
    let mut list_query = NotificationListQuery::new(actor.hub_id(), actor.recipient())
        .paginate(page, DEFAULT_ITEMS_PER_PAGE);
    if query.unread {
        list_query = list_query.unread_only();
    }

    let (total, notifications) = repo.list_notifications(list_query)?;
    let unread = repo.count_unread(actor.hub_id(), actor.recipient())?;

    Ok(InboxPage {
        notifications,
        page,
        total_pages: total.div_ceil(DEFAULT_ITEMS_PER_PAGE),
        unread,
    })
}

pub fn mark_read<R>(repo: &R, actor: &Actor, notification_id: i32) -> ServiceResult<()>
where
    R: NotificationWriter + ?Sized,
{
    repo.mark_notification_read(notification_id, actor.hub_id(), actor.recipient())?;
    Ok(())
}

pub fn mark_all_read<R>(repo: &R, actor: &Actor) -> ServiceResult<usize>
where
    R: NotificationWriter + ?Sized,
{
    Ok(repo.mark_all_notifications_read(actor.hub_id(), actor.recipient())?)
}
