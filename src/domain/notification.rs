use chrono::NaiveDateTime;
use pushkind_common::pagination::Pagination;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// In-app notification for a staff user or for a client.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    pub id: i32,
    pub hub_id: i32,
    /// Staff recipient.
    pub user_id: Option<i32>,
    /// Client recipient, when the notification is not addressed to staff.
    pub customer_id: Option<i32>,
    pub order_id: Option<i32>,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    /// Routing hints for the UI, e.g. `{"actionType": "upload_po"}`.
    pub metadata: Value,
    pub created_at: NaiveDateTime,
}

/// Recipient of a notification row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recipient {
    Staff(i32),
    Client(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub hub_id: i32,
    pub recipient: Recipient,
    pub order_id: Option<i32>,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub metadata: Value,
}

/// Query definition used to list notifications of one recipient.
#[derive(Debug, Clone)]
pub struct NotificationListQuery {
    pub hub_id: i32,
    pub recipient: Recipient,
    pub unread_only: bool,
    pub pagination: Option<Pagination>,
}

impl NotificationListQuery {
    pub fn new(hub_id: i32, recipient: Recipient) -> Self {
        Self {
            hub_id,
            recipient,
            unread_only: false,
            pagination: None,
        }
    }

    pub fn unread_only(mut self) -> Self {
        self.unread_only = true;
        self
    }

    /// Apply pagination to the query with the given page number and page size.
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}
