use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::notification::{
    NewNotification as DomainNewNotification, Notification as DomainNotification, Recipient,
};
use crate::models::{decode_json, encode_json};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::notifications)]
pub struct Notification {
    pub id: i32,
    pub hub_id: i32,
    pub user_id: Option<i32>,
    pub customer_id: Option<i32>,
    pub order_id: Option<i32>,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub metadata: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::notifications)]
pub struct NewNotification<'a> {
    pub hub_id: i32,
    pub user_id: Option<i32>,
    pub customer_id: Option<i32>,
    pub order_id: Option<i32>,
    pub title: &'a str,
    pub body: &'a str,
    pub is_read: bool,
    pub metadata: String,
}

impl From<Notification> for DomainNotification {
    fn from(value: Notification) -> Self {
        Self {
            id: value.id,
            hub_id: value.hub_id,
            user_id: value.user_id,
            customer_id: value.customer_id,
            order_id: value.order_id,
            metadata: decode_json(&value.metadata, "notifications.metadata"),
            title: value.title,
            body: value.body,
            is_read: value.is_read,
            created_at: value.created_at,
        }
    }
}

impl<'a> From<&'a DomainNewNotification> for NewNotification<'a> {
    fn from(value: &'a DomainNewNotification) -> Self {
        let (user_id, customer_id) = match value.recipient {
            Recipient::Staff(user_id) => (Some(user_id), None),
            Recipient::Client(customer_id) => (None, Some(customer_id)),
        };

        Self {
            hub_id: value.hub_id,
            user_id,
            customer_id,
            order_id: value.order_id,
            title: value.title.as_str(),
            body: value.body.as_str(),
            is_read: value.is_read,
            metadata: encode_json(&value.metadata),
        }
    }
}
