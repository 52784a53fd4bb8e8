use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::order::{
    NewOrder as DomainNewOrder, Order as DomainOrder, OrderItem as DomainOrderItem, OrderStage,
    OrderStatus,
};
use crate::models::{decode_json, encode_json};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::orders)]
pub struct Order {
    pub id: i32,
    pub hub_id: i32,
    pub customer_id: i32,
    pub public_token: String,
    pub status: String,
    pub stage: String,
    pub notes: Option<String>,
    pub attachments: String,
    pub total_cents: Option<i64>,
    pub currency: Option<String>,
    pub deposit_percent: Option<i32>,
    pub deposit_cents: Option<i64>,
    pub deposit_paid: bool,
    pub deposit_paid_at: Option<NaiveDateTime>,
    pub final_payment_received: bool,
    pub final_payment_received_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(belongs_to(Order, foreign_key = order_id))]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::orders)]
pub struct NewOrder<'a> {
    pub hub_id: i32,
    pub customer_id: i32,
    pub public_token: &'a str,
    pub status: &'a str,
    pub stage: &'a str,
    pub notes: Option<&'a str>,
    pub attachments: String,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::order_items)]
pub struct NewOrderItem<'a> {
    pub order_id: i32,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub quantity: i32,
}

/// Column changes applied to an order row by a transition.
#[derive(AsChangeset, Default)]
#[diesel(table_name = crate::schema::orders)]
pub struct OrderChanges {
    pub status: Option<String>,
    pub stage: Option<String>,
    pub total_cents: Option<Option<i64>>,
    pub currency: Option<Option<String>>,
    pub deposit_percent: Option<Option<i32>>,
    pub deposit_cents: Option<Option<i64>>,
    pub deposit_paid: Option<bool>,
    pub deposit_paid_at: Option<Option<NaiveDateTime>>,
    pub final_payment_received: Option<bool>,
    pub final_payment_received_at: Option<Option<NaiveDateTime>>,
    pub updated_at: Option<NaiveDateTime>,
}

impl Order {
    pub fn into_domain(self, items: Vec<OrderItem>) -> DomainOrder {
        DomainOrder {
            id: self.id,
            hub_id: self.hub_id,
            customer_id: self.customer_id,
            status: self.status.parse().unwrap_or_default(),
            stage: self.stage.parse().unwrap_or_default(),
            attachments: decode_json(&self.attachments, "orders.attachments"),
            public_token: self.public_token,
            notes: self.notes,
            total_cents: self.total_cents,
            currency: self.currency,
            deposit_percent: self.deposit_percent,
            deposit_cents: self.deposit_cents,
            deposit_paid: self.deposit_paid,
            deposit_paid_at: self.deposit_paid_at,
            final_payment_received: self.final_payment_received,
            final_payment_received_at: self.final_payment_received_at,
            items: items.into_iter().map(OrderItem::into_domain).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl OrderItem {
    pub fn into_domain(self) -> DomainOrderItem {
        DomainOrderItem {
            name: self.name,
            description: self.description,
            quantity: self.quantity,
        }
    }
}

impl From<(Order, Vec<OrderItem>)> for DomainOrder {
    fn from(value: (Order, Vec<OrderItem>)) -> Self {
        value.0.into_domain(value.1)
    }
}

impl<'a> NewOrder<'a> {
    pub fn from_domain(value: &'a DomainNewOrder, public_token: &'a str) -> Self {
        Self {
            hub_id: value.hub_id,
            customer_id: value.customer_id,
            public_token,
            status: OrderStatus::Pending.as_str(),
            stage: OrderStage::Received.as_str(),
            notes: value.notes.as_deref(),
            attachments: encode_json(&value.attachments),
        }
    }
}

impl<'a> NewOrderItem<'a> {
    pub fn from_domain(order_id: i32, value: &'a DomainOrderItem) -> Self {
        Self {
            order_id,
            name: value.name.as_str(),
            description: value.description.as_deref(),
            quantity: value.quantity,
        }
    }
}
