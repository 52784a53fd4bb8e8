use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::payment::{Payment as DomainPayment, PaymentKind};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::payments)]
pub struct Payment {
    pub id: i32,
    pub order_id: i32,
    pub hub_id: i32,
    pub kind: String,
    pub amount_cents: i64,
    pub currency: String,
    pub reference: Option<String>,
    pub recorded_by: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::payments)]
pub struct NewPayment<'a> {
    pub order_id: i32,
    pub hub_id: i32,
    pub kind: &'a str,
    pub amount_cents: i64,
    pub currency: &'a str,
    pub reference: Option<&'a str>,
    pub recorded_by: Option<i32>,
}

impl From<Payment> for DomainPayment {
    fn from(value: Payment) -> Self {
        Self {
            id: value.id,
            order_id: value.order_id,
            hub_id: value.hub_id,
            kind: value.kind.parse().unwrap_or(PaymentKind::Final),
            amount_cents: value.amount_cents,
            currency: value.currency,
            reference: value.reference,
            recorded_by: value.recorded_by,
            created_at: value.created_at,
        }
    }
}
