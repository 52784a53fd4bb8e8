use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::delivery_note::{
    DeliveryNote as DomainDeliveryNote, NewDeliveryNote as DomainNewDeliveryNote,
};
use crate::models::{decode_json, encode_json};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::delivery_notes)]
pub struct DeliveryNote {
    pub id: i32,
    pub order_id: i32,
    pub hub_id: i32,
    pub dn_number: String,
    pub items: String,
    pub files: String,
    pub delivered_at: Option<NaiveDateTime>,
    pub created_by: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::delivery_notes)]
pub struct NewDeliveryNote<'a> {
    pub order_id: i32,
    pub hub_id: i32,
    pub dn_number: &'a str,
    pub items: String,
    pub files: String,
    pub delivered_at: Option<NaiveDateTime>,
    pub created_by: Option<i32>,
}

impl From<DeliveryNote> for DomainDeliveryNote {
    fn from(value: DeliveryNote) -> Self {
        Self {
            id: value.id,
            order_id: value.order_id,
            hub_id: value.hub_id,
            items: decode_json(&value.items, "delivery_notes.items"),
            files: decode_json(&value.files, "delivery_notes.files"),
            dn_number: value.dn_number,
            delivered_at: value.delivered_at,
            created_by: value.created_by,
            created_at: value.created_at,
        }
    }
}

impl<'a> NewDeliveryNote<'a> {
    pub fn from_domain(
        order_id: i32,
        hub_id: i32,
        created_by: Option<i32>,
        value: &'a DomainNewDeliveryNote,
    ) -> Self {
        Self {
            order_id,
            hub_id,
            dn_number: value.dn_number.as_str(),
            items: encode_json(&value.items),
            files: encode_json(&value.files),
            delivered_at: value.delivered_at,
            created_by,
        }
    }
}
