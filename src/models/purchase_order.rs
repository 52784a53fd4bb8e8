use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::purchase_order::{
    NewPurchaseOrder as DomainNewPurchaseOrder, PurchaseOrder as DomainPurchaseOrder,
};
use crate::models::{decode_json, encode_json};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::purchase_orders)]
pub struct PurchaseOrder {
    pub id: i32,
    pub order_id: i32,
    pub hub_id: i32,
    pub po_number: String,
    pub files: String,
    pub deposit_required: bool,
    pub deposit_percent: Option<i32>,
    pub deposit_cents: Option<i64>,
    pub deposit_proof_files: String,
    pub submitted_by_client: bool,
    pub created_by: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::purchase_orders)]
pub struct NewPurchaseOrder<'a> {
    pub order_id: i32,
    pub hub_id: i32,
    pub po_number: &'a str,
    pub files: String,
    pub deposit_required: bool,
    pub deposit_percent: Option<i32>,
    pub deposit_cents: Option<i64>,
    pub submitted_by_client: bool,
    pub created_by: Option<i32>,
}

impl From<PurchaseOrder> for DomainPurchaseOrder {
    fn from(value: PurchaseOrder) -> Self {
        Self {
            id: value.id,
            order_id: value.order_id,
            hub_id: value.hub_id,
            files: decode_json(&value.files, "purchase_orders.files"),
            deposit_proof_files: decode_json(
                &value.deposit_proof_files,
                "purchase_orders.deposit_proof_files",
            ),
            po_number: value.po_number,
            deposit_required: value.deposit_required,
            deposit_percent: value.deposit_percent,
            deposit_cents: value.deposit_cents,
            submitted_by_client: value.submitted_by_client,
            created_by: value.created_by,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl<'a> NewPurchaseOrder<'a> {
    pub fn from_domain(
        order_id: i32,
        hub_id: i32,
        created_by: Option<i32>,
        deposit_cents: Option<i64>,
        value: &'a DomainNewPurchaseOrder,
    ) -> Self {
        Self {
            order_id,
            hub_id,
            po_number: value.po_number.as_str(),
            files: encode_json(&value.files),
            deposit_required: value.deposit.required,
            deposit_percent: value.deposit.percent,
            deposit_cents,
            submitted_by_client: value.submitted_by_client,
            created_by,
        }
    }
}
