use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::quotation::{NewQuotation as DomainNewQuotation, Quotation as DomainQuotation};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::quotations)]
pub struct Quotation {
    pub id: i32,
    pub order_id: i32,
    pub hub_id: i32,
    pub total_cents: i64,
    pub currency: String,
    pub deposit_required: bool,
    pub deposit_percent: Option<i32>,
    pub file_url: Option<String>,
    pub notes: Option<String>,
    pub accepted: Option<bool>,
    pub rejection_reason: Option<String>,
    pub client_comment: Option<String>,
    pub responded_at: Option<NaiveDateTime>,
    pub created_by: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::quotations)]
pub struct NewQuotation<'a> {
    pub order_id: i32,
    pub hub_id: i32,
    pub total_cents: i64,
    pub currency: &'a str,
    pub deposit_required: bool,
    pub deposit_percent: Option<i32>,
    pub file_url: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub created_by: Option<i32>,
}

/// One-time client response written onto a quotation row.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::quotations)]
pub struct QuotationResponse<'a> {
    pub accepted: Option<bool>,
    pub rejection_reason: Option<&'a str>,
    pub client_comment: Option<&'a str>,
    pub responded_at: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

impl From<Quotation> for DomainQuotation {
    fn from(value: Quotation) -> Self {
        Self {
            id: value.id,
            order_id: value.order_id,
            hub_id: value.hub_id,
            total_cents: value.total_cents,
            currency: value.currency,
            deposit_required: value.deposit_required,
            deposit_percent: value.deposit_percent,
            file_url: value.file_url,
            notes: value.notes,
            accepted: value.accepted,
            rejection_reason: value.rejection_reason,
            client_comment: value.client_comment,
            responded_at: value.responded_at,
            created_by: value.created_by,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl<'a> NewQuotation<'a> {
    pub fn from_domain(
        order_id: i32,
        hub_id: i32,
        created_by: Option<i32>,
        value: &'a DomainNewQuotation,
    ) -> Self {
        Self {
            order_id,
            hub_id,
            total_cents: value.total_cents,
            currency: value.currency.as_str(),
            deposit_required: value.deposit_required,
            deposit_percent: value.deposit_percent,
            file_url: value.file_url.as_deref(),
            notes: value.notes.as_deref(),
            created_by,
        }
    }
}
