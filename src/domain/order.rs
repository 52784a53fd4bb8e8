use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use pushkind_common::pagination::Pagination;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Currency recorded on payments when an order has no quoted currency yet.
pub const DEFAULT_CURRENCY: &str = "AED";

/// Raised when a stored or submitted value does not name a known variant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Coarse classification of an order.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Request received and waiting for staff.
    #[default]
    Pending,
    /// Quotation accepted, the order is proceeding.
    Approved,
    /// Request declined by staff.
    Rejected,
    /// A quotation is out with the client.
    QuotationSent,
    /// Goods delivered and paid.
    Completed,
    /// Order withdrawn before a purchase order was prepared.
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Approved,
        OrderStatus::Rejected,
        OrderStatus::QuotationSent,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
            OrderStatus::QuotationSent => "quotation_sent",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses after which the order no longer moves.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }

    /// Stage implied by switching to this status; `None` keeps the current stage.
    pub fn mapped_stage(self) -> Option<OrderStage> {
        match self {
            OrderStatus::Pending => Some(OrderStage::Received),
            OrderStatus::Approved => Some(OrderStage::QuotationAccepted),
            OrderStatus::QuotationSent => Some(OrderStage::QuotationSent),
            OrderStatus::Completed => Some(OrderStage::CompletedDelivered),
            OrderStatus::Rejected | OrderStatus::Cancelled => None,
        }
    }

    /// Human readable label used in notifications and emails.
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Approved => "Approved",
            OrderStatus::Rejected => "Rejected",
            OrderStatus::QuotationSent => "Quotation sent",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value.trim().to_lowercase())
            .ok_or_else(|| ParseEnumError {
                kind: "order status",
                value: value.to_string(),
            })
    }
}

/// Fine grained pipeline position of an order.
///
/// Variants are declared in pipeline order; the derived ordering and
/// [`OrderStage::ordinal`] both rely on it, so a new stage has to be
/// inserted at its place in the pipeline rather than appended.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStage {
    #[default]
    Received,
    UnderReview,
    QuotationPrepared,
    QuotationSent,
    QuotationAccepted,
    PoPrepared,
    AwaitingDeposit,
    DepositReceived,
    InManufacturing,
    QualityCheck,
    ReadyForDelivery,
    DeliveryNoteSent,
    Delivered,
    AwaitingFinalPayment,
    CompletedDelivered,
}

impl OrderStage {
    pub const ALL: [OrderStage; 15] = [
        OrderStage::Received,
        OrderStage::UnderReview,
        OrderStage::QuotationPrepared,
        OrderStage::QuotationSent,
        OrderStage::QuotationAccepted,
        OrderStage::PoPrepared,
        OrderStage::AwaitingDeposit,
        OrderStage::DepositReceived,
        OrderStage::InManufacturing,
        OrderStage::QualityCheck,
        OrderStage::ReadyForDelivery,
        OrderStage::DeliveryNoteSent,
        OrderStage::Delivered,
        OrderStage::AwaitingFinalPayment,
        OrderStage::CompletedDelivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStage::Received => "received",
            OrderStage::UnderReview => "under_review",
            OrderStage::QuotationPrepared => "quotation_prepared",
            OrderStage::QuotationSent => "quotation_sent",
            OrderStage::QuotationAccepted => "quotation_accepted",
            OrderStage::PoPrepared => "po_prepared",
            OrderStage::AwaitingDeposit => "awaiting_deposit",
            OrderStage::DepositReceived => "deposit_received",
            OrderStage::InManufacturing => "in_manufacturing",
            OrderStage::QualityCheck => "quality_check",
            OrderStage::ReadyForDelivery => "ready_for_delivery",
            OrderStage::DeliveryNoteSent => "delivery_note_sent",
            OrderStage::Delivered => "delivered",
            OrderStage::AwaitingFinalPayment => "awaiting_final_payment",
            OrderStage::CompletedDelivered => "completed_delivered",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStage::Received => "Request received",
            OrderStage::UnderReview => "Under review",
            OrderStage::QuotationPrepared => "Quotation prepared",
            OrderStage::QuotationSent => "Quotation sent",
            OrderStage::QuotationAccepted => "Quotation accepted",
            OrderStage::PoPrepared => "Purchase order prepared",
            OrderStage::AwaitingDeposit => "Awaiting deposit",
            OrderStage::DepositReceived => "Deposit received",
            OrderStage::InManufacturing => "In manufacturing",
            OrderStage::QualityCheck => "Quality check",
            OrderStage::ReadyForDelivery => "Ready for delivery",
            OrderStage::DeliveryNoteSent => "Delivery note sent",
            OrderStage::Delivered => "Delivered",
            OrderStage::AwaitingFinalPayment => "Awaiting final payment",
            OrderStage::CompletedDelivered => "Completed",
        }
    }

    /// Position of the stage in the pipeline, starting at zero.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Progress through the pipeline in whole percent.
    pub fn progress_percent(self) -> u8 {
        let last = OrderStage::ALL.len() - 1;
        (self.ordinal() * 100 / last) as u8
    }
}

impl fmt::Display for OrderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStage {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        OrderStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == value.trim().to_lowercase())
            .ok_or_else(|| ParseEnumError {
                kind: "order stage",
                value: value.to_string(),
            })
    }
}

/// Line requested by the client when submitting an order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub name: String,
    pub description: Option<String>,
    pub quantity: i32,
}

/// Domain representation of an order belonging to a hub.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    /// Unique identifier of the order.
    pub id: i32,
    /// Owning hub identifier.
    pub hub_id: i32,
    /// Customer that submitted the order.
    pub customer_id: i32,
    /// Unguessable token used by the client-facing tracking page.
    pub public_token: String,
    pub status: OrderStatus,
    pub stage: OrderStage,
    /// Free form notes supplied with the request.
    pub notes: Option<String>,
    /// File references attached by the client on submission.
    pub attachments: Vec<String>,
    /// Quoted total in minor currency units, known once a quotation exists.
    pub total_cents: Option<i64>,
    /// ISO 4217 currency code of the quoted total.
    pub currency: Option<String>,
    pub deposit_percent: Option<i32>,
    pub deposit_cents: Option<i64>,
    pub deposit_paid: bool,
    pub deposit_paid_at: Option<NaiveDateTime>,
    pub final_payment_received: bool,
    pub final_payment_received_at: Option<NaiveDateTime>,
    pub items: Vec<OrderItem>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Order {
    pub fn progress_percent(&self) -> u8 {
        self.stage.progress_percent()
    }
}

/// Payload required to insert a new order for a hub.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub hub_id: i32,
    pub customer_id: i32,
    pub notes: Option<String>,
    pub attachments: Vec<String>,
    pub items: Vec<OrderItem>,
}

impl NewOrder {
    /// Build a new order payload for the given customer.
    pub fn new(hub_id: i32, customer_id: i32, items: Vec<OrderItem>) -> Self {
        Self {
            hub_id,
            customer_id,
            notes: None,
            attachments: Vec::new(),
            items,
        }
    }

    /// Attach client notes to the order payload.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Attach uploaded file references to the order payload.
    pub fn with_attachments(mut self, attachments: Vec<String>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// Query definition used to list orders for a hub.
#[derive(Debug, Clone)]
pub struct OrderListQuery {
    /// Owning hub identifier.
    pub hub_id: i32,
    /// Optional status filter.
    pub status: Option<OrderStatus>,
    /// Optional stage filter.
    pub stage: Option<OrderStage>,
    /// Optional customer identifier filter.
    pub customer_id: Option<i32>,
    /// Optional search term that matches the notes or the tracking token.
    pub search: Option<String>,
    /// Optional pagination options applied to the query.
    pub pagination: Option<Pagination>,
}

impl OrderListQuery {
    /// Construct a query that targets all orders belonging to `hub_id`.
    pub fn new(hub_id: i32) -> Self {
        Self {
            hub_id,
            status: None,
            stage: None,
            customer_id: None,
            search: None,
            pagination: None,
        }
    }

    /// Filter the results by the provided status.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filter the results by the provided stage.
    pub fn stage(mut self, stage: OrderStage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Filter the results by customer identifier.
    pub fn customer_id(mut self, customer_id: i32) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    /// Filter the results by a search term.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Apply pagination to the query with the given page number and page size.
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// Fresh tracking token for the public order page.
pub fn generate_public_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Public tracking page of the order with `token` under `base_url`.
pub fn tracking_url(base_url: &str, token: &str) -> String {
    format!("{}/track/{token}", base_url.trim_end_matches('/'))
}

/// Largest amount, in minor units, accepted for totals and payments.
pub const MAX_AMOUNT_CENTS: i64 = i64::MAX / 100;

/// Deposit owed on `total_cents` at `percent`, rounded half up to the minor unit.
///
/// Computed in 128 bits; a result outside `i64` saturates.
pub fn deposit_amount(total_cents: i64, percent: i32) -> i64 {
    let cents = (i128::from(total_cents) * i128::from(percent) + 50).div_euclid(100);
    i64::try_from(cents).unwrap_or(if cents < 0 { i64::MIN } else { i64::MAX })
}
