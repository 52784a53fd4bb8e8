use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::order::{OrderItem, OrderStage, OrderStatus, ParseEnumError};
use crate::forms::{LINE_MAX_LEN, TEXT_MAX_LEN, optional_text, sanitize_inline_text};
use crate::services::orders::OrderRequest;

/// Result type returned by the order form helpers.
pub type OrderFormResult<T> = Result<T, OrderFormError>;

#[derive(Debug, Error)]
pub enum OrderFormError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("items must be a JSON list: {0}")]
    MalformedItems(#[from] serde_json::Error),
    #[error("at least one item is required")]
    NoItems,
    #[error("item name cannot be empty")]
    EmptyItemName,
    #[error("{0}")]
    UnknownValue(#[from] ParseEnumError),
}

/// Multipart body of a new order request.
#[derive(MultipartForm)]
pub struct CreateOrderMultipart {
    /// JSON encoded list of [`OrderItemForm`].
    pub items: Text<String>,
    pub notes: Option<Text<String>>,
    #[multipart(limit = "20MB")]
    pub files: Vec<TempFile>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderItemForm {
    #[validate(length(min = 1, max = LINE_MAX_LEN))]
    pub name: String,
    #[validate(length(max = TEXT_MAX_LEN))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 1_000_000))]
    pub quantity: i32,
}

#[derive(Debug, Validate)]
pub struct CreateOrderForm {
    pub items: Vec<OrderItemForm>,
    #[validate(length(max = TEXT_MAX_LEN))]
    pub notes: Option<String>,
}

impl CreateOrderForm {
    /// Build the form from the raw multipart fields.
    pub fn parse(items: &str, notes: Option<String>) -> OrderFormResult<Self> {
        Ok(Self {
            items: serde_json::from_str(items)?,
            notes,
        })
    }

    /// Validate the request and attach the stored file references.
    pub fn into_request(self, attachments: Vec<String>) -> OrderFormResult<OrderRequest> {
        self.validate()?;
        if self.items.is_empty() {
            return Err(OrderFormError::NoItems);
        }

        let items = self
            .items
            .into_iter()
            .map(|item| {
                item.validate()?;
                let name = sanitize_inline_text(&item.name);
                if name.is_empty() {
                    return Err(OrderFormError::EmptyItemName);
                }
                Ok(OrderItem {
                    name,
                    description: optional_text(item.description.as_deref()),
                    quantity: item.quantity,
                })
            })
            .collect::<OrderFormResult<Vec<_>>>()?;

        Ok(OrderRequest {
            items,
            notes: optional_text(self.notes.as_deref()),
            attachments,
        })
    }
}

/// Staff status change.
#[derive(Debug, Deserialize, Validate)]
pub struct StatusForm {
    pub status: String,
    #[validate(length(max = TEXT_MAX_LEN))]
    pub note: Option<String>,
}

impl StatusForm {
    pub fn parse(self) -> OrderFormResult<(OrderStatus, Option<String>)> {
        self.validate()?;
        let status = self.status.parse::<OrderStatus>()?;
        Ok((status, optional_text(self.note.as_deref())))
    }
}

/// Staff stage advance.
#[derive(Debug, Deserialize, Validate)]
pub struct StageForm {
    pub stage: String,
    #[validate(length(max = TEXT_MAX_LEN))]
    pub note: Option<String>,
}

impl StageForm {
    pub fn parse(self) -> OrderFormResult<(OrderStage, Option<String>)> {
        self.validate()?;
        let stage = self.stage.parse::<OrderStage>()?;
        Ok((stage, optional_text(self.note.as_deref())))
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CancelForm {
    #[validate(length(max = TEXT_MAX_LEN))]
    pub note: Option<String>,
}

impl CancelForm {
    pub fn into_note(self) -> OrderFormResult<Option<String>> {
        self.validate()?;
        Ok(optional_text(self.note.as_deref()))
    }
}
