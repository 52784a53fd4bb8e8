use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::delivery_note::{DeliveryItem, NewDeliveryNote};
use crate::domain::order::{OrderStage, ParseEnumError};
use crate::forms::{LINE_MAX_LEN, sanitize_inline_text};

pub type DeliveryNoteFormResult<T> = Result<T, DeliveryNoteFormError>;

#[derive(Debug, Error)]
pub enum DeliveryNoteFormError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("items must be a JSON list: {0}")]
    MalformedItems(#[from] serde_json::Error),
    #[error("DN number cannot be empty")]
    EmptyNumber,
    #[error("a delivery note needs at least one item")]
    NoItems,
    #[error("{0}")]
    UnknownStage(#[from] ParseEnumError),
}

#[derive(MultipartForm)]
pub struct CreateDeliveryNoteMultipart {
    pub dn_number: Text<String>,
    /// JSON encoded list of [`DeliveryItemForm`].
    pub items: Text<String>,
    /// Stage to move the order to together with the note.
    pub advance_to: Option<Text<String>>,
    #[multipart(limit = "20MB")]
    pub files: Vec<TempFile>,
}

impl CreateDeliveryNoteMultipart {
    pub fn form(&self) -> DeliveryNoteFormResult<CreateDeliveryNoteForm> {
        Ok(CreateDeliveryNoteForm {
            dn_number: self.dn_number.0.clone(),
            items: serde_json::from_str(&self.items.0)?,
            advance_to: self.advance_to.as_ref().map(|value| value.0.clone()),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeliveryItemForm {
    #[validate(length(min = 1, max = LINE_MAX_LEN))]
    pub name: String,
    #[validate(range(min = 1, max = 1_000_000))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Validate)]
pub struct CreateDeliveryNoteForm {
    #[validate(length(min = 1, max = LINE_MAX_LEN))]
    pub dn_number: String,
    pub items: Vec<DeliveryItemForm>,
    pub advance_to: Option<String>,
}

impl CreateDeliveryNoteForm {
    /// Validated note and the optional stage to advance to.
    ///
    /// Advancing to `delivered` stamps the delivery time.
    pub fn into_new_delivery_note(
        self,
        files: Vec<String>,
    ) -> DeliveryNoteFormResult<(NewDeliveryNote, Option<OrderStage>)> {
        self.validate()?;

        let dn_number = sanitize_inline_text(&self.dn_number);
        if dn_number.is_empty() {
            return Err(DeliveryNoteFormError::EmptyNumber);
        }
        if self.items.is_empty() {
            return Err(DeliveryNoteFormError::NoItems);
        }

        let items = self
            .items
            .iter()
            .map(|item| {
                item.validate()?;
                Ok(DeliveryItem {
                    name: sanitize_inline_text(&item.name),
                    quantity: item.quantity,
                })
            })
            .collect::<DeliveryNoteFormResult<Vec<_>>>()?;

        let advance_to = self
            .advance_to
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::parse::<OrderStage>)
            .transpose()?;

        let mut note = NewDeliveryNote::new(dn_number, items).with_files(files);
        if advance_to == Some(OrderStage::Delivered) {
            note = note.delivered_at(Utc::now().naive_utc());
        }

        Ok((note, advance_to))
    }
}
