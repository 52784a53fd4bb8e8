use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::purchase_order::{DepositTerms, NewPurchaseOrder};
use crate::forms::{LINE_MAX_LEN, parse_flag, sanitize_inline_text};

pub type PurchaseOrderFormResult<T> = Result<T, PurchaseOrderFormError>;

#[derive(Debug, Error)]
pub enum PurchaseOrderFormError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("PO number cannot be empty")]
    EmptyNumber,
    #[error("`{0}` is not a deposit percentage")]
    InvalidPercent(String),
    #[error("at least one file is required")]
    NoFiles,
}

/// Multipart body of a purchase order upload.
#[derive(MultipartForm)]
pub struct CreatePurchaseOrderMultipart {
    pub po_number: Text<String>,
    pub deposit_required: Option<Text<String>>,
    pub deposit_percent: Option<Text<String>>,
    #[multipart(limit = "20MB")]
    pub files: Vec<TempFile>,
}

impl CreatePurchaseOrderMultipart {
    pub fn form(&self) -> CreatePurchaseOrderForm {
        CreatePurchaseOrderForm {
            po_number: self.po_number.0.clone(),
            deposit_required: self
                .deposit_required
                .as_ref()
                .is_some_and(|value| parse_flag(&value.0)),
            deposit_percent: self.deposit_percent.as_ref().map(|value| value.0.clone()),
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct CreatePurchaseOrderForm {
    #[validate(length(min = 1, max = LINE_MAX_LEN))]
    pub po_number: String,
    pub deposit_required: bool,
    /// Blank falls back to the percentage of the accepted quotation.
    pub deposit_percent: Option<String>,
}

impl CreatePurchaseOrderForm {
    /// Validate the fields and attach the stored PO files.
    ///
    /// A percentage implies that a deposit is required.
    pub fn into_new_purchase_order(
        self,
        files: Vec<String>,
    ) -> PurchaseOrderFormResult<NewPurchaseOrder> {
        self.validate()?;
        if files.is_empty() {
            return Err(PurchaseOrderFormError::NoFiles);
        }

        let po_number = sanitize_inline_text(&self.po_number);
        if po_number.is_empty() {
            return Err(PurchaseOrderFormError::EmptyNumber);
        }

        let percent = match self
            .deposit_percent
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            Some(raw) => Some(
                raw.trim_end_matches('%')
                    .parse::<i32>()
                    .ok()
                    .filter(|percent| (1..=100).contains(percent))
                    .ok_or_else(|| PurchaseOrderFormError::InvalidPercent(raw.to_string()))?,
            ),
            None => None,
        };

        let deposit = match (self.deposit_required, percent) {
            (_, Some(percent)) => DepositTerms::percent(percent),
            (true, None) => DepositTerms {
                required: true,
                percent: None,
            },
            (false, None) => DepositTerms::none(),
        };

        Ok(NewPurchaseOrder::new(po_number, files).with_deposit(deposit))
    }
}

/// Multipart body carrying deposit proof files.
#[derive(MultipartForm)]
pub struct DepositProofMultipart {
    #[multipart(limit = "20MB")]
    pub files: Vec<TempFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(number: &str, required: bool, percent: Option<&str>) -> CreatePurchaseOrderForm {
        CreatePurchaseOrderForm {
            po_number: number.to_string(),
            deposit_required: required,
            deposit_percent: percent.map(str::to_string),
        }
    }

    fn files() -> Vec<String> {
        vec!["/uploads/1/po.pdf".to_string()]
    }

    #[test]
    fn deposit_terms_follow_the_flags() {
        let explicit = form("PO-1", false, Some("30"))
            .into_new_purchase_order(files())
            .expect("valid");
        assert_eq!(explicit.deposit, DepositTerms::percent(30));

        let inherited = form("PO-2", true, Some(""))
            .into_new_purchase_order(files())
            .expect("valid");
        assert!(inherited.deposit.required);
        assert_eq!(inherited.deposit.percent, None);

        let none = form(" PO-3 ", false, None)
            .into_new_purchase_order(files())
            .expect("valid");
        assert_eq!(none.deposit, DepositTerms::none());
        assert_eq!(none.po_number, "PO-3");
    }

    #[test]
    fn files_and_number_are_required() {
        assert!(matches!(
            form("PO-1", false, None).into_new_purchase_order(Vec::new()),
            Err(PurchaseOrderFormError::NoFiles)
        ));
        assert!(matches!(
            form("", false, None).into_new_purchase_order(files()),
            Err(PurchaseOrderFormError::Validation(_))
        ));
        assert!(matches!(
            form("   ", false, None).into_new_purchase_order(files()),
            Err(PurchaseOrderFormError::EmptyNumber)
        ));
        assert!(matches!(
            form("PO-1", true, Some("0")).into_new_purchase_order(files()),
            Err(PurchaseOrderFormError::InvalidPercent(_))
        ));
    }
}
