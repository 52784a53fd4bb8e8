use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::quotation::{NewQuotation, QuotationResponse};
use crate::forms::{MoneyParseError, TEXT_MAX_LEN, optional_text, parse_money};

/// ISO 4217 currency codes are three ASCII alphabetic characters.
const CURRENCY_CODE_LEN: u64 = 3;

pub type QuotationFormResult<T> = Result<T, QuotationFormError>;

#[derive(Debug, Error)]
pub enum QuotationFormError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Amount(#[from] MoneyParseError),
    #[error("invalid currency code `{0}`")]
    InvalidCurrency(String),
    #[error("`{0}` is not a deposit percentage")]
    InvalidPercent(String),
}

/// Multipart body posted by staff when issuing a quotation.
#[derive(MultipartForm)]
pub struct CreateQuotationMultipart {
    pub total: Text<String>,
    pub currency: Text<String>,
    pub deposit_percent: Option<Text<String>>,
    pub notes: Option<Text<String>>,
    #[multipart(limit = "20MB")]
    pub file: Option<TempFile>,
}

impl CreateQuotationMultipart {
    /// Plain form fields of the multipart body.
    pub fn form(&self) -> CreateQuotationForm {
        CreateQuotationForm {
            total: self.total.0.clone(),
            currency: self.currency.0.clone(),
            deposit_percent: self.deposit_percent.as_ref().map(|value| value.0.clone()),
            notes: self.notes.as_ref().map(|value| value.0.clone()),
        }
    }
}

#[derive(Debug, Clone, Validate)]
pub struct CreateQuotationForm {
    /// Decimal amount in major units, e.g. `10,000.00`.
    #[validate(length(min = 1, max = 32))]
    pub total: String,
    #[validate(length(equal = CURRENCY_CODE_LEN))]
    pub currency: String,
    /// Blank or missing means no deposit is required.
    pub deposit_percent: Option<String>,
    #[validate(length(max = TEXT_MAX_LEN))]
    pub notes: Option<String>,
}

impl CreateQuotationForm {
    pub fn into_new_quotation(self, file_url: Option<String>) -> QuotationFormResult<NewQuotation> {
        self.validate()?;

        let total_cents = parse_money(&self.total)?;
        let currency = self.currency.trim().to_ascii_uppercase();
        if !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(QuotationFormError::InvalidCurrency(self.currency));
        }

        let mut quotation = NewQuotation::new(total_cents, currency);
        if let Some(raw) = self
            .deposit_percent
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            let percent = raw
                .trim_end_matches('%')
                .parse::<i32>()
                .ok()
                .filter(|percent| (1..=100).contains(percent))
                .ok_or_else(|| QuotationFormError::InvalidPercent(raw.to_string()))?;
            quotation = quotation.with_deposit(percent);
        }
        if let Some(url) = file_url {
            quotation = quotation.with_file_url(url);
        }
        if let Some(notes) = optional_text(self.notes.as_deref()) {
            quotation = quotation.with_notes(notes);
        }

        Ok(quotation)
    }
}

/// Client answer to a quotation, posted as JSON.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuotationResponseForm {
    pub accepted: bool,
    #[validate(length(max = TEXT_MAX_LEN))]
    pub rejection_reason: Option<String>,
    #[validate(length(max = TEXT_MAX_LEN))]
    pub client_comment: Option<String>,
}

impl QuotationResponseForm {
    pub fn into_response(self) -> QuotationFormResult<QuotationResponse> {
        self.validate()?;

        let mut response = if self.accepted {
            QuotationResponse::accept()
        } else {
            QuotationResponse::reject(optional_text(self.rejection_reason.as_deref()))
        };
        if let Some(comment) = optional_text(self.client_comment.as_deref()) {
            response = response.with_comment(comment);
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(total: &str, currency: &str, percent: Option<&str>) -> CreateQuotationForm {
        CreateQuotationForm {
            total: total.to_string(),
            currency: currency.to_string(),
            deposit_percent: percent.map(str::to_string),
            notes: None,
        }
    }

    #[test]
    fn quotation_amounts_become_minor_units() {
        let quotation = form("10,000", "aed", Some("30%"))
            .into_new_quotation(Some("/uploads/1/q.pdf".to_string()))
            .expect("valid");

        assert_eq!(quotation.total_cents, 1_000_000);
        assert_eq!(quotation.currency, "AED");
        assert!(quotation.deposit_required);
        assert_eq!(quotation.deposit_percent, Some(30));
        assert_eq!(quotation.file_url.as_deref(), Some("/uploads/1/q.pdf"));
    }

    #[test]
    fn blank_percent_means_no_deposit() {
        let quotation = form("99.90", "USD", Some(" "))
            .into_new_quotation(None)
            .expect("valid");

        assert!(!quotation.deposit_required);
        assert_eq!(quotation.total_cents, 9_990);
    }

    #[test]
    fn bad_terms_are_reported() {
        assert!(matches!(
            form("abc", "AED", None).into_new_quotation(None),
            Err(QuotationFormError::Amount(_))
        ));
        assert!(matches!(
            form("10", "A1D", None).into_new_quotation(None),
            Err(QuotationFormError::InvalidCurrency(_))
        ));
        assert!(matches!(
            form("10", "AED", Some("150")).into_new_quotation(None),
            Err(QuotationFormError::InvalidPercent(_))
        ));
        assert!(matches!(
            form("10", "DIRHAM", None).into_new_quotation(None),
            Err(QuotationFormError::Validation(_))
        ));
    }

    #[test]
    fn responses_parse_from_camel_case_json() {
        let form: QuotationResponseForm = serde_json::from_str(
            r#"{"accepted":false,"rejectionReason":" budget ","clientComment":"maybe later"}"#,
        )
        .expect("json");

        let response = form.into_response().expect("valid");

        assert!(!response.accepted);
        assert_eq!(response.rejection_reason.as_deref(), Some("budget"));
        assert_eq!(response.client_comment.as_deref(), Some("maybe later"));
    }
}
