use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::payment::NewPayment;
use crate::forms::{LINE_MAX_LEN, MoneyParseError, parse_money, sanitize_inline_text};

#[derive(Debug, Error)]
pub enum PaymentFormError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Amount(#[from] MoneyParseError),
    #[error("payment amount must be positive")]
    ZeroAmount,
}

/// Deposit confirmation or final payment entered by staff.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PaymentForm {
    /// Decimal amount; blank uses what the order says is owed.
    pub amount: Option<String>,
    #[validate(length(max = LINE_MAX_LEN))]
    pub reference: Option<String>,
}

impl PaymentForm {
    pub fn into_new_payment(self) -> Result<NewPayment, PaymentFormError> {
        self.validate()?;

        let amount = match self
            .amount
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            Some(raw) => match parse_money(raw)? {
                0 => return Err(PaymentFormError::ZeroAmount),
                cents => Some(cents),
            },
            None => None,
        };

        let mut payment = NewPayment::new(amount);
        if let Some(reference) = self
            .reference
            .as_deref()
            .map(sanitize_inline_text)
            .filter(|value| !value.is_empty())
        {
            payment = payment.with_reference(reference);
        }
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_amount_defers_to_the_order() {
        let payment = PaymentForm {
            amount: Some("  ".to_string()),
            reference: Some(" TT 1 ".to_string()),
        }
        .into_new_payment()
        .expect("valid");

        assert_eq!(payment, NewPayment::new(None).with_reference("TT 1"));
    }

    #[test]
    fn amounts_are_parsed_and_must_be_positive() {
        let payment = PaymentForm {
            amount: Some("7,000".to_string()),
            reference: None,
        }
        .into_new_payment()
        .expect("valid");
        assert_eq!(payment.amount_cents, Some(700_000));

        assert!(matches!(
            PaymentForm {
                amount: Some("0.00".to_string()),
                reference: None,
            }
            .into_new_payment(),
            Err(PaymentFormError::ZeroAmount)
        ));
    }
}
