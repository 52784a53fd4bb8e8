//! Request payloads and their validation.
//!
//! Multipart structs mirror what the browser posts; the plain `*Form`
//! structs next to them carry the parsed fields and do the validation so
//! they can be tested without a multipart body.

use thiserror::Error;

use crate::domain::order::MAX_AMOUNT_CENTS;

pub mod delivery_notes;
pub mod orders;
pub mod payments;
pub mod purchase_orders;
pub mod quotations;

/// Maximum allowed length of a single-line text field.
pub const LINE_MAX_LEN: u64 = 256;
/// Maximum allowed length of free text such as notes and comments.
pub const TEXT_MAX_LEN: u64 = 4000;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("`{0}` is not a valid amount")]
pub struct MoneyParseError(pub String);

/// Parse a decimal amount such as `10,000.50` into minor units.
pub fn parse_money(input: &str) -> Result<i64, MoneyParseError> {
    let invalid = || MoneyParseError(input.to_string());
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '_'))
        .collect();

    let (whole, fraction) = match cleaned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty()
        || fraction.len() > 2
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole: i64 = whole.parse().map_err(|_| invalid())?;
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => fraction.parse().map_err(|_| invalid())?,
    };

    whole
        .checked_mul(100)
        .and_then(|cents| cents.checked_add(fraction))
        .filter(|cents| *cents <= MAX_AMOUNT_CENTS)
        .ok_or_else(invalid)
}

/// Collapse whitespace runs and drop control characters.
pub fn sanitize_inline_text(input: &str) -> String {
    let mut sanitized = String::with_capacity(input.len());
    let mut previous_whitespace = false;

    for ch in input.trim().chars() {
        if ch.is_whitespace() {
            if !previous_whitespace {
                sanitized.push(' ');
                previous_whitespace = true;
            }
        } else if ch.is_control() {
            continue;
        } else {
            sanitized.push(ch);
            previous_whitespace = false;
        }
    }

    sanitized
}

/// Sanitize every line and drop leading, trailing and repeated blank lines.
pub fn sanitize_multiline_text(input: &str) -> String {
    let mut result: Vec<String> = Vec::new();
    for line in input.lines().map(sanitize_inline_text) {
        let blank = line.is_empty();
        if blank && result.last().is_none_or(|last: &String| last.is_empty()) {
            continue;
        }
        result.push(line);
    }
    while matches!(result.last(), Some(line) if line.is_empty()) {
        result.pop();
    }
    result.join("\n")
}

/// Sanitized optional text, `None` when nothing is left.
pub fn optional_text(input: Option<&str>) -> Option<String> {
    input
        .map(sanitize_multiline_text)
        .filter(|value| !value.is_empty())
}

/// Checkbox style flag as posted by HTML forms and API clients.
pub fn parse_flag(input: &str) -> bool {
    matches!(
        input.trim().to_ascii_lowercase().as_str(),
        "true" | "on" | "1" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_parses_into_minor_units() {
        assert_eq!(parse_money("10000"), Ok(1_000_000));
        assert_eq!(parse_money(" 10,000.5 "), Ok(1_000_050));
        assert_eq!(parse_money("3000.05"), Ok(300_005));
        assert!(parse_money("").is_err());
        assert!(parse_money("-5").is_err());
        assert!(parse_money("90000000000000000").is_err());
        assert_eq!(
            parse_money("922337203685477.58"),
            Ok(MAX_AMOUNT_CENTS)
        );
        assert!(parse_money("1.234").is_err());
        assert!(parse_money("ten").is_err());
    }

    #[test]
    fn text_is_sanitized() {
        assert_eq!(sanitize_inline_text("  Steel \t frame\u{7}  "), "Steel frame");
        assert_eq!(
            sanitize_multiline_text("\n\nfirst\n\n\n second \n\n"),
            "first\n\nsecond"
        );
        assert_eq!(optional_text(Some("   ")), None);
    }

    #[test]
    fn flags_accept_checkbox_values() {
        assert!(parse_flag("on"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag("off"));
        assert!(!parse_flag(""));
    }
}
