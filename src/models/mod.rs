use serde::Serialize;
use serde::de::DeserializeOwned;

pub mod customer;
pub mod delivery_note;
pub mod history;
pub mod notification;
pub mod order;
pub mod payment;
pub mod purchase_order;
pub mod quotation;
pub mod user;

/// Decode a JSON text column, falling back to the type's default on corrupt data.
pub(crate) fn decode_json<T>(raw: &str, column: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("Invalid JSON stored in `{column}`: {err}");
            T::default()
        }
    }
}

/// Encode a value for a JSON text column.
pub(crate) fn encode_json<T>(value: &T) -> String
where
    T: Serialize + ?Sized,
{
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}
