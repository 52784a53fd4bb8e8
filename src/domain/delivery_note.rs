use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Line of the manifest captured on a delivery note.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DeliveryItem {
    pub name: String,
    pub quantity: i32,
}

/// Manifest issued when goods are ready or delivered.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeliveryNote {
    pub id: i32,
    pub order_id: i32,
    pub hub_id: i32,
    pub dn_number: String,
    pub items: Vec<DeliveryItem>,
    pub files: Vec<String>,
    pub delivered_at: Option<NaiveDateTime>,
    pub created_by: Option<i32>,
    pub created_at: NaiveDateTime,
}

/// Payload required to issue a delivery note.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDeliveryNote {
    pub dn_number: String,
    pub items: Vec<DeliveryItem>,
    pub files: Vec<String>,
    pub delivered_at: Option<NaiveDateTime>,
}

impl NewDeliveryNote {
    pub fn new(dn_number: impl Into<String>, items: Vec<DeliveryItem>) -> Self {
        Self {
            dn_number: dn_number.into(),
            items,
            files: Vec::new(),
            delivered_at: None,
        }
    }

    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = files;
        self
    }

    pub fn delivered_at(mut self, delivered_at: NaiveDateTime) -> Self {
        self.delivered_at = Some(delivered_at);
        self
    }
}
