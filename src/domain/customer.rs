use pushkind_common::domain::auth::AuthenticatedUser;
use serde::{Deserialize, Serialize};

/// Client of a hub; owner of orders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    pub id: i32,
    pub hub_id: i32,
    pub name: String,
    /// Primary email address stored in lowercase for comparisons.
    pub email: String,
}

/// Payload required to insert a new customer for a hub.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    pub hub_id: i32,
    pub name: String,
    pub email: String,
}

impl NewCustomer {
    /// Build a new customer payload while normalising the email to lowercase.
    #[must_use]
    pub fn new(hub_id: i32, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            hub_id,
            name: name.into(),
            email: email.into().to_lowercase(),
        }
    }
}

impl From<&AuthenticatedUser> for NewCustomer {
    fn from(value: &AuthenticatedUser) -> Self {
        NewCustomer::new(value.hub_id, value.name.clone(), value.email.clone())
    }
}
