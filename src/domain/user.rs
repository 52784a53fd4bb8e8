use pushkind_common::domain::auth::AuthenticatedUser;
use serde::{Deserialize, Serialize};

/// Staff member of a hub.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct User {
    pub id: i32,
    pub hub_id: i32,
    pub name: String,
    pub email: String,
    /// Admins receive order notifications.
    pub is_admin: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewUser {
    pub hub_id: i32,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl NewUser {
    #[must_use]
    pub fn new(hub_id: i32, name: String, email: String, is_admin: bool) -> Self {
        Self {
            hub_id,
            name,
            email: email.to_lowercase(),
            is_admin,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct UpdateUser {
    pub name: String,
    pub is_admin: bool,
}

impl NewUser {
    /// Staff record for a session user; `is_admin` reflects the access role.
    pub fn from_session(value: &AuthenticatedUser, is_admin: bool) -> Self {
        NewUser::new(value.hub_id, value.name.clone(), value.email.clone(), is_admin)
    }
}
