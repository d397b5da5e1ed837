//! Session-stored state.

use serde::{Deserialize, Serialize};

use tamarind_core::{Email, Role, UserId};

/// Session keys used with tower-sessions.
pub mod session_keys {
    /// The authenticated account, set on login/registration.
    pub const CURRENT_USER: &str = "current_user";
}

/// The authenticated account as stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
}

impl CurrentUser {
    /// Build session state from a freshly loaded user row.
    #[must_use]
    pub fn from_user(user: &crate::models::user::User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}
