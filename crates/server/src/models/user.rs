//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tamarind_core::{Email, Role, UserId};

/// A registered account.
///
/// The credential hash never leaves the repository layer; see
/// `UserRepository::get_password_hash`.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    /// Avatar stored with the external image collaborator, if any.
    pub avatar: Option<StoredImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A reference to an image held by the external image-storage collaborator.
///
/// `public_id` is the collaborator's handle, used for deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredImage {
    pub url: String,
    pub public_id: String,
}
