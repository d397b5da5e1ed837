//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! tamarind-cli admin promote -e admin@example.com
//! ```
//!
//! Promotion targets an already-registered account; there is no direct
//! admin creation, so every admin goes through normal registration first.

use tamarind_core::{Email, Role};
use tamarind_server::db::UserRepository;

use super::CommandError;

/// Promote a registered user to the admin role.
///
/// # Errors
///
/// Returns `CommandError::InvalidEmail` for a malformed email,
/// `CommandError::UserNotFound` if no account exists for it.
pub async fn promote(email: &str) -> Result<(), CommandError> {
    let email =
        Email::parse(email).map_err(|e| CommandError::InvalidEmail(format!("{email}: {e}")))?;

    let pool = super::connect().await?;
    let users = UserRepository::new(&pool);

    let user = users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| CommandError::UserNotFound(email.to_string()))?;

    if user.role.is_admin() {
        tracing::info!(%email, "user is already an admin");
        return Ok(());
    }

    users.update_role(user.id, Role::Admin).await?;
    tracing::info!(%email, user_id = %user.id, "user promoted to admin");

    Ok(())
}
