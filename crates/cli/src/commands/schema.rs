//! Schema command: apply the idempotent DDL.
//!
//! Runs the same statement set the server applies at startup, so a fresh
//! database can be prepared without booting the server.

use super::CommandError;

/// Apply the schema.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a statement fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    tracing::info!("Applying schema...");
    tamarind_server::schema::ensure_schema(&pool).await?;
    tracing::info!("Schema applied");

    Ok(())
}
