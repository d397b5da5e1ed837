//! CLI command implementations.

pub mod admin;
pub mod schema;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use tamarind_server::db::RepositoryError;

/// Errors shared by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Repository error.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No user registered under the given email.
    #[error("No user found with email: {0}")]
    UserNotFound(String),
}

/// Connect to the database using the server's environment conventions.
pub(crate) async fn connect() -> Result<PgPool, CommandError> {
    let _ = dotenvy::dotenv();

    let url = std::env::var("SERVER_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("SERVER_DATABASE_URL"))?;

    let pool = tamarind_server::db::create_pool(&SecretString::from(url)).await?;
    Ok(pool)
}
