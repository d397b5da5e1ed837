//! Database operations for the Tamarind Market `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `users` - Accounts, credential hashes, reset tokens
//! - `categories` - Category names and icons
//! - `products` / `product_images` / `product_reviews` - Catalog
//! - `orders` / `order_items` / `shipping_info` / `payments` - Orders
//! - `sessions` - Tower-sessions storage (owned by the session store)
//!
//! The schema is applied at startup via [`crate::schema::ensure_schema`]
//! (idempotent `CREATE TABLE IF NOT EXISTS` statements).
//!
//! All queries are parameterized `sqlx::query`/`query_as` calls binding
//! against `#[derive(sqlx::FromRow)]` row structs which are then mapped into
//! domain models; stored enum text that fails to parse surfaces as
//! [`RepositoryError::DataCorruption`].

pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::CategoryRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email, category still in use).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// Each request borrows a pooled, short-lived connection; nothing in the
/// server holds a connection at module scope.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
