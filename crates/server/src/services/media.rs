//! Image-storage client.
//!
//! Wraps the external image-storage collaborator. The server never uploads
//! here; it only deletes images orphaned by entity deletion (user avatars,
//! category icons, product images). Deletion is best-effort: callers log
//! failures and continue with the primary operation.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::MediaStorageConfig;
use crate::models::user::StoredImage;

/// Errors that can occur when interacting with the image store.
#[derive(Debug, Error)]
pub enum MediaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to build the client.
    #[error("Client error: {0}")]
    Client(String),
}

/// Image-storage API client.
#[derive(Clone)]
pub struct MediaClient {
    client: reqwest::Client,
    base_url: String,
}

impl MediaClient {
    /// Create a new image-storage client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &MediaStorageConfig) -> Result<Self, MediaError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| MediaError::Client(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Delete a stored image by its public id.
    ///
    /// A 404 from the store counts as success: the image is already gone.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the store rejects it.
    pub async fn delete_image(&self, public_id: &str) -> Result<(), MediaError> {
        let url = format!("{}/v1/images/{public_id}", self.base_url);

        let response = self.client.delete(&url).send().await?;
        let status = response.status();

        if !status.is_success() && status.as_u16() != 404 {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Best-effort removal of externally stored images.
///
/// Failures (and a missing media configuration) are logged and swallowed so
/// the primary deletion is never aborted by cleanup.
pub async fn cleanup_images(client: Option<&MediaClient>, images: &[StoredImage], context: &str) {
    let Some(client) = client else {
        if !images.is_empty() {
            tracing::debug!(context, count = images.len(), "media cleanup skipped (no client configured)");
        }
        return;
    };

    for image in images {
        if let Err(e) = client.delete_image(&image.public_id).await {
            tracing::warn!(
                context,
                public_id = %image.public_id,
                error = %e,
                "failed to delete stored image"
            );
        }
    }
}
