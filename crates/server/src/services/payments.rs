//! Payment gateway client.
//!
//! Wraps the external payment-processing collaborator. The only operation
//! the server needs is creating a payment intent for an order; the client
//! confirms the intent browser-side using the returned secret.

use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tamarind_core::OrderId;

use crate::config::PaymentGatewayConfig;

/// Errors that can occur when interacting with the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Payment gateway API client.
#[derive(Clone)]
pub struct PaymentClient {
    client: reqwest::Client,
    base_url: String,
}

/// An in-progress charge attempt at the gateway.
///
/// `client_secret` is handed to the caller for client-side confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub intent_id: String,
    pub client_secret: String,
}

/// Request body for intent creation.
#[derive(Debug, Serialize)]
struct CreateIntentRequest<'a> {
    order_id: OrderId,
    amount: Decimal,
    currency: &'a str,
}

impl PaymentClient {
    /// Create a new payment gateway client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PaymentGatewayConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| PaymentError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Create a payment intent for an order total.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the gateway rejects it. The
    /// caller is responsible for any already-persisted order rows; there is
    /// no compensating rollback here.
    pub async fn create_intent(
        &self,
        order_id: OrderId,
        amount: Decimal,
    ) -> Result<PaymentIntent, PaymentError> {
        let url = format!("{}/v1/payment_intents", self.base_url);

        let body = CreateIntentRequest {
            order_id,
            amount,
            currency: "usd",
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<PaymentIntent>()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_intent_deserializes_gateway_response() {
        let json = r#"{"intent_id":"pi_123","client_secret":"pi_123_secret_abc"}"#;
        let intent: PaymentIntent = serde_json::from_str(json).unwrap();
        assert_eq!(intent.intent_id, "pi_123");
        assert_eq!(intent.client_secret, "pi_123_secret_abc");
    }

    #[test]
    fn test_create_intent_request_shape() {
        let body = CreateIntentRequest {
            order_id: OrderId::new(7),
            amount: "25.60".parse().unwrap(),
            currency: "usd",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["order_id"], 7);
        // Decimal serializes as a string on the wire
        assert_eq!(json["amount"], "25.60");
        assert_eq!(json["currency"], "usd");
    }
}
