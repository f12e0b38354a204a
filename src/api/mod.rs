//! API
//!
//! HTTP client for the storefront REST service. Every remote capability the
//! core consumes (catalog, branding, settings, coupons, orders, contact)
//! hangs off [`ApiClient`]; non-2xx responses are surfaced with the remote
//! message passed through verbatim.

pub mod content;
pub mod coupons;
pub mod orders;
pub mod products;

use reqwest::{Client, Response, StatusCode};
use rusty_money::iso::Currency;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    config::{ConfigError, StorefrontConfig},
    pricing::PricingError,
};

/// Errors that can occur when talking to the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport or deserialization failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service returned a non-2xx response.
    #[error("unexpected response from storefront api ({status}): {message}")]
    UnexpectedResponse {
        /// HTTP status of the response.
        status: StatusCode,
        /// Remote error message, or the raw body when none was supplied.
        message: String,
    },

    /// A wire amount could not be converted to money.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// HTTP client for the storefront REST service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    website_id: u64,
    currency: &'static Currency,
    http: Client,
}

impl ApiClient {
    /// Create a client from the storefront configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the configured currency code is
    /// unknown.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_parts(
            config.api_base_url.clone(),
            config.website_id,
            config.currency()?,
        ))
    }

    /// Create a client from raw parts.
    pub fn from_parts(
        base_url: impl Into<String>,
        website_id: u64,
        currency: &'static Currency,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self {
            base_url,
            website_id,
            currency,
            http: Client::new(),
        }
    }

    /// Website id sent with branding, contact and order requests.
    pub fn website_id(&self) -> u64 {
        self.website_id
    }

    /// Currency catalog prices are interpreted in.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        tracing::debug!(path, "storefront api GET");

        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await?;

        let response = check(response).await?;

        Ok(response.json().await?)
    }

    pub(crate) async fn post_json<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, ApiError> {
        tracing::debug!(path, "storefront api POST");

        Ok(self.http.post(self.url(path)).json(body).send().await?)
    }
}

/// Map a non-2xx response to [`ApiError::UnexpectedResponse`], extracting
/// the remote message when the body carries one.
pub(crate) async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = message_from_body(&body);

    tracing::warn!(%status, message, "storefront api request failed");

    Err(ApiError::UnexpectedResponse { status, message })
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Extract the human-readable message from an error body.
///
/// The service uses both `{"message": ...}` and `{"error": ...}` shapes;
/// anything else is passed through as-is.
fn message_from_body(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error) {
            return message;
        }
    }

    body.to_owned()
}

#[cfg(test)]
mod tests {
    use rusty_money::iso;

    use super::*;

    #[test]
    fn base_url_trailing_slashes_are_trimmed() {
        let client = ApiClient::from_parts("http://localhost:5000/api//", 1, iso::USD);

        assert_eq!(client.url("/products"), "http://localhost:5000/api/products");
    }

    #[test]
    fn message_from_body_prefers_message_field() {
        assert_eq!(
            message_from_body(r#"{"message":"Invalid coupon code"}"#),
            "Invalid coupon code"
        );
    }

    #[test]
    fn message_from_body_falls_back_to_error_field() {
        assert_eq!(
            message_from_body(r#"{"error":"Out of stock"}"#),
            "Out of stock"
        );
    }

    #[test]
    fn message_from_body_passes_raw_text_through() {
        assert_eq!(message_from_body("Bad Gateway"), "Bad Gateway");
        assert_eq!(message_from_body(r#"{"code":500}"#), r#"{"code":500}"#);
    }
}
