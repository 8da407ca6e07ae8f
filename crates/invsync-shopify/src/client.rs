use std::time::Duration;

use invsync_core::{AppConfig, ExternalProductPayload};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode, Url};

use crate::error::CatalogError;
use crate::retry::{retry_with_backoff, Idempotency};
use crate::types::{CreatedProduct, ProductEnvelope, ProductResponse, UpdatedProduct};

const ACCESS_TOKEN_HEADER: &str = "x-shopify-access-token";
const USER_AGENT: &str = "invsync/0.1 (inventory-sync)";

/// Error bodies are truncated to this many characters before they end up in
/// an error message.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Client for the Shopify Admin REST `products` resource.
///
/// The access token and content type are sent as default headers on every
/// request. Rate-limited requests (429) are retried for both create and
/// update; network failures and 5xx responses only for update, since a lost
/// create response may already have produced a product.
pub struct ShopifyAdminClient {
    client: Client,
    /// Store origin (`https://{shop}.myshopify.com`), no trailing slash.
    base_url: String,
    api_version: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl ShopifyAdminClient {
    /// Creates a client for the store at `base_url`.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::InvalidBaseUrl`] if `base_url` is not an absolute
    ///   `http`/`https` URL.
    /// - [`CatalogError::InvalidAccessToken`] if the token is not a valid
    ///   header value.
    /// - [`CatalogError::Http`] if the underlying `reqwest::Client` cannot be
    ///   constructed.
    pub fn new(
        base_url: &str,
        api_version: &str,
        access_token: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, CatalogError> {
        let trimmed = base_url.trim_end_matches('/');
        let parsed = Url::parse(trimmed).map_err(|e| CatalogError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host().is_none() {
            return Err(CatalogError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: "expected an http(s) URL with a host".to_owned(),
            });
        }

        let mut token =
            HeaderValue::from_str(access_token).map_err(|_| CatalogError::InvalidAccessToken)?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(HeaderName::from_static(ACCESS_TOKEN_HEADER), token);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: trimmed.to_owned(),
            api_version: api_version.to_owned(),
            max_retries,
            backoff_base_ms,
        })
    }

    /// Creates a client from the application configuration.
    ///
    /// # Errors
    ///
    /// See [`ShopifyAdminClient::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, CatalogError> {
        Self::new(
            &config.shopify_origin(),
            &config.shopify_api_version,
            &config.shopify_access_token,
            config.request_timeout_secs,
            config.max_retries,
            config.retry_backoff_base_ms,
        )
    }

    /// Creates a product and returns the id the storefront assigned to it.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::RateLimited`] after all retries are exhausted.
    /// - [`CatalogError::Unauthorized`], [`CatalogError::NotFound`],
    ///   [`CatalogError::UnexpectedStatus`] for non-2xx responses.
    /// - [`CatalogError::Http`] on network failure (not retried).
    /// - [`CatalogError::Deserialize`] / [`CatalogError::MissingProductId`] if
    ///   the response does not carry a product id.
    pub async fn create_product(
        &self,
        payload: &ExternalProductPayload,
    ) -> Result<CreatedProduct, CatalogError> {
        let url = self.products_url();
        let raw_body = retry_with_backoff(
            self.max_retries,
            self.backoff_base_ms,
            Idempotency::NonIdempotent,
            || self.send_product(Method::POST, &url, payload),
        )
        .await?;
        tracing::debug!(url, body = %raw_body, "create product response");

        let context = format!("create product \"{}\"", payload.title);
        let parsed = serde_json::from_str::<ProductResponse>(&raw_body).map_err(|e| {
            CatalogError::Deserialize {
                context: context.clone(),
                source: e,
            }
        })?;
        let remote_id = parsed
            .product
            .id_string()
            .ok_or(CatalogError::MissingProductId { context })?;

        Ok(CreatedProduct {
            remote_id,
            raw_body,
        })
    }

    /// Replaces the product addressed by `remote_id` with `payload`.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::InvalidProductId`] if `remote_id` is not numeric.
    /// - [`CatalogError::RateLimited`], [`CatalogError::Http`] or a 5xx
    ///   [`CatalogError::UnexpectedStatus`] after all retries are exhausted.
    /// - [`CatalogError::NotFound`] if the product no longer exists.
    /// - [`CatalogError::Unauthorized`] or other
    ///   [`CatalogError::UnexpectedStatus`] responses (not retried).
    pub async fn update_product(
        &self,
        remote_id: &str,
        payload: &ExternalProductPayload,
    ) -> Result<UpdatedProduct, CatalogError> {
        let url = self.product_url(remote_id)?;
        let raw_body = retry_with_backoff(
            self.max_retries,
            self.backoff_base_ms,
            Idempotency::Idempotent,
            || self.send_product(Method::PUT, &url, payload),
        )
        .await?;
        tracing::debug!(url, body = %raw_body, "update product response");

        Ok(UpdatedProduct {
            remote_id: remote_id.to_owned(),
            raw_body,
        })
    }

    /// Sends `payload` in a product envelope and returns the raw 2xx body.
    async fn send_product(
        &self,
        method: Method,
        url: &str,
        payload: &ExternalProductPayload,
    ) -> Result<String, CatalogError> {
        let response = self
            .client
            .request(method, url)
            .json(&ProductEnvelope { product: payload })
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(2);
            return Err(CatalogError::RateLimited { retry_after_secs });
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CatalogError::Unauthorized {
                status: status.as_u16(),
            });
        }

        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        Ok(response.text().await?)
    }

    fn products_url(&self) -> String {
        format!(
            "{base}/admin/api/{version}/products.json",
            base = self.base_url,
            version = self.api_version
        )
    }

    /// Builds the addressed-resource URL. Only numeric ids are accepted so a
    /// stored link can never inject path segments or query strings.
    fn product_url(&self, remote_id: &str) -> Result<String, CatalogError> {
        let id = remote_id.trim();
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CatalogError::InvalidProductId(remote_id.to_owned()));
        }
        Ok(format!(
            "{base}/admin/api/{version}/products/{id}.json",
            base = self.base_url,
            version = self.api_version
        ))
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
