use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid Admin API base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid access token header value")]
    InvalidAccessToken,

    #[error("invalid remote product id \"{0}\": expected a numeric id")]
    InvalidProductId(String),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("response for {context} did not contain a product id")]
    MissingProductId { context: String },

    #[error("rate limited by the Admin API (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("Admin API rejected the access token (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}: {body}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        body: String,
    },
}

impl CatalogError {
    /// `true` when the request went through but the response body could not
    /// be interpreted. The remote side may have acted on the request.
    #[must_use]
    pub fn is_response_shape(&self) -> bool {
        matches!(
            self,
            Self::Deserialize { .. } | Self::MissingProductId { .. }
        )
    }
}
