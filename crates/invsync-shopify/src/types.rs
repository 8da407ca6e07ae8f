//! Wire types for the Admin REST `products` resource.
//!
//! Requests and responses wrap the product in a `{"product": {...}}`
//! envelope. Product ids are 64-bit integers in JSON; some proxies and older
//! API versions return them as strings, so the response side accepts both.

use invsync_core::ExternalProductPayload;
use serde::{Deserialize, Serialize};

/// Request body for create and update.
#[derive(Debug, Serialize)]
pub(crate) struct ProductEnvelope<'a> {
    pub product: &'a ExternalProductPayload,
}

/// Response body from create and update; only the fields we read.
#[derive(Debug, Deserialize)]
pub(crate) struct ProductResponse {
    pub product: RemoteProduct,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoteProduct {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

impl RemoteProduct {
    /// The product id as a string, or `None` when it is absent, empty or not
    /// a number/string.
    pub fn id_string(&self) -> Option<String> {
        match self.id.as_ref()? {
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
            _ => None,
        }
    }
}

/// Result of a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedProduct {
    /// Id assigned by the storefront.
    pub remote_id: String,
    pub raw_body: String,
}

/// Result of a successful update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedProduct {
    pub remote_id: String,
    pub raw_body: String,
}
