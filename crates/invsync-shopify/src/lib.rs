//! Storefront catalog client for the Shopify Admin REST API.

pub mod client;
pub mod error;
mod retry;
pub mod types;

pub use client::ShopifyAdminClient;
pub use error::CatalogError;
pub use types::{CreatedProduct, UpdatedProduct};
