use std::net::SocketAddr;

use crate::items::LinkField;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub shopify_shop_name: String,
    pub shopify_access_token: String,
    pub shopify_api_version: String,
    /// Overrides the `https://{shop}.myshopify.com` origin (proxies, tests).
    pub shopify_base_url: Option<String>,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub page_size: u32,
    pub link_field: LinkField,
    pub link_write_attempts: u32,
    pub max_concurrent_items: usize,
}

impl AppConfig {
    /// Origin of the storefront Admin API, without a trailing slash.
    #[must_use]
    pub fn shopify_origin(&self) -> String {
        match &self.shopify_base_url {
            Some(url) => url.trim_end_matches('/').to_owned(),
            None => format!("https://{}.myshopify.com", self.shopify_shop_name),
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("shopify_shop_name", &self.shopify_shop_name)
            .field("shopify_access_token", &"[redacted]")
            .field("shopify_api_version", &self.shopify_api_version)
            .field("shopify_base_url", &self.shopify_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("page_size", &self.page_size)
            .field("link_field", &self.link_field)
            .field("link_write_attempts", &self.link_write_attempts)
            .field("max_concurrent_items", &self.max_concurrent_items)
            .finish()
    }
}
