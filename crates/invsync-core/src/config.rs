use crate::app_config::{AppConfig, Environment};
use crate::items::LinkField;
use crate::ConfigError;

const MAX_PAGE_SIZE: u32 = 1_000;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation live here, decoupled from the process environment,
/// so tests can drive it with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let shopify_shop_name = require("SHOPIFY_SHOP_NAME")?;
    let shopify_access_token = require("SHOPIFY_ACCESS_TOKEN")?;

    let env = parse_environment(&or_default("INVSYNC_ENV", "development"))?;

    let bind_addr = or_default("INVSYNC_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("INVSYNC_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("INVSYNC_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("INVSYNC_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("INVSYNC_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("INVSYNC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let shopify_api_version = or_default("SHOPIFY_API_VERSION", "2024-04");
    let shopify_base_url = lookup("SHOPIFY_BASE_URL")
        .ok()
        .filter(|v| !v.trim().is_empty());

    let request_timeout_secs = parse_u64("INVSYNC_REQUEST_TIMEOUT_SECS", "30")?;
    let max_retries = parse_u32("INVSYNC_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("INVSYNC_RETRY_BACKOFF_BASE_MS", "500")?;

    let page_size = parse_u32("INVSYNC_PAGE_SIZE", "10")?;
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(invalid(
            "INVSYNC_PAGE_SIZE",
            format!("must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"),
        ));
    }

    let link_field = LinkField::new(&or_default("INVSYNC_LINK_FIELD", LinkField::DEFAULT))
        .map_err(|e| invalid("INVSYNC_LINK_FIELD", e.to_string()))?;

    let link_write_attempts = parse_u32("INVSYNC_LINK_WRITE_ATTEMPTS", "3")?;
    if link_write_attempts == 0 {
        return Err(invalid("INVSYNC_LINK_WRITE_ATTEMPTS", "must be at least 1".to_owned()));
    }

    let max_concurrent_items = parse_usize("INVSYNC_MAX_CONCURRENT_ITEMS", "1")?;
    if max_concurrent_items == 0 {
        return Err(invalid("INVSYNC_MAX_CONCURRENT_ITEMS", "must be at least 1".to_owned()));
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        shopify_shop_name,
        shopify_access_token,
        shopify_api_version,
        shopify_base_url,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        page_size,
        link_field,
        link_write_attempts,
        max_concurrent_items,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "INVSYNC_ENV".to_string(),
            reason: format!("expected development, test, or production, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
