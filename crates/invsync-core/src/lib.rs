mod app_config;
mod config;
pub mod events;
pub mod items;
pub mod payload;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use events::{EventKind, TriggerEvent};
pub use items::{
    CandidateFilter, ItemKind, ItemRecord, LinkField, LinkState, SourceNumber,
    NUMERIC_TEXT_PATTERN,
};
pub use payload::{map_item, ExternalProductPayload, ExternalVariant, DEFAULT_PRICE};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid link field name \"{0}\": expected a lowercase SQL identifier")]
    InvalidLinkField(String),

    #[error("unknown event kind \"{0}\"")]
    InvalidEventKind(String),

    #[error("unknown item kind \"{0}\"")]
    InvalidItemKind(String),
}
