//! Error types for ipharvest.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Unknown source kind '{kind}' for source '{source_id}'")]
    UnknownKind { kind: String, source_id: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Response too large: {url} exceeds {limit}")]
    ResponseTooLarge { url: String, limit: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Job cancelled")]
    Cancelled,
}
