use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HarvestError {
    #[error("catalogue request failed: {0}")]
    Http(String),

    #[error("catalogue returned status {status} for {url}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },

    #[error("invalid JSON from {url}: {message}")]
    InvalidJson { url: String, message: String },

    #[error("missing field `{field}` in {context}")]
    MissingField { field: String, context: String },

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("unbound placeholder `{placeholder}` in endpoint template {template}")]
    UnboundPlaceholder {
        placeholder: String,
        template: String,
    },

    #[error("missing config file at {0}")]
    MissingConfig(PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to serialize record: {0}")]
    Serialize(String),

    #[error("csv export failed: {0}")]
    Csv(String),
}

impl HarvestError {
    pub fn missing(field: &str, context: impl Into<String>) -> Self {
        HarvestError::MissingField {
            field: field.to_string(),
            context: context.into(),
        }
    }
}
