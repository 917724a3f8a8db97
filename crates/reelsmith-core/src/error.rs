//! Error types for reelsmith

use thiserror::Error;

/// The main error type for reelsmith operations
#[derive(Debug, Error)]
pub enum ReelError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{service} error: {status} - {body}")]
    Upstream {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Invalid status transition for '{id}': {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: String,
        to: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),
}

impl ReelError {
    /// Build an upstream error from a non-success HTTP exchange
    pub fn upstream(service: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        ReelError::Upstream {
            service: service.into(),
            status,
            body: body.into(),
        }
    }

    /// Whether this error came from a remote service (HTTP status or poll timeout)
    pub fn is_upstream(&self) -> bool {
        matches!(self, ReelError::Upstream { .. } | ReelError::Timeout(_))
    }
}

/// Result type alias for reelsmith operations
pub type Result<T> = std::result::Result<T, ReelError>;

impl From<toml::de::Error> for ReelError {
    fn from(err: toml::de::Error) -> Self {
        ReelError::TomlParse(err.to_string())
    }
}
