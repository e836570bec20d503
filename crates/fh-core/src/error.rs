//! Error types for fanhub

use thiserror::Error;

/// Main error type for fanhub
#[derive(Debug, Error)]
pub enum FanHubError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(String),

    /// Post not found
    #[error("Post not found: {0}")]
    PostNotFound(String),

    /// Comment not found
    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    /// Actor may not change the comment
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unsupported schema version
    #[error("Unsupported schema version: {0}")]
    UnsupportedSchemaVersion(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<FanHubError>,
    },
}

impl FanHubError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        FanHubError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error (or the error it wraps) is a missing comment
    pub fn is_not_found(&self) -> bool {
        match self {
            FanHubError::CommentNotFound(_) | FanHubError::PostNotFound(_) => true,
            FanHubError::WithContext { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

impl From<toml::de::Error> for FanHubError {
    fn from(err: toml::de::Error) -> Self {
        FanHubError::Toml(err.to_string())
    }
}

impl From<toml::ser::Error> for FanHubError {
    fn from(err: toml::ser::Error) -> Self {
        FanHubError::Toml(err.to_string())
    }
}

/// Result type alias for fanhub
pub type Result<T> = std::result::Result<T, FanHubError>;
