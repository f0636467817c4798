//! Error types for Automod

/// Result type alias using Automod's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Automod operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration, fatal before the listener binds
    #[error("configuration error: {0}")]
    Config(String),

    /// Model resource acquisition failed, fatal at startup
    #[error("model load error: {0}")]
    ModelLoad(String),

    /// Classifier invoked before a successful load
    #[error("classifier not ready: load() has not completed")]
    NotReady,

    /// Per-call inference failure, recovered as a field-level ERROR verdict
    #[error("inference error: {0}")]
    Inference(String),

    /// Malformed request body, recovered as a fail-open response
    #[error("validation error: {0}")]
    Validation(String),

    /// Classification exceeded the per-request budget
    #[error("classification timed out")]
    Timeout,

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Anything uncaught, recovered as a fail-open response
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new model-load error
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
