//! Error types for the scene crate

/// Errors that can occur while ingesting content or persisting transforms
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Content or stored record could not be parsed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File store I/O failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A transform failed validation
    #[error("Invalid transform: {0}")]
    InvalidTransform(#[from] placement::Error),

    /// Storage collaborator reported a failure
    #[error("Store error: {0}")]
    Store(String),

    /// The fetch task ended without a result
    #[error("Fetch cancelled")]
    Cancelled,
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true if retrying the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Store(_))
    }
}
