//! Error types for the AR view

use devices::CameraError;

/// Errors that end or prevent an AR view
#[derive(Debug, thiserror::Error)]
pub enum ArError {
    /// Camera acquisition failed on the passthrough path
    #[error("Camera unavailable: {0}")]
    Camera(CameraError),

    /// Content record could not be read
    #[error("Content error: {0}")]
    Content(#[from] scene::Error),

    /// Configuration file could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Opening was cancelled (the view closed before it was ready)
    #[error("AR view cancelled")]
    Cancelled,

    /// The view was already closed
    #[error("AR view closed")]
    Closed,
}

impl From<CameraError> for ArError {
    fn from(err: CameraError) -> Self {
        match err {
            CameraError::Cancelled => ArError::Cancelled,
            other => ArError::Camera(other),
        }
    }
}

/// Result type for AR view operations
pub type Result<T> = std::result::Result<T, ArError>;

impl ArError {
    /// Whether the error screen should offer a retry action
    pub fn is_retryable(&self) -> bool {
        match self {
            ArError::Camera(err) => err.is_retryable(),
            ArError::Content(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// User-facing remediation text, for camera failures
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            ArError::Camera(err) => Some(err.remediation()),
            _ => None,
        }
    }
}
