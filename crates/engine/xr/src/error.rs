//! Error types for the XR crate

use crate::session::{ReferenceSpaceKind, SessionMode};

/// Errors that can occur during XR session operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The runtime does not offer the requested session mode
    #[error("Session mode not supported: {0}")]
    NotSupported(SessionMode),

    /// The runtime refused or failed to create a session
    #[error("Session request failed: {0}")]
    SessionRequestFailed(String),

    /// A reference space could not be created
    #[error("Reference space unavailable: {0:?}")]
    ReferenceSpaceUnavailable(ReferenceSpaceKind),

    /// A hit-test source could not be created
    #[error("Hit-test source unavailable: {0}")]
    HitTestUnavailable(String),

    /// The session already ended
    #[error("Session ended")]
    SessionEnded,

    /// Runtime-specific error
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Result type for XR operations
pub type Result<T> = std::result::Result<T, Error>;
