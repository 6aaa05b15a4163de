//! Error types for the placement crate

/// Errors that can occur while validating placement data
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A transform component is NaN or infinite
    #[error("Non-finite {field} in transform")]
    NonFinite { field: &'static str },

    /// A scale component is zero or negative
    #[error("Invalid scale {0:?}: every component must be positive")]
    InvalidScale([f32; 3]),
}

/// Result type for placement operations
pub type Result<T> = std::result::Result<T, Error>;
