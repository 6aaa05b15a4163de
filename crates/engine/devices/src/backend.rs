//! Camera backend trait for platform-specific implementations
//!
//! This module defines the traits that platform camera backends must
//! implement (e.g. `getUserMedia` in browsers, a native capture API on
//! desktop or mobile).

use crate::camera::{CameraConstraints, CameraError, StreamSettings};
use async_trait::async_trait;

/// A single live video track handed out by a backend.
///
/// Tracks are owned by [`CameraStream`](crate::camera::CameraStream), which
/// stops them when it is dropped.
pub trait VideoTrack: Send {
    /// Backend-assigned track identifier
    fn id(&self) -> &str;

    /// Settings the platform actually granted
    fn settings(&self) -> StreamSettings;

    /// Whether the track is still producing frames
    fn is_live(&self) -> bool;

    /// Stop the track and release the underlying device
    fn stop(&mut self);
}

/// Trait for camera backends
///
/// Implementations of this trait provide platform-specific camera access.
/// The backend is responsible for:
/// - Mapping [`CameraConstraints`] onto the platform request
/// - Categorizing failures into [`CameraError`] variants
/// - Returning every track it opened so the caller can own their release
///
/// # Example
///
/// ```ignore
/// let backend = BrowserCamera::new();
/// let tracks = backend.open(&CameraConstraints::rear_hd()).await?;
/// ```
#[async_trait]
pub trait CameraBackend: Send + Sync {
    /// Get the name of this backend
    fn name(&self) -> &str;

    /// Request a video stream matching the constraints
    async fn open(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Vec<Box<dyn VideoTrack>>, CameraError>;
}

/// A camera backend for platforms without any camera
///
/// Every request fails with [`CameraError::NoDevice`], which lets the AR
/// view surface the "no camera" screen without conditional compilation.
#[derive(Debug, Default)]
pub struct NullCamera;

impl NullCamera {
    /// Create a new null camera
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CameraBackend for NullCamera {
    fn name(&self) -> &str {
        "null"
    }

    async fn open(
        &self,
        _constraints: &CameraConstraints,
    ) -> Result<Vec<Box<dyn VideoTrack>>, CameraError> {
        Err(CameraError::NoDevice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_camera() {
        let backend = NullCamera::new();
        assert_eq!(backend.name(), "null");

        let result = backend.open(&CameraConstraints::default()).await;
        assert!(matches!(result, Err(CameraError::NoDevice)));
    }
}
