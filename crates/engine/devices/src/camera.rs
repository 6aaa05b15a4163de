//! Camera passthrough provider
//!
//! Acquires a rear-facing video stream used as the background layer when
//! no immersive AR session exists. The stream moves through
//! `Inactive → Requesting → Active | Failed`, and every opened track is
//! owned by a [`CameraStream`] guard that stops it on drop, so leaving the
//! view on any path (close, error, cancellation) releases the device.

use crate::backend::{CameraBackend, VideoTrack};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Which physical camera to request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera, facing away from the user
    #[default]
    Environment,
    /// Front camera, facing the user
    User,
}

/// Stream request constraints.
///
/// The resolution is a preference; backends may grant less and the
/// provider accepts whatever arrives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConstraints {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self::rear_hd()
    }
}

impl CameraConstraints {
    /// Environment-facing camera at an ideal 1920×1080
    pub fn rear_hd() -> Self {
        Self {
            facing: FacingMode::Environment,
            ideal_width: 1920,
            ideal_height: 1080,
        }
    }
}

/// Settings actually granted for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSettings {
    pub width: u32,
    pub height: u32,
    pub facing: FacingMode,
}

/// Errors that can occur while acquiring the camera
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    /// The user or platform denied camera access
    #[error("Camera permission denied")]
    PermissionDenied,

    /// No camera is present or none matches the request
    #[error("No camera device found")]
    NoDevice,

    /// The camera is held by another application
    #[error("Camera is busy or in use by another application")]
    DeviceBusy,

    /// The request was cancelled before it finished
    #[error("Camera request cancelled")]
    Cancelled,

    /// Any other backend failure
    #[error("Camera error: {0}")]
    Other(String),
}

impl CameraError {
    /// Map a browser `DOMException` name onto a category
    pub fn from_dom_name(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" | "SecurityError" | "PermissionDeniedError" => Self::PermissionDenied,
            "NotFoundError" | "DevicesNotFoundError" | "OverconstrainedError" => Self::NoDevice,
            "NotReadableError" | "TrackStartError" | "AbortError" => Self::DeviceBusy,
            _ => Self::Other(format!("{name}: {message}")),
        }
    }

    /// User-facing remediation text for the error screen
    pub fn remediation(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Camera access was blocked. Allow camera access for this site in your browser or system settings, then try again."
            }
            Self::NoDevice => {
                "No camera was found on this device. AR view needs a rear-facing camera."
            }
            Self::DeviceBusy => {
                "The camera is being used by another app. Close other apps that use the camera, then try again."
            }
            Self::Cancelled => "The camera request was cancelled.",
            Self::Other(_) => "The camera could not be started. Try again, or restart the app.",
        }
    }

    /// Returns true if the error screen should offer a retry action
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

/// Lifecycle of the passthrough stream
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Inactive,
    Requesting,
    Active,
    Failed(CameraError),
}

/// Owning guard for the tracks of one camera stream.
///
/// Dropping the guard stops every track that is still live.
pub struct CameraStream {
    tracks: Vec<Box<dyn VideoTrack>>,
}

impl std::fmt::Debug for CameraStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraStream")
            .field("tracks", &self.tracks.len())
            .field("active", &self.is_active())
            .finish()
    }
}

impl CameraStream {
    /// Take ownership of backend tracks
    pub fn new(tracks: Vec<Box<dyn VideoTrack>>) -> Self {
        Self { tracks }
    }

    /// Settings of the first track, if any
    pub fn settings(&self) -> Option<StreamSettings> {
        self.tracks.first().map(|t| t.settings())
    }

    /// Number of tracks still producing frames
    pub fn live_tracks(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_live()).count()
    }

    /// Whether at least one track is live
    pub fn is_active(&self) -> bool {
        self.live_tracks() > 0
    }

    /// Stop all tracks now
    pub fn stop(&mut self) {
        for track in self.tracks.iter_mut() {
            if track.is_live() {
                tracing::debug!(track = track.id(), "Stopping camera track");
                track.stop();
            }
        }
        self.tracks.clear();
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Camera passthrough provider for the fallback path
#[derive(Debug)]
pub struct PassthroughProvider {
    constraints: CameraConstraints,
    state: StreamState,
    stream: Option<CameraStream>,
}

impl PassthroughProvider {
    /// Create a provider that will request the given constraints
    pub fn new(constraints: CameraConstraints) -> Self {
        Self {
            constraints,
            state: StreamState::Inactive,
            stream: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> &StreamState {
        &self.state
    }

    /// The active stream, if acquired
    pub fn stream(&self) -> Option<&CameraStream> {
        self.stream.as_ref()
    }

    /// Number of live camera tracks held by this provider
    pub fn live_tracks(&self) -> usize {
        self.stream.as_ref().map_or(0, |s| s.live_tracks())
    }

    /// Acquire the camera stream.
    ///
    /// Works from `Inactive` and from `Failed` (retry). Cancelling `cancel`
    /// while the request is in flight drops the request, and a stream that
    /// still arrives is stopped before returning [`CameraError::Cancelled`].
    pub async fn acquire(
        &mut self,
        backend: &dyn CameraBackend,
        cancel: &CancellationToken,
    ) -> Result<StreamSettings, CameraError> {
        if let (StreamState::Active, Some(settings)) =
            (&self.state, self.stream.as_ref().and_then(|s| s.settings()))
        {
            return Ok(settings);
        }

        self.release();
        self.state = StreamState::Requesting;
        tracing::info!(backend = backend.name(), constraints = ?self.constraints, "Requesting camera");

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CameraError::Cancelled),
            result = backend.open(&self.constraints) => result,
        };

        let stream = match result {
            Ok(tracks) => CameraStream::new(tracks),
            Err(CameraError::Cancelled) => {
                tracing::debug!("Camera request cancelled");
                self.state = StreamState::Inactive;
                return Err(CameraError::Cancelled);
            }
            Err(err) => {
                tracing::warn!(error = %err, "Camera acquisition failed");
                self.state = StreamState::Failed(err.clone());
                return Err(err);
            }
        };

        if cancel.is_cancelled() {
            // Dropping the guard stops the late tracks.
            drop(stream);
            self.state = StreamState::Inactive;
            return Err(CameraError::Cancelled);
        }

        let Some(settings) = stream.settings() else {
            let err = CameraError::Other("backend returned no video tracks".to_string());
            self.state = StreamState::Failed(err.clone());
            return Err(err);
        };

        if settings.width < self.constraints.ideal_width
            || settings.height < self.constraints.ideal_height
        {
            tracing::info!(
                width = settings.width,
                height = settings.height,
                "Camera granted below the ideal resolution"
            );
        }
        if settings.facing != self.constraints.facing {
            tracing::warn!(facing = ?settings.facing, "Camera granted a different facing mode");
        }

        self.stream = Some(stream);
        self.state = StreamState::Active;
        Ok(settings)
    }

    /// Stop all tracks and return to `Inactive` (a failure state is kept)
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            tracing::info!("Camera released");
        }
        if matches!(self.state, StreamState::Active | StreamState::Requesting) {
            self.state = StreamState::Inactive;
        }
    }
}

impl Drop for PassthroughProvider {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountedTrack {
        live: bool,
        counter: Arc<AtomicUsize>,
        settings: StreamSettings,
    }

    impl VideoTrack for CountedTrack {
        fn id(&self) -> &str {
            "test-track"
        }
        fn settings(&self) -> StreamSettings {
            self.settings
        }
        fn is_live(&self) -> bool {
            self.live
        }
        fn stop(&mut self) {
            if self.live {
                self.live = false;
                self.counter.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    struct TestCamera {
        counter: Arc<AtomicUsize>,
        width: u32,
        fail: Option<CameraError>,
    }

    #[async_trait]
    impl CameraBackend for TestCamera {
        fn name(&self) -> &str {
            "test"
        }

        async fn open(
            &self,
            constraints: &CameraConstraints,
        ) -> Result<Vec<Box<dyn VideoTrack>>, CameraError> {
            if let Some(err) = &self.fail {
                return Err(err.clone());
            }
            self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Box::new(CountedTrack {
                live: true,
                counter: self.counter.clone(),
                settings: StreamSettings {
                    width: self.width,
                    height: self.width * 9 / 16,
                    facing: constraints.facing,
                },
            })])
        }
    }

    fn camera(width: u32) -> (TestCamera, Arc<AtomicUsize>) {
        let counter = Arc::new(AtomicUsize::new(0));
        (
            TestCamera {
                counter: counter.clone(),
                width,
                fail: None,
            },
            counter,
        )
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let (backend, counter) = camera(1920);
        let mut provider = PassthroughProvider::new(CameraConstraints::default());
        assert_eq!(provider.state(), &StreamState::Inactive);

        let settings = provider
            .acquire(&backend, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(settings.width, 1920);
        assert_eq!(provider.state(), &StreamState::Active);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        provider.release();
        assert_eq!(provider.state(), &StreamState::Inactive);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lower_resolution_is_accepted() {
        let (backend, _counter) = camera(640);
        let mut provider = PassthroughProvider::new(CameraConstraints::rear_hd());

        let settings = provider
            .acquire(&backend, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(settings.width, 640);
        assert_eq!(provider.state(), &StreamState::Active);
    }

    #[tokio::test]
    async fn test_failure_then_retry() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut backend = TestCamera {
            counter: counter.clone(),
            width: 1280,
            fail: Some(CameraError::PermissionDenied),
        };
        let mut provider = PassthroughProvider::new(CameraConstraints::default());
        let cancel = CancellationToken::new();

        let err = provider.acquire(&backend, &cancel).await.unwrap_err();
        assert_eq!(err, CameraError::PermissionDenied);
        assert!(err.is_retryable());
        assert_eq!(
            provider.state(),
            &StreamState::Failed(CameraError::PermissionDenied)
        );

        backend.fail = None;
        provider.acquire(&backend, &cancel).await.unwrap();
        assert_eq!(provider.state(), &StreamState::Active);
    }

    #[tokio::test]
    async fn test_cancelled_before_request() {
        let (backend, counter) = camera(1920);
        let mut provider = PassthroughProvider::new(CameraConstraints::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = provider.acquire(&backend, &cancel).await.unwrap_err();
        assert_eq!(err, CameraError::Cancelled);
        assert_eq!(provider.state(), &StreamState::Inactive);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_drop_releases_tracks() {
        let (backend, counter) = camera(1920);
        {
            let mut provider = PassthroughProvider::new(CameraConstraints::default());
            provider
                .acquire(&backend, &CancellationToken::new())
                .await
                .unwrap();
            assert_eq!(provider.live_tracks(), 1);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dom_error_mapping() {
        assert_eq!(
            CameraError::from_dom_name("NotAllowedError", ""),
            CameraError::PermissionDenied
        );
        assert_eq!(
            CameraError::from_dom_name("NotFoundError", ""),
            CameraError::NoDevice
        );
        assert_eq!(
            CameraError::from_dom_name("NotReadableError", ""),
            CameraError::DeviceBusy
        );
        assert!(matches!(
            CameraError::from_dom_name("TypeError", "bad"),
            CameraError::Other(_)
        ));
    }
}
