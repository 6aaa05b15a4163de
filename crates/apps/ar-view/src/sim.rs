//! Simulated platform backends
//!
//! Desktop stand-ins for the AR runtime and the camera, used by the
//! simulation harness and the tests. Both keep shared counters so callers
//! can check that sessions end, hit-test sources are cancelled and camera
//! tracks are stopped.

use async_trait::async_trait;
use devices::{CameraBackend, CameraConstraints, CameraError, FacingMode, StreamSettings, VideoTrack};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use xr::{
    Error, HitTestSourceId, ReferenceSpace, ReferenceSpaceKind, Result, SessionFeature,
    SessionMode, XrRuntime, XrSession,
};

// ============================================================================
// XR runtime
// ============================================================================

/// How the simulated runtime answers the capability probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeAnswer {
    Supported,
    Unsupported,
    Fail(String),
}

/// Counters shared between a runtime and its sessions
#[derive(Debug, Default)]
pub struct SessionLog {
    pub sessions_started: AtomicUsize,
    pub sessions_ended: AtomicUsize,
    pub active_sources: AtomicUsize,
}

impl SessionLog {
    pub fn active_sources(&self) -> usize {
        self.active_sources.load(Ordering::SeqCst)
    }

    pub fn sessions_ended(&self) -> usize {
        self.sessions_ended.load(Ordering::SeqCst)
    }
}

/// Scripted AR runtime
#[derive(Debug)]
pub struct SimulatedRuntime {
    probe: ProbeAnswer,
    hit_test_available: bool,
    session_available: bool,
    log: Arc<SessionLog>,
}

impl SimulatedRuntime {
    pub fn new(probe: ProbeAnswer) -> Self {
        Self {
            probe,
            hit_test_available: true,
            session_available: true,
            log: Arc::default(),
        }
    }

    /// Sessions refuse to create hit-test sources
    pub fn without_hit_test(mut self) -> Self {
        self.hit_test_available = false;
        self
    }

    /// Session requests fail despite a positive probe
    pub fn without_sessions(mut self) -> Self {
        self.session_available = false;
        self
    }

    pub fn log(&self) -> Arc<SessionLog> {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl XrRuntime for SimulatedRuntime {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn is_session_supported(&self, mode: SessionMode) -> Result<bool> {
        match (&self.probe, mode) {
            (ProbeAnswer::Fail(reason), _) => Err(Error::Runtime(reason.clone())),
            (ProbeAnswer::Supported, SessionMode::ImmersiveAr) => Ok(true),
            _ => Ok(false),
        }
    }

    async fn request_session(
        &self,
        mode: SessionMode,
        required: &[SessionFeature],
    ) -> Result<Box<dyn XrSession>> {
        if !self.session_available {
            return Err(Error::SessionRequestFailed("simulated refusal".into()));
        }
        if mode != SessionMode::ImmersiveAr {
            return Err(Error::NotSupported(mode));
        }
        tracing::debug!(?required, "Simulated session started");
        self.log.sessions_started.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimulatedSession {
            hit_test_available: self.hit_test_available,
            next_id: AtomicU32::new(1),
            ended: false,
            log: Arc::clone(&self.log),
        }))
    }
}

/// Session created by [`SimulatedRuntime`]
#[derive(Debug)]
pub struct SimulatedSession {
    hit_test_available: bool,
    next_id: AtomicU32,
    ended: bool,
    log: Arc<SessionLog>,
}

impl SimulatedSession {
    fn next_id(&self) -> u32 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl XrSession for SimulatedSession {
    async fn request_reference_space(
        &mut self,
        kind: ReferenceSpaceKind,
    ) -> Result<ReferenceSpace> {
        if self.ended {
            return Err(Error::SessionEnded);
        }
        Ok(ReferenceSpace {
            id: self.next_id(),
            kind,
        })
    }

    async fn request_hit_test_source(&mut self, space: ReferenceSpace) -> Result<HitTestSourceId> {
        if self.ended {
            return Err(Error::SessionEnded);
        }
        if !self.hit_test_available {
            return Err(Error::HitTestUnavailable(format!(
                "no hit-test from {:?} space",
                space.kind
            )));
        }
        self.log.active_sources.fetch_add(1, Ordering::SeqCst);
        Ok(HitTestSourceId(self.next_id()))
    }

    fn cancel_hit_test_source(&mut self, _source: HitTestSourceId) {
        // Saturating: cancelling an unknown source is a no-op
        let _ = self
            .log
            .active_sources
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    fn end(&mut self) {
        if !self.ended {
            self.ended = true;
            self.log.sessions_ended.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_ended(&self) -> bool {
        self.ended
    }
}

// ============================================================================
// Camera
// ============================================================================

/// Scripted camera backend
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    width: u32,
    height: u32,
    latency: Option<Duration>,
    failure: Option<CameraError>,
    live: Arc<AtomicUsize>,
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl SimulatedCamera {
    /// Camera that grants `width`×`height` regardless of the request
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            latency: None,
            failure: None,
            live: Arc::default(),
        }
    }

    /// Answer every request after `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every request with `error`
    pub fn failing(mut self, error: CameraError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Tracks opened by this camera that have not been stopped
    pub fn live_tracks(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraBackend for SimulatedCamera {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn open(
        &self,
        constraints: &CameraConstraints,
    ) -> std::result::Result<Vec<Box<dyn VideoTrack>>, CameraError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Box::new(SimulatedTrack {
            settings: StreamSettings {
                width: self.width,
                height: self.height,
                facing: constraints.facing,
            },
            live: Arc::clone(&self.live),
            stopped: false,
        })])
    }
}

/// Track handed out by [`SimulatedCamera`]
#[derive(Debug)]
pub struct SimulatedTrack {
    settings: StreamSettings,
    live: Arc<AtomicUsize>,
    stopped: bool,
}

impl VideoTrack for SimulatedTrack {
    fn id(&self) -> &str {
        match self.settings.facing {
            FacingMode::Environment => "simulated-rear",
            FacingMode::User => "simulated-front",
        }
    }

    fn settings(&self) -> StreamSettings {
        self.settings
    }

    fn is_live(&self) -> bool {
        !self.stopped
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_camera_counts_tracks() {
        let camera = SimulatedCamera::new(1280, 720);
        let mut tracks = camera.open(&CameraConstraints::rear_hd()).await.unwrap();
        assert_eq!(camera.live_tracks(), 1);
        assert_eq!(tracks[0].settings().width, 1280);

        tracks[0].stop();
        tracks[0].stop();
        assert_eq!(camera.live_tracks(), 0);
    }

    #[tokio::test]
    async fn test_probe_answers() {
        let runtime = SimulatedRuntime::new(ProbeAnswer::Fail("no xr".into()));
        assert!(runtime
            .is_session_supported(SessionMode::ImmersiveAr)
            .await
            .is_err());

        let runtime = SimulatedRuntime::new(ProbeAnswer::Supported);
        assert!(runtime
            .is_session_supported(SessionMode::ImmersiveAr)
            .await
            .unwrap());
        assert!(!runtime
            .is_session_supported(SessionMode::ImmersiveVr)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_session_tracks_sources() {
        let runtime = SimulatedRuntime::new(ProbeAnswer::Supported);
        let log = runtime.log();
        let mut session = runtime
            .request_session(SessionMode::ImmersiveAr, &[SessionFeature::HitTest])
            .await
            .unwrap();

        let viewer = session
            .request_reference_space(ReferenceSpaceKind::Viewer)
            .await
            .unwrap();
        let source = session.request_hit_test_source(viewer).await.unwrap();
        assert_eq!(log.active_sources(), 1);

        session.cancel_hit_test_source(source);
        session.cancel_hit_test_source(source);
        assert_eq!(log.active_sources(), 0);

        session.end();
        session.end();
        assert_eq!(log.sessions_ended(), 1);
    }
}
