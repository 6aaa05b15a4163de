//! Runtime, session and frame traits
//!
//! Platform backends implement these three traits. The runtime answers the
//! capability probe and creates sessions; a session hands out reference
//! spaces and hit-test sources; a frame is the per-tick view of results and
//! input that the render loop reads synchronously.

use crate::error::Result;
use crate::pose::Pose;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Kind of session to request from the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionMode {
    /// Camera see-through AR with real-world tracking
    #[serde(rename = "immersive-ar")]
    ImmersiveAr,
    /// Fully virtual immersive session
    #[serde(rename = "immersive-vr")]
    ImmersiveVr,
    /// Non-immersive session rendered inside the page
    #[serde(rename = "inline")]
    Inline,
}

impl SessionMode {
    /// Runtime identifier for this mode
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ImmersiveAr => "immersive-ar",
            Self::ImmersiveVr => "immersive-vr",
            Self::Inline => "inline",
        }
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional or required session features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionFeature {
    HitTest,
}

/// Reference space kinds used by placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceSpaceKind {
    /// Tracks the viewer's head/device; rays cast from here follow the crosshair
    Viewer,
    /// Fixed at the session origin; placement poses are reported here
    Local,
}

/// Handle to a reference space owned by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceSpace {
    pub id: u32,
    pub kind: ReferenceSpaceKind,
}

/// Handle to a hit-test source owned by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitTestSourceId(pub u32);

/// Trait for AR runtimes (e.g. WebXR `navigator.xr`, ARCore, ARKit)
#[async_trait]
pub trait XrRuntime: Send + Sync {
    /// Get the name of this runtime
    fn name(&self) -> &str;

    /// Ask whether a session mode is supported
    async fn is_session_supported(&self, mode: SessionMode) -> Result<bool>;

    /// Create a session with the required features
    async fn request_session(
        &self,
        mode: SessionMode,
        required: &[SessionFeature],
    ) -> Result<Box<dyn XrSession>>;
}

/// An active immersive session
#[async_trait]
pub trait XrSession: Send {
    /// Create a reference space of the given kind
    async fn request_reference_space(&mut self, kind: ReferenceSpaceKind)
        -> Result<ReferenceSpace>;

    /// Create a hit-test source casting along the -Z axis of `space`
    async fn request_hit_test_source(&mut self, space: ReferenceSpace) -> Result<HitTestSourceId>;

    /// Cancel a hit-test source; results stop being produced for it
    fn cancel_hit_test_source(&mut self, source: HitTestSourceId);

    /// End the session
    fn end(&mut self);

    /// Whether the session has ended
    fn is_ended(&self) -> bool;
}

/// Per-frame view of the session, valid only during one render tick
pub trait XrFrame {
    /// Poses of the hit-test results for `source`, expressed in `base`,
    /// nearest first
    fn hit_test_poses(&self, source: HitTestSourceId, base: ReferenceSpace) -> Vec<Pose>;

    /// Number of `select` input events delivered this frame
    fn select_count(&self) -> u32;
}

/// A frame described by plain data.
///
/// Used by recorded sessions, simulations and tests; it answers every
/// source and space with the same results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub hits: Vec<Pose>,
    pub selects: u32,
}

impl FrameSnapshot {
    /// Frame with no hits and no input
    pub fn empty() -> Self {
        Self::default()
    }

    /// Frame with a single hit
    pub fn hit(pose: Pose) -> Self {
        Self {
            hits: vec![pose],
            selects: 0,
        }
    }

    /// Add select events to this frame
    pub fn with_selects(mut self, selects: u32) -> Self {
        self.selects = selects;
        self
    }
}

impl XrFrame for FrameSnapshot {
    fn hit_test_poses(&self, _source: HitTestSourceId, _base: ReferenceSpace) -> Vec<Pose> {
        self.hits.clone()
    }

    fn select_count(&self) -> u32 {
        self.selects
    }
}
