//! Immersive AR session boundary
//!
//! This crate wraps the parts of a platform AR runtime that object placement
//! needs and nothing more:
//!
//! - **Capability detection**: one async probe for `immersive-ar` support that
//!   picks the rendering path before anything is drawn
//! - **Session boundary**: runtime, session and per-frame traits that platform
//!   backends implement (WebXR, ARCore, ARKit, ...)
//! - **Hit-testing**: a viewer-space ray cast every frame, reporting the
//!   candidate pose under the device's crosshair
//!
//! # Modules
//!
//! - [`capability`]: Capability probe and render-path decision
//! - [`error`]: Error types for session operations
//! - [`hit_test`]: Per-frame hit-test engine
//! - [`pose`]: Rigid transforms (position + orientation)
//! - [`session`]: Runtime, session and frame traits

pub mod capability;
pub mod error;
pub mod pose;
pub mod session;

// Re-export commonly used types
pub use capability::{Capability, CapabilityDetector, RenderPath};
pub use error::{Error, Result};
pub use hit_test::{HitTestEngine, HitTestStatus};
pub use pose::Pose;
pub use session::{
    FrameSnapshot, HitTestSourceId, ReferenceSpace, ReferenceSpaceKind, SessionFeature,
    SessionMode, XrFrame, XrRuntime, XrSession,
};
