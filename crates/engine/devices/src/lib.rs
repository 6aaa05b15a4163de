//! Input and capture device abstractions for AR placement
//!
//! This crate provides platform-agnostic abstractions for the devices the
//! AR view talks to directly: the pointer (tap-to-place input) and the
//! rear-facing camera used as a passthrough background when no immersive
//! session is available.
//!
//! # Modules
//!
//! - [`pointer`]: Pointer/touch events, viewport and NDC conversion
//! - [`camera`]: Camera passthrough lifecycle and scoped stream ownership
//! - [`backend`]: Camera backend trait for platform-specific implementations

pub mod backend;
pub mod camera;
pub mod pointer;

// Re-export commonly used types at crate root
pub use backend::{CameraBackend, NullCamera, VideoTrack};
pub use camera::{
    CameraConstraints, CameraError, CameraStream, FacingMode, PassthroughProvider, StreamSettings,
    StreamState,
};
pub use pointer::{PointerEvent, PointerPhase, PointerState, Viewport};
