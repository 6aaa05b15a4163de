//! AR content placement
//!
//! Everything between "a candidate pose exists" and "here is where to draw":
//!
//! - [`tap`]: fixed-distance tap-to-place heuristic for the passthrough path
//! - [`anchor`]: the one-shot `unplaced → placed` anchor state machine
//! - [`transform`]: the persisted per-item [`ModelTransform`] offset
//! - [`compose`]: merging anchor, offset and state-dependent defaults into a
//!   final [`RenderTransform`]
//! - [`error`]: error types
//!
//! Poses come from the `xr` crate so hit-test results and tap results share
//! one representation.

pub mod anchor;
pub mod compose;
pub mod error;
pub mod tap;
pub mod transform;

pub use anchor::{Anchor, AnchorConfig, AnchorMachine, AnchorSource, AnchorState, CommitOutcome};
pub use compose::{AnchorMode, PreviewStyle, RenderTransform, TransformComposer};
pub use error::{Error, Result};
pub use tap::TapPolicy;
pub use transform::ModelTransform;
pub use xr::Pose;
