//! Transform composition
//!
//! Produces the final render transform of the primary content item and of
//! every anchor-relative offset (hotspots, primitives).
//!
//! - Position: `anchor.position + offset`, component-wise, in both modes.
//!   The anchor orientation is never applied to offsets.
//! - Rotation and scale: taken from the persisted [`ModelTransform`] when one
//!   exists, otherwise a state-dependent default (small and spinning while
//!   unplaced, full size with a faint wobble once placed).

use crate::anchor::AnchorState;
use crate::transform::ModelTransform;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use xr::Pose;

/// How the content root relates to the anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorMode {
    /// Root at a surface hit-test position; no orbit rig
    Immersive,
    /// Root at a free anchor in front of a virtual orbit camera
    Simulated,
}

/// Final transform handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for RenderTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Defaults used when no persisted transform exists
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewStyle {
    /// Where the preview floats before placement (simulated mode)
    pub preview_position: Vec3,
    /// Uniform scale before placement
    pub unplaced_scale: f32,
    /// Uniform scale after placement
    pub placed_scale: f32,
    /// Idle Y spin before placement, radians per second
    pub idle_spin_speed: f32,
    /// Peak Y wobble after placement, radians
    pub placed_wobble_amplitude: f32,
    /// Wobble angular frequency, radians per second
    pub placed_wobble_frequency: f32,
}

impl Default for PreviewStyle {
    fn default() -> Self {
        Self {
            preview_position: Vec3::new(0.0, 0.0, -2.0),
            unplaced_scale: 0.6,
            placed_scale: 1.0,
            idle_spin_speed: 0.5,
            placed_wobble_amplitude: 0.02,
            placed_wobble_frequency: 0.5,
        }
    }
}

/// Combines anchor state, persisted offset and defaults
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformComposer {
    mode: AnchorMode,
    style: PreviewStyle,
}

impl TransformComposer {
    pub fn new(mode: AnchorMode, style: PreviewStyle) -> Self {
        Self { mode, style }
    }

    pub fn mode(&self) -> AnchorMode {
        self.mode
    }

    pub fn style(&self) -> &PreviewStyle {
        &self.style
    }

    /// Pose of the content root: the anchor once placed, otherwise the
    /// preview position
    pub fn base_pose(&self, state: &AnchorState) -> Pose {
        match state.anchor() {
            Some(anchor) => anchor.pose,
            None => Pose::from_position(self.style.preview_position),
        }
    }

    /// Final transform of the primary content at `time` seconds
    pub fn primary(
        &self,
        state: &AnchorState,
        model: Option<&ModelTransform>,
        time: f32,
    ) -> RenderTransform {
        let base = self.base_pose(state);
        let offset = model.map_or(Vec3::ZERO, |m| m.position);

        let (local_rotation, scale) = match model {
            Some(m) => (m.rotation_quat(), m.scale),
            None if state.is_placed() => {
                let wobble = (time * self.style.placed_wobble_frequency).sin()
                    * self.style.placed_wobble_amplitude;
                (Quat::from_rotation_y(wobble), Vec3::splat(self.style.placed_scale))
            }
            None => (
                Quat::from_rotation_y(time * self.style.idle_spin_speed),
                Vec3::splat(self.style.unplaced_scale),
            ),
        };

        RenderTransform {
            position: base.position + offset,
            rotation: local_rotation,
            scale,
        }
    }

    /// Final transform of an authored anchor-relative offset
    pub fn offset(
        &self,
        state: &AnchorState,
        position: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) -> RenderTransform {
        let base = self.base_pose(state);
        RenderTransform {
            position: base.position + position,
            rotation,
            scale,
        }
    }
}
