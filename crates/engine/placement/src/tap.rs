//! Tap-to-place heuristic
//!
//! Without depth sensing the passthrough path cannot know where a tap hits
//! the world. It instead projects the tap to a point at a constant distance
//! in front of the virtual camera (at the origin, looking down -Z), with the
//! screen offset scaled down so content stays near the middle of the view.
//! The constants are empirical; they live in [`TapPolicy`] so they can be
//! tuned per device class.

use devices::Viewport;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use xr::Pose;

/// Constants of the fixed-distance projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapPolicy {
    /// Forward distance from the camera, in scene units
    pub distance: f32,
    /// Multiplier applied to normalized X
    pub horizontal_scale: f32,
    /// Multiplier applied to normalized Y
    pub vertical_scale: f32,
    /// Added to the scaled Y so content sits slightly above center
    pub vertical_bias: f32,
}

impl Default for TapPolicy {
    fn default() -> Self {
        Self {
            distance: 2.0,
            horizontal_scale: 0.8,
            vertical_scale: 0.5,
            vertical_bias: 0.2,
        }
    }
}

impl TapPolicy {
    /// Candidate pose for a tap at pixel `tap` inside `viewport`.
    ///
    /// Pure: identical inputs always give the identical pose. Returns `None`
    /// for a degenerate viewport or non-finite tap.
    pub fn resolve(&self, tap: Vec2, viewport: Viewport) -> Option<Pose> {
        if !tap.is_finite() {
            return None;
        }
        let ndc = viewport.to_ndc(tap)?;
        Some(Pose::from_position(self.project(ndc)))
    }

    /// Scene-space point for normalized device coordinates
    pub fn project(&self, ndc: Vec2) -> Vec3 {
        Vec3::new(
            ndc.x * self.horizontal_scale,
            ndc.y * self.vertical_scale + self.vertical_bias,
            -self.distance,
        )
    }
}
