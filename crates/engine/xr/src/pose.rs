//! Rigid transforms in scene space

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position (meters) plus unit-quaternion orientation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// Pose at the origin with no rotation
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    /// Create a pose, normalizing the orientation
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation: orientation.normalize(),
        }
    }

    /// Pose at a position with identity orientation
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
        }
    }

    /// Whether every component is finite
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.orientation.is_finite()
    }

    /// Approximate equality for tests and change detection
    pub fn abs_diff_eq(&self, other: &Pose, max_abs_diff: f32) -> bool {
        self.position.abs_diff_eq(other.position, max_abs_diff)
            && (self.orientation.abs_diff_eq(other.orientation, max_abs_diff)
                || self.orientation.abs_diff_eq(-other.orientation, max_abs_diff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_orientation() {
        let pose = Pose::new(Vec3::ZERO, Quat::from_xyzw(0.0, 2.0, 0.0, 0.0));
        assert!(pose.orientation.is_normalized());
        assert!(pose.abs_diff_eq(&Pose::new(Vec3::ZERO, Quat::from_rotation_y(std::f32::consts::PI)), 1e-6));
    }

    #[test]
    fn test_non_finite_detected() {
        let pose = Pose::from_position(Vec3::new(f32::NAN, 0.0, 0.0));
        assert!(!pose.is_finite());
        assert!(Pose::IDENTITY.is_finite());
    }
}
