//! Persisted per-item model transform
//!
//! A `ModelTransform` is the user's fine-tuning of one content item's
//! placement relative to the anchor. It outlives AR sessions: it is loaded
//! when the scene mounts and written back by the storage collaborator on an
//! explicit save. Rotation is kept as XYZ Euler angles in radians, matching
//! the stored record.

use crate::error::{Error, Result};
use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Offset position, Euler rotation and scale applied on top of the anchor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelTransform {
    pub position: Vec3,
    /// XYZ Euler angles in radians
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ModelTransform {
    /// No offset, no rotation, unit scale
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    /// Create a transform from its three parts
    pub fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Rotation as a quaternion
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Check that the transform is usable for rendering
    pub fn validate(&self) -> Result<()> {
        if !self.position.is_finite() {
            return Err(Error::NonFinite { field: "position" });
        }
        if !self.rotation.is_finite() {
            return Err(Error::NonFinite { field: "rotation" });
        }
        if !self.scale.is_finite() {
            return Err(Error::NonFinite { field: "scale" });
        }
        if self.scale.min_element() <= 0.0 {
            return Err(Error::InvalidScale(self.scale.to_array()));
        }
        Ok(())
    }

    // Editor interactions

    /// Drag: move by `delta` in anchor space
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Rotate by Euler `delta` radians, wrapping each angle into (-π, π]
    pub fn rotate(&mut self, delta: Vec3) {
        let wrapped = (self.rotation + delta).to_array().map(wrap_angle);
        self.rotation = Vec3::from_array(wrapped);
    }

    /// Uniform scale by `factor`, clamped to `[min, max]` per component
    pub fn scale_by(&mut self, factor: f32, min: f32, max: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.scale = (self.scale * factor).clamp(Vec3::splat(min), Vec3::splat(max));
        }
    }
}

fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped == -PI {
        PI
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_identity_is_valid() {
        assert!(ModelTransform::IDENTITY.validate().is_ok());
        assert_eq!(ModelTransform::default().rotation_quat(), Quat::IDENTITY);
    }

    #[test]
    fn test_validation_errors() {
        let mut t = ModelTransform::IDENTITY;
        t.scale = Vec3::new(1.0, 0.0, 1.0);
        assert!(matches!(t.validate(), Err(Error::InvalidScale(_))));

        t = ModelTransform::IDENTITY;
        t.position.y = f32::INFINITY;
        assert_eq!(t.validate(), Err(Error::NonFinite { field: "position" }));
    }

    #[test]
    fn test_editor_mutations() {
        let mut t = ModelTransform::IDENTITY;
        t.translate(Vec3::new(0.5, 0.0, -0.25));
        t.translate(Vec3::new(0.5, 1.0, 0.0));
        assert_eq!(t.position, Vec3::new(1.0, 1.0, -0.25));

        t.rotate(Vec3::new(0.0, 1.5 * PI, 0.0));
        assert!((t.rotation.y - (-0.5 * PI)).abs() < 1e-5);

        t.scale_by(10.0, 0.1, 5.0);
        assert_eq!(t.scale, Vec3::splat(5.0));
        t.scale_by(-1.0, 0.1, 5.0);
        assert_eq!(t.scale, Vec3::splat(5.0));
    }
}
