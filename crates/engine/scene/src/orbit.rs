//! Virtual camera rig for the simulated (passthrough) path
//!
//! The real camera feed is drawn behind the scene, so the virtual camera only
//! decides how the content is framed. Before placement the user can orbit,
//! pan and zoom around the preview; once placed the rig snaps back to its home
//! pose looking at the anchor and only rotation stays enabled.
//!
//! Uses OpenGL convention: +X right, +Y up, -Z forward.

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Default vertical field of view: 60 degrees
pub const DEFAULT_VFOV: f32 = 60.0 * std::f32::consts::PI / 180.0;

/// Maximum elevation above/below the target plane (85 degrees)
const MAX_ELEVATION: f32 = 85.0 * std::f32::consts::PI / 180.0;

/// Pose of the virtual camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub rotation: Quat,
    /// Vertical field of view in radians
    pub vfov: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            vfov: DEFAULT_VFOV,
        }
    }
}

impl CameraPose {
    /// Camera at `position` looking at `target`
    pub fn look_at(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            rotation: look_rotation(position, target),
            vfov: DEFAULT_VFOV,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

fn look_rotation(position: Vec3, target: Vec3) -> Quat {
    let forward = (target - position).normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let right = forward.cross(Vec3::Y).normalize_or_zero();
    if right == Vec3::ZERO {
        // Looking straight up or down
        return Quat::from_rotation_arc(Vec3::NEG_Z, forward);
    }
    let up = right.cross(forward);
    Quat::from_mat3(&Mat3::from_cols(right, up, -forward))
}

/// Sensitivity and limits of the orbit rig
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    /// Radians per pixel of drag
    pub rotate_sensitivity: f32,
    /// Meters per pixel of pan drag at 1 m distance
    pub pan_sensitivity: f32,
    /// Distance change per zoom unit
    pub zoom_sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            rotate_sensitivity: 0.005,
            pan_sensitivity: 0.002,
            zoom_sensitivity: 0.5,
            min_distance: 0.5,
            max_distance: 10.0,
        }
    }
}

/// Orbit controller with a home pose
///
/// `enable_pan` and `enable_zoom` mirror what the draw list reports to the
/// presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitRig {
    camera: CameraPose,
    target: Vec3,
    home: Vec3,
    config: OrbitConfig,
    pub enable_pan: bool,
    pub enable_zoom: bool,
}

impl OrbitRig {
    /// Rig at `home` (the origin by default) looking at `target`
    pub fn new(home: Vec3, target: Vec3, config: OrbitConfig) -> Self {
        Self {
            camera: CameraPose::look_at(home, target),
            target,
            home,
            config,
            enable_pan: true,
            enable_zoom: true,
        }
    }

    pub fn camera(&self) -> &CameraPose {
        &self.camera
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn home(&self) -> Vec3 {
        self.home
    }

    pub fn distance(&self) -> f32 {
        (self.camera.position - self.target).length()
    }

    /// Orbit around the target; pitch is clamped short of the poles
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        let mut offset = self.camera.position - self.target;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return;
        }

        if pitch_delta.abs() > 1e-4 {
            let right = (-offset).normalize().cross(Vec3::Y).normalize_or_zero();
            if right != Vec3::ZERO {
                offset = Quat::from_axis_angle(right, pitch_delta) * offset;

                let xz = Vec3::new(offset.x, 0.0, offset.z).length();
                let elevation = offset.y.atan2(xz);
                if elevation.abs() > MAX_ELEVATION && xz > f32::EPSILON {
                    let clamped = elevation.clamp(-MAX_ELEVATION, MAX_ELEVATION);
                    let ratio = distance * clamped.cos() / xz;
                    offset = Vec3::new(offset.x * ratio, distance * clamped.sin(), offset.z * ratio);
                }
            }
        }

        if yaw_delta.abs() > 1e-4 {
            offset = Quat::from_rotation_y(yaw_delta) * offset;
        }

        self.camera.position = self.target + offset.normalize() * distance;
        self.camera.rotation = look_rotation(self.camera.position, self.target);
    }

    /// Drag in pixels, converted with the configured sensitivity
    pub fn drag(&mut self, dx: f32, dy: f32) {
        let s = self.config.rotate_sensitivity;
        self.rotate(-dx * s, -dy * s);
    }

    /// Move camera and target together in the view plane; no-op when disabled
    pub fn pan(&mut self, dx: f32, dy: f32) {
        if !self.enable_pan {
            return;
        }
        let scale = self.config.pan_sensitivity * self.distance().max(1.0);
        let delta = (-self.camera.right() * dx + self.camera.up() * dy) * scale;
        self.camera.position += delta;
        self.target += delta;
    }

    /// Move toward (positive) or away from the target; no-op when disabled
    pub fn zoom(&mut self, delta: f32) {
        if !self.enable_zoom {
            return;
        }
        let to_target = self.target - self.camera.position;
        let distance = to_target.length();
        if distance <= f32::EPSILON {
            return;
        }
        let new_distance = (distance - delta * self.config.zoom_sensitivity)
            .clamp(self.config.min_distance, self.config.max_distance);
        self.camera.position = self.target - to_target * (new_distance / distance);
    }

    /// Return to the home pose looking at `target`
    pub fn reset_home(&mut self, target: Vec3) {
        self.target = target;
        self.camera = CameraPose::look_at(self.home, target);
    }

    /// Lock to rotation only, framing `anchor` from the home pose
    pub fn lock_to_anchor(&mut self, anchor: Vec3) {
        self.reset_home(anchor);
        self.enable_pan = false;
        self.enable_zoom = false;
    }

    /// Overwrite the camera position while keeping the target in view
    pub fn set_position(&mut self, position: Vec3) {
        self.camera.position = position;
        self.camera.rotation = look_rotation(position, self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> OrbitRig {
        OrbitRig::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -2.0), OrbitConfig::default())
    }

    #[test]
    fn test_home_pose_looks_at_target() {
        let rig = rig();
        assert!(rig.camera().forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!((rig.distance() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_rotate_keeps_distance() {
        let mut rig = rig();
        rig.rotate(0.7, 0.3);
        rig.rotate(-2.0, -0.1);
        assert!((rig.distance() - 2.0).abs() < 1e-4);

        let to_target = (rig.target() - rig.camera().position).normalize();
        assert!(rig.camera().forward().abs_diff_eq(to_target, 1e-4));
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut rig = rig();
        for _ in 0..40 {
            rig.rotate(0.0, 0.2);
        }
        let offset = rig.camera().position - rig.target();
        let xz = Vec3::new(offset.x, 0.0, offset.z).length();
        assert!(offset.y.atan2(xz).abs() <= MAX_ELEVATION + 1e-3);
    }

    #[test]
    fn test_zoom_clamps_and_respects_lock() {
        let mut rig = rig();
        rig.zoom(100.0);
        assert!((rig.distance() - 0.5).abs() < 1e-5);
        rig.zoom(-100.0);
        assert!((rig.distance() - 10.0).abs() < 1e-4);

        rig.lock_to_anchor(Vec3::new(0.0, 0.2, -2.0));
        let before = rig.distance();
        rig.zoom(1.0);
        rig.pan(50.0, 50.0);
        assert_eq!(rig.distance(), before);
        assert_eq!(rig.camera().position, Vec3::ZERO);
    }

    #[test]
    fn test_pan_moves_target_with_camera() {
        let mut rig = rig();
        let before = rig.camera().position - rig.target();
        rig.pan(100.0, -40.0);
        let after = rig.camera().position - rig.target();
        assert!(before.abs_diff_eq(after, 1e-5));
        assert_ne!(rig.target(), Vec3::new(0.0, 0.0, -2.0));
    }
}
