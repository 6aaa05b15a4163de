//! Camera auto-sway
//!
//! After placement on the simulated path the virtual camera drifts slightly
//! so the content reads as anchored in the scene behind it. The offset is a
//! pure function of time around the home position.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Amplitudes in meters and angular frequencies in radians per second
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwayConfig {
    pub enabled: bool,
    pub amplitude_x: f32,
    pub amplitude_y: f32,
    pub frequency_x: f32,
    pub frequency_y: f32,
}

impl Default for SwayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            amplitude_x: 0.05,
            amplitude_y: 0.03,
            frequency_x: 0.3,
            frequency_y: 0.5,
        }
    }
}

/// Sinusoidal camera perturbation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraSway {
    config: SwayConfig,
}

impl CameraSway {
    pub fn new(config: SwayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SwayConfig {
        &self.config
    }

    /// Offset at `time` seconds since placement
    pub fn offset(&self, time: f32) -> Vec3 {
        if !self.config.enabled {
            return Vec3::ZERO;
        }
        Vec3::new(
            (time * self.config.frequency_x).sin() * self.config.amplitude_x,
            (time * self.config.frequency_y).sin() * self.config.amplitude_y,
            0.0,
        )
    }

    /// Camera position around `home`
    pub fn apply(&self, home: Vec3, time: f32) -> Vec3 {
        home + self.offset(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_bounded() {
        let sway = CameraSway::default();
        for i in 0..500 {
            let o = sway.offset(i as f32 * 0.13);
            assert!(o.x.abs() <= 0.05 + 1e-6);
            assert!(o.y.abs() <= 0.03 + 1e-6);
            assert_eq!(o.z, 0.0);
        }
    }

    #[test]
    fn test_starts_at_home() {
        let sway = CameraSway::default();
        assert_eq!(sway.apply(Vec3::ONE, 0.0), Vec3::ONE);
    }

    #[test]
    fn test_disabled() {
        let sway = CameraSway::new(SwayConfig {
            enabled: false,
            ..Default::default()
        });
        assert_eq!(sway.offset(1.7), Vec3::ZERO);
    }
}
