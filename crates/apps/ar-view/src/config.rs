//! AR view configuration
//!
//! Loaded from `ar.toml` in the per-user config directory (or an explicit
//! path), falling back to defaults. A few values can be overridden from the
//! environment:
//!
//! - `AR_TAP_DISTANCE`: tap-to-place depth in meters
//! - `AR_DEBOUNCE_MS`: duplicate-commit window
//! - `AR_ACK_MS`: placed acknowledgement duration
//! - `AR_CAMERA_WIDTH` / `AR_CAMERA_HEIGHT`: ideal camera resolution
//! - `AR_SWAY`: `0`/`false` disables camera sway
//! - `AR_STORE_DIR`: directory of the file transform store

use crate::error::{ArError, Result};
use devices::{CameraConstraints, FacingMode};
use placement::{AnchorConfig, PreviewStyle, TapPolicy};
use scene::{OrbitConfig, RendererOptions, SwayConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Ideal camera request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSection {
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl Default for CameraSection {
    fn default() -> Self {
        let rear = CameraConstraints::rear_hd();
        Self {
            ideal_width: rear.ideal_width,
            ideal_height: rear.ideal_height,
        }
    }
}

/// Where transforms are persisted
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Directory of the file store; `None` keeps transforms in memory
    pub dir: Option<PathBuf>,
}

/// Full AR view configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArConfig {
    pub tap: TapPolicy,
    pub anchor: AnchorConfig,
    pub camera: CameraSection,
    pub sway: SwayConfig,
    pub preview: PreviewStyle,
    pub orbit: OrbitConfig,
    pub store: StoreSection,
}

impl ArConfig {
    /// Default config file location
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ar-view").join("ar.toml"))
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ArError::Config(e.to_string()))
    }

    /// Load from `path`. A missing file yields defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(ArError::Config(format!(
                "Failed to read {}: {err}",
                path.display()
            ))),
        }
    }

    /// Load from the per-user config directory, then apply the environment.
    /// Never fails: unreadable config is logged and replaced by defaults.
    pub fn load() -> Self {
        let mut config = match Self::config_path() {
            Some(path) => Self::load_from(&path).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Ignoring config file");
                Self::default()
            }),
            None => Self::default(),
        };
        config.apply_env();
        config
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ArError::Config(e.to_string()))
    }

    /// Apply `AR_*` overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup; unparsable values are ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn parsed<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            let raw = lookup(key)?;
            match raw.trim().parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(key, value = %raw, "Ignoring unparsable override");
                    None
                }
            }
        }

        if let Some(distance) = parsed::<f32>(&lookup, "AR_TAP_DISTANCE") {
            if distance.is_finite() && distance > 0.0 {
                self.tap.distance = distance;
            }
        }
        if let Some(ms) = parsed(&lookup, "AR_DEBOUNCE_MS") {
            self.anchor.debounce_ms = ms;
        }
        if let Some(ms) = parsed(&lookup, "AR_ACK_MS") {
            self.anchor.ack_ms = ms;
        }
        if let Some(width) = parsed(&lookup, "AR_CAMERA_WIDTH") {
            self.camera.ideal_width = width;
        }
        if let Some(height) = parsed(&lookup, "AR_CAMERA_HEIGHT") {
            self.camera.ideal_height = height;
        }
        if let Some(raw) = lookup("AR_SWAY") {
            self.sway.enabled = !matches!(raw.trim(), "0" | "false" | "off" | "no");
        }
        if let Some(dir) = lookup("AR_STORE_DIR").filter(|d| !d.trim().is_empty()) {
            self.store.dir = Some(PathBuf::from(dir));
        }
    }

    /// Camera request derived from the config
    pub fn camera_constraints(&self) -> CameraConstraints {
        CameraConstraints {
            facing: FacingMode::Environment,
            ideal_width: self.camera.ideal_width,
            ideal_height: self.camera.ideal_height,
        }
    }

    /// Renderer options derived from the config
    pub fn renderer_options(&self) -> RendererOptions {
        RendererOptions {
            preview: self.preview,
            orbit: self.orbit,
            sway: self.sway,
        }
    }
}
