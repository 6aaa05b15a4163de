//! Capability detection
//!
//! The probe runs once when the AR view opens, before any renderer exists.
//! Its answer fixes the rendering path for the rest of the session; there
//! is no renegotiation if the runtime changes its mind later.

use crate::session::{SessionMode, XrRuntime};
use serde::{Deserialize, Serialize};

/// Outcome of the immersive-AR probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    /// The runtime offers `immersive-ar`
    Supported,
    /// The runtime is absent or says no
    Unsupported,
    /// The probe itself failed
    Undetermined(String),
}

impl Capability {
    /// Rendering path implied by this outcome
    pub fn render_path(&self) -> RenderPath {
        match self {
            Self::Supported => RenderPath::Immersive,
            Self::Unsupported | Self::Undetermined(_) => RenderPath::Passthrough,
        }
    }

    /// Whether the probe answered yes
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported)
    }
}

/// The two rendering paths of the AR view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderPath {
    /// Platform AR session with real hit-testing
    Immersive,
    /// Camera video background with tap-to-place
    Passthrough,
}

impl RenderPath {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Immersive => "immersive",
            Self::Passthrough => "passthrough",
        }
    }
}

/// Probes a runtime for immersive-AR support
pub struct CapabilityDetector;

impl CapabilityDetector {
    /// Query the runtime once.
    ///
    /// `None` means the platform has no AR runtime at all. Probe errors are
    /// logged and reported as [`Capability::Undetermined`], never returned.
    pub async fn detect(runtime: Option<&dyn XrRuntime>) -> Capability {
        let Some(runtime) = runtime else {
            tracing::info!("No XR runtime available, using camera passthrough");
            return Capability::Unsupported;
        };

        let capability = match runtime.is_session_supported(SessionMode::ImmersiveAr).await {
            Ok(true) => Capability::Supported,
            Ok(false) => Capability::Unsupported,
            Err(err) => {
                tracing::warn!(runtime = runtime.name(), error = %err, "AR capability probe failed");
                Capability::Undetermined(err.to_string())
            }
        };

        tracing::info!(
            runtime = runtime.name(),
            capability = ?capability,
            path = capability.render_path().name(),
            "AR capability decided"
        );
        capability
    }
}
