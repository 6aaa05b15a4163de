//! Anchor state machine
//!
//! Holds the single anchor of an AR session. The only transition is
//! `Unplaced → Placed`, taken once on the first commit that carries a
//! candidate pose. There is no way back: re-placing requires a new view.
//!
//! Commits are processed one at a time on the frame thread, so the terminal
//! state doubles as the in-flight guard. A commit arriving within the
//! debounce window of the placing commit is reported as
//! [`CommitOutcome::Debounced`] (a duplicate delivery of the same gesture);
//! later ones as [`CommitOutcome::AlreadyPlaced`]. Both are no-ops.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use xr::Pose;

/// Which placement source produced an anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorSource {
    /// Immersive `select` while a hit-test candidate existed
    HitTest,
    /// Passthrough pointer-down resolved by the tap heuristic
    Tap,
}

/// The committed pose of the session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub pose: Pose,
    pub source: AnchorSource,
    pub placed_at: Instant,
}

/// Anchor lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AnchorState {
    /// No anchor yet: preview, grid and orbit controls are shown
    #[default]
    Unplaced,
    /// Anchor frozen for the rest of the session
    Placed(Anchor),
}

impl AnchorState {
    pub fn anchor(&self) -> Option<&Anchor> {
        match self {
            Self::Unplaced => None,
            Self::Placed(anchor) => Some(anchor),
        }
    }

    pub fn is_placed(&self) -> bool {
        matches!(self, Self::Placed(_))
    }
}

/// Result of a commit attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommitOutcome {
    /// The anchor was created by this commit
    Placed(Anchor),
    /// No candidate pose was available; still unplaced
    NoCandidate,
    /// Duplicate of the placing gesture, dropped
    Debounced,
    /// The anchor already exists, dropped
    AlreadyPlaced,
}

impl CommitOutcome {
    pub fn is_placed(&self) -> bool {
        matches!(self, Self::Placed(_))
    }
}

/// Timing policy of the state machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Window after placement in which further commits count as duplicates
    pub debounce_ms: u64,
    /// How long the "placed" acknowledgement stays visible
    pub ack_ms: u64,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            ack_ms: 2000,
        }
    }
}

impl AnchorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn ack_duration(&self) -> Duration {
        Duration::from_millis(self.ack_ms)
    }
}

/// One-shot anchor state machine
#[derive(Debug, Clone, Default)]
pub struct AnchorMachine {
    state: AnchorState,
    config: AnchorConfig,
    dropped: u32,
}

impl AnchorMachine {
    /// Create an unplaced machine
    pub fn new(config: AnchorConfig) -> Self {
        Self {
            state: AnchorState::Unplaced,
            config,
            dropped: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> &AnchorState {
        &self.state
    }

    /// The anchor, once placed
    pub fn anchor(&self) -> Option<&Anchor> {
        self.state.anchor()
    }

    pub fn is_placed(&self) -> bool {
        self.state.is_placed()
    }

    /// Number of commits dropped after placement
    pub fn dropped_commits(&self) -> u32 {
        self.dropped
    }

    /// Process one commit gesture.
    ///
    /// `candidate` is the pose the active source reports at the moment of
    /// the gesture; it is captured verbatim. Non-finite candidates count as
    /// missing.
    pub fn commit(
        &mut self,
        candidate: Option<Pose>,
        source: AnchorSource,
        now: Instant,
    ) -> CommitOutcome {
        if let AnchorState::Placed(anchor) = self.state {
            self.dropped += 1;
            let since = now.saturating_duration_since(anchor.placed_at);
            return if since < self.config.debounce() {
                tracing::trace!(?source, ?since, "Duplicate commit dropped");
                CommitOutcome::Debounced
            } else {
                tracing::debug!(?source, "Commit ignored, anchor already placed");
                CommitOutcome::AlreadyPlaced
            };
        }

        let Some(pose) = candidate.filter(Pose::is_finite) else {
            tracing::debug!(?source, "Commit without candidate pose");
            return CommitOutcome::NoCandidate;
        };

        let anchor = Anchor {
            pose,
            source,
            placed_at: now,
        };
        self.state = AnchorState::Placed(anchor);
        tracing::info!(
            ?source,
            position = ?pose.position,
            "Anchor placed"
        );
        CommitOutcome::Placed(anchor)
    }

    /// Whether the "placed" acknowledgement should be visible at `now`
    pub fn ack_visible(&self, now: Instant) -> bool {
        self.anchor().is_some_and(|anchor| {
            now.saturating_duration_since(anchor.placed_at) < self.config.ack_duration()
        })
    }

    /// The reference grid shows only before placement
    pub fn grid_visible(&self) -> bool {
        !self.is_placed()
    }

    /// Orbit zoom is disabled once placed
    pub fn zoom_enabled(&self) -> bool {
        !self.is_placed()
    }
}
