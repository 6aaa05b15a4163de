//! Pointer input support
//!
//! Pointer events cover mouse clicks and touches over the passthrough view.
//! Only pointer-down matters for placement; the state tracker keeps the
//! rest so gestures can still be inspected.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Pointer event phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// A finger touched the screen or a button was pressed
    Down,
    /// The pointer moved while down
    Move,
    /// The pointer was lifted
    Up,
    /// The pointer was cancelled by the platform
    Cancel,
}

/// A single pointer event in viewport pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Unique identifier for this pointer (for multi-touch tracking)
    pub id: u64,
    /// Position in viewport pixels, origin top-left, +Y down
    pub position: Vec2,
    /// The phase of this event
    pub phase: PointerPhase,
}

impl PointerEvent {
    /// Create a new pointer event
    pub fn new(id: u64, position: Vec2, phase: PointerPhase) -> Self {
        Self {
            id,
            position,
            phase,
        }
    }

    /// Shorthand for a pointer-down at the given pixel position
    pub fn down(id: u64, x: f32, y: f32) -> Self {
        Self::new(id, Vec2::new(x, y), PointerPhase::Down)
    }
}

/// Size of the view receiving pointer input, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Create a new viewport
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether both dimensions are finite and positive
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Center point in pixels
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Convert a pixel position to normalized device coordinates.
    ///
    /// Both axes map to [-1, 1] with +Y up. Returns `None` for a degenerate
    /// viewport.
    pub fn to_ndc(&self, position: Vec2) -> Option<Vec2> {
        if !self.is_valid() {
            return None;
        }
        let x = (position.x / self.width) * 2.0 - 1.0;
        let y = -((position.y / self.height) * 2.0 - 1.0);
        Some(Vec2::new(x, y))
    }
}

/// Pointer state tracker
///
/// Tracks active pointers and queues pointer-downs until the next frame
/// drains them.
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    /// Currently active pointers
    active: Vec<PointerEvent>,
    /// Pointer-downs received since the last drain
    pending_downs: Vec<PointerEvent>,
}

impl PointerState {
    /// Create a new empty pointer state
    pub fn new() -> Self {
        Self::default()
    }

    /// Update pointer state with a new event
    pub fn update(&mut self, event: PointerEvent) {
        match event.phase {
            PointerPhase::Down => {
                self.active.retain(|p| p.id != event.id);
                self.active.push(event);
                self.pending_downs.push(event);
            }
            PointerPhase::Move => {
                if let Some(existing) = self.active.iter_mut().find(|p| p.id == event.id) {
                    existing.position = event.position;
                    existing.phase = PointerPhase::Move;
                }
            }
            PointerPhase::Up | PointerPhase::Cancel => {
                self.active.retain(|p| p.id != event.id);
            }
        }
    }

    /// Take all pointer-downs received since the last call, in arrival order
    pub fn drain_downs(&mut self) -> Vec<PointerEvent> {
        std::mem::take(&mut self.pending_downs)
    }

    /// Get all currently active pointers
    pub fn active(&self) -> &[PointerEvent] {
        &self.active
    }

    /// Check if any pointer is down
    pub fn is_pressed(&self) -> bool {
        !self.active.is_empty()
    }

    /// Clear all pointer state
    pub fn clear(&mut self) {
        self.active.clear();
        self.pending_downs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ndc_corners_and_center() {
        let viewport = Viewport::new(800.0, 600.0);

        assert_eq!(viewport.to_ndc(viewport.center()), Some(Vec2::ZERO));
        assert_eq!(viewport.to_ndc(Vec2::ZERO), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(
            viewport.to_ndc(Vec2::new(800.0, 600.0)),
            Some(Vec2::new(1.0, -1.0))
        );
    }

    #[test]
    fn test_degenerate_viewport() {
        assert!(Viewport::new(0.0, 600.0).to_ndc(Vec2::ZERO).is_none());
        assert!(Viewport::new(800.0, f32::NAN).to_ndc(Vec2::ZERO).is_none());
        assert!(!Viewport::new(-1.0, 1.0).is_valid());
    }

    #[test]
    fn test_pointer_lifecycle() {
        let mut state = PointerState::new();
        assert!(!state.is_pressed());

        state.update(PointerEvent::down(1, 10.0, 20.0));
        assert!(state.is_pressed());

        state.update(PointerEvent::new(1, Vec2::new(15.0, 25.0), PointerPhase::Move));
        assert_eq!(state.active()[0].position, Vec2::new(15.0, 25.0));

        state.update(PointerEvent::new(1, Vec2::new(15.0, 25.0), PointerPhase::Up));
        assert!(!state.is_pressed());

        // The down survives until drained even though the pointer lifted
        let downs = state.drain_downs();
        assert_eq!(downs.len(), 1);
        assert_eq!(downs[0].position, Vec2::new(10.0, 20.0));
        assert!(state.drain_downs().is_empty());
    }

    #[test]
    fn test_downs_keep_arrival_order() {
        let mut state = PointerState::new();
        state.update(PointerEvent::down(1, 1.0, 1.0));
        state.update(PointerEvent::down(2, 2.0, 2.0));

        let ids: Vec<u64> = state.drain_downs().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
