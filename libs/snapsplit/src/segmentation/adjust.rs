//! # Split Offset Adjustment
//!
//! Interactive nudging of the global split shift. The shift is kept as a
//! normalized position `t` in `[-1, 1]` across the mesh extent along the
//! split axis, so `t = 0` is the centre and `±1` the bounds.

use config::constants::{SPLIT_DRAG_SENSITIVITY, SPLIT_NUDGE_STEP};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Input events driving an [`AxisAdjustSession`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AdjustEvent {
    /// Starts adjusting from the current shift.
    Begin,
    /// Wheel or arrow steps; positive moves towards the upper bound.
    Nudge(i32),
    /// Vertical pointer movement in pixels; positive moves up.
    Drag { pixels: f64 },
    /// A shift typed directly, in mesh units.
    Typed(f64),
    Confirm,
    Cancel,
}

/// Where an adjustment session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjustState {
    Idle,
    Adjusting,
    Committed,
}

/// State machine for moving the split preview along the axis.
///
/// Events other than `Begin` are ignored while idle; once committed the
/// session only reports its final shift.
///
/// # Example
///
/// ```rust
/// use snapsplit::segmentation::{AdjustEvent, AxisAdjustSession};
///
/// let mut session = AxisAdjustSession::new(0.0, 100.0, 0.0);
/// session.handle(AdjustEvent::Begin);
/// session.handle(AdjustEvent::Nudge(10));
/// session.handle(AdjustEvent::Confirm);
/// assert!((session.shift() - 5.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AxisAdjustSession {
    lo: f64,
    hi: f64,
    t: f64,
    initial_t: f64,
    state: AdjustState,
}

impl AxisAdjustSession {
    /// Creates an idle session over the extent `[lo, hi]`, starting at
    /// `shift` (clamped into the extent).
    pub fn new(lo: f64, hi: f64, shift: f64) -> Self {
        let mut session = Self {
            lo,
            hi,
            t: 0.0,
            initial_t: 0.0,
            state: AdjustState::Idle,
        };
        session.t = session.normalize(shift);
        session.initial_t = session.t;
        session
    }

    pub fn state(&self) -> AdjustState {
        self.state
    }

    /// Normalized position in `[-1, 1]`.
    pub fn t(&self) -> f64 {
        self.t
    }

    /// Shift from the centre of the extent, in mesh units.
    pub fn shift(&self) -> f64 {
        self.t * self.half()
    }

    /// Absolute position of the leading plane along the axis.
    pub fn position(&self) -> f64 {
        self.mid() + self.shift()
    }

    /// Applies one event and returns the resulting state.
    pub fn handle(&mut self, event: AdjustEvent) -> AdjustState {
        match (self.state, event) {
            (AdjustState::Idle, AdjustEvent::Begin) => {
                self.initial_t = self.t;
                self.state = AdjustState::Adjusting;
            }
            (AdjustState::Adjusting, AdjustEvent::Nudge(steps)) => {
                self.set_t(self.t + steps as f64 * SPLIT_NUDGE_STEP);
            }
            (AdjustState::Adjusting, AdjustEvent::Drag { pixels }) => {
                self.set_t(self.t + pixels * SPLIT_DRAG_SENSITIVITY);
            }
            (AdjustState::Adjusting, AdjustEvent::Typed(shift)) => {
                self.t = self.normalize(shift);
            }
            (AdjustState::Adjusting, AdjustEvent::Confirm) => {
                self.state = AdjustState::Committed;
                debug!(shift = self.shift(), "split offset committed");
            }
            (AdjustState::Adjusting, AdjustEvent::Cancel) => {
                self.t = self.initial_t;
                self.state = AdjustState::Idle;
            }
            _ => {}
        }
        self.state
    }

    fn mid(&self) -> f64 {
        0.5 * (self.lo + self.hi)
    }

    fn half(&self) -> f64 {
        0.5 * (self.hi - self.lo)
    }

    fn set_t(&mut self, t: f64) {
        self.t = t.clamp(-1.0, 1.0);
    }

    fn normalize(&self, shift: f64) -> f64 {
        let half = self.half();
        if half > 1e-12 {
            (shift / half).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_starts_idle_and_ignores_moves() {
        let mut session = AxisAdjustSession::new(0.0, 100.0, 0.0);
        assert_eq!(session.handle(AdjustEvent::Nudge(5)), AdjustState::Idle);
        assert_eq!(session.shift(), 0.0);
    }

    #[test]
    fn test_drag_and_nudge_clamp() {
        let mut session = AxisAdjustSession::new(-10.0, 10.0, 0.0);
        session.handle(AdjustEvent::Begin);
        session.handle(AdjustEvent::Drag { pixels: 5000.0 });
        assert_eq!(session.t(), 1.0);
        assert_relative_eq!(session.position(), 10.0);
        session.handle(AdjustEvent::Nudge(-50));
        assert_relative_eq!(session.t(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_typed_shift_is_clamped() {
        let mut session = AxisAdjustSession::new(0.0, 40.0, 0.0);
        session.handle(AdjustEvent::Begin);
        session.handle(AdjustEvent::Typed(-100.0));
        assert_relative_eq!(session.shift(), -20.0);
        assert_relative_eq!(session.position(), 0.0);
    }

    #[test]
    fn test_cancel_restores_and_returns_to_idle() {
        let mut session = AxisAdjustSession::new(0.0, 100.0, 10.0);
        session.handle(AdjustEvent::Begin);
        session.handle(AdjustEvent::Nudge(30));
        assert_eq!(session.handle(AdjustEvent::Cancel), AdjustState::Idle);
        assert_relative_eq!(session.shift(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_committed_session_is_final() {
        let mut session = AxisAdjustSession::new(0.0, 100.0, 0.0);
        session.handle(AdjustEvent::Begin);
        session.handle(AdjustEvent::Nudge(2));
        assert_eq!(session.handle(AdjustEvent::Confirm), AdjustState::Committed);
        session.handle(AdjustEvent::Nudge(20));
        assert_relative_eq!(session.shift(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_flat_extent_stays_centred() {
        let session = AxisAdjustSession::new(5.0, 5.0, 3.0);
        assert_eq!(session.t(), 0.0);
        assert_eq!(session.position(), 5.0);
    }
}
