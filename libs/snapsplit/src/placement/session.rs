//! # Click Placement
//!
//! State machine behind interactive placement: points are collected one
//! at a time, the last one can be undone, and nothing is synthesized until
//! the session is committed into a [`PlacementPlan`].

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{place_manual, PlacementPlan};
use crate::connector::ConnectorSpec;
use crate::error::{SelectionError, SnapSplitResult};
use crate::seam::SeamRegion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementState {
    Idle,
    Placing,
    Committed,
}

/// Collects manual connector points on one seam.
///
/// # Example
///
/// ```rust,ignore
/// let mut session = PlacementSession::new(seam, spec);
/// session.begin();
/// session.click(point);
/// let plan = session.commit()?;
/// ```
#[derive(Debug, Clone)]
pub struct PlacementSession {
    seam: SeamRegion,
    spec: ConnectorSpec,
    points: Vec<DVec3>,
    state: PlacementState,
}

impl PlacementSession {
    pub fn new(seam: SeamRegion, spec: ConnectorSpec) -> Self {
        Self {
            seam,
            spec,
            points: Vec::new(),
            state: PlacementState::Idle,
        }
    }

    pub fn state(&self) -> PlacementState {
        self.state
    }

    /// Points accepted so far, projected onto the seam plane.
    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    pub fn begin(&mut self) {
        if self.state == PlacementState::Idle {
            self.points.clear();
            self.state = PlacementState::Placing;
        }
    }

    /// Adds a point if it lies on the seam. Returns whether it was taken.
    pub fn click(&mut self, point: DVec3) -> bool {
        if self.state != PlacementState::Placing {
            return false;
        }
        let local = self.seam.project(point);
        if !self.seam.contains(local) {
            debug!(x = point.x, y = point.y, z = point.z, "click outside seam ignored");
            return false;
        }
        self.points.push(self.seam.to_world(local));
        true
    }

    /// Removes the most recent point.
    pub fn undo(&mut self) -> Option<DVec3> {
        if self.state != PlacementState::Placing {
            return None;
        }
        self.points.pop()
    }

    /// Drops every point and returns to idle.
    pub fn cancel(&mut self) {
        if self.state == PlacementState::Placing {
            self.points.clear();
            self.state = PlacementState::Idle;
        }
    }

    /// Turns the collected points into a plan.
    ///
    /// # Errors
    ///
    /// [`SelectionError::NoPointsInSeam`] when nothing was placed, or the
    /// spacing and spec errors of [`place_manual`]. The session stays in
    /// `Placing` on error so the caller can fix the points.
    pub fn commit(&mut self) -> SnapSplitResult<PlacementPlan> {
        if self.state != PlacementState::Placing || self.points.is_empty() {
            return Err(SelectionError::NoPointsInSeam(0).into());
        }
        let plan = place_manual(&self.seam, &self.points, &self.spec)?;
        self.state = PlacementState::Committed;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::ConnectorKind;
    use crate::error::{InputError, SnapSplitError};
    use crate::placement::fixtures::box_seam;
    use crate::tolerance::ResolvedTolerance;
    use config::pipeline::PipelineConfig;

    fn session() -> PlacementSession {
        let spec = ConnectorSpec::defaults(
            ConnectorKind::CylindricalPin,
            &ResolvedTolerance::exact(0.2),
            &PipelineConfig::default(),
        );
        PlacementSession::new(box_seam(50.0, 50.0), spec)
    }

    #[test]
    fn test_clicks_ignored_until_begin() {
        let mut s = session();
        assert!(!s.click(DVec3::new(50.0, 10.0, 10.0)));
        s.begin();
        assert!(s.click(DVec3::new(49.0, 10.0, 10.0)));
        assert_eq!(s.points(), &[DVec3::new(50.0, 10.0, 10.0)]);
    }

    #[test]
    fn test_undo_and_commit() {
        let mut s = session();
        s.begin();
        s.click(DVec3::new(50.0, 10.0, 10.0));
        s.click(DVec3::new(50.0, 12.0, 10.0));
        assert_eq!(s.undo(), Some(DVec3::new(50.0, 12.0, 10.0)));
        s.click(DVec3::new(50.0, 40.0, 40.0));
        let plan = s.commit().unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(s.state(), PlacementState::Committed);
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let mut s = session();
        s.begin();
        s.click(DVec3::new(50.0, 10.0, 10.0));
        s.cancel();
        assert_eq!(s.state(), PlacementState::Idle);
        assert!(s.points().is_empty());
        assert!(s.commit().is_err());
    }

    #[test]
    fn test_failed_commit_keeps_placing() {
        let mut s = session();
        s.begin();
        s.click(DVec3::new(50.0, 10.0, 10.0));
        s.click(DVec3::new(50.0, 12.0, 10.0));
        assert!(matches!(
            s.commit(),
            Err(SnapSplitError::Input(InputError::SpacingTooTight { .. }))
        ));
        assert_eq!(s.state(), PlacementState::Placing);
    }
}
