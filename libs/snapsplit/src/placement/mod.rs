//! # Connector Placement
//!
//! Turns a seam into an ordered list of connector instances. Every plan is
//! checked against the minimum spacing of its connector before it is
//! returned, so synthesis never starts on overlapping connectors.
//!
//! Line and grid positions are laid out on the seam's bounding rectangle
//! and then tested against the cut faces themselves: a position whose
//! footprint, grown by the clearance, leaves either face is dropped into
//! [`PlacementPlan::rejected`].
//!
//! | Mode   | Function                                  |
//! |--------|-------------------------------------------|
//! | Line   | [`place_line`], [`place_line_count`]      |
//! | Grid   | [`place_grid`]                            |
//! | Manual | [`place_manual`], [`PlacementSession`]    |

pub mod grid;
pub mod line;
pub mod manual;
pub mod session;

use config::constants::MAX_MARGIN_PCT;
use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::connector::{ConnectorSpec, Frame};
use crate::error::{InputError, SelectionError, SnapSplitResult};
use crate::part::PartId;
use crate::seam::SeamRegion;

pub use grid::place_grid;
pub use line::{place_line, place_line_count};
pub use manual::place_manual;
pub use session::{PlacementSession, PlacementState};

/// One connector to synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectorInstance {
    /// Point on the seam plane where the pin is based.
    pub position: DVec3,
    pub frame: Frame,
    pub spec: ConnectorSpec,
    /// Part receiving the pin.
    pub male: PartId,
    /// Part receiving the socket.
    pub female: PartId,
}

/// Ordered connectors for one seam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementPlan {
    /// Index of the seam's split plane.
    pub plane: usize,
    pub instances: Vec<ConnectorInstance>,
    /// Requested positions that were dropped: manual points outside the
    /// seam, or line and grid positions whose connector would leave it.
    pub rejected: Vec<DVec3>,
}

impl PlacementPlan {
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Validates a margin in percent and returns it as a fraction.
pub(crate) fn margin_fraction(margin_pct: f64) -> Result<f64, InputError> {
    if !(0.0..MAX_MARGIN_PCT).contains(&margin_pct) {
        return Err(InputError::InvalidMargin(margin_pct));
    }
    Ok(margin_pct / 100.0)
}

/// Builds a checked plan from plane-local points.
pub(crate) fn build_plan(
    seam: &SeamRegion,
    points: &[DVec2],
    spec: &ConnectorSpec,
    rejected: Vec<DVec3>,
) -> Result<PlacementPlan, InputError> {
    let frame = Frame::from_normal(seam.normal);
    let instances: Vec<ConnectorInstance> = points
        .iter()
        .map(|&p| ConnectorInstance {
            position: seam.to_world(p),
            frame,
            spec: *spec,
            male: seam.a,
            female: seam.b,
        })
        .collect();
    check_spacing(&instances, spec.min_spacing())?;
    Ok(PlacementPlan {
        plane: seam.plane.index,
        instances,
        rejected,
    })
}

/// Builds a plan from rectangle-derived points, keeping only those whose
/// connector lies on both cut faces.
pub(crate) fn build_fitted_plan(
    seam: &SeamRegion,
    points: &[DVec2],
    spec: &ConnectorSpec,
) -> SnapSplitResult<PlacementPlan> {
    let radius = spec.footprint() * 0.5 + spec.tolerance;
    let (accepted, outside): (Vec<DVec2>, Vec<DVec2>) =
        points.iter().copied().partition(|&p| seam.contains_disc(p, radius));
    if accepted.is_empty() {
        return Err(SelectionError::NoFittingPositions(points.len()).into());
    }
    if !outside.is_empty() {
        warn!(
            dropped = outside.len(),
            kept = accepted.len(),
            radius,
            "connector positions off the seam dropped"
        );
    }
    let rejected = outside.into_iter().map(|p| seam.to_world(p)).collect();
    Ok(build_plan(seam, &accepted, spec, rejected)?)
}

/// Rejects plans where two centres are not farther apart than `minimum`.
pub fn check_spacing(instances: &[ConnectorInstance], minimum: f64) -> Result<(), InputError> {
    let closest = instances
        .iter()
        .enumerate()
        .flat_map(|(i, a)| {
            instances[i + 1..]
                .iter()
                .map(move |b| a.position.distance(b.position))
        })
        .min_by(f64::total_cmp);
    match closest {
        Some(spacing) if spacing <= minimum => Err(InputError::SpacingTooTight { spacing, minimum }),
        _ => Ok(()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::ConnectorKind;
    use crate::tolerance::ResolvedTolerance;
    use config::pipeline::PipelineConfig;

    fn pin() -> ConnectorSpec {
        ConnectorSpec::defaults(
            ConnectorKind::CylindricalPin,
            &ResolvedTolerance::exact(0.2),
            &PipelineConfig::default(),
        )
    }

    #[test]
    fn test_margin_bounds() {
        assert_eq!(margin_fraction(0.0), Ok(0.0));
        assert_eq!(margin_fraction(10.0), Ok(0.1));
        assert!(margin_fraction(50.0).is_err());
        assert!(margin_fraction(-1.0).is_err());
        assert!(margin_fraction(f64::NAN).is_err());
    }

    #[test]
    fn test_roles_follow_seam() {
        let seam = fixtures::box_seam(50.0, 50.0);
        let plan = build_plan(&seam, &[DVec2::new(25.0, 25.0)], &pin(), Vec::new()).unwrap();
        assert_eq!(plan.instances[0].male, PartId(1));
        assert_eq!(plan.instances[0].female, PartId(2));
        assert_eq!(plan.instances[0].frame.z, DVec3::X);
        assert_eq!(plan.instances[0].position, DVec3::new(50.0, 25.0, 25.0));
    }

    #[test]
    fn test_spacing_must_exceed_minimum() {
        let seam = fixtures::box_seam(50.0, 50.0);
        let spec = pin();
        let close = [DVec2::new(10.0, 25.0), DVec2::new(15.0, 25.0)];
        assert!(matches!(
            build_plan(&seam, &close, &spec, Vec::new()),
            Err(InputError::SpacingTooTight { .. })
        ));
        let apart = [DVec2::new(10.0, 25.0), DVec2::new(16.0, 25.0)];
        assert!(build_plan(&seam, &apart, &spec, Vec::new()).is_ok());
    }
}
