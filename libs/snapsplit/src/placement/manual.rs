//! Manual placement from caller-supplied points.

use glam::{DVec2, DVec3};
use tracing::warn;

use super::{build_plan, PlacementPlan};
use crate::connector::ConnectorSpec;
use crate::error::{SelectionError, SnapSplitResult};
use crate::seam::SeamRegion;

/// Projects each point onto the seam plane and keeps those inside the
/// seam. Rejected points are listed in the plan.
///
/// # Errors
///
/// [`SelectionError::NoPointsInSeam`] when no point lands on the seam,
/// [`InputError::SpacingTooTight`](crate::error::InputError::SpacingTooTight)
/// when accepted points are too close.
pub fn place_manual(
    seam: &SeamRegion,
    points: &[DVec3],
    spec: &ConnectorSpec,
) -> SnapSplitResult<PlacementPlan> {
    spec.validate()?;
    let mut accepted: Vec<DVec2> = Vec::with_capacity(points.len());
    let mut rejected = Vec::new();
    for &point in points {
        let local = seam.project(point);
        if seam.contains(local) {
            accepted.push(local);
        } else {
            warn!(x = point.x, y = point.y, z = point.z, "point outside seam rejected");
            rejected.push(point);
        }
    }
    if accepted.is_empty() {
        return Err(SelectionError::NoPointsInSeam(points.len()).into());
    }
    Ok(build_plan(seam, &accepted, spec, rejected)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::ConnectorKind;
    use crate::error::SnapSplitError;
    use crate::placement::fixtures::box_seam;
    use crate::tolerance::ResolvedTolerance;
    use config::pipeline::PipelineConfig;

    fn pin() -> ConnectorSpec {
        ConnectorSpec::defaults(
            ConnectorKind::SnapPin,
            &ResolvedTolerance::exact(0.2),
            &PipelineConfig::default(),
        )
    }

    #[test]
    fn test_points_are_projected() {
        let seam = box_seam(50.0, 50.0);
        let plan = place_manual(&seam, &[DVec3::new(40.0, 12.0, 30.0)], &pin()).unwrap();
        assert_eq!(plan.instances[0].position, DVec3::new(50.0, 12.0, 30.0));
        assert!(plan.rejected.is_empty());
    }

    #[test]
    fn test_outside_points_reported() {
        let seam = box_seam(50.0, 50.0);
        let outside = DVec3::new(50.0, 80.0, 10.0);
        let plan = place_manual(&seam, &[DVec3::new(50.0, 20.0, 20.0), outside], &pin()).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.rejected, vec![outside]);
    }

    #[test]
    fn test_all_outside_is_error() {
        let seam = box_seam(50.0, 50.0);
        assert_eq!(
            place_manual(&seam, &[DVec3::new(50.0, -5.0, 10.0)], &pin()),
            Err(SnapSplitError::Selection(SelectionError::NoPointsInSeam(1)))
        );
    }
}
