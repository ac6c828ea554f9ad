//! Line placement along the longer side of the seam rectangle.

use config::constants::MAX_CONNECTORS_PER_SEAM;
use glam::DVec2;
use tracing::debug;

use super::{build_fitted_plan, margin_fraction, PlacementPlan};
use crate::connector::ConnectorSpec;
use crate::error::{InputError, SnapSplitResult};
use crate::seam::SeamRegion;

/// Places connectors roughly `spacing_hint` apart along the seam.
///
/// The count is `max(1, floor((1 - 2·margin)·L / spacing_hint))` where `L`
/// is the long side of the seam rectangle; the first and last connectors
/// sit at the margin.
///
/// # Errors
///
/// [`InputError::InvalidMargin`], [`InputError::InvalidConnector`] for a
/// bad spec or a non-positive hint, [`InputError::SpacingTooTight`] when
/// the resulting connectors are too close,
/// [`SelectionError::NoFittingPositions`](crate::error::SelectionError::NoFittingPositions)
/// when no connector fits on the cut faces.
pub fn place_line(
    seam: &SeamRegion,
    margin_pct: f64,
    spacing_hint: f64,
    spec: &ConnectorSpec,
) -> SnapSplitResult<PlacementPlan> {
    let margin = margin_fraction(margin_pct)?;
    spec.validate()?;
    if !(spacing_hint > 0.0) {
        return Err(InputError::InvalidConnector(format!(
            "spacing hint must be positive: {spacing_hint}"
        ))
        .into());
    }
    let extent = seam.extent();
    let inset = (1.0 - 2.0 * margin) * extent.x.max(extent.y);
    let count = ((inset / spacing_hint).floor() as usize).clamp(1, MAX_CONNECTORS_PER_SEAM);
    debug!(count, spacing_hint, "line placement");
    build_fitted_plan(seam, &line_points(seam, margin, count), spec)
}

/// Places exactly `count` connectors along the seam.
///
/// # Errors
///
/// As [`place_line`], plus [`InputError::InvalidCount`] for a count outside
/// `1..=MAX_CONNECTORS_PER_SEAM`.
pub fn place_line_count(
    seam: &SeamRegion,
    margin_pct: f64,
    count: usize,
    spec: &ConnectorSpec,
) -> SnapSplitResult<PlacementPlan> {
    let margin = margin_fraction(margin_pct)?;
    spec.validate()?;
    if !(1..=MAX_CONNECTORS_PER_SEAM).contains(&count) {
        return Err(InputError::InvalidCount {
            count,
            min: 1,
            max: MAX_CONNECTORS_PER_SEAM,
        }
        .into());
    }
    build_fitted_plan(seam, &line_points(seam, margin, count), spec)
}

/// Evenly spaced points between the margins of the long side, centred
/// across it. A single point sits at the centre.
fn line_points(seam: &SeamRegion, margin: f64, count: usize) -> Vec<DVec2> {
    let extent = seam.extent();
    let center = seam.center();
    let along_u = extent.x >= extent.y;
    let (lo, length) = if along_u {
        (seam.rect_min.x, extent.x)
    } else {
        (seam.rect_min.y, extent.y)
    };
    let start = lo + margin * length;
    let end = lo + (1.0 - margin) * length;

    (0..count)
        .map(|i| {
            let t = if count == 1 {
                0.5
            } else {
                i as f64 / (count - 1) as f64
            };
            let s = start + t * (end - start);
            if along_u {
                DVec2::new(s, center.y)
            } else {
                DVec2::new(center.x, s)
            }
        })
        .collect()
}
