//! Grid placement across the margin-inset seam rectangle.

use config::constants::MAX_CONNECTORS_PER_SEAM;
use glam::DVec2;

use super::{build_fitted_plan, margin_fraction, PlacementPlan};
use crate::connector::ConnectorSpec;
use crate::error::{InputError, SnapSplitResult};
use crate::seam::SeamRegion;

/// Places a `rows × columns` lattice of connectors, row by row.
///
/// Columns run along the seam's first in-plane axis and rows along the
/// second. A dimension with a single entry is centred.
///
/// # Errors
///
/// [`InputError::InvalidGrid`] for an empty lattice or one with more than
/// `MAX_CONNECTORS_PER_SEAM` connectors, otherwise as
/// [`place_line`](super::place_line). Lattice points whose connector would
/// leave the seam are dropped into the plan's `rejected` list.
pub fn place_grid(
    seam: &SeamRegion,
    margin_pct: f64,
    rows: usize,
    columns: usize,
    spec: &ConnectorSpec,
) -> SnapSplitResult<PlacementPlan> {
    let margin = margin_fraction(margin_pct)?;
    spec.validate()?;
    if rows == 0
        || columns == 0
        || rows.max(columns) > MAX_CONNECTORS_PER_SEAM
        || rows * columns > MAX_CONNECTORS_PER_SEAM
    {
        return Err(InputError::InvalidGrid { rows, columns }.into());
    }

    let extent = seam.extent();
    let lo = seam.rect_min + extent * margin;
    let hi = seam.rect_max - extent * margin;
    let fraction = |i: usize, n: usize| {
        if n > 1 {
            i as f64 / (n - 1) as f64
        } else {
            0.5
        }
    };

    let mut points = Vec::with_capacity(rows * columns);
    for r in 0..rows {
        let y = lo.y + fraction(r, rows) * (hi.y - lo.y);
        for c in 0..columns {
            let x = lo.x + fraction(c, columns) * (hi.x - lo.x);
            points.push(DVec2::new(x, y));
        }
    }
    build_fitted_plan(seam, &points, spec)
}
