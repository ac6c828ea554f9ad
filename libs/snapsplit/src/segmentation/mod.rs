//! # Segmentation
//!
//! Splits a closed mesh into watertight parts along parallel planes
//! ([`SegmentationEngine::planar_split`]) or along a lattice of planes
//! across one cut face of an existing part
//! ([`SegmentationEngine::grid_split`]).
//!
//! ## Algorithm
//!
//! Every output cell is carved from the source with one `difference` per
//! bounding plane against an oversized half-space box. A failed carve
//! remeshes the whole source at a coarser voxel size and restarts every
//! cell, so a split either emits all of its parts or none.

pub mod adjust;
pub mod cap;


use config::constants::{CUTTER_MARGIN_FRACTION, MAX_PARTS, MIN_PARTS, REMESH_VOXEL_DIVISIONS};
use config::pipeline::PipelineConfig;
use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};
use snapsplit_mesh::ops::section::plane_axes;
use snapsplit_mesh::ops::validate::{boundary_edges, validate};
use snapsplit_mesh::primitives::create_box;
use snapsplit_mesh::{GeometryKernel, Mesh, MeshError, MeshResult};
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::error::{GeometryError, InputError, SelectionError, SnapSplitResult};
use crate::part::{Border, Part, PartId, PartIds, Side, SplitPlane};
use crate::seam::in_plane_basis;

pub use adjust::{AdjustEvent, AdjustState, AxisAdjustSession};
pub use cap::CapReport;

// =============================================================================
// REQUESTS AND RESULTS
// =============================================================================

/// Parameters of a planar split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRequest {
    /// Unit normal of the cutting planes.
    pub axis: DVec3,
    /// Number of parts to produce.
    pub count: usize,
    /// Explicit plane offsets along `axis`; evenly spaced when absent.
    pub offsets: Option<Vec<f64>>,
    /// Shift applied to every default offset.
    pub shift: f64,
    /// Close the cut faces (true) or leave the seams open.
    pub cap_seams: bool,
}

impl SplitRequest {
    pub fn new(axis: DVec3, count: usize) -> Self {
        Self {
            axis,
            count,
            offsets: None,
            shift: 0.0,
            cap_seams: true,
        }
    }

    pub fn with_offsets(mut self, offsets: Vec<f64>) -> Self {
        self.offsets = Some(offsets);
        self
    }

    pub fn with_shift(mut self, shift: f64) -> Self {
        self.shift = shift;
        self
    }

    pub fn with_caps(mut self, cap_seams: bool) -> Self {
        self.cap_seams = cap_seams;
        self
    }
}

/// Parts produced by a split, in slab (or row-major grid) order.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitResult {
    pub parts: Vec<Part>,
    /// The planes introduced by this split.
    pub planes: Vec<SplitPlane>,
    /// Voxel remesh attempts needed before every cell carved cleanly.
    pub remediation_attempts: u32,
    pub caps: Vec<CapReport>,
}

/// One output cell: the planes bounding it and the name of its part.
#[derive(Debug, Clone)]
struct Cell {
    name: String,
    /// Borders inherited from the parent part; no cut needed.
    inherited: Vec<Border>,
    /// Borders carved by this split.
    carved: Vec<Border>,
}

enum Carve {
    Done(Vec<Mesh>),
    Failed { cell: usize, error: MeshError },
}

// =============================================================================
// OFFSETS
// =============================================================================

/// Extent of the mesh along a unit axis.
pub fn extent_along(mesh: &Mesh, axis: DVec3) -> (f64, f64) {
    mesh.vertices()
        .iter()
        .map(|v| v.dot(axis))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        })
}

/// Evenly spaced offsets dividing `[lo, hi]` into `count` slabs, all moved
/// by `shift` and clamped into the extent.
///
/// # Example
///
/// ```rust
/// use snapsplit::segmentation::default_offsets;
///
/// assert_eq!(default_offsets(0.0, 90.0, 3, 0.0), vec![30.0, 60.0]);
/// assert_eq!(default_offsets(0.0, 90.0, 3, 5.0), vec![35.0, 65.0]);
/// ```
pub fn default_offsets(lo: f64, hi: f64, count: usize, shift: f64) -> Vec<f64> {
    let length = hi - lo;
    if !(length > 0.0) || count < MIN_PARTS {
        return Vec::new();
    }
    (1..count)
        .map(|i| (lo + i as f64 / count as f64 * length + shift).clamp(lo, hi))
        .collect()
}

/// Where the preview planes of a split sit for the current count and shift.
pub fn preview_offsets(mesh: &Mesh, axis: DVec3, count: usize, shift: f64) -> Vec<f64> {
    let (lo, hi) = extent_along(mesh, axis);
    default_offsets(lo, hi, count, shift)
}

// =============================================================================
// ENGINE
// =============================================================================

/// Planar and grid splitting on top of a geometry kernel.
pub struct SegmentationEngine<'a> {
    kernel: &'a dyn GeometryKernel,
    config: PipelineConfig,
}

impl<'a> SegmentationEngine<'a> {
    pub fn new(kernel: &'a dyn GeometryKernel, config: PipelineConfig) -> Self {
        Self { kernel, config }
    }

    /// Splits `mesh` into `request.count` parts along parallel planes.
    ///
    /// Parts are named `{name}_P1`, `{name}_P2`, ... from the low end of
    /// the axis. Planes get indices `0..count - 1` in offset order.
    ///
    /// # Errors
    ///
    /// Input errors are reported before any boolean runs. A cell that stays
    /// non-manifold after every remediation attempt fails the whole split
    /// with [`GeometryError::Split`].
    pub fn planar_split(
        &self,
        name: &str,
        mesh: &Mesh,
        request: &SplitRequest,
        ids: &mut PartIds,
        cancel: &CancelToken,
    ) -> SnapSplitResult<SplitResult> {
        if !self.kernel.is_manifold(mesh) {
            return Err(InputError::NonManifoldInput(issue_of(mesh)).into());
        }
        let axis = request.axis;
        if !axis.is_finite() || (axis.length() - 1.0).abs() > 1e-6 {
            return Err(InputError::DegenerateAxis {
                x: axis.x,
                y: axis.y,
                z: axis.z,
            }
            .into());
        }
        if !(MIN_PARTS..=MAX_PARTS).contains(&request.count) {
            return Err(InputError::InvalidCount {
                count: request.count,
                min: MIN_PARTS,
                max: MAX_PARTS,
            }
            .into());
        }

        let (lo, hi) = extent_along(mesh, axis);
        let offsets = match &request.offsets {
            Some(offsets) => offsets.clone(),
            None => default_offsets(lo, hi, request.count, request.shift),
        };
        check_offsets(&offsets, request.count, lo, hi)?;

        let mut bounds = Vec::with_capacity(offsets.len() + 2);
        bounds.push(lo);
        bounds.extend_from_slice(&offsets);
        bounds.push(hi);
        for (index, slab) in bounds.windows(2).enumerate() {
            if !has_geometry_between(mesh, axis, slab[0], slab[1], self.config.plane_epsilon) {
                return Err(InputError::DegenerateSlab {
                    index,
                    lo: slab[0],
                    hi: slab[1],
                }
                .into());
            }
        }

        let planes: Vec<SplitPlane> = offsets
            .iter()
            .enumerate()
            .map(|(index, &offset)| SplitPlane::new(axis, offset, index))
            .collect();
        let cells: Vec<Cell> = (0..request.count)
            .map(|i| {
                let mut carved = Vec::with_capacity(2);
                if i > 0 {
                    carved.push(open_border(planes[i - 1], Side::Positive));
                }
                if i < planes.len() {
                    carved.push(open_border(planes[i], Side::Negative));
                }
                Cell {
                    name: format!("{name}_P{}", i + 1),
                    inherited: Vec::new(),
                    carved,
                }
            })
            .collect();

        info!(
            source = name,
            count = request.count,
            cap_seams = request.cap_seams,
            "planar split"
        );
        self.split_cells(mesh, cells, planes, request.cap_seams, ids, cancel)
    }

    /// Splits a part into a `rows × columns` grid across one of its cut
    /// faces.
    ///
    /// `face_plane` is the index of the split plane whose cut face is
    /// divided. Columns run along the first in-plane axis of that face and
    /// rows along the second. New planes get indices after the largest one
    /// the part already borders.
    ///
    /// # Errors
    ///
    /// [`SelectionError::UnknownFace`] when the part has no cut face on
    /// that plane, [`InputError::InvalidGrid`] for fewer than two cells,
    /// otherwise as [`planar_split`](Self::planar_split).
    pub fn grid_split(
        &self,
        part: &Part,
        face_plane: usize,
        rows: usize,
        columns: usize,
        ids: &mut PartIds,
        cancel: &CancelToken,
    ) -> SnapSplitResult<SplitResult> {
        if rows == 0 || columns == 0 || rows.max(columns) > MAX_PARTS || rows * columns < MIN_PARTS {
            return Err(InputError::InvalidGrid { rows, columns }.into());
        }
        if part.is_open() {
            return Err(InputError::OpenSeams(part.id()).into());
        }
        let mesh = part.mesh();
        if !self.kernel.is_manifold(mesh) {
            return Err(InputError::NonManifoldInput(issue_of(mesh)).into());
        }
        let face_border = part.border(face_plane).copied();
        let faces = part.tagged_faces(face_plane);
        let Some(face_border) = face_border.filter(|_| !faces.is_empty()) else {
            return Err(SelectionError::UnknownFace {
                part: part.id(),
                plane: face_plane,
            }
            .into());
        };

        let (t1, t2) = in_plane_basis(face_border.plane.axis);
        let project = |axis: DVec3| {
            faces
                .iter()
                .flat_map(|&f| mesh.triangle_positions(f))
                .map(|p| p.dot(axis))
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
                    (lo.min(d), hi.max(d))
                })
        };
        let (min1, max1) = project(t1);
        let (min2, max2) = project(t2);

        let mut next_index = part.max_plane_index().map_or(0, |i| i + 1);
        let mut family = |axis: DVec3, lo: f64, hi: f64, n: usize| -> Vec<SplitPlane> {
            default_offsets(lo, hi, n, 0.0)
                .into_iter()
                .map(|offset| {
                    let plane = SplitPlane::new(axis, offset, next_index);
                    next_index += 1;
                    plane
                })
                .collect()
        };
        let column_planes = family(t1, min1, max1, columns);
        let row_planes = family(t2, min2, max2, rows);
        if column_planes.len() + 1 != columns || row_planes.len() + 1 != rows {
            return Err(InputError::InvalidGrid { rows, columns }.into());
        }

        let (part_lo1, part_hi1) = extent_along(mesh, t1);
        let (part_lo2, part_hi2) = extent_along(mesh, t2);
        let mut cells = Vec::with_capacity(rows * columns);
        for r in 0..rows {
            for c in 0..columns {
                let lo1 = if c > 0 { column_planes[c - 1].offset } else { part_lo1 };
                let hi1 = column_planes.get(c).map_or(part_hi1, |p| p.offset);
                let lo2 = if r > 0 { row_planes[r - 1].offset } else { part_lo2 };
                let hi2 = row_planes.get(r).map_or(part_hi2, |p| p.offset);
                let eps = self.config.plane_epsilon;
                if !has_geometry_in_cell(mesh, (t1, lo1, hi1), (t2, lo2, hi2), eps) {
                    return Err(InputError::DegenerateSlab {
                        index: r * columns + c,
                        lo: lo1,
                        hi: hi1,
                    }
                    .into());
                }

                let mut carved = Vec::with_capacity(4);
                if c > 0 {
                    carved.push(open_border(column_planes[c - 1], Side::Positive));
                }
                if let Some(plane) = column_planes.get(c) {
                    carved.push(open_border(*plane, Side::Negative));
                }
                if r > 0 {
                    carved.push(open_border(row_planes[r - 1], Side::Positive));
                }
                if let Some(plane) = row_planes.get(r) {
                    carved.push(open_border(*plane, Side::Negative));
                }
                cells.push(Cell {
                    name: format!("{}_R{}C{}", part.name(), r + 1, c + 1),
                    inherited: part.borders().to_vec(),
                    carved,
                });
            }
        }

        info!(part = %part.id(), rows, columns, "grid split");
        let mut planes = column_planes;
        planes.extend(row_planes);
        self.split_cells(mesh, cells, planes, true, ids, cancel)
    }

    /// Closes every open seam of a part with the probe rule.
    ///
    /// # Errors
    ///
    /// [`GeometryError::Cap`] when a section cannot be filled,
    /// [`GeometryError::Validation`] when the result is not manifold.
    pub fn cap_part(&self, part: &Part) -> SnapSplitResult<(Part, Vec<CapReport>)> {
        let mut mesh = part.sealed_mesh().clone();
        let mut borders = part.borders().to_vec();
        let mut reports = Vec::new();
        for border in borders.iter_mut().filter(|b| b.is_open()) {
            let (capped, kind) =
                cap::cap_plane(self.kernel, &mesh, border, part.tag_epsilon()).map_err(|source| {
                    GeometryError::Cap {
                        plane: border.plane.index,
                        source,
                    }
                })?;
            mesh = capped;
            border.cap = Some(kind);
            reports.push(CapReport {
                part: part.id(),
                plane: border.plane.index,
                kind,
            });
        }
        if !self.kernel.is_manifold(&mesh) {
            return Err(GeometryError::Validation {
                part: part.id(),
                stage: "capping",
                message: issue_of(&mesh),
            }
            .into());
        }
        let mut capped = part.clone();
        capped.replace_with_borders(mesh, borders);
        debug!(part = %part.id(), caps = reports.len(), "part capped");
        Ok((capped, reports))
    }

    // -------------------------------------------------------------------------
    // Carving
    // -------------------------------------------------------------------------

    fn split_cells(
        &self,
        mesh: &Mesh,
        cells: Vec<Cell>,
        planes: Vec<SplitPlane>,
        cap_seams: bool,
        ids: &mut PartIds,
        cancel: &CancelToken,
    ) -> SnapSplitResult<SplitResult> {
        let mut source = mesh.clone();
        let mut attempts = 0;
        let carved = loop {
            match self.carve_cells(&source, &cells, cancel)? {
                Carve::Done(meshes) => break meshes,
                Carve::Failed { cell, error } => {
                    if attempts >= self.config.remesh_attempts {
                        return Err(GeometryError::Split {
                            slab: cell,
                            attempts,
                            source: error,
                        }
                        .into());
                    }
                    let voxel = remesh_voxel_size(mesh, attempts);
                    attempts += 1;
                    warn!(cell, attempt = attempts, voxel, %error, "cut failed, remeshing source");
                    source = self.kernel.remesh(mesh, voxel).map_err(|source| {
                        GeometryError::Split {
                            slab: cell,
                            attempts,
                            source,
                        }
                    })?;
                }
            }
        };

        let eps = self.config.plane_epsilon.max(self.config.weld_epsilon);
        let mut parts = Vec::with_capacity(cells.len());
        let mut caps = Vec::new();
        for (cell, carved_mesh) in cells.into_iter().zip(carved) {
            cancel.check()?;
            let id = ids.allocate();
            let mut sealed = carved_mesh;
            let mut borders = cell.inherited;
            for mut border in cell.carved {
                let (capped, kind) = cap::cap_plane(self.kernel, &sealed, &border, eps).map_err(
                    |source| GeometryError::Cap {
                        plane: border.plane.index,
                        source,
                    },
                )?;
                sealed = capped;
                if cap_seams {
                    border.cap = Some(kind);
                    caps.push(CapReport {
                        part: id,
                        plane: border.plane.index,
                        kind,
                    });
                }
                borders.push(border);
            }
            if !self.kernel.is_manifold(&sealed) {
                return Err(GeometryError::Validation {
                    part: id,
                    stage: "split",
                    message: issue_of(&sealed),
                }
                .into());
            }

            let part = if cap_seams {
                Part::new(id, cell.name, sealed, borders, eps)
            } else {
                let mut open = sealed.clone();
                for border in borders.iter().filter(|b| b.is_open()) {
                    open = cap::open_plane(&open, border, eps);
                }
                check_open_boundary(id, &open, &borders, eps)?;
                Part::new(id, cell.name, open, borders, eps).with_sealed(sealed)
            };
            debug!(
                part = %part.id(),
                name = part.name(),
                triangles = part.mesh().triangle_count(),
                "part emitted"
            );
            parts.push(part);
        }

        info!(parts = parts.len(), remediation = attempts, "split complete");
        Ok(SplitResult {
            parts,
            planes,
            remediation_attempts: attempts,
            caps,
        })
    }

    fn carve_cells(&self, source: &Mesh, cells: &[Cell], cancel: &CancelToken) -> SnapSplitResult<Carve> {
        let mut meshes = Vec::with_capacity(cells.len());
        for (index, cell) in cells.iter().enumerate() {
            let mut carved = source.clone();
            for border in &cell.carved {
                cancel.check()?;
                let result = half_space_cutter(source, border)
                    .and_then(|cutter| self.kernel.difference(&carved, &cutter));
                match result {
                    Ok(mesh) => carved = mesh,
                    Err(error) => return Ok(Carve::Failed { cell: index, error }),
                }
            }
            meshes.push(carved);
        }
        Ok(Carve::Done(meshes))
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn open_border(plane: SplitPlane, side: Side) -> Border {
    Border {
        plane,
        side,
        cap: None,
    }
}

fn issue_of(mesh: &Mesh) -> String {
    validate(mesh)
        .issue()
        .unwrap_or_else(|| "not a closed manifold surface".to_string())
}

fn check_offsets(offsets: &[f64], count: usize, lo: f64, hi: f64) -> Result<(), InputError> {
    if offsets.len() + 1 != count {
        return Err(InputError::InvalidOffsets(format!(
            "expected {} offsets for {count} parts, got {}",
            count - 1,
            offsets.len()
        )));
    }
    if let Some(bad) = offsets.iter().find(|o| !(**o > lo && **o < hi)) {
        return Err(InputError::InvalidOffsets(format!(
            "offset {bad} is not strictly inside the extent [{lo}, {hi}]"
        )));
    }
    if let Some(pair) = offsets.windows(2).find(|w| !(w[1] > w[0])) {
        return Err(InputError::InvalidOffsets(format!(
            "offsets must strictly increase: {} then {}",
            pair[0], pair[1]
        )));
    }
    Ok(())
}

/// Whether some triangle reaches into the open range `(lo, hi)` along the
/// axis.
fn has_geometry_between(mesh: &Mesh, axis: DVec3, lo: f64, hi: f64, eps: f64) -> bool {
    if !(hi - lo > eps) {
        return false;
    }
    (0..mesh.triangle_count()).any(|i| {
        let (tmin, tmax) = mesh
            .triangle_positions(i)
            .iter()
            .map(|p| p.dot(axis))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), d| (a.min(d), b.max(d)));
        tmax > lo + eps && tmin < hi - eps
    })
}

fn has_geometry_in_cell(
    mesh: &Mesh,
    (a1, lo1, hi1): (DVec3, f64, f64),
    (a2, lo2, hi2): (DVec3, f64, f64),
    eps: f64,
) -> bool {
    if !(hi1 - lo1 > eps && hi2 - lo2 > eps) {
        return false;
    }
    (0..mesh.triangle_count()).any(|i| {
        let corners = mesh.triangle_positions(i);
        let span = |axis: DVec3| {
            corners
                .iter()
                .map(|p| p.dot(axis))
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), d| (a.min(d), b.max(d)))
        };
        let (min1, max1) = span(a1);
        let (min2, max2) = span(a2);
        max1 > lo1 + eps && min1 < hi1 - eps && max2 > lo2 + eps && min2 < hi2 - eps
    })
}

/// Box covering everything on the far side of the border's plane.
fn half_space_cutter(mesh: &Mesh, border: &Border) -> MeshResult<Mesh> {
    let axis = border.plane.axis;
    let (min, max) = mesh.bounding_box();
    let center = (min + max) * 0.5;
    let diagonal = (max - min).length().max(1.0);
    let reach = diagonal * (0.5 + CUTTER_MARGIN_FRACTION);

    let along = center.dot(axis);
    let offset = border.plane.offset;
    let (z_lo, z_hi) = match border.side {
        Side::Negative => (offset, along + reach),
        Side::Positive => (along - reach, offset),
    };

    let (u, v) = plane_axes(axis);
    let origin = center - axis * along;
    let frame = DMat4::from_cols(
        u.extend(0.0),
        v.extend(0.0),
        axis.extend(0.0),
        origin.extend(1.0),
    );
    let mut cutter = create_box(
        DVec3::new(-reach, -reach, z_lo),
        DVec3::new(reach, reach, z_hi),
    )?;
    cutter.transform(&frame);
    Ok(cutter)
}

fn remesh_voxel_size(mesh: &Mesh, attempt: u32) -> f64 {
    let divisions = REMESH_VOXEL_DIVISIONS
        .get(attempt as usize)
        .copied()
        .unwrap_or(REMESH_VOXEL_DIVISIONS[REMESH_VOXEL_DIVISIONS.len() - 1]);
    mesh.diagonal() / divisions
}

/// An open part may only have boundary edges lying on one of its open
/// seam planes.
fn check_open_boundary(
    id: PartId,
    mesh: &Mesh,
    borders: &[Border],
    eps: f64,
) -> SnapSplitResult<()> {
    let report = validate(mesh);
    if report.non_manifold_edge_count > 0 || report.collapsed_face_count > 0 {
        return Err(GeometryError::Validation {
            part: id,
            stage: "opening seams",
            message: report.issue().unwrap_or_default(),
        }
        .into());
    }
    let stray = boundary_edges(mesh).into_iter().find(|&(a, b)| {
        !borders.iter().filter(|border| border.is_open()).any(|border| {
            border.plane.signed_distance(mesh.vertex(a)).abs() <= eps
                && border.plane.signed_distance(mesh.vertex(b)).abs() <= eps
        })
    });
    match stray {
        Some((a, b)) => Err(GeometryError::Validation {
            part: id,
            stage: "opening seams",
            message: format!("boundary edge {a}-{b} is off every open seam"),
        }
        .into()),
        None => Ok(()),
    }
}
