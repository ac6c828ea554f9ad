//! # Boolean Operations (CSG)
//!
//! Union and difference of closed meshes using BSP trees.
//!
//! ## Algorithm
//!
//! Based on the csg.js algorithm by Evan Wallace:
//! - Union: A.clipTo(B); B.clipTo(A); B.invert(); B.clipTo(A); B.invert(); combine
//! - Difference: A.invert(); A.clipTo(B); B.clipTo(A); B.invert(); B.clipTo(A); B.invert(); combine; result.invert()
//!
//! The polygon soup that comes out of the tree is welded, T-junctions are
//! split and the result is triangulated by [`crate::ops::repair`].
//! Faces that lie outside the other operand's bounding box survive either
//! operation whole; they still shape the trees, but their fragments are
//! discarded and the original face is emitted. Every result is validated. A non-manifold result is repaired again with the
//! coarser welds of `REPAIR_WELD_SCALES`; if none of them closes it the
//! boolean fails.
//!
//! ## Example
//!
//! ```rust
//! use snapsplit_mesh::ops::boolean::difference;
//! use snapsplit_mesh::primitives::create_box;
//! use snapsplit_mesh::KernelTolerance;
//! use glam::DVec3;
//!
//! let block = create_box(DVec3::ZERO, DVec3::splat(10.0)).unwrap();
//! let notch = create_box(DVec3::splat(5.0), DVec3::splat(15.0)).unwrap();
//! let result = difference(&block, &notch, &KernelTolerance::default()).unwrap();
//! assert!((result.signed_volume() - 875.0).abs() < 1e-6);
//! ```

mod bsp;
mod plane;
mod polygon;


use config::constants::REPAIR_WELD_SCALES;
use glam::DVec3;
use tracing::debug;

use crate::error::{MeshError, MeshResult};
use crate::kernel::KernelTolerance;
use crate::mesh::Mesh;
use crate::ops::repair::{polygons_to_mesh, remove_duplicate_faces};
use crate::ops::validate::validate;
use bsp::BspNode;
pub(crate) use polygon::mesh_to_polygons;

pub(crate) use polygon::Polygon;

// =============================================================================
// PUBLIC API
// =============================================================================

/// Computes the union of two closed meshes.
///
/// # Errors
///
/// Returns [`MeshError::NonManifold`] when the repaired result is not a
/// closed manifold surface.
pub fn union(a: &Mesh, b: &Mesh, tolerance: &KernelTolerance) -> MeshResult<Mesh> {
    if a.is_empty() {
        return Ok(b.clone());
    }
    if b.is_empty() || !bounds_overlap(a, b, tolerance.plane_epsilon) {
        let mut merged = a.clone();
        merged.merge(b);
        return Ok(merged);
    }

    let epsilon = tolerance.plane_epsilon;
    let mut polygons_a = mesh_to_polygons(a);
    let mut polygons_b = mesh_to_polygons(b);
    let mut kept = mark_clear(&mut polygons_a, b.bounding_box(), epsilon);
    kept.extend(mark_clear(&mut polygons_b, a.bounding_box(), epsilon));
    let mut tree_a = BspNode::new(polygons_a, epsilon);
    let mut tree_b = BspNode::new(polygons_b, epsilon);

    tree_a.clip_to(&tree_b, epsilon);
    tree_b.clip_to(&tree_a, epsilon);
    tree_b.invert();
    tree_b.clip_to(&tree_a, epsilon);
    tree_b.invert();

    let mut polygons = kept;
    polygons.extend(without_clear(tree_a.all_polygons()));
    polygons.extend(without_clear(tree_b.all_polygons()));
    finish("union", polygons, tolerance)
}

/// Computes `a` minus `b`.
///
/// # Errors
///
/// Returns [`MeshError::NonManifold`] when the repaired result is not a
/// closed manifold surface (including when nothing of `a` remains).
pub fn difference(a: &Mesh, b: &Mesh, tolerance: &KernelTolerance) -> MeshResult<Mesh> {
    if a.is_empty() || b.is_empty() || !bounds_overlap(a, b, tolerance.plane_epsilon) {
        return Ok(a.clone());
    }

    let epsilon = tolerance.plane_epsilon;
    let mut polygons_a = mesh_to_polygons(a);
    let kept = mark_clear(&mut polygons_a, b.bounding_box(), epsilon);
    let mut tree_a = BspNode::new(polygons_a, epsilon);
    let mut tree_b = BspNode::new(mesh_to_polygons(b), epsilon);

    tree_a.invert();
    tree_a.clip_to(&tree_b, epsilon);
    tree_b.clip_to(&tree_a, epsilon);
    tree_b.invert();
    tree_b.clip_to(&tree_a, epsilon);
    tree_b.invert();
    tree_a.invert();

    let mut polygons = kept;
    polygons.extend(without_clear(tree_a.all_polygons()));
    polygons.extend(tree_b.all_polygons().into_iter().map(|mut polygon| {
        polygon.flip();
        polygon
    }));
    finish("difference", polygons, tolerance)
}

// =============================================================================
// HELPERS
// =============================================================================

fn bounds_overlap(a: &Mesh, b: &Mesh, epsilon: f64) -> bool {
    let (min_a, max_a) = a.bounding_box();
    let (min_b, max_b) = b.bounding_box();
    let slack = DVec3::splat(epsilon);
    (min_a - slack).cmple(max_b).all() && (min_b - slack).cmple(max_a).all()
}

/// Flags the polygons lying outside `bounds` and returns copies of them.
fn mark_clear(polygons: &mut [Polygon], bounds: (DVec3, DVec3), epsilon: f64) -> Vec<Polygon> {
    let slack = DVec3::splat(epsilon);
    let (min, max) = (bounds.0 - slack, bounds.1 + slack);
    let mut kept = Vec::new();
    for polygon in polygons.iter_mut() {
        let (lo, hi) = polygon.bounds();
        if hi.cmplt(min).any() || lo.cmpgt(max).any() {
            polygon.clear = true;
            kept.push(polygon.clone());
        }
    }
    kept
}

fn without_clear(polygons: Vec<Polygon>) -> impl Iterator<Item = Polygon> {
    polygons.into_iter().filter(|polygon| !polygon.clear)
}

fn finish(
    operation: &'static str,
    polygons: Vec<Polygon>,
    tolerance: &KernelTolerance,
) -> MeshResult<Mesh> {
    let mut issue = String::new();
    for (attempt, scale) in REPAIR_WELD_SCALES.iter().enumerate() {
        let weld = KernelTolerance {
            weld_epsilon: tolerance.weld_epsilon * scale,
            ..*tolerance
        };
        let mut mesh = polygons_to_mesh(&polygons, &weld)?;
        let duplicates = remove_duplicate_faces(&mut mesh);
        let report = validate(&mesh);
        debug!(
            operation,
            attempt,
            polygons = polygons.len(),
            triangles = mesh.triangle_count(),
            duplicates,
            manifold = report.is_manifold,
            "boolean finished"
        );
        match report.issue() {
            None => return Ok(mesh),
            Some(found) => issue = found,
        }
    }
    Err(MeshError::non_manifold(operation, issue))
}
