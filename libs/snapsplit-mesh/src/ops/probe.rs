//! # Wall Thickness Probe
//!
//! Ray casting against a mesh to tell hollow (shelled) bodies from solid
//! ones near a surface point.

use config::constants::EPSILON;
use glam::DVec3;

use crate::mesh::Mesh;

// =============================================================================
// RAY CASTING
// =============================================================================

/// Möller–Trumbore ray-triangle intersection.
///
/// Returns the ray parameter `t > 0` of the hit, or `None` when the ray
/// misses or runs parallel to the triangle. Both windings are hit.
///
/// # Example
///
/// ```rust
/// use snapsplit_mesh::ops::probe::ray_triangle_intersect;
/// use glam::DVec3;
///
/// let hit = ray_triangle_intersect(
///     DVec3::new(0.2, 0.2, -1.0),
///     DVec3::Z,
///     [DVec3::ZERO, DVec3::X, DVec3::Y],
/// );
/// assert_eq!(hit, Some(1.0));
/// ```
pub fn ray_triangle_intersect(origin: DVec3, direction: DVec3, [v0, v1, v2]: [DVec3; 3]) -> Option<f64> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = direction.cross(edge2);
    let a = edge1.dot(h);
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    (t > EPSILON).then_some(t)
}

/// Sorted distances at which a ray crosses the surface. Hits closer together
/// than `merge` (a ray through a shared edge) are counted once.
pub fn ray_hits(mesh: &Mesh, origin: DVec3, direction: DVec3, merge: f64) -> Vec<f64> {
    let mut hits: Vec<f64> = (0..mesh.triangle_count())
        .filter_map(|i| ray_triangle_intersect(origin, direction, mesh.triangle_positions(i)))
        .collect();
    hits.sort_by(f64::total_cmp);
    hits.dedup_by(|later, earlier| *later - *earlier < merge);
    hits
}

// =============================================================================
// THICKNESS
// =============================================================================

/// Probes the wall thickness behind a surface point.
///
/// The ray starts `inset` inside the surface at `point` (the kernel passes
/// its weld distance) and travels against the outward `normal`. If it leaves the material and later enters it again the
/// body is hollow there and the distance to the first exit is the wall
/// thickness. A ray that leaves the mesh for good means a solid body and
/// yields `None`.
///
/// # Example
///
/// ```rust
/// use snapsplit_mesh::ops::probe::probe_thickness;
/// use snapsplit_mesh::primitives::create_box;
/// use glam::DVec3;
///
/// let solid = create_box(DVec3::ZERO, DVec3::splat(10.0)).unwrap();
/// assert_eq!(probe_thickness(&solid, DVec3::new(10.0, 5.0, 5.0), DVec3::X, 1e-5), None);
/// ```
pub fn probe_thickness(mesh: &Mesh, point: DVec3, normal: DVec3, inset: f64) -> Option<f64> {
    let direction = (-normal).try_normalize()?;
    let inset = inset.max(EPSILON);
    let origin = point + direction * inset;

    let hits = ray_hits(mesh, origin, direction, inset * 0.1);
    match hits.as_slice() {
        [exit, _reentry, ..] => Some(exit + inset),
        _ => None,
    }
}
