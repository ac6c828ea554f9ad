//! # Seam Location
//!
//! A seam is where two parts from the same split touch: both border the
//! same split plane from opposite sides and their cut faces overlap. The
//! part on the negative side of the plane is `a` (it receives the pins),
//! the other is `b` (it receives the sockets).

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use snapsplit_mesh::ops::section::{boundary_loops, plane_axes, signed_area};
use snapsplit_mesh::Mesh;
use tracing::debug;

use crate::part::{Part, PartId, Side, SplitPlane};

/// In-plane axes for a seam normal.
///
/// Axis-aligned normals use the remaining world axes in order (X gives Y
/// and Z, Y gives X and Z, Z gives X and Y); other normals use a
/// right-handed pair.
pub fn in_plane_basis(normal: DVec3) -> (DVec3, DVec3) {
    const ALIGNED: f64 = 1.0 - 1e-9;
    let n = normal.abs();
    if n.x >= ALIGNED {
        (DVec3::Y, DVec3::Z)
    } else if n.y >= ALIGNED {
        (DVec3::X, DVec3::Z)
    } else if n.z >= ALIGNED {
        (DVec3::X, DVec3::Y)
    } else {
        plane_axes(normal)
    }
}

/// The contact region between two adjacent parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeamRegion {
    /// Male side, on the negative side of the plane.
    pub a: PartId,
    /// Female side.
    pub b: PartId,
    pub plane: SplitPlane,
    /// Origin of the plane-local coordinates.
    pub origin: DVec3,
    /// Unit normal pointing from `a` to `b`.
    pub normal: DVec3,
    pub u: DVec3,
    pub v: DVec3,
    /// Bounding rectangle of the overlap, plane-local.
    pub rect_min: DVec2,
    pub rect_max: DVec2,
    /// Outer boundary loop of `a`'s cut face, plane-local.
    pub boundary: Vec<DVec2>,
    faces_a: Vec<[DVec2; 3]>,
    faces_b: Vec<[DVec2; 3]>,
}

impl SeamRegion {
    /// Plane-local coordinates of a world point (projected onto the plane).
    pub fn project(&self, p: DVec3) -> DVec2 {
        let d = p - self.origin;
        DVec2::new(d.dot(self.u), d.dot(self.v))
    }

    /// World position of a plane-local point.
    pub fn to_world(&self, p: DVec2) -> DVec3 {
        self.origin + self.u * p.x + self.v * p.y
    }

    /// Size of the overlap rectangle.
    pub fn extent(&self) -> DVec2 {
        self.rect_max - self.rect_min
    }

    pub fn center(&self) -> DVec2 {
        (self.rect_min + self.rect_max) * 0.5
    }

    /// Whether a plane-local point lies on both cut faces.
    pub fn contains(&self, p: DVec2) -> bool {
        const SLACK: f64 = 1e-9;
        let inside = |faces: &[[DVec2; 3]]| faces.iter().any(|t| in_triangle(p, t, SLACK));
        inside(&self.faces_a) && inside(&self.faces_b)
    }

    /// Whether a disc of the given radius around `p` lies on both cut faces,
    /// sampled at the centre and eight points of its rim.
    pub fn contains_disc(&self, p: DVec2, radius: f64) -> bool {
        self.contains(p)
            && (0..8).all(|k| {
                let theta = std::f64::consts::FRAC_PI_4 * k as f64;
                self.contains(p + DVec2::new(theta.cos(), theta.sin()) * radius)
            })
    }
}

/// Finds the seam between two parts, if they have one.
///
/// The parts must border the same split plane (same index, axis and offset
/// within `tolerance`) from opposite sides, and their cut faces on it must
/// overlap. The returned region orders the parts so that `a` is the one on
/// the negative side, whatever the argument order.
pub fn locate_seam(first: &Part, second: &Part, tolerance: f64) -> Option<SeamRegion> {
    let (border_1, border_2) = first.borders().iter().find_map(|b1| {
        second
            .borders()
            .iter()
            .find(|b2| b1.side != b2.side && b1.plane.coincides(&b2.plane, tolerance))
            .map(|b2| (b1, b2))
    })?;

    let (a, b) = match border_1.side {
        Side::Negative => (first, second),
        Side::Positive => (second, first),
    };
    let plane = match border_1.side {
        Side::Negative => border_1.plane,
        Side::Positive => border_2.plane,
    };

    let normal = plane.axis;
    let origin = plane.point();
    let (u, v) = in_plane_basis(normal);
    let project = |p: DVec3| {
        let d = p - origin;
        DVec2::new(d.dot(u), d.dot(v))
    };

    let flatten = |part: &Part| -> Vec<[DVec2; 3]> {
        part.tagged_faces(plane.index)
            .into_iter()
            .map(|f| part.mesh().triangle_positions(f).map(project))
            .collect()
    };
    let faces_a = flatten(a);
    let faces_b = flatten(b);
    if faces_a.is_empty() || faces_b.is_empty() {
        return None;
    }

    let (min_a, max_a) = bounds(&faces_a);
    let (min_b, max_b) = bounds(&faces_b);
    let rect_min = min_a.max(min_b);
    let rect_max = max_a.min(max_b);
    if !(rect_max.x - rect_min.x > tolerance && rect_max.y - rect_min.y > tolerance) {
        return None;
    }
    let overlapping = faces_a
        .iter()
        .any(|ta| faces_b.iter().any(|tb| triangles_overlap(ta, tb)));
    if !overlapping {
        return None;
    }

    let boundary = outer_boundary(a, plane.index)
        .into_iter()
        .map(project)
        .collect();
    debug!(
        a = %a.id(),
        b = %b.id(),
        plane = plane.index,
        faces_a = faces_a.len(),
        faces_b = faces_b.len(),
        "seam located"
    );
    Some(SeamRegion {
        a: a.id(),
        b: b.id(),
        plane,
        origin,
        normal,
        u,
        v,
        rect_min,
        rect_max,
        boundary,
        faces_a,
        faces_b,
    })
}

fn bounds(faces: &[[DVec2; 3]]) -> (DVec2, DVec2) {
    faces.iter().flatten().fold(
        (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
        |(lo, hi), p| (lo.min(*p), hi.max(*p)),
    )
}

/// Largest boundary loop of the faces tagged with a plane.
fn outer_boundary(part: &Part, plane: usize) -> Vec<DVec3> {
    let mut patch = Mesh::with_capacity(part.mesh().vertex_count(), 0);
    for &v in part.mesh().vertices() {
        patch.add_vertex(v);
    }
    for f in part.tagged_faces(plane) {
        let [i, j, k] = part.mesh().triangle(f);
        patch.add_triangle(i, j, k);
    }
    patch.compact();

    let (u, v) = plane_axes(part.border(plane).map_or(DVec3::Z, |b| b.plane.axis));
    boundary_loops(&patch)
        .into_iter()
        .map(|ring| ring.iter().map(|&i| patch.vertex(i)).collect::<Vec<_>>())
        .max_by(|x, y| loop_area(x, u, v).total_cmp(&loop_area(y, u, v)))
        .unwrap_or_default()
}

fn loop_area(ring: &[DVec3], u: DVec3, v: DVec3) -> f64 {
    let flat: Vec<DVec2> = ring.iter().map(|p| DVec2::new(p.dot(u), p.dot(v))).collect();
    signed_area(&flat).abs()
}

fn in_triangle(p: DVec2, &[a, b, c]: &[DVec2; 3], slack: f64) -> bool {
    let d1 = (b - a).perp_dot(p - a);
    let d2 = (c - b).perp_dot(p - b);
    let d3 = (a - c).perp_dot(p - c);
    let has_neg = d1 < -slack || d2 < -slack || d3 < -slack;
    let has_pos = d1 > slack || d2 > slack || d3 > slack;
    !(has_neg && has_pos)
}

/// Separating axis test on the six edge normals; touching counts as
/// disjoint.
fn triangles_overlap(t1: &[DVec2; 3], t2: &[DVec2; 3]) -> bool {
    let separated_by = |tri: &[DVec2; 3]| {
        (0..3).any(|i| {
            let edge = tri[(i + 1) % 3] - tri[i];
            let axis = edge.perp();
            let project = |t: &[DVec2; 3]| {
                t.iter()
                    .map(|p| p.dot(axis))
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
                        (lo.min(d), hi.max(d))
                    })
            };
            let (min1, max1) = project(t1);
            let (min2, max2) = project(t2);
            let slack = 1e-12 * axis.length().max(1.0);
            max1 <= min2 + slack || max2 <= min1 + slack
        })
    };
    !separated_by(t1) && !separated_by(t2)
}
