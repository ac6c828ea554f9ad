//! # Planar Sections
//!
//! Helpers for the faces and boundary loops of a mesh that lie on a plane,
//! and for closing such loops with a flat cap.
//!
//! Caps are filled with the even-odd rule: a loop nested inside an odd
//! number of other loops is a hole. Holes are bridged into their outer loop
//! and the result is ear clipped with exact orientation predicates.

use std::collections::BTreeMap;

use glam::{DVec2, DVec3};
use robust::{orient2d, Coord};
use tracing::{debug, warn};

use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;
use crate::ops::validate::boundary_edges;

// =============================================================================
// FACES AND LOOPS ON A PLANE
// =============================================================================

/// Triangles lying on the plane through `point` whose outward normal points
/// along `normal`.
pub fn faces_on_plane(mesh: &Mesh, point: DVec3, normal: DVec3, epsilon: f64) -> Vec<usize> {
    (0..mesh.triangle_count())
        .filter(|&i| {
            mesh.triangle_positions(i)
                .iter()
                .all(|p| (*p - point).dot(normal).abs() <= epsilon)
                && mesh.face_normal(i).dot(normal) > 0.5
        })
        .collect()
}

/// Returns a copy of the mesh without its faces on the plane.
pub fn strip_plane(mesh: &Mesh, point: DVec3, normal: DVec3, epsilon: f64) -> Mesh {
    let mut on_plane = vec![false; mesh.triangle_count()];
    for i in faces_on_plane(mesh, point, normal, epsilon) {
        on_plane[i] = true;
    }
    let mut stripped = mesh.clone();
    stripped.retain_triangles(|i, _| !on_plane[i]);
    stripped
}

/// Chains the unpaired directed edges of the mesh into closed loops.
///
/// Loops follow the orientation of the faces that own their edges.
pub fn boundary_loops(mesh: &Mesh) -> Vec<Vec<u32>> {
    let mut outgoing: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for (a, b) in boundary_edges(mesh) {
        outgoing.entry(a).or_default().push(b);
    }

    let mut loops = Vec::new();
    loop {
        let Some(start) = outgoing
            .iter()
            .find(|(_, ends)| !ends.is_empty())
            .map(|(&start, _)| start)
        else {
            break;
        };
        let mut ring = vec![start];
        let mut current = start;
        loop {
            let next = match outgoing.get_mut(&current) {
                Some(ends) if !ends.is_empty() => ends.remove(0),
                _ => {
                    warn!(start, "boundary loop is not closed");
                    ring.clear();
                    break;
                }
            };
            if next == start {
                break;
            }
            ring.push(next);
            current = next;
        }
        if ring.len() >= 3 {
            loops.push(ring);
        }
    }
    loops
}

/// Boundary loops whose vertices all lie on the plane through `point`.
pub fn loops_on_plane(mesh: &Mesh, point: DVec3, normal: DVec3, epsilon: f64) -> Vec<Vec<u32>> {
    boundary_loops(mesh)
        .into_iter()
        .filter(|ring| {
            ring.iter()
                .all(|&i| (mesh.vertex(i) - point).dot(normal).abs() <= epsilon)
        })
        .collect()
}

// =============================================================================
// CAPPING
// =============================================================================

/// Right-handed in-plane axes `(u, v)` with `u × v = normal`.
pub fn plane_axes(normal: DVec3) -> (DVec3, DVec3) {
    let u = normal.any_orthonormal_vector();
    (u, normal.cross(u))
}

/// Closes the given planar loops with flat faces whose normal is `normal`.
///
/// # Errors
///
/// Fails when the region cannot be triangulated (zero area or crossing
/// loops).
pub fn cap_loops(mesh: &Mesh, loops: &[Vec<u32>], normal: DVec3) -> MeshResult<Mesh> {
    let (u, v) = plane_axes(normal);
    let mut flat: Vec<u32> = Vec::new();
    let mut points: Vec<DVec2> = Vec::new();
    let mut rings: Vec<Vec<usize>> = Vec::with_capacity(loops.len());
    for ring in loops {
        let mut indices = Vec::with_capacity(ring.len());
        for &i in ring {
            let p = mesh.vertex(i);
            indices.push(points.len());
            points.push(DVec2::new(p.dot(u), p.dot(v)));
            flat.push(i);
        }
        rings.push(indices);
    }

    let triangles = fill_even_odd(&points, &rings)?;
    let mut capped = mesh.clone();
    for [a, b, c] in &triangles {
        capped.add_triangle(flat[*a], flat[*b], flat[*c]);
    }
    debug!(loops = loops.len(), triangles = triangles.len(), "capped planar loops");
    Ok(capped)
}

/// Triangulates the region enclosed by `rings` under the even-odd rule.
///
/// Returned triangles are counter-clockwise and index into `points`.
///
/// # Example
///
/// ```rust
/// use snapsplit_mesh::ops::section::fill_even_odd;
/// use glam::DVec2;
///
/// let points = vec![
///     DVec2::new(0.0, 0.0), DVec2::new(4.0, 0.0), DVec2::new(4.0, 4.0), DVec2::new(0.0, 4.0),
///     DVec2::new(1.0, 1.0), DVec2::new(3.0, 1.0), DVec2::new(3.0, 3.0), DVec2::new(1.0, 3.0),
/// ];
/// let rings = vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]];
/// let triangles = fill_even_odd(&points, &rings).unwrap();
/// assert_eq!(triangles.len(), 8);
/// ```
pub fn fill_even_odd(points: &[DVec2], rings: &[Vec<usize>]) -> MeshResult<Vec<[usize; 3]>> {
    let polygons: Vec<Vec<DVec2>> = rings
        .iter()
        .map(|ring| ring.iter().map(|&i| points[i]).collect())
        .collect();

    // Nesting depth of every ring; odd depth means hole
    let depth: Vec<usize> = (0..rings.len())
        .map(|i| {
            (0..rings.len())
                .filter(|&j| j != i && point_in_polygon(polygons[i][0], &polygons[j]))
                .count()
        })
        .collect();

    let mut triangles = Vec::new();
    for outer in (0..rings.len()).filter(|&i| depth[i] % 2 == 0) {
        let mut polygon = oriented(&rings[outer], points, true);

        // Holes whose innermost container is this ring
        let mut holes: Vec<Vec<usize>> = (0..rings.len())
            .filter(|&h| {
                depth[h] == depth[outer] + 1 && point_in_polygon(polygons[h][0], &polygons[outer])
            })
            .map(|h| oriented(&rings[h], points, false))
            .collect();
        holes.sort_by(|a, b| max_x(points, b).total_cmp(&max_x(points, a)));

        for h in 0..holes.len() {
            let (pending, hole) = (&holes[h + 1..], &holes[h]);
            polygon = bridge(points, polygon, hole, pending)?;
        }
        triangles.extend(ear_clip(points, polygon)?);
    }
    Ok(triangles)
}

/// Even-odd point in polygon test.
///
/// # Example
///
/// ```rust
/// use snapsplit_mesh::ops::section::point_in_polygon;
/// use glam::DVec2;
///
/// let square = [DVec2::ZERO, DVec2::X, DVec2::ONE, DVec2::Y];
/// assert!(point_in_polygon(DVec2::splat(0.5), &square));
/// assert!(!point_in_polygon(DVec2::splat(1.5), &square));
/// ```
pub fn point_in_polygon(p: DVec2, polygon: &[DVec2]) -> bool {
    let n = polygon.len();
    let mut inside = false;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + n - 1) % n];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Signed area, positive for counter-clockwise polygons.
pub fn signed_area(polygon: &[DVec2]) -> f64 {
    let n = polygon.len();
    (0..n)
        .map(|i| polygon[i].perp_dot(polygon[(i + 1) % n]))
        .sum::<f64>()
        * 0.5
}

// =============================================================================
// TRIANGULATION INTERNALS
// =============================================================================

fn coord(p: DVec2) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}

fn orient(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    orient2d(coord(a), coord(b), coord(c))
}

fn oriented(ring: &[usize], points: &[DVec2], counter_clockwise: bool) -> Vec<usize> {
    let polygon: Vec<DVec2> = ring.iter().map(|&i| points[i]).collect();
    let mut ring = ring.to_vec();
    if (signed_area(&polygon) > 0.0) != counter_clockwise {
        ring.reverse();
    }
    ring
}

fn max_x(points: &[DVec2], ring: &[usize]) -> f64 {
    ring.iter()
        .map(|&i| points[i].x)
        .fold(f64::NEG_INFINITY, f64::max)
}

/// True when segments `p1p2` and `q1q2` touch anywhere other than at a
/// shared endpoint.
fn segments_touch(p1: DVec2, p2: DVec2, q1: DVec2, q2: DVec2) -> bool {
    if p1 == q1 || p1 == q2 || p2 == q1 || p2 == q2 {
        return false;
    }
    let d1 = orient(q1, q2, p1);
    let d2 = orient(q1, q2, p2);
    let d3 = orient(p1, p2, q1);
    let d4 = orient(p1, p2, q2);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    let within = |a: DVec2, b: DVec2, p: DVec2| {
        p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
    };
    (d1 == 0.0 && within(q1, q2, p1))
        || (d2 == 0.0 && within(q1, q2, p2))
        || (d3 == 0.0 && within(p1, p2, q1))
        || (d4 == 0.0 && within(p1, p2, q2))
}

/// Whether `b` lies strictly inside the interior angle at `a` of a
/// counter-clockwise polygon with neighbours `prev` and `next`.
fn in_cone(prev: DVec2, a: DVec2, next: DVec2, b: DVec2) -> bool {
    if orient(a, next, prev) >= 0.0 {
        orient(a, b, prev) > 0.0 && orient(b, a, next) > 0.0
    } else {
        !(orient(a, b, next) >= 0.0 && orient(b, a, prev) >= 0.0)
    }
}

fn ring_edges<'a>(
    points: &'a [DVec2],
    ring: &'a [usize],
) -> impl Iterator<Item = (DVec2, DVec2)> + 'a {
    let n = ring.len();
    (0..n).map(move |i| (points[ring[i]], points[ring[(i + 1) % n]]))
}

/// Splices a clockwise hole into a counter-clockwise polygon through the
/// nearest visible vertex.
fn bridge(
    points: &[DVec2],
    polygon: Vec<usize>,
    hole: &[usize],
    pending: &[Vec<usize>],
) -> MeshResult<Vec<usize>> {
    let m = (0..hole.len())
        .max_by(|&a, &b| points[hole[a]].x.total_cmp(&points[hole[b]].x))
        .ok_or_else(|| MeshError::degenerate("Empty hole loop"))?;
    let from = points[hole[m]];

    let n = polygon.len();
    let mut candidates: Vec<usize> = (0..n).collect();
    candidates.sort_by(|&a, &b| {
        from.distance_squared(points[polygon[a]])
            .total_cmp(&from.distance_squared(points[polygon[b]]))
    });

    let visible = |k: usize| {
        let to = points[polygon[k]];
        let prev = points[polygon[(k + n - 1) % n]];
        let next = points[polygon[(k + 1) % n]];
        in_cone(prev, to, next, from)
            && !ring_edges(points, &polygon).any(|(a, b)| segments_touch(from, to, a, b))
            && !ring_edges(points, hole).any(|(a, b)| segments_touch(from, to, a, b))
            && !pending
                .iter()
                .any(|other| ring_edges(points, other).any(|(a, b)| segments_touch(from, to, a, b)))
    };

    let k = candidates
        .into_iter()
        .find(|&k| visible(k))
        .ok_or_else(|| MeshError::degenerate("No bridge from hole to outer loop"))?;

    let mut spliced = Vec::with_capacity(n + hole.len() + 2);
    spliced.extend_from_slice(&polygon[..=k]);
    spliced.extend_from_slice(&hole[m..]);
    spliced.extend_from_slice(&hole[..=m]);
    spliced.extend_from_slice(&polygon[k..]);
    Ok(spliced)
}

fn is_ear(points: &[DVec2], remaining: &[usize], i: usize) -> bool {
    let n = remaining.len();
    let (ia, ib, ic) = (remaining[(i + n - 1) % n], remaining[i], remaining[(i + 1) % n]);
    let (a, b, c) = (points[ia], points[ib], points[ic]);
    if orient(a, b, c) <= 0.0 {
        return false;
    }
    !remaining.iter().any(|&j| {
        let p = points[j];
        p != a
            && p != b
            && p != c
            && orient(a, b, p) >= 0.0
            && orient(b, c, p) >= 0.0
            && orient(c, a, p) >= 0.0
    })
}

fn ear_clip(points: &[DVec2], mut remaining: Vec<usize>) -> MeshResult<Vec<[usize; 3]>> {
    let mut triangles = Vec::with_capacity(remaining.len().saturating_sub(2));
    while remaining.len() > 3 {
        let n = remaining.len();
        let ear = match (0..n).find(|&i| is_ear(points, &remaining, i)) {
            Some(i) => i,
            None => {
                warn!(remaining = n, "ear clipping stuck, clipping first convex vertex");
                (0..n)
                    .find(|&i| {
                        let (a, b, c) = (
                            points[remaining[(i + n - 1) % n]],
                            points[remaining[i]],
                            points[remaining[(i + 1) % n]],
                        );
                        orient(a, b, c) > 0.0
                    })
                    .ok_or_else(|| MeshError::degenerate("Cap region has no area"))?
            }
        };
        triangles.push([remaining[(ear + n - 1) % n], remaining[ear], remaining[(ear + 1) % n]]);
        remaining.remove(ear);
    }
    if let [a, b, c] = remaining[..] {
        triangles.push([a, b, c]);
    }
    Ok(triangles)
}
