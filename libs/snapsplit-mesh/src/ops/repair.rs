//! # Post-Boolean Repair
//!
//! Turns the polygon soup produced by the BSP booleans into an indexed
//! triangle mesh:
//!
//! 1. weld vertices closer than the weld tolerance (spatial hash),
//! 2. split polygon edges at vertices lying on them (T-junctions),
//! 3. drop slivers thinner than the tolerance,
//! 4. triangulate the remaining convex polygons.
//!
//! After these steps the faces of a correct boolean share edges exactly, so
//! the result can be validated topologically.

use std::collections::{HashMap, HashSet};

use glam::DVec3;
use rayon::prelude::*;
use tracing::debug;

use crate::error::MeshResult;
use crate::kernel::KernelTolerance;
use crate::mesh::Mesh;
use crate::ops::boolean::Polygon;

// =============================================================================
// VERTEX WELDING
// =============================================================================

/// Merges points closer than a tolerance into shared indices.
///
/// Points are hashed into cells twice the tolerance wide; a lookup scans the
/// 27 neighbouring cells so that no pair within tolerance is missed at a
/// cell boundary. The first point inserted represents its cluster.
#[derive(Debug)]
pub struct VertexWelder {
    tolerance: f64,
    cell: f64,
    cells: HashMap<(i64, i64, i64), Vec<u32>>,
    positions: Vec<DVec3>,
}

impl VertexWelder {
    /// Creates a welder for the given tolerance.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            cell: tolerance * 2.0,
            cells: HashMap::new(),
            positions: Vec::new(),
        }
    }

    fn key(&self, p: DVec3) -> (i64, i64, i64) {
        let q = (p / self.cell).floor();
        (q.x as i64, q.y as i64, q.z as i64)
    }

    /// Returns the index of the welded vertex for `p`, inserting it if new.
    ///
    /// When several existing vertices are within tolerance the nearest one
    /// wins, so two copies of the same split point always weld together.
    pub fn insert(&mut self, p: DVec3) -> u32 {
        let (kx, ky, kz) = self.key(p);
        let tolerance_sq = self.tolerance * self.tolerance;
        let mut nearest: Option<(f64, u32)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.cells.get(&(kx + dx, ky + dy, kz + dz)) else {
                        continue;
                    };
                    for &i in bucket {
                        let d = self.positions[i as usize].distance_squared(p);
                        if d <= tolerance_sq && nearest.map_or(true, |(best, _)| d < best) {
                            nearest = Some((d, i));
                        }
                    }
                }
            }
        }
        if let Some((_, found)) = nearest {
            return found;
        }
        let index = self.positions.len() as u32;
        self.positions.push(p);
        self.cells.entry((kx, ky, kz)).or_default().push(index);
        index
    }

    /// Number of distinct vertices.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True when nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Consumes the welder, returning the distinct positions.
    pub fn into_positions(self) -> Vec<DVec3> {
        self.positions
    }
}

// =============================================================================
// POLYGON SOUP → MESH
// =============================================================================

/// Welds, repairs and triangulates a polygon soup.
pub fn polygons_to_mesh(polygons: &[Polygon], tolerance: &KernelTolerance) -> MeshResult<Mesh> {
    let epsilon = tolerance.weld_epsilon;
    let mut welder = VertexWelder::new(epsilon);
    let mut loops: Vec<Vec<u32>> = Vec::with_capacity(polygons.len());
    let mut collapsed = 0usize;

    for polygon in polygons {
        let mut indices: Vec<u32> = Vec::with_capacity(polygon.vertices.len());
        for &v in &polygon.vertices {
            let index = welder.insert(v);
            if indices.last() != Some(&index) {
                indices.push(index);
            }
        }
        while indices.len() > 1 && indices.first() == indices.last() {
            indices.pop();
        }
        if indices.len() >= 3 && !has_repeats(&indices) {
            loops.push(indices);
        } else {
            collapsed += 1;
        }
    }

    let positions = welder.into_positions();
    let mut used = vec![false; positions.len()];
    for index in loops.iter().flatten() {
        used[*index as usize] = true;
    }
    let candidates: Vec<u32> = (0..positions.len() as u32)
        .filter(|&i| used[i as usize])
        .collect();

    let loops: Vec<Vec<u32>> = loops
        .par_iter()
        .map(|indices| split_t_junctions(indices, &positions, &candidates, epsilon))
        .collect();

    let mut mesh = Mesh::from_parts(positions, Vec::with_capacity(loops.len() * 2))?;
    let mut slivers = 0usize;
    for indices in &loops {
        if is_sliver(indices, mesh.vertices(), epsilon) {
            slivers += 1;
            continue;
        }
        triangulate_convex(&mut mesh, indices, epsilon);
    }
    mesh.compact();

    debug!(
        polygons = polygons.len(),
        collapsed,
        slivers,
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "repaired polygon soup"
    );
    Ok(mesh)
}

fn has_repeats(indices: &[u32]) -> bool {
    indices
        .iter()
        .enumerate()
        .any(|(i, a)| indices[i + 1..].contains(a))
}

/// Inserts every candidate vertex lying on an edge of the loop into that edge.
///
/// Near a sharp corner a vertex can be within tolerance of both edges; it is
/// inserted once, into the nearer edge.
fn split_t_junctions(
    indices: &[u32],
    positions: &[DVec3],
    candidates: &[u32],
    epsilon: f64,
) -> Vec<u32> {
    let n = indices.len();
    // (edge, parameter along edge, distance from edge, vertex)
    let mut hits: Vec<(usize, f64, f64, u32)> = Vec::new();
    for i in 0..n {
        let (a, b) = (positions[indices[i] as usize], positions[indices[(i + 1) % n] as usize]);
        let edge = b - a;
        let length = edge.length();
        if length <= epsilon {
            continue;
        }
        let direction = edge / length;
        let lo = a.min(b) - DVec3::splat(epsilon);
        let hi = a.max(b) + DVec3::splat(epsilon);

        hits.extend(
            candidates
                .iter()
                .filter(|&&c| !indices.contains(&c))
                .filter_map(|&c| {
                    let p = positions[c as usize];
                    if p.cmplt(lo).any() || p.cmpgt(hi).any() {
                        return None;
                    }
                    let t = (p - a).dot(direction);
                    if t <= epsilon || t >= length - epsilon {
                        return None;
                    }
                    let distance = (p - (a + direction * t)).length();
                    (distance < epsilon).then_some((i, t, distance, c))
                }),
        );
    }
    if hits.is_empty() {
        return indices.to_vec();
    }

    hits.sort_by(|x, y| x.3.cmp(&y.3).then(x.2.total_cmp(&y.2)));
    hits.dedup_by_key(|hit| hit.3);
    hits.sort_by(|x, y| x.0.cmp(&y.0).then(x.1.total_cmp(&y.1)));

    let mut out = Vec::with_capacity(n + hits.len());
    let mut pending = hits.iter().peekable();
    for (i, &index) in indices.iter().enumerate() {
        out.push(index);
        while let Some(&(_, _, _, c)) = pending.next_if(|hit| hit.0 == i) {
            out.push(c);
        }
    }
    out
}

/// Removes repeated faces left by coincident polygons.
///
/// Copies with the same orientation collapse to one; a face and its reverse
/// cancel out. Returns the number of faces removed.
pub fn remove_duplicate_faces(mesh: &mut Mesh) -> usize {
    fn canonical([a, b, c]: [u32; 3]) -> [u32; 3] {
        if a <= b && a <= c {
            [a, b, c]
        } else if b <= a && b <= c {
            [b, c, a]
        } else {
            [c, a, b]
        }
    }

    let mut counts: HashMap<[u32; 3], i64> = HashMap::with_capacity(mesh.triangle_count());
    for &triangle in mesh.triangles() {
        *counts.entry(canonical(triangle)).or_insert(0) += 1;
    }
    let reversed = |[a, b, c]: [u32; 3]| [a, c, b];
    let clean = counts.len() == mesh.triangle_count()
        && counts.keys().all(|&key| !counts.contains_key(&canonical(reversed(key))));
    if clean {
        return 0;
    }

    let before = mesh.triangle_count();
    let mut emitted: HashSet<[u32; 3]> = HashSet::new();
    mesh.retain_triangles(|_, triangle| {
        let key = canonical(triangle);
        let count = |k: &[u32; 3]| counts.get(k).copied().unwrap_or(0);
        count(&key) > count(&canonical(reversed(key))) && emitted.insert(key)
    });
    before - mesh.triangle_count()
}

/// A polygon whose vertices all lie within `epsilon` of one line.
fn is_sliver(indices: &[u32], positions: &[DVec3], epsilon: f64) -> bool {
    let points: Vec<DVec3> = indices.iter().map(|&i| positions[i as usize]).collect();
    let mut best = (0, 0, 0.0);
    for i in 0..points.len() {
        for j in i + 1..points.len() {
            let d = points[i].distance_squared(points[j]);
            if d > best.2 {
                best = (i, j, d);
            }
        }
    }
    let (p, q) = (points[best.0], points[best.1]);
    let Some(axis) = (q - p).try_normalize() else {
        return true;
    };
    points.iter().all(|&r| {
        let offset = r - p;
        (offset - axis * offset.dot(axis)).length() < epsilon
    })
}

/// Triangulates a convex loop. Loops with collinear runs (from T-junction
/// splits) are fanned from their centroid to avoid zero-area triangles.
fn triangulate_convex(mesh: &mut Mesh, indices: &[u32], epsilon: f64) {
    let n = indices.len();
    if n == 3 {
        mesh.add_triangle(indices[0], indices[1], indices[2]);
        return;
    }

    let position = |i: usize| mesh.vertex(indices[i % n]);
    let all_corners = (0..n).all(|i| {
        let prev = position(i + n - 1);
        let here = position(i);
        let next = position(i + 1);
        match (next - prev).try_normalize() {
            Some(axis) => {
                let offset = here - prev;
                (offset - axis * offset.dot(axis)).length() > epsilon
            }
            None => false,
        }
    });

    if all_corners {
        for i in 1..n - 1 {
            mesh.add_triangle(indices[0], indices[i], indices[i + 1]);
        }
    } else {
        let centroid = indices
            .iter()
            .map(|&i| mesh.vertex(i))
            .sum::<DVec3>()
            / n as f64;
        let center = mesh.add_vertex(centroid);
        for i in 0..n {
            mesh.add_triangle(center, indices[i], indices[(i + 1) % n]);
        }
    }
}
