//! # Voxel Remesh
//!
//! Coarse simplification by vertex clustering on a regular grid. Used as the
//! last resort before a failed cut is reported: snapping nearby vertices
//! together removes slivers and near-coincident features that defeat the
//! boolean.

use std::collections::{HashMap, HashSet};

use glam::DVec3;
use tracing::debug;

use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;

/// Clusters vertices into cells of `voxel_size` and rebuilds the mesh.
///
/// Each cluster is represented by the mean of its members. Triangles that
/// collapse, and pairs of coincident opposite triangles, are removed.
///
/// # Errors
///
/// Fails for a non-positive voxel size or when nothing of the mesh survives.
///
/// # Example
///
/// ```rust
/// use snapsplit_mesh::ops::remesh::voxel_remesh;
/// use snapsplit_mesh::primitives::create_box;
/// use glam::DVec3;
///
/// let cube = create_box(DVec3::ZERO, DVec3::splat(10.0)).unwrap();
/// let coarse = voxel_remesh(&cube, 1.0).unwrap();
/// assert_eq!(coarse.triangle_count(), 12);
/// ```
pub fn voxel_remesh(mesh: &Mesh, voxel_size: f64) -> MeshResult<Mesh> {
    if !(voxel_size > 0.0) {
        return Err(MeshError::degenerate(format!(
            "Voxel size must be positive: {voxel_size}"
        )));
    }

    let mut cluster_of: Vec<u32> = Vec::with_capacity(mesh.vertex_count());
    let mut clusters: HashMap<(i64, i64, i64), u32> = HashMap::new();
    let mut sums: Vec<(DVec3, u32)> = Vec::new();
    for &v in mesh.vertices() {
        let cell = (v / voxel_size).round();
        let key = (cell.x as i64, cell.y as i64, cell.z as i64);
        let index = *clusters.entry(key).or_insert_with(|| {
            sums.push((DVec3::ZERO, 0));
            (sums.len() - 1) as u32
        });
        let entry = &mut sums[index as usize];
        entry.0 += v;
        entry.1 += 1;
        cluster_of.push(index);
    }

    let vertices: Vec<DVec3> = sums.iter().map(|(sum, n)| *sum / *n as f64).collect();

    let mut seen: HashSet<[u32; 3]> = HashSet::new();
    let mut mapped: Vec<[u32; 3]> = Vec::with_capacity(mesh.triangle_count());
    for &[a, b, c] in mesh.triangles() {
        let tri = [
            cluster_of[a as usize],
            cluster_of[b as usize],
            cluster_of[c as usize],
        ];
        if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
            continue;
        }
        if seen.insert(canonical(tri)) {
            mapped.push(tri);
        }
    }

    // Coincident opposite faces enclose no volume
    let keys: HashSet<[u32; 3]> = mapped.iter().map(|&t| canonical(t)).collect();
    let triangles: Vec<[u32; 3]> = mapped
        .into_iter()
        .filter(|&[a, b, c]| !keys.contains(&canonical([a, c, b])))
        .collect();

    let mut result = Mesh::from_parts(vertices, triangles)?;
    result.compact();
    if result.is_empty() {
        return Err(MeshError::degenerate(format!(
            "Voxel remesh at {voxel_size} collapsed the mesh"
        )));
    }

    debug!(
        voxel_size,
        before = mesh.triangle_count(),
        after = result.triangle_count(),
        "voxel remesh"
    );
    Ok(result)
}

/// Rotates a triangle so its smallest index comes first, keeping winding.
fn canonical([a, b, c]: [u32; 3]) -> [u32; 3] {
    if a <= b && a <= c {
        [a, b, c]
    } else if b <= a && b <= c {
        [b, c, a]
    } else {
        [c, a, b]
    }
}
