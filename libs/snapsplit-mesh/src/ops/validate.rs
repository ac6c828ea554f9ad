//! Manifold validation and health reporting.
//!
//! A mesh is accepted as manifold when it is a closed, consistently oriented
//! edge-manifold surface: every directed edge `a → b` appears exactly once and
//! is matched by exactly one `b → a`, and no triangle repeats a vertex.

use std::collections::HashMap;
use std::fmt;

use config::constants::AREA_EPSILON;

use crate::mesh::Mesh;

/// Report of mesh validation results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshReport {
    /// Total number of vertices.
    pub vertex_count: usize,
    /// Total number of faces.
    pub face_count: usize,
    /// Total number of undirected edges.
    pub edge_count: usize,
    /// Edges used by exactly one face.
    pub boundary_edge_count: usize,
    /// Edges used by more than two faces, or twice in the same direction.
    pub non_manifold_edge_count: usize,
    /// Faces that repeat a vertex index.
    pub collapsed_face_count: usize,
    /// Faces with near-zero area.
    pub degenerate_face_count: usize,
    /// Enclosed volume (meaningful only when watertight).
    pub signed_volume: f64,
    /// No boundary edges.
    pub is_watertight: bool,
    /// Closed, consistently oriented edge-manifold.
    pub is_manifold: bool,
    /// Closed but enclosing negative volume.
    pub is_inside_out: bool,
}

impl MeshReport {
    /// Short description of the first problem found, if any.
    pub fn issue(&self) -> Option<String> {
        if self.face_count == 0 {
            return Some("mesh has no faces".to_string());
        }
        if self.collapsed_face_count > 0 {
            return Some(format!("{} collapsed faces", self.collapsed_face_count));
        }
        if self.non_manifold_edge_count > 0 {
            return Some(format!(
                "{} non-manifold edges",
                self.non_manifold_edge_count
            ));
        }
        if self.boundary_edge_count > 0 {
            return Some(format!("{} boundary edges", self.boundary_edge_count));
        }
        if self.is_inside_out {
            return Some("surface is inside-out".to_string());
        }
        None
    }
}

impl fmt::Display for MeshReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesh Report:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Faces: {}", self.face_count)?;
        writeln!(f, "  Edges: {}", self.edge_count)?;
        writeln!(f, "  Volume: {:.6}", self.signed_volume)?;
        writeln!(
            f,
            "  Watertight: {}",
            if self.is_watertight { "Yes" } else { "No" }
        )?;
        writeln!(
            f,
            "  Manifold: {}",
            if self.is_manifold { "Yes" } else { "No" }
        )?;
        if let Some(issue) = self.issue() {
            writeln!(f, "  Issue: {issue}")?;
        }
        if self.degenerate_face_count > 0 {
            writeln!(f, "  Sliver faces: {}", self.degenerate_face_count)?;
        }
        Ok(())
    }
}

/// Counts every directed edge of the mesh.
pub fn directed_edges(mesh: &Mesh) -> HashMap<(u32, u32), u32> {
    let mut edges = HashMap::with_capacity(mesh.triangle_count() * 3);
    for &[a, b, c] in mesh.triangles() {
        for edge in [(a, b), (b, c), (c, a)] {
            *edges.entry(edge).or_insert(0) += 1;
        }
    }
    edges
}

/// Directed edges that have no opposite partner, in a deterministic order.
///
/// On an open mesh these are the edges of the boundary loops, oriented the
/// same way as the faces that own them.
pub fn boundary_edges(mesh: &Mesh) -> Vec<(u32, u32)> {
    let edges = directed_edges(mesh);
    let mut boundary: Vec<(u32, u32)> = edges
        .iter()
        .filter(|(&(a, b), _)| !edges.contains_key(&(b, a)))
        .map(|(&edge, _)| edge)
        .collect();
    boundary.sort_unstable();
    boundary
}

/// Checks whether the mesh is a closed, consistently oriented edge-manifold.
///
/// # Example
///
/// ```rust
/// use snapsplit_mesh::primitives::create_cube;
/// use snapsplit_mesh::ops::validate::is_manifold;
/// use glam::DVec3;
///
/// let cube = create_cube(DVec3::ONE, false).unwrap();
/// assert!(is_manifold(&cube));
/// ```
pub fn is_manifold(mesh: &Mesh) -> bool {
    validate(mesh).is_manifold
}

/// Validates a mesh and returns a report of any issues.
pub fn validate(mesh: &Mesh) -> MeshReport {
    let edges = directed_edges(mesh);

    let mut edge_count = 0;
    let mut boundary_edge_count = 0;
    let mut non_manifold_edge_count = 0;
    for (&(a, b), &forward) in &edges {
        let backward = edges.get(&(b, a)).copied().unwrap_or(0);
        // Visit each undirected edge once
        if backward > 0 && (a, b) > (b, a) {
            continue;
        }
        edge_count += 1;
        match (forward, backward) {
            (1, 1) => {}
            (1, 0) => boundary_edge_count += 1,
            _ => non_manifold_edge_count += 1,
        }
    }

    let collapsed_face_count = mesh
        .triangles()
        .iter()
        .filter(|&&[a, b, c]| a == b || b == c || a == c)
        .count();
    let degenerate_face_count = (0..mesh.triangle_count())
        .filter(|&i| mesh.face_cross(i).length() < AREA_EPSILON)
        .count();

    let signed_volume = mesh.signed_volume();
    let is_watertight = boundary_edge_count == 0 && !mesh.is_empty();
    let closed = is_watertight && non_manifold_edge_count == 0 && collapsed_face_count == 0;
    let is_inside_out = closed && signed_volume < 0.0;

    MeshReport {
        vertex_count: mesh.vertex_count(),
        face_count: mesh.triangle_count(),
        edge_count,
        boundary_edge_count,
        non_manifold_edge_count,
        collapsed_face_count,
        degenerate_face_count,
        signed_volume,
        is_watertight,
        is_manifold: closed && !is_inside_out,
        is_inside_out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::create_cube;
    use glam::DVec3;

    #[test]
    fn test_cube_report() {
        let cube = create_cube(DVec3::splat(2.0), false).unwrap();
        let report = validate(&cube);
        assert!(report.is_manifold);
        assert!(report.is_watertight);
        assert_eq!(report.edge_count, 18);
        assert_eq!(report.issue(), None);
    }

    #[test]
    fn test_open_box_has_boundary() {
        let mut cube = create_cube(DVec3::ONE, false).unwrap();
        cube.retain_triangles(|index, _| index >= 2);
        let report = validate(&cube);
        assert!(!report.is_manifold);
        assert_eq!(report.boundary_edge_count, 4);
        assert_eq!(boundary_edges(&cube).len(), 4);
    }

    #[test]
    fn test_inside_out_rejected() {
        let mut cube = create_cube(DVec3::ONE, false).unwrap();
        cube.flip();
        let report = validate(&cube);
        assert!(report.is_inside_out);
        assert!(!report.is_manifold);
    }

    #[test]
    fn test_duplicated_face_is_non_manifold() {
        let mut cube = create_cube(DVec3::ONE, false).unwrap();
        let [a, b, c] = cube.triangle(0);
        cube.add_triangle(a, b, c);
        let report = validate(&cube);
        assert!(report.non_manifold_edge_count > 0);
        assert!(!is_manifold(&cube));
    }

    #[test]
    fn test_empty_mesh_is_not_manifold() {
        assert!(!is_manifold(&Mesh::new()));
    }

    #[test]
    fn test_report_display() {
        let cube = create_cube(DVec3::ONE, false).unwrap();
        let text = validate(&cube).to_string();
        assert!(text.contains("Manifold: Yes"));
    }
}
