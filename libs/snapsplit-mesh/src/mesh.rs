//! # Mesh Data Structure
//!
//! Indexed triangle mesh used by every kernel operation. A `Mesh` is a plain
//! value: kernel calls consume references and return fresh meshes.

use config::constants::{MAX_TRIANGLES, MAX_VERTICES};
use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};

/// A triangle mesh with vertices and indices.
///
/// All geometry calculations use f64. Triangles are wound counter-clockwise
/// when seen from outside, so face normals point out of the solid.
///
/// # Example
///
/// ```rust
/// use snapsplit_mesh::Mesh;
/// use glam::DVec3;
///
/// let mut mesh = Mesh::new();
/// mesh.add_vertex(DVec3::new(0.0, 0.0, 0.0));
/// mesh.add_vertex(DVec3::new(1.0, 0.0, 0.0));
/// mesh.add_vertex(DVec3::new(0.0, 1.0, 0.0));
/// mesh.add_triangle(0, 1, 2);
/// assert_eq!(mesh.triangle_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Vertex positions
    vertices: Vec<DVec3>,
    /// Triangle indices (3 indices per triangle)
    triangles: Vec<[u32; 3]>,
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Builds a mesh from raw buffers, checking sizes and index bounds.
    ///
    /// # Errors
    ///
    /// Returns an error when a limit is exceeded or a triangle references a
    /// missing vertex.
    pub fn from_parts(vertices: Vec<DVec3>, triangles: Vec<[u32; 3]>) -> MeshResult<Self> {
        if vertices.len() > MAX_VERTICES {
            return Err(MeshError::TooManyVertices {
                count: vertices.len(),
                max: MAX_VERTICES,
            });
        }
        if triangles.len() > MAX_TRIANGLES {
            return Err(MeshError::TooManyTriangles {
                count: triangles.len(),
                max: MAX_TRIANGLES,
            });
        }
        let vertex_count = vertices.len() as u32;
        if let Some(bad) = triangles
            .iter()
            .position(|tri| tri.iter().any(|&i| i >= vertex_count))
        {
            return Err(MeshError::invalid_topology(format!(
                "triangle {bad} references a vertex outside 0..{vertex_count}"
            )));
        }
        Ok(Self {
            vertices,
            triangles,
        })
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Returns true if the mesh has no triangles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Adds a vertex and returns its index.
    pub fn add_vertex(&mut self, position: DVec3) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(position);
        index
    }

    /// Adds a triangle by vertex indices.
    pub fn add_triangle(&mut self, v0: u32, v1: u32, v2: u32) {
        self.triangles.push([v0, v1, v2]);
    }

    /// Returns a reference to the vertices.
    #[inline]
    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    /// Returns a reference to the triangles.
    #[inline]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Returns the vertex at the given index.
    #[inline]
    pub fn vertex(&self, index: u32) -> DVec3 {
        self.vertices[index as usize]
    }

    /// Returns the triangle at the given index.
    #[inline]
    pub fn triangle(&self, index: usize) -> [u32; 3] {
        self.triangles[index]
    }

    /// Returns the three corner positions of a triangle.
    #[inline]
    pub fn triangle_positions(&self, index: usize) -> [DVec3; 3] {
        let [a, b, c] = self.triangles[index];
        [self.vertex(a), self.vertex(b), self.vertex(c)]
    }

    /// Unnormalized face normal (length is twice the triangle area).
    pub fn face_cross(&self, index: usize) -> DVec3 {
        let [a, b, c] = self.triangle_positions(index);
        (b - a).cross(c - a)
    }

    /// Unit face normal, or zero for a degenerate triangle.
    pub fn face_normal(&self, index: usize) -> DVec3 {
        self.face_cross(index).normalize_or_zero()
    }

    /// Triangle area.
    pub fn face_area(&self, index: usize) -> f64 {
        self.face_cross(index).length() * 0.5
    }

    /// Computes the axis-aligned bounding box.
    ///
    /// Returns (min, max) corners of the bounding box.
    pub fn bounding_box(&self) -> (DVec3, DVec3) {
        if self.vertices.is_empty() {
            return (DVec3::ZERO, DVec3::ZERO);
        }

        let mut min = self.vertices[0];
        let mut max = self.vertices[0];

        for v in &self.vertices[1..] {
            min = min.min(*v);
            max = max.max(*v);
        }

        (min, max)
    }

    /// Length of the bounding box diagonal.
    pub fn diagonal(&self) -> f64 {
        let (min, max) = self.bounding_box();
        (max - min).length()
    }

    /// Signed volume enclosed by the surface (divergence theorem).
    ///
    /// Positive for a closed mesh with outward-facing triangles.
    pub fn signed_volume(&self) -> f64 {
        self.triangles
            .iter()
            .map(|&[a, b, c]| {
                let (a, b, c) = (self.vertex(a), self.vertex(b), self.vertex(c));
                a.dot(b.cross(c))
            })
            .sum::<f64>()
            / 6.0
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        (0..self.triangles.len()).map(|i| self.face_area(i)).sum()
    }

    /// Transforms all vertices by a 4x4 matrix.
    ///
    /// Matrices with a negative determinant also flip the winding so the
    /// surface stays outward-facing.
    pub fn transform(&mut self, matrix: &DMat4) {
        for v in &mut self.vertices {
            *v = matrix.transform_point3(*v);
        }
        if matrix.determinant() < 0.0 {
            self.flip();
        }
    }

    /// Translates the mesh by a vector.
    pub fn translate(&mut self, offset: DVec3) {
        for v in &mut self.vertices {
            *v += offset;
        }
    }

    /// Reverses the winding of every triangle.
    pub fn flip(&mut self) {
        for tri in &mut self.triangles {
            tri.swap(1, 2);
        }
    }

    /// Merges another mesh into this one.
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len() as u32;

        self.vertices.extend_from_slice(&other.vertices);

        for tri in &other.triangles {
            self.triangles
                .push([tri[0] + offset, tri[1] + offset, tri[2] + offset]);
        }
    }

    /// Keeps only the triangles for which `keep` returns true, dropping
    /// vertices no longer referenced.
    pub fn retain_triangles(&mut self, mut keep: impl FnMut(usize, [u32; 3]) -> bool) {
        let mut index = 0;
        self.triangles.retain(|tri| {
            let kept = keep(index, *tri);
            index += 1;
            kept
        });
        self.compact();
    }

    /// Removes unreferenced vertices and renumbers the triangles.
    pub fn compact(&mut self) {
        let mut remap = vec![u32::MAX; self.vertices.len()];
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for tri in &mut self.triangles {
            for index in tri.iter_mut() {
                let slot = &mut remap[*index as usize];
                if *slot == u32::MAX {
                    *slot = vertices.len() as u32;
                    vertices.push(self.vertices[*index as usize]);
                }
                *index = *slot;
            }
        }
        self.vertices = vertices;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tetrahedron() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_vertex(DVec3::ZERO);
        mesh.add_vertex(DVec3::X);
        mesh.add_vertex(DVec3::Y);
        mesh.add_vertex(DVec3::Z);
        mesh.add_triangle(0, 2, 1);
        mesh.add_triangle(0, 1, 3);
        mesh.add_triangle(0, 3, 2);
        mesh.add_triangle(1, 2, 3);
        mesh
    }

    #[test]
    fn test_mesh_new() {
        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn test_mesh_add_vertex() {
        let mut mesh = Mesh::new();
        let idx = mesh.add_vertex(DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(idx, 0);
        assert_eq!(mesh.vertex(0), DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_from_parts_rejects_bad_index() {
        let err = Mesh::from_parts(vec![DVec3::ZERO], vec![[0, 1, 2]]).unwrap_err();
        assert!(matches!(err, MeshError::InvalidTopology { .. }));
    }

    #[test]
    fn test_mesh_bounding_box() {
        let mesh = tetrahedron();
        let (min, max) = mesh.bounding_box();
        assert_eq!(min, DVec3::ZERO);
        assert_eq!(max, DVec3::ONE);
    }

    #[test]
    fn test_signed_volume_tetrahedron() {
        assert_relative_eq!(tetrahedron().signed_volume(), 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_flip_negates_volume() {
        let mut mesh = tetrahedron();
        mesh.flip();
        assert_relative_eq!(mesh.signed_volume(), -1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mirror_transform_keeps_orientation() {
        let mut mesh = tetrahedron();
        mesh.transform(&DMat4::from_scale(DVec3::new(-1.0, 1.0, 1.0)));
        assert!(mesh.signed_volume() > 0.0);
    }

    #[test]
    fn test_face_normal_outward() {
        let mesh = tetrahedron();
        assert_eq!(mesh.face_normal(0), DVec3::NEG_Z);
    }

    #[test]
    fn test_mesh_merge() {
        let mut mesh1 = tetrahedron();
        let mut mesh2 = tetrahedron();
        mesh2.translate(DVec3::splat(5.0));

        mesh1.merge(&mesh2);
        assert_eq!(mesh1.vertex_count(), 8);
        assert_eq!(mesh1.triangle_count(), 8);
        assert_eq!(mesh1.triangle(4), [4, 6, 5]);
        assert_relative_eq!(mesh1.signed_volume(), 2.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_retain_triangles_compacts() {
        let mut mesh = tetrahedron();
        mesh.retain_triangles(|index, _| index == 0);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle(0), [0, 1, 2]);
    }
}
