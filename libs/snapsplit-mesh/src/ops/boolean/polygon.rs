//! # Polygon for BSP Operations
//!
//! Convex planar polygon carrying the plane of the face it was cut from.

use glam::DVec3;

use super::plane::Plane;
use crate::mesh::Mesh;

/// A convex polygon and its supporting plane.
///
/// Fragments produced by splitting keep the plane of the original face so
/// that coplanar fragments classify identically everywhere in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<DVec3>,
    pub plane: Plane,
    /// Clear of the other operand: the face survives the boolean whole, so
    /// its fragments are dropped and the original is emitted instead.
    pub clear: bool,
}

impl Polygon {
    /// Creates a polygon, computing its plane. Returns `None` when degenerate.
    pub fn new(vertices: Vec<DVec3>) -> Option<Self> {
        let plane = Plane::from_polygon(&vertices)?;
        Some(Self {
            vertices,
            plane,
            clear: false,
        })
    }

    /// A piece of this polygon, sharing its plane and flags.
    pub fn fragment(&self, vertices: Vec<DVec3>) -> Self {
        Self {
            vertices,
            plane: self.plane,
            clear: self.clear,
        }
    }

    /// Bounding box of the vertices.
    pub fn bounds(&self) -> (DVec3, DVec3) {
        self.vertices.iter().fold(
            (DVec3::splat(f64::INFINITY), DVec3::splat(f64::NEG_INFINITY)),
            |(lo, hi), &v| (lo.min(v), hi.max(v)),
        )
    }

    /// Reverses orientation.
    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.plane.flip();
    }
}

/// Converts mesh triangles to polygons, skipping degenerate triangles.
pub fn mesh_to_polygons(mesh: &Mesh) -> Vec<Polygon> {
    (0..mesh.triangle_count())
        .filter_map(|i| Polygon::new(mesh.triangle_positions(i).to_vec()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::create_cube;

    #[test]
    fn test_flip_reverses_normal() {
        let mut polygon = Polygon::new(vec![DVec3::ZERO, DVec3::X, DVec3::Y]).unwrap();
        polygon.flip();
        assert!((polygon.plane.normal + DVec3::Z).length() < 1e-12);
        assert_eq!(polygon.vertices[0], DVec3::Y);
    }

    #[test]
    fn test_fragment_keeps_plane_and_flag() {
        let mut polygon = Polygon::new(vec![DVec3::ZERO, DVec3::X, DVec3::Y]).unwrap();
        polygon.clear = true;
        let piece = polygon.fragment(vec![DVec3::ZERO, DVec3::X * 0.5, DVec3::Y * 0.5]);
        assert_eq!(piece.plane, polygon.plane);
        assert!(piece.clear);
        assert_eq!(piece.bounds(), (DVec3::ZERO, DVec3::new(0.5, 0.5, 0.0)));
    }

    #[test]
    fn test_mesh_to_polygons() {
        let cube = create_cube(DVec3::ONE, false).unwrap();
        assert_eq!(mesh_to_polygons(&cube).len(), 12);
    }
}
