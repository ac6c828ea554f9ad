//! # Box Primitive
//!
//! Axis-aligned boxes, used for half-space cutters and test solids.

use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;
use glam::DVec3;

/// Creates an axis-aligned box spanning `min..max`.
///
/// # Returns
///
/// A mesh with 8 vertices and 12 triangles (2 per face).
///
/// # Example
///
/// ```rust
/// use snapsplit_mesh::primitives::create_box;
/// use glam::DVec3;
///
/// let mesh = create_box(DVec3::ZERO, DVec3::new(100.0, 50.0, 50.0)).unwrap();
/// assert_eq!(mesh.vertex_count(), 8);
/// assert_eq!(mesh.triangle_count(), 12);
/// ```
pub fn create_box(min: DVec3, max: DVec3) -> MeshResult<Mesh> {
    let size = max - min;
    if !(size.x > 0.0 && size.y > 0.0 && size.z > 0.0) {
        return Err(MeshError::degenerate(format!(
            "Box extent must be positive: {size:?}"
        )));
    }

    let mut mesh = Mesh::with_capacity(8, 12);

    // Bottom face (z = min.z)
    let v0 = mesh.add_vertex(DVec3::new(min.x, min.y, min.z));
    let v1 = mesh.add_vertex(DVec3::new(max.x, min.y, min.z));
    let v2 = mesh.add_vertex(DVec3::new(max.x, max.y, min.z));
    let v3 = mesh.add_vertex(DVec3::new(min.x, max.y, min.z));

    // Top face (z = max.z)
    let v4 = mesh.add_vertex(DVec3::new(min.x, min.y, max.z));
    let v5 = mesh.add_vertex(DVec3::new(max.x, min.y, max.z));
    let v6 = mesh.add_vertex(DVec3::new(max.x, max.y, max.z));
    let v7 = mesh.add_vertex(DVec3::new(min.x, max.y, max.z));

    // Counter-clockwise seen from outside
    mesh.add_triangle(v0, v2, v1);
    mesh.add_triangle(v0, v3, v2);

    mesh.add_triangle(v4, v5, v6);
    mesh.add_triangle(v4, v6, v7);

    mesh.add_triangle(v0, v1, v5);
    mesh.add_triangle(v0, v5, v4);

    mesh.add_triangle(v2, v3, v7);
    mesh.add_triangle(v2, v7, v6);

    mesh.add_triangle(v3, v0, v4);
    mesh.add_triangle(v3, v4, v7);

    mesh.add_triangle(v1, v2, v6);
    mesh.add_triangle(v1, v6, v5);

    Ok(mesh)
}

/// Creates a cube or rectangular prism of the given size.
///
/// * `center` - If true, center at origin; if false, corner at origin
pub fn create_cube(size: DVec3, center: bool) -> MeshResult<Mesh> {
    if center {
        create_box(-size / 2.0, size / 2.0)
    } else {
        create_box(DVec3::ZERO, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::validate::is_manifold;
    use approx::assert_relative_eq;

    #[test]
    fn test_box_counts() {
        let mesh = create_box(DVec3::ZERO, DVec3::ONE).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_box_is_closed_and_outward() {
        let mesh = create_box(DVec3::ZERO, DVec3::new(100.0, 50.0, 50.0)).unwrap();
        assert!(is_manifold(&mesh));
        assert_relative_eq!(mesh.signed_volume(), 250_000.0, epsilon = 1e-6);
        assert_relative_eq!(mesh.surface_area(), 25_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_cube_centered() {
        let mesh = create_cube(DVec3::splat(10.0), true).unwrap();
        let (min, max) = mesh.bounding_box();
        assert_eq!(min, DVec3::splat(-5.0));
        assert_eq!(max, DVec3::splat(5.0));
    }

    #[test]
    fn test_box_rejects_flat_extent() {
        assert!(create_box(DVec3::ZERO, DVec3::new(1.0, 0.0, 1.0)).is_err());
    }
}
