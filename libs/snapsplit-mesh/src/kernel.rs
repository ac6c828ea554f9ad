//! # Geometry Kernel
//!
//! The single entry point through which the pipeline performs booleans,
//! validation, thickness probes and remeshing. Callers hold a
//! `&dyn GeometryKernel` so the boolean engine can be replaced without
//! touching segmentation or synthesis.

use config::constants::{PLANE_EPSILON, WELD_EPSILON};
use config::pipeline::PipelineConfig;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;
use crate::ops;

/// Numerical tolerances owned by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KernelTolerance {
    /// Half-thickness of the "on plane" band during BSP classification.
    pub plane_epsilon: f64,
    /// Distance below which vertices are welded after a boolean.
    pub weld_epsilon: f64,
}

impl Default for KernelTolerance {
    fn default() -> Self {
        Self {
            plane_epsilon: PLANE_EPSILON,
            weld_epsilon: WELD_EPSILON,
        }
    }
}

impl From<&PipelineConfig> for KernelTolerance {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            plane_epsilon: config.plane_epsilon,
            weld_epsilon: config.weld_epsilon,
        }
    }
}

/// Boolean and inspection operations on closed triangle meshes.
///
/// Every mesh returned by `union` and `difference` is manifold; anything
/// else is reported as an error.
pub trait GeometryKernel: Send + Sync {
    /// Union of two closed meshes.
    fn union(&self, a: &Mesh, b: &Mesh) -> MeshResult<Mesh>;

    /// `a` minus `b`.
    fn difference(&self, a: &Mesh, b: &Mesh) -> MeshResult<Mesh>;

    /// Closed, consistently oriented edge-manifold check.
    fn is_manifold(&self, mesh: &Mesh) -> bool;

    /// Wall thickness behind a surface point, `None` for a solid body.
    /// The ray starts the kernel's weld distance inside the surface.
    fn probe_thickness(&self, mesh: &Mesh, point: DVec3, normal: DVec3) -> Option<f64>;

    /// Coarse voxel-resolution remesh used to remediate failed cuts.
    fn remesh(&self, mesh: &Mesh, voxel_size: f64) -> MeshResult<Mesh>;

    /// Tolerances used for welding and plane classification.
    fn tolerance(&self) -> KernelTolerance;
}

/// BSP-tree kernel with weld and T-junction repair.
///
/// # Example
///
/// ```rust
/// use snapsplit_mesh::{BspKernel, GeometryKernel, KernelTolerance};
/// use snapsplit_mesh::primitives::create_box;
/// use glam::DVec3;
///
/// let kernel = BspKernel::new(KernelTolerance::default());
/// let a = create_box(DVec3::ZERO, DVec3::splat(2.0)).unwrap();
/// let b = create_box(DVec3::ONE, DVec3::splat(3.0)).unwrap();
/// let merged = kernel.union(&a, &b).unwrap();
/// assert!(kernel.is_manifold(&merged));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BspKernel {
    tolerance: KernelTolerance,
}

impl BspKernel {
    /// Creates a kernel with explicit tolerances.
    pub fn new(tolerance: KernelTolerance) -> Self {
        Self { tolerance }
    }

    /// Creates a kernel from the pipeline configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(KernelTolerance::from(config))
    }

    fn check_operand(operation: &'static str, role: &str, mesh: &Mesh) -> MeshResult<()> {
        match ops::validate(mesh).issue() {
            None => Ok(()),
            Some(issue) => {
                debug!(operation, role, %issue, "rejected operand");
                Err(MeshError::non_manifold_input(format!(
                    "{operation} {role} operand: {issue}"
                )))
            }
        }
    }
}

impl GeometryKernel for BspKernel {
    fn union(&self, a: &Mesh, b: &Mesh) -> MeshResult<Mesh> {
        Self::check_operand("union", "first", a)?;
        Self::check_operand("union", "second", b)?;
        ops::union(a, b, &self.tolerance)
    }

    fn difference(&self, a: &Mesh, b: &Mesh) -> MeshResult<Mesh> {
        Self::check_operand("difference", "first", a)?;
        Self::check_operand("difference", "second", b)?;
        ops::difference(a, b, &self.tolerance)
    }

    fn is_manifold(&self, mesh: &Mesh) -> bool {
        ops::is_manifold(mesh)
    }

    fn probe_thickness(&self, mesh: &Mesh, point: DVec3, normal: DVec3) -> Option<f64> {
        ops::probe_thickness(mesh, point, normal, self.tolerance.weld_epsilon)
    }

    fn remesh(&self, mesh: &Mesh, voxel_size: f64) -> MeshResult<Mesh> {
        ops::voxel_remesh(mesh, voxel_size)
    }

    fn tolerance(&self) -> KernelTolerance {
        self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::create_box;

    #[test]
    fn test_tolerance_from_config() {
        let config = PipelineConfig::fine();
        let tolerance = KernelTolerance::from(&config);
        assert_eq!(tolerance.plane_epsilon, config.plane_epsilon);
        assert_eq!(tolerance.weld_epsilon, config.weld_epsilon);
    }

    #[test]
    fn test_rejects_open_operand() {
        let kernel = BspKernel::default();
        let mut open = create_box(DVec3::ZERO, DVec3::ONE).unwrap();
        open.retain_triangles(|i, _| i != 0);
        let closed = create_box(DVec3::ZERO, DVec3::ONE).unwrap();
        let err = kernel.difference(&open, &closed).unwrap_err();
        assert!(matches!(err, MeshError::NonManifoldInput { .. }));
    }

    #[test]
    fn test_kernel_is_object_safe() {
        let kernel: Box<dyn GeometryKernel> = Box::new(BspKernel::default());
        let cube = create_box(DVec3::ZERO, DVec3::ONE).unwrap();
        assert!(kernel.is_manifold(&cube));
        assert_eq!(kernel.probe_thickness(&cube, DVec3::new(1.0, 0.5, 0.5), DVec3::X), None);
    }

    #[test]
    fn test_thickness_uses_weld_distance() {
        let mut outer = create_box(DVec3::ZERO, DVec3::ONE).unwrap();
        let mut inner = create_box(DVec3::splat(5e-6), DVec3::splat(1.0 - 5e-6)).unwrap();
        inner.flip();
        outer.merge(&inner);
        let fine = BspKernel::new(KernelTolerance {
            plane_epsilon: 1e-7,
            weld_epsilon: 1e-7,
        });
        let wall = fine.probe_thickness(&outer, DVec3::new(1.0, 0.4, 0.6), DVec3::X).unwrap();
        assert!((wall - 5e-6).abs() < 1e-12);
        // The default 1e-5 weld steps past such a wall into the cavity
        let coarse = BspKernel::default().probe_thickness(&outer, DVec3::new(1.0, 0.4, 0.6), DVec3::X);
        assert!(coarse.is_some_and(|t| t > 0.5));
    }
}
