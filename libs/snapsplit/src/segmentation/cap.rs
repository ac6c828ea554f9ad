//! # Seam Capping
//!
//! Cut faces are always rebuilt from the section loops: the faces the
//! boolean left on the plane are stripped and the loops are filled again
//! under the even-odd rule. Whether the body is hollow at the seam is
//! decided by a thickness probe next to the section.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use snapsplit_mesh::ops::section::{cap_loops, loops_on_plane, plane_axes, signed_area, strip_plane};
use snapsplit_mesh::{GeometryKernel, Mesh, MeshError, MeshResult};
use tracing::debug;

use crate::part::{Border, CapKind, PartId};

/// How one seam of one part was closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapReport {
    pub part: PartId,
    pub plane: usize,
    pub kind: CapKind,
}

/// Removes the faces on the border plane, leaving the seam open.
pub(crate) fn open_plane(mesh: &Mesh, border: &Border, epsilon: f64) -> Mesh {
    strip_plane(mesh, border.plane.point(), border.outward(), epsilon)
}

/// Rebuilds the cut face on a border plane.
///
/// Works on both closed meshes (the existing cut face is replaced) and on
/// meshes whose seam was left open.
pub(crate) fn cap_plane(
    kernel: &dyn GeometryKernel,
    mesh: &Mesh,
    border: &Border,
    epsilon: f64,
) -> MeshResult<(Mesh, CapKind)> {
    let point = border.plane.point();
    let outward = border.outward();
    let stripped = strip_plane(mesh, point, outward, epsilon);
    let loops = loops_on_plane(&stripped, point, outward, epsilon);
    if loops.is_empty() {
        return Err(MeshError::degenerate(format!(
            "no section loops on split plane {}",
            border.plane.index
        )));
    }

    let kind = match probe_section(kernel, &stripped, &loops, outward) {
        Some(thickness) => CapKind::Wall { thickness },
        None => CapKind::Solid,
    };
    let capped = cap_loops(&stripped, &loops, outward)?;
    debug!(
        plane = border.plane.index,
        loops = loops.len(),
        ?kind,
        "rebuilt seam cap"
    );
    Ok((capped, kind))
}

/// Probes the wall next to the longest edge of the outermost loop.
///
/// The probe starts on the side face owning that edge and runs inward
/// parallel to the section. The stripped mesh is open, so only the side
/// walls are hit.
fn probe_section(
    kernel: &dyn GeometryKernel,
    stripped: &Mesh,
    loops: &[Vec<u32>],
    outward: DVec3,
) -> Option<f64> {
    let (u, v) = plane_axes(outward);
    let outer = loops.iter().max_by(|a, b| {
        loop_area(stripped, a, u, v).total_cmp(&loop_area(stripped, b, u, v))
    })?;

    let n = outer.len();
    let (a, b) = (0..n)
        .map(|i| (outer[i], outer[(i + 1) % n]))
        .max_by(|(a0, a1), (b0, b1)| {
            let la = stripped.vertex(*a0).distance(stripped.vertex(*a1));
            let lb = stripped.vertex(*b0).distance(stripped.vertex(*b1));
            la.total_cmp(&lb)
        })?;

    let face = stripped.triangles().iter().position(|tri| {
        (0..3).any(|k| tri[k] == a && tri[(k + 1) % 3] == b)
    })?;
    let [p0, p1, p2] = stripped.triangle_positions(face);
    let centroid = (p0 + p1 + p2) / 3.0;
    kernel.probe_thickness(stripped, centroid, stripped.face_normal(face))
}

fn loop_area(mesh: &Mesh, ring: &[u32], u: DVec3, v: DVec3) -> f64 {
    let points: Vec<_> = ring
        .iter()
        .map(|&i| {
            let p = mesh.vertex(i);
            DVec2::new(p.dot(u), p.dot(v))
        })
        .collect();
    signed_area(&points).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::{Side, SplitPlane};
    use approx::assert_relative_eq;
    use snapsplit_mesh::primitives::create_box;
    use snapsplit_mesh::BspKernel;

    fn border_at(offset: f64) -> Border {
        Border {
            plane: SplitPlane::new(DVec3::X, offset, 0),
            side: Side::Negative,
            cap: None,
        }
    }

    #[test]
    fn test_solid_section() {
        let kernel = BspKernel::default();
        let cube = create_box(DVec3::ZERO, DVec3::splat(10.0)).unwrap();
        let (capped, kind) = cap_plane(&kernel, &cube, &border_at(10.0), 1e-5).unwrap();
        assert_eq!(kind, CapKind::Solid);
        assert!(kernel.is_manifold(&capped));
        assert_relative_eq!(capped.signed_volume(), 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_hollow_section_is_wall() {
        let kernel = BspKernel::default();
        let outer = create_box(DVec3::ZERO, DVec3::splat(20.0)).unwrap();
        let cavity = create_box(DVec3::new(-5.0, 2.0, 2.0), DVec3::new(18.0, 18.0, 18.0)).unwrap();
        let tube = kernel.difference(&outer, &cavity).unwrap();

        let border = Border {
            side: Side::Positive,
            ..border_at(0.0)
        };
        let (capped, kind) = cap_plane(&kernel, &tube, &border, 1e-5).unwrap();
        match kind {
            CapKind::Wall { thickness } => assert_relative_eq!(thickness, 2.0, epsilon = 1e-6),
            CapKind::Solid => panic!("expected a wall cap"),
        }
        assert!(kernel.is_manifold(&capped));
        assert_relative_eq!(capped.signed_volume(), tube.signed_volume(), epsilon = 1e-6);
    }

    #[test]
    fn test_open_then_cap_restores_volume() {
        let kernel = BspKernel::default();
        let cube = create_box(DVec3::ZERO, DVec3::splat(10.0)).unwrap();
        let border = border_at(10.0);
        let open = open_plane(&cube, &border, 1e-5);
        assert!(!kernel.is_manifold(&open));
        let (capped, _) = cap_plane(&kernel, &open, &border, 1e-5).unwrap();
        assert_relative_eq!(capped.signed_volume(), 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_section_is_error() {
        let kernel = BspKernel::default();
        let cube = create_box(DVec3::ZERO, DVec3::splat(10.0)).unwrap();
        assert!(cap_plane(&kernel, &cube, &border_at(5.0), 1e-5).is_err());
    }
}
