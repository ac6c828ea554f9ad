//! # Connector Solids
//!
//! Pins, sockets, snap rings and grooves as lofts in connector-local
//! coordinates: the seam plane is `z = 0` and `+z` points into the female
//! part. The pin spans `[-(1 - d)·L, d·L]`; the socket is the pin section
//! grown by the tolerance and reaches `clearance` past the pin tip.

use glam::DVec2;
use snapsplit_mesh::primitives::{circle_outline, create_loft, rect_outline, Station};
use snapsplit_mesh::{Mesh, MeshResult};

use crate::connector::{ConnectorSpec, CrossSection};
use crate::placement::ConnectorInstance;

/// The world-space solids of one connector instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorSolids {
    /// Fused into the male part.
    pub pin: Mesh,
    /// Retention ring of snap variants, fused after the pin.
    pub ring: Option<Mesh>,
    /// Cut from the female part.
    pub socket: Mesh,
    /// Groove matching the ring, cut after the socket.
    pub groove: Option<Mesh>,
}

impl ConnectorSolids {
    /// Builds the solids of an instance and moves them onto the seam.
    pub fn for_instance(instance: &ConnectorInstance) -> MeshResult<Self> {
        let spec = &instance.spec;
        let matrix = instance.frame.to_matrix(instance.position);
        let place = |mut mesh: Mesh| {
            mesh.transform(&matrix);
            mesh
        };
        Ok(Self {
            pin: place(pin_solid(spec)?),
            ring: ring_solid(spec)?.map(place),
            socket: place(socket_solid(spec)?),
            groove: groove_solid(spec)?.map(place),
        })
    }
}

/// Cross-section outline grown by `grow` on every side.
fn outline(section: &CrossSection, grow: f64, segments: u32) -> Vec<DVec2> {
    match *section {
        CrossSection::Round { diameter } => circle_outline(diameter * 0.5 + grow, segments),
        CrossSection::Rect { width, height } => rect_outline(width * 0.5 + grow, height * 0.5 + grow),
    }
}

/// Local z of the pin base.
fn base_z(spec: &ConnectorSpec) -> f64 {
    -spec.embedded_length()
}

/// Axial band `[lo, hi]` of the snap ring, half a band width below the
/// chamfer.
fn ring_band(spec: &ConnectorSpec) -> (f64, f64) {
    let hi = spec.inserted_length() - spec.chamfer - 0.5 * spec.snap_ring.width;
    (hi - spec.snap_ring.width, hi)
}

/// The nominal pin, with a chamfered tip when `spec.chamfer > 0`.
pub fn pin_solid(spec: &ConnectorSpec) -> MeshResult<Mesh> {
    let tip = spec.inserted_length();
    let body = outline(&spec.section, 0.0, spec.segments);
    let mut stations = vec![Station::new(base_z(spec), body.clone())];
    if spec.chamfer > 0.0 {
        stations.push(Station::new(tip - spec.chamfer, body));
        stations.push(Station::new(tip, outline(&spec.section, -spec.chamfer, spec.segments)));
    } else {
        stations.push(Station::new(tip, body));
    }
    create_loft(&stations)
}

/// The socket: the pin section grown by the tolerance, from below the seam
/// plane to `clearance` past the tip.
pub fn socket_solid(spec: &ConnectorSpec) -> MeshResult<Mesh> {
    let grown = outline(&spec.section, spec.tolerance, spec.segments);
    let bottom = base_z(spec).min(-spec.clearance);
    let top = spec.inserted_length() + spec.clearance;
    create_loft(&[Station::new(bottom, grown.clone()), Station::new(top, grown)])
}

/// Raised band around the pin for snap variants.
pub fn ring_solid(spec: &ConnectorSpec) -> MeshResult<Option<Mesh>> {
    if !spec.kind.is_snap() {
        return Ok(None);
    }
    let (lo, hi) = ring_band(spec);
    let band = outline(&spec.section, spec.snap_ring.height, spec.segments);
    create_loft(&[Station::new(lo, band.clone()), Station::new(hi, band)]).map(Some)
}

/// Groove in the socket wall receiving the ring, grown by the tolerance.
pub fn groove_solid(spec: &ConnectorSpec) -> MeshResult<Option<Mesh>> {
    if !spec.kind.is_snap() {
        return Ok(None);
    }
    let (lo, hi) = ring_band(spec);
    let grow = spec.snap_ring.height + spec.tolerance;
    let band = outline(&spec.section, grow, spec.segments);
    create_loft(&[
        Station::new(lo - spec.tolerance, band.clone()),
        Station::new(hi + spec.tolerance, band),
    ])
    .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::ConnectorKind;
    use crate::tolerance::ResolvedTolerance;
    use approx::assert_relative_eq;
    use config::pipeline::PipelineConfig;
    use snapsplit_mesh::ops::validate::is_manifold;

    fn spec(kind: ConnectorKind) -> ConnectorSpec {
        ConnectorSpec::defaults(kind, &ResolvedTolerance::exact(0.2), &PipelineConfig::default())
    }

    fn max_radius(mesh: &Mesh) -> f64 {
        mesh.vertices()
            .iter()
            .map(|v| v.truncate().length())
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_pin_spans_embed_and_insert() {
        let pin = pin_solid(&spec(ConnectorKind::CylindricalPin)).unwrap();
        assert!(is_manifold(&pin));
        let (min, max) = pin.bounding_box();
        assert_relative_eq!(min.z, -4.0);
        assert_relative_eq!(max.z, 4.0);
    }

    #[test]
    fn test_socket_radius_grows_by_tolerance() {
        let s = spec(ConnectorKind::CylindricalPin);
        let pin = pin_solid(&s).unwrap();
        let socket = socket_solid(&s).unwrap();
        assert_relative_eq!(max_radius(&socket) - max_radius(&pin), 0.2, epsilon = 1e-12);
        let (_, top) = socket.bounding_box();
        assert_relative_eq!(top.z, 4.2, epsilon = 1e-12);
    }

    #[test]
    fn test_tenon_socket_is_wider() {
        let s = spec(ConnectorKind::RectangularTenon);
        let (pin_min, pin_max) = pin_solid(&s).unwrap().bounding_box();
        let (socket_min, socket_max) = socket_solid(&s).unwrap().bounding_box();
        assert_relative_eq!(pin_max.x - pin_min.x, 6.0);
        assert_relative_eq!(socket_max.x - socket_min.x, 6.4, epsilon = 1e-12);
        assert_relative_eq!(socket_max.y - socket_min.y, 6.4, epsilon = 1e-12);
    }

    #[test]
    fn test_chamfer_narrows_tip() {
        let pin = pin_solid(&spec(ConnectorKind::RectangularTenon)).unwrap();
        let top: Vec<_> = pin.vertices().iter().filter(|v| (v.z - 4.0).abs() < 1e-12).collect();
        assert_eq!(top.len(), 4);
        assert!(top.iter().all(|v| (v.x.abs() - 2.7).abs() < 1e-12));
    }

    #[test]
    fn test_plain_pin_has_no_ring() {
        let s = spec(ConnectorKind::CylindricalPin);
        assert!(ring_solid(&s).unwrap().is_none());
        assert!(groove_solid(&s).unwrap().is_none());
    }

    #[test]
    fn test_snap_ring_and_groove_nest() {
        let s = spec(ConnectorKind::SnapPin);
        let ring = ring_solid(&s).unwrap().unwrap();
        let groove = groove_solid(&s).unwrap().unwrap();
        assert!(is_manifold(&ring) && is_manifold(&groove));
        let (ring_min, ring_max) = ring.bounding_box();
        let (groove_min, groove_max) = groove.bounding_box();
        assert!(groove_min.z < ring_min.z && groove_max.z > ring_max.z);
        assert_relative_eq!(max_radius(&groove) - max_radius(&ring), 0.2, epsilon = 1e-12);
        // Ring sits below the chamfer
        assert!(ring_max.z < s.inserted_length() - s.chamfer);
    }
}
