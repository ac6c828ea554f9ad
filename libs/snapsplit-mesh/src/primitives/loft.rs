//! # Loft Primitive
//!
//! Closed solids built from a stack of convex outlines at increasing heights
//! along Z. Pins, tenons, sockets and snap rings are all lofts: a straight
//! prism is two stations, a chamfered tip adds a third, smaller one.

use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;
use glam::{DVec2, DVec3};
use std::f64::consts::PI;

/// One cross-section of a loft.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// Height along Z
    pub z: f64,
    /// Convex outline, counter-clockwise seen from +Z
    pub outline: Vec<DVec2>,
}

impl Station {
    /// Creates a station.
    pub fn new(z: f64, outline: Vec<DVec2>) -> Self {
        Self { z, outline }
    }
}

/// Regular polygon approximating a circle, starting on +X.
///
/// # Example
///
/// ```rust
/// use snapsplit_mesh::primitives::circle_outline;
///
/// let ring = circle_outline(2.5, 32);
/// assert_eq!(ring.len(), 32);
/// assert!((ring[0].x - 2.5).abs() < 1e-12);
/// ```
pub fn circle_outline(radius: f64, segments: u32) -> Vec<DVec2> {
    (0..segments)
        .map(|j| {
            let theta = 2.0 * PI * j as f64 / segments as f64;
            DVec2::new(radius * theta.cos(), radius * theta.sin())
        })
        .collect()
}

/// Rectangle centred on the origin with the given half extents.
pub fn rect_outline(half_x: f64, half_y: f64) -> Vec<DVec2> {
    vec![
        DVec2::new(-half_x, -half_y),
        DVec2::new(half_x, -half_y),
        DVec2::new(half_x, half_y),
        DVec2::new(-half_x, half_y),
    ]
}

/// Builds a closed, outward-facing mesh through the given stations.
///
/// # Errors
///
/// Fails for fewer than two stations, non-increasing heights, outlines with
/// fewer than three points, mismatched outline sizes, or outlines that are
/// not counter-clockwise.
pub fn create_loft(stations: &[Station]) -> MeshResult<Mesh> {
    if stations.len() < 2 {
        return Err(MeshError::degenerate("Loft needs at least two stations"));
    }
    let ring = stations[0].outline.len();
    if ring < 3 {
        return Err(MeshError::degenerate(format!(
            "Loft outline needs at least 3 points: {ring}"
        )));
    }
    for pair in stations.windows(2) {
        if !(pair[1].z > pair[0].z) {
            return Err(MeshError::degenerate(format!(
                "Loft stations must strictly increase in z: {} then {}",
                pair[0].z, pair[1].z
            )));
        }
    }
    for station in stations {
        if station.outline.len() != ring {
            return Err(MeshError::degenerate("Loft outlines differ in size"));
        }
        if signed_area(&station.outline) <= 0.0 {
            return Err(MeshError::degenerate(format!(
                "Loft outline at z={} is empty or clockwise",
                station.z
            )));
        }
    }

    let mut mesh = Mesh::with_capacity(ring * stations.len(), 2 * ring * stations.len());
    let rings: Vec<Vec<u32>> = stations
        .iter()
        .map(|station| {
            station
                .outline
                .iter()
                .map(|p| mesh.add_vertex(DVec3::new(p.x, p.y, station.z)))
                .collect()
        })
        .collect();

    for pair in rings.windows(2) {
        let (lower, upper) = (&pair[0], &pair[1]);
        for j in 0..ring {
            let next = (j + 1) % ring;
            mesh.add_triangle(lower[j], lower[next], upper[next]);
            mesh.add_triangle(lower[j], upper[next], upper[j]);
        }
    }

    let bottom = &rings[0];
    for j in 1..ring - 1 {
        mesh.add_triangle(bottom[0], bottom[j + 1], bottom[j]);
    }
    if let Some(top) = rings.last() {
        for j in 1..ring - 1 {
            mesh.add_triangle(top[0], top[j], top[j + 1]);
        }
    }

    Ok(mesh)
}

fn signed_area(outline: &[DVec2]) -> f64 {
    let n = outline.len();
    (0..n)
        .map(|i| outline[i].perp_dot(outline[(i + 1) % n]))
        .sum::<f64>()
        * 0.5
}
