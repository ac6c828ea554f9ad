//! # Plane for BSP Operations
//!
//! Plane representation with point classification and polygon splitting.

use glam::DVec3;

use super::polygon::Polygon;

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Classification of a point or polygon relative to a plane.
///
/// Values are bit flags so a polygon's type is the OR of its vertices' types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Classification {
    /// On the plane (within epsilon).
    Coplanar = 0,
    /// In front of the plane (positive side).
    Front = 1,
    /// Behind the plane (negative side).
    Back = 2,
    /// Vertices on both sides.
    Spanning = 3,
}

impl Classification {
    fn from_bits(bits: u8) -> Self {
        match bits {
            0 => Self::Coplanar,
            1 => Self::Front,
            2 => Self::Back,
            _ => Self::Spanning,
        }
    }
}

/// Output buckets for [`Plane::split_polygon`].
#[derive(Debug, Default)]
pub struct Partition {
    pub coplanar_front: Vec<Polygon>,
    pub coplanar_back: Vec<Polygon>,
    pub front: Vec<Polygon>,
    pub back: Vec<Polygon>,
}

// =============================================================================
// PLANE
// =============================================================================

/// A plane `normal · p = w` with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: DVec3,
    pub w: f64,
}

impl Plane {
    /// Plane through a point with the given (not necessarily unit) normal.
    pub fn from_point_normal(point: DVec3, normal: DVec3) -> Option<Self> {
        let normal = normal.try_normalize()?;
        Some(Self {
            normal,
            w: normal.dot(point),
        })
    }

    /// Plane of a polygon using Newell's method.
    ///
    /// Returns `None` for polygons with (near) zero area.
    pub fn from_polygon(vertices: &[DVec3]) -> Option<Self> {
        let n = vertices.len();
        if n < 3 {
            return None;
        }
        let mut normal = DVec3::ZERO;
        let mut centroid = DVec3::ZERO;
        for i in 0..n {
            let current = vertices[i];
            let next = vertices[(i + 1) % n];
            normal.x += (current.y - next.y) * (current.z + next.z);
            normal.y += (current.z - next.z) * (current.x + next.x);
            normal.z += (current.x - next.x) * (current.y + next.y);
            centroid += current;
        }
        if normal.length_squared() < f64::EPSILON * f64::EPSILON {
            return None;
        }
        Self::from_point_normal(centroid / n as f64, normal)
    }

    /// Signed distance from the plane (positive in front).
    #[inline]
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) - self.w
    }

    /// Reverses the plane orientation.
    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    /// Classifies a point against the plane with an "on plane" band of
    /// half-width `epsilon`.
    #[inline]
    pub fn classify_point(&self, point: DVec3, epsilon: f64) -> Classification {
        let t = self.signed_distance(point);
        if t < -epsilon {
            Classification::Back
        } else if t > epsilon {
            Classification::Front
        } else {
            Classification::Coplanar
        }
    }

    /// Splits `polygon` by this plane into the buckets of `out`.
    ///
    /// Coplanar polygons go to the front or back coplanar bucket depending on
    /// their orientation. Spanning polygons are cut; both halves keep the
    /// plane of the original polygon.
    pub fn split_polygon(&self, polygon: Polygon, epsilon: f64, out: &mut Partition) {
        let types: Vec<Classification> = polygon
            .vertices
            .iter()
            .map(|&v| self.classify_point(v, epsilon))
            .collect();
        let polygon_type =
            Classification::from_bits(types.iter().fold(0u8, |acc, t| acc | *t as u8));

        match polygon_type {
            Classification::Coplanar => {
                if self.normal.dot(polygon.plane.normal) > 0.0 {
                    out.coplanar_front.push(polygon);
                } else {
                    out.coplanar_back.push(polygon);
                }
            }
            Classification::Front => out.front.push(polygon),
            Classification::Back => out.back.push(polygon),
            Classification::Spanning => {
                let n = polygon.vertices.len();
                let mut front = Vec::with_capacity(n + 1);
                let mut back = Vec::with_capacity(n + 1);
                for i in 0..n {
                    let j = (i + 1) % n;
                    let (ti, tj) = (types[i], types[j]);
                    let (vi, vj) = (polygon.vertices[i], polygon.vertices[j]);
                    if ti != Classification::Back {
                        front.push(vi);
                    }
                    if ti != Classification::Front {
                        back.push(vi);
                    }
                    if (ti as u8 | tj as u8) == Classification::Spanning as u8 {
                        let t = (self.w - self.normal.dot(vi)) / self.normal.dot(vj - vi);
                        let v = vi.lerp(vj, t);
                        front.push(v);
                        back.push(v);
                    }
                }
                if front.len() >= 3 {
                    out.front.push(polygon.fragment(front));
                }
                if back.len() >= 3 {
                    out.back.push(polygon.fragment(back));
                }
            }
        }
    }
}
