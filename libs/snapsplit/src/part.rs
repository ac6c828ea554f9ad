//! # Parts
//!
//! A part is a mesh produced by a split, together with the split planes it
//! borders. Faces lying on one of those planes carry the plane's index as a
//! tag; tags are recomputed every time the mesh is replaced.

use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use snapsplit_mesh::Mesh;

/// Stable identifier of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(pub u64);

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "part#{}", self.0)
    }
}

/// Hands out part identifiers in increasing order.
#[derive(Debug, Clone, Default)]
pub struct PartIds {
    next: u64,
}

impl PartIds {
    /// Returns a fresh identifier.
    pub fn allocate(&mut self) -> PartId {
        let id = PartId(self.next);
        self.next += 1;
        id
    }
}

/// A cutting plane `axis · p = offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitPlane {
    /// Unit normal.
    pub axis: DVec3,
    /// Signed distance of the plane from the origin along `axis`.
    pub offset: f64,
    /// Index of the plane, unique among the planes a part borders.
    pub index: usize,
}

impl SplitPlane {
    pub fn new(axis: DVec3, offset: f64, index: usize) -> Self {
        Self {
            axis,
            offset,
            index,
        }
    }

    /// The point of the plane closest to the origin.
    pub fn point(&self) -> DVec3 {
        self.axis * self.offset
    }

    /// Signed distance of `p` from the plane.
    pub fn signed_distance(&self, p: DVec3) -> f64 {
        self.axis.dot(p) - self.offset
    }

    /// Same index and geometrically the same plane.
    pub fn coincides(&self, other: &SplitPlane, epsilon: f64) -> bool {
        self.index == other.index
            && self.axis.abs_diff_eq(other.axis, epsilon)
            && (self.offset - other.offset).abs() <= epsilon
    }
}

/// Which side of a split plane a part lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Below the plane (smaller offsets).
    Negative,
    /// Above the plane.
    Positive,
}

impl Side {
    /// Outward normal of a part's cut face on this side of a plane.
    pub fn outward(self, axis: DVec3) -> DVec3 {
        match self {
            Side::Negative => axis,
            Side::Positive => -axis,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Negative => Side::Positive,
            Side::Positive => Side::Negative,
        }
    }
}

/// How the cut face on a split plane was closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CapKind {
    /// The whole cross-section was filled.
    Solid,
    /// A hollow body: only the wall ring was filled.
    Wall { thickness: f64 },
}

/// A split plane bordered by a part.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Border {
    pub plane: SplitPlane,
    pub side: Side,
    /// `None` while the cut is left open.
    pub cap: Option<CapKind>,
}

impl Border {
    pub fn outward(&self) -> DVec3 {
        self.side.outward(self.plane.axis)
    }

    pub fn is_open(&self) -> bool {
        self.cap.is_none()
    }
}

/// A mesh with identity and seam bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    id: PartId,
    name: String,
    mesh: Mesh,
    borders: Vec<Border>,
    face_tags: Vec<Option<usize>>,
    tag_epsilon: f64,
    /// The closed cut result of a part whose seams were left open.
    sealed: Option<Mesh>,
}

impl Part {
    /// Creates a part and tags its faces.
    pub fn new(
        id: PartId,
        name: impl Into<String>,
        mesh: Mesh,
        borders: Vec<Border>,
        tag_epsilon: f64,
    ) -> Self {
        let face_tags = compute_tags(&mesh, &borders, tag_epsilon);
        Self {
            id,
            name: name.into(),
            mesh,
            borders,
            face_tags,
            tag_epsilon,
            sealed: None,
        }
    }

    /// Remembers the closed solid an open part was cut from, so its seams
    /// can be capped later.
    pub(crate) fn with_sealed(mut self, sealed: Mesh) -> Self {
        self.sealed = Some(sealed);
        self
    }

    /// The closed solid to cap from: the remembered cut for an open part,
    /// the mesh itself otherwise.
    pub(crate) fn sealed_mesh(&self) -> &Mesh {
        self.sealed.as_ref().unwrap_or(&self.mesh)
    }

    pub fn id(&self) -> PartId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn borders(&self) -> &[Border] {
        &self.borders
    }

    /// Split plane index per face, `None` for faces of the original surface.
    pub fn face_tags(&self) -> &[Option<usize>] {
        &self.face_tags
    }

    /// The border on the plane with the given index.
    pub fn border(&self, plane: usize) -> Option<&Border> {
        self.borders.iter().find(|b| b.plane.index == plane)
    }

    /// Faces tagged with a split plane index.
    pub fn tagged_faces(&self, plane: usize) -> Vec<usize> {
        self.face_tags
            .iter()
            .enumerate()
            .filter(|(_, tag)| **tag == Some(plane))
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether any cut face was left open.
    pub fn is_open(&self) -> bool {
        self.borders.iter().any(Border::is_open)
    }

    /// Largest split plane index used by this part.
    pub fn max_plane_index(&self) -> Option<usize> {
        self.borders.iter().map(|b| b.plane.index).max()
    }

    /// Replaces the mesh and recomputes the face tags.
    pub(crate) fn replace_mesh(&mut self, mesh: Mesh) {
        self.sealed = None;
        self.face_tags = compute_tags(&mesh, &self.borders, self.tag_epsilon);
        self.mesh = mesh;
    }

    /// Replaces the mesh and border list together.
    pub(crate) fn replace_with_borders(&mut self, mesh: Mesh, borders: Vec<Border>) {
        self.borders = borders;
        self.replace_mesh(mesh);
    }

    pub(crate) fn tag_epsilon(&self) -> f64 {
        self.tag_epsilon
    }
}

/// Tags every face lying on a border plane and facing out of the part.
fn compute_tags(mesh: &Mesh, borders: &[Border], epsilon: f64) -> Vec<Option<usize>> {
    (0..mesh.triangle_count())
        .map(|face| {
            let corners = mesh.triangle_positions(face);
            let normal = mesh.face_normal(face);
            borders
                .iter()
                .find(|border| {
                    corners
                        .iter()
                        .all(|&p| border.plane.signed_distance(p).abs() <= epsilon)
                        && normal.dot(border.outward()) > 0.5
                })
                .map(|border| border.plane.index)
        })
        .collect()
}
