//! # Collaborators
//!
//! Services the pipeline calls out to but does not implement: reading the
//! source mesh, writing parts, grouping parts in the host scene. In-memory
//! implementations back the tests and headless use.
//!
//! ```
//! use snapsplit::collaborators::{InMemoryMeshIo, MeshFormat, MeshIo};
//! use snapsplit_mesh::primitives::create_box;
//! use glam::DVec3;
//!
//! let cube = create_box(DVec3::ZERO, DVec3::ONE).unwrap();
//! let io = InMemoryMeshIo::with_source("cube", cube.clone());
//! let (name, mesh) = io.load_mesh().unwrap();
//! assert_eq!(name, "cube");
//!
//! io.export_mesh("cube_P1", &mesh, MeshFormat::Stl).unwrap();
//! assert_eq!(io.exported().len(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use snapsplit_mesh::Mesh;
use thiserror::Error;

use crate::part::PartId;

/// File formats a part can be exported as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeshFormat {
    Stl,
    Obj,
    ThreeMf,
}

impl MeshFormat {
    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            MeshFormat::Stl => "stl",
            MeshFormat::Obj => "obj",
            MeshFormat::ThreeMf => "3mf",
        }
    }
}

impl fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Failure reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

/// Loads the source mesh and writes finished parts.
pub trait MeshIo: Send + Sync {
    /// Returns the name and mesh of the object to split.
    fn load_mesh(&self) -> Result<(String, Mesh), CollaboratorError>;

    /// Writes one part.
    fn export_mesh(&self, name: &str, mesh: &Mesh, format: MeshFormat) -> Result<(), CollaboratorError>;
}

/// Groups split parts in the host scene.
pub trait GroupingService: Send + Sync {
    /// Registers parts under a named collection.
    fn register_parts(&self, collection: &str, parts: &[PartId]) -> Result<(), CollaboratorError>;
}

impl<T: MeshIo + ?Sized> MeshIo for Arc<T> {
    fn load_mesh(&self) -> Result<(String, Mesh), CollaboratorError> {
        (**self).load_mesh()
    }

    fn export_mesh(&self, name: &str, mesh: &Mesh, format: MeshFormat) -> Result<(), CollaboratorError> {
        (**self).export_mesh(name, mesh, format)
    }
}

impl<T: GroupingService + ?Sized> GroupingService for Arc<T> {
    fn register_parts(&self, collection: &str, parts: &[PartId]) -> Result<(), CollaboratorError> {
        (**self).register_parts(collection, parts)
    }
}

/// A file exported through [`InMemoryMeshIo`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedMesh {
    pub name: String,
    pub format: MeshFormat,
    pub mesh: Mesh,
}

/// Mesh I/O backed by memory.
#[derive(Debug, Default)]
pub struct InMemoryMeshIo {
    source: Option<(String, Mesh)>,
    exported: Mutex<Vec<ExportedMesh>>,
}

impl InMemoryMeshIo {
    /// I/O whose `load_mesh` returns `mesh` under `name`.
    pub fn with_source(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            source: Some((name.into(), mesh)),
            exported: Mutex::default(),
        }
    }

    /// Everything exported so far, in call order.
    pub fn exported(&self) -> Vec<ExportedMesh> {
        self.exported
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MeshIo for InMemoryMeshIo {
    fn load_mesh(&self) -> Result<(String, Mesh), CollaboratorError> {
        self.source
            .clone()
            .ok_or_else(|| CollaboratorError("no mesh selected".to_string()))
    }

    fn export_mesh(&self, name: &str, mesh: &Mesh, format: MeshFormat) -> Result<(), CollaboratorError> {
        if mesh.is_empty() {
            return Err(CollaboratorError(format!("{name} has no faces")));
        }
        self.exported
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ExportedMesh {
                name: name.to_string(),
                format,
                mesh: mesh.clone(),
            });
        Ok(())
    }
}

/// Grouping service that records collections in memory.
#[derive(Debug, Default)]
pub struct InMemoryGrouping {
    collections: Mutex<BTreeMap<String, Vec<PartId>>>,
}

impl InMemoryGrouping {
    /// Parts registered under `collection`, in registration order.
    pub fn members(&self, collection: &str) -> Vec<PartId> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

impl GroupingService for InMemoryGrouping {
    fn register_parts(&self, collection: &str, parts: &[PartId]) -> Result<(), CollaboratorError> {
        let mut collections = self
            .collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let members = collections.entry(collection.to_string()).or_default();
        for id in parts {
            if !members.contains(id) {
                members.push(*id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use snapsplit_mesh::primitives::create_box;

    #[test]
    fn test_load_without_source_fails() {
        let io = InMemoryMeshIo::default();
        assert!(io.load_mesh().is_err());
    }

    #[test]
    fn test_export_rejects_empty_mesh() {
        let io = InMemoryMeshIo::default();
        let err = io.export_mesh("empty", &Mesh::new(), MeshFormat::Obj).unwrap_err();
        assert_eq!(err.to_string(), "empty has no faces");
        assert!(io.exported().is_empty());
    }

    #[test]
    fn test_export_records_format() {
        let io = InMemoryMeshIo::default();
        let cube = create_box(DVec3::ZERO, DVec3::ONE).unwrap();
        io.export_mesh("a", &cube, MeshFormat::ThreeMf).unwrap();
        let exported = io.exported();
        assert_eq!(exported[0].name, "a");
        assert_eq!(exported[0].format.extension(), "3mf");
    }

    #[test]
    fn test_grouping_ignores_duplicates() {
        let grouping = InMemoryGrouping::default();
        grouping.register_parts("parts", &[PartId(1), PartId(2)]).unwrap();
        grouping.register_parts("parts", &[PartId(2), PartId(3)]).unwrap();
        assert_eq!(grouping.members("parts"), vec![PartId(1), PartId(2), PartId(3)]);
        assert!(grouping.members("other").is_empty());
    }
}
