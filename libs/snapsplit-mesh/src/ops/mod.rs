//! # Mesh Operations
//!
//! Booleans with post-boolean repair, validation, thickness probing, voxel
//! remesh and planar section capping.

pub mod boolean;
pub mod probe;
pub mod remesh;
pub mod repair;
pub mod section;
pub mod validate;

pub use boolean::{difference, union};
pub use probe::probe_thickness;
pub use remesh::voxel_remesh;
pub use validate::{is_manifold, validate, MeshReport};
