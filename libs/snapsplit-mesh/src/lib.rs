//! # SnapSplit Mesh
//!
//! Geometry kernel for planar segmentation and connector synthesis.
//!
//! ## Architecture
//!
//! ```text
//! snapsplit (pipeline) → GeometryKernel → ops::boolean → ops::repair → ops::validate
//! ```
//!
//! ## Algorithms
//!
//! - **Boolean Operations**: BSP trees (csg.js algorithm)
//! - **Repair**: spatial-hash vertex welding, T-junction splitting, sliver removal
//! - **Validation**: directed-edge pairing and signed volume
//! - **Thickness**: Möller–Trumbore ray casting
//! - **Caps**: ear clipping with hole bridging
//!
//! ## Usage
//!
//! ```rust
//! use snapsplit_mesh::{BspKernel, GeometryKernel};
//! use snapsplit_mesh::primitives::create_box;
//! use glam::DVec3;
//!
//! let kernel = BspKernel::default();
//! let block = create_box(DVec3::ZERO, DVec3::new(100.0, 50.0, 50.0)).unwrap();
//! let cutter = create_box(DVec3::new(50.0, -50.0, -50.0), DVec3::splat(200.0)).unwrap();
//! let slab = kernel.difference(&block, &cutter).unwrap();
//! assert!((slab.signed_volume() - 125_000.0).abs() < 1e-6);
//! ```

pub mod error;
pub mod kernel;
pub mod mesh;
pub mod ops;
pub mod primitives;

pub use error::{MeshError, MeshResult};
pub use kernel::{BspKernel, GeometryKernel, KernelTolerance};
pub use mesh::Mesh;
