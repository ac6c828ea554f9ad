//! # SnapSplit
//!
//! Splits a watertight mesh into printable parts along planes and joins the
//! parts with snap-fit connectors whose sockets are sized from material
//! tolerance profiles.
//!
//! ## Architecture
//!
//! ```text
//! Orchestrator
//!   → segmentation (planar / grid split, capping)
//!   → seam (shared cut faces)
//!   → placement (line / grid / manual plans)
//!   → synthesis (pin union, socket difference)
//!         ↓
//!   snapsplit-mesh (GeometryKernel)
//! ```
//!
//! Every operation validates its input before the first boolean and leaves
//! the parts untouched when it fails or is cancelled.
//!
//! ## Usage
//!
//! ```rust
//! use glam::DVec3;
//! use snapsplit::orchestrator::{ConnectRequest, PlacementMode};
//! use snapsplit::segmentation::SplitRequest;
//! use snapsplit::{CancelToken, ConnectorKind, Orchestrator};
//! use snapsplit_mesh::primitives::create_box;
//!
//! let mut orchestrator = Orchestrator::default();
//! orchestrator.set_source("box", create_box(DVec3::ZERO, DVec3::new(100.0, 50.0, 50.0)).unwrap());
//!
//! let cancel = CancelToken::new();
//! let split = orchestrator
//!     .split(&SplitRequest::new(DVec3::X, 2).with_offsets(vec![50.0]), &cancel)
//!     .unwrap();
//! let ids: Vec<_> = split.parts.iter().map(|p| p.id()).collect();
//!
//! let request = ConnectRequest::new(ConnectorKind::CylindricalPin, PlacementMode::Line { spacing: 20.0 })
//!     .with_material("PLA")
//!     .with_margin(10.0);
//! let results = orchestrator.connect(&ids, &request, &cancel).unwrap();
//! assert!(results[0].is_complete());
//! ```

pub mod cancel;
pub mod collaborators;
pub mod connector;
pub mod error;
pub mod orchestrator;
pub mod part;
pub mod placement;
pub mod seam;
pub mod segmentation;
pub mod synthesis;
pub mod tolerance;

pub use cancel::CancelToken;
pub use connector::{ConnectorKind, ConnectorSpec, CrossSection};
pub use error::{
    GeometryError, InputError, SelectionError, SnapSplitError, SnapSplitResult, ToleranceError,
};
pub use orchestrator::{ConnectRequest, FaceSelector, Orchestrator, PlacementMode};
pub use part::{Part, PartId};
pub use seam::{locate_seam, SeamRegion};
pub use segmentation::{SplitRequest, SplitResult};
pub use synthesis::ConnectResult;
pub use tolerance::{resolve, ResolvedTolerance, ToleranceProfile};
