//! # Pipeline Errors
//!
//! One error enum per category. Input, selection and tolerance errors are
//! raised before any boolean runs and never leave a part modified.

use snapsplit_mesh::MeshError;
use thiserror::Error;

use crate::part::PartId;

/// Result alias for pipeline operations.
pub type SnapSplitResult<T> = Result<T, SnapSplitError>;

/// Top-level error returned by every public pipeline operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapSplitError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Tolerance(#[from] ToleranceError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Cancelled through a `CancelToken`; nothing was changed
    #[error("Operation cancelled")]
    Cancelled,

    /// A collaborator (mesh I/O, grouping) failed
    #[error("{service} failed: {message}")]
    Collaborator {
        service: &'static str,
        message: String,
    },
}

/// Invalid arguments or input geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("Input mesh is not manifold: {0}")]
    NonManifoldInput(String),

    #[error("Split axis must be a unit vector, got [{x}, {y}, {z}]")]
    DegenerateAxis { x: f64, y: f64, z: f64 },

    #[error("Part count {count} is outside {min}..={max}")]
    InvalidCount { count: usize, min: usize, max: usize },

    #[error("Invalid split offsets: {0}")]
    InvalidOffsets(String),

    #[error("Slab {index} between {lo} and {hi} contains no geometry")]
    DegenerateSlab { index: usize, lo: f64, hi: f64 },

    #[error("Grid of {rows}x{columns} is out of range")]
    InvalidGrid { rows: usize, columns: usize },

    #[error("Margin {0}% is outside [0, 50)")]
    InvalidMargin(f64),

    #[error("Connector spacing {spacing:.4} is below the minimum {minimum:.4}")]
    SpacingTooTight { spacing: f64, minimum: f64 },

    #[error("Invalid connector: {0}")]
    InvalidConnector(String),

    #[error("{0} has open seams; cap it before connecting")]
    OpenSeams(PartId),

    #[error("No source mesh loaded")]
    NoSource,
}

/// Problems with the set of parts or points chosen by the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error("At least two parts must be selected, got {0}")]
    TooFewParts(usize),

    #[error("Unknown part {0}")]
    UnknownPart(PartId),

    #[error("{a} and {b} do not share a seam")]
    NotAdjacent { a: PartId, b: PartId },

    #[error("None of the selected parts share a seam")]
    NoSeams,

    #[error("{part} has no cut face from split plane {plane}")]
    UnknownFace { part: PartId, plane: usize },

    #[error("All {0} manual points lie outside the seam")]
    NoPointsInSeam(usize),

    #[error("None of the {0} connector positions leaves the connector on the seam")]
    NoFittingPositions(usize),

    #[error("{0} appears twice in one job")]
    Overlapping(PartId),
}

/// Tolerance lookup and override failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToleranceError {
    #[error("Tolerance override must not be negative: {0}")]
    NegativeOverride(f64),

    #[error("Unknown material profile: {0}")]
    UnknownMaterial(String),

    #[error("Invalid profile for {material}: {message}")]
    InvalidProfile { material: String, message: String },
}

/// Boolean results that could not be made manifold.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("Slab {slab} failed after {attempts} remediation attempts: {source}")]
    Split {
        slab: usize,
        attempts: u32,
        #[source]
        source: MeshError,
    },

    #[error("Capping split plane {plane} failed: {source}")]
    Cap {
        plane: usize,
        #[source]
        source: MeshError,
    },

    #[error("Connector {index} failed: {source}")]
    Instance {
        index: usize,
        #[source]
        source: MeshError,
    },

    #[error("{part} is not manifold after {stage}: {message}")]
    Validation {
        part: PartId,
        stage: &'static str,
        message: String,
    },

    #[error(transparent)]
    Kernel(#[from] MeshError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_passes_through_category() {
        let err: SnapSplitError = InputError::InvalidMargin(60.0).into();
        assert_eq!(err.to_string(), "Margin 60% is outside [0, 50)");
    }

    #[test]
    fn test_geometry_error_keeps_source() {
        use std::error::Error as _;
        let err = GeometryError::Instance {
            index: 2,
            source: MeshError::non_manifold("union", "3 boundary edges"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("Connector 2 failed"));
    }

    #[test]
    fn test_errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SnapSplitError>();
    }
}
