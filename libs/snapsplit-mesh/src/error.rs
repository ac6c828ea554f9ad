//! # Mesh Errors
//!
//! Error types for kernel operations.

use thiserror::Error;

/// Errors that can occur inside the geometry kernel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    /// Input mesh is not a closed edge-manifold surface
    #[error("Input is not manifold: {message}")]
    NonManifoldInput { message: String },

    /// Boolean or repair produced a mesh that failed validation
    #[error("{operation} produced a non-manifold result: {message}")]
    NonManifold {
        operation: &'static str,
        message: String,
    },

    /// Degenerate geometry (zero-size primitive, collapsed polygon, ...)
    #[error("Degenerate geometry: {message}")]
    DegenerateGeometry { message: String },

    /// A face references a vertex that does not exist
    #[error("Invalid topology: {message}")]
    InvalidTopology { message: String },

    /// Too many vertices
    #[error("Too many vertices: {count} (max: {max})")]
    TooManyVertices { count: usize, max: usize },

    /// Too many triangles
    #[error("Too many triangles: {count} (max: {max})")]
    TooManyTriangles { count: usize, max: usize },
}

impl MeshError {
    /// Creates a non-manifold input error.
    pub fn non_manifold_input(message: impl Into<String>) -> Self {
        Self::NonManifoldInput {
            message: message.into(),
        }
    }

    /// Creates a non-manifold result error for the named operation.
    pub fn non_manifold(operation: &'static str, message: impl Into<String>) -> Self {
        Self::NonManifold {
            operation,
            message: message.into(),
        }
    }

    /// Creates a degenerate geometry error.
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            message: message.into(),
        }
    }

    /// Creates an invalid topology error.
    pub fn invalid_topology(message: impl Into<String>) -> Self {
        Self::InvalidTopology {
            message: message.into(),
        }
    }
}

/// Result type for kernel operations.
pub type MeshResult<T> = Result<T, MeshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MeshError::non_manifold("difference", "3 boundary edges");
        assert_eq!(
            err.to_string(),
            "difference produced a non-manifold result: 3 boundary edges"
        );
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MeshError>();
    }
}
