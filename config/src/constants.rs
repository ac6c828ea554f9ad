//! # Configuration Constants
//!
//! Centralized constants for the SnapSplit pipeline. Kernel tolerances,
//! tessellation parameters, segmentation limits and connector defaults are
//! defined here.
//!
//! ## Categories
//!
//! - **Precision**: Floating-point tolerances used by the geometry kernel
//! - **Resolution**: Tessellation of round connector solids
//! - **Segmentation**: Part counts, cutter sizing and remediation
//! - **Connectors**: Default pin, tenon and snap dimensions (millimetres)
//! - **Limits**: Safety bounds

// =============================================================================
// PRECISION CONSTANTS
// =============================================================================

/// Epsilon for floating-point comparisons of scalar values.
///
/// # Example
///
/// ```rust
/// use config::constants::EPSILON;
///
/// fn approximately_equal(a: f64, b: f64) -> bool {
///     (a - b).abs() < EPSILON
/// }
///
/// assert!(approximately_equal(1.0, 1.0 + 1e-11));
/// ```
pub const EPSILON: f64 = 1e-10;

/// Thickness of the "on plane" band used when classifying points against a
/// BSP splitting plane.
///
/// Points closer than this to a plane are treated as lying on it. The value
/// is sized for meshes expressed in millimetres.
///
/// # Example
///
/// ```rust
/// use config::constants::PLANE_EPSILON;
///
/// let distance: f64 = 5e-6;
/// assert!(distance.abs() < PLANE_EPSILON);
/// ```
pub const PLANE_EPSILON: f64 = 1e-5;

/// Distance below which two vertices are welded into one after a boolean.
///
/// Must be at least [`PLANE_EPSILON`] so that points snapped onto a plane by
/// classification weld with the exact intersection points of their
/// neighbours.
///
/// # Example
///
/// ```rust
/// use config::constants::{PLANE_EPSILON, WELD_EPSILON};
///
/// assert!(WELD_EPSILON >= PLANE_EPSILON);
/// ```
pub const WELD_EPSILON: f64 = 1e-5;

/// Multiples of the weld tolerance tried, in order, when the repaired result
/// of a boolean is not manifold. Coarser welds merge the near-coincident
/// points left by cuts at shallow angles.
pub const REPAIR_WELD_SCALES: [f64; 3] = [1.0, 4.0, 16.0];

/// Twice-area below which a triangle is considered degenerate.
///
/// # Example
///
/// ```rust
/// use config::constants::AREA_EPSILON;
///
/// assert!(AREA_EPSILON < 1e-6);
/// ```
pub const AREA_EPSILON: f64 = 1e-10;

// =============================================================================
// RESOLUTION CONSTANTS
// =============================================================================

/// Default number of segments used to tessellate round pins and sockets.
///
/// # Example
///
/// ```rust
/// use config::constants::DEFAULT_SEGMENTS;
///
/// assert!(DEFAULT_SEGMENTS >= 12);
/// ```
pub const DEFAULT_SEGMENTS: u32 = 32;

/// Minimum number of segments for a round cross-section.
pub const MIN_SEGMENTS: u32 = 3;

/// Maximum number of segments for a round cross-section.
pub const MAX_SEGMENTS: u32 = 512;

// =============================================================================
// SEGMENTATION CONSTANTS
// =============================================================================

/// Smallest number of parts a planar split may produce.
pub const MIN_PARTS: usize = 2;

/// Largest number of parts a single planar split may produce.
///
/// # Example
///
/// ```rust
/// use config::constants::{MAX_PARTS, MIN_PARTS};
///
/// let requested = 4;
/// assert!((MIN_PARTS..=MAX_PARTS).contains(&requested));
/// ```
pub const MAX_PARTS: usize = 12;

/// How far a half-space cutter reaches past the mesh bounding box, as a
/// fraction of the bounding box diagonal.
///
/// The cutter's outer faces must never touch the mesh, so the margin is
/// generous.
pub const CUTTER_MARGIN_FRACTION: f64 = 0.25;

/// Maximum number of voxel-remesh remediation attempts for a failed cut.
pub const MAX_REMESH_ATTEMPTS: u32 = 2;

/// Voxel grid resolution (cells along the bounding box diagonal) for each
/// remediation attempt, coarsening as attempts progress.
///
/// # Example
///
/// ```rust
/// use config::constants::{MAX_REMESH_ATTEMPTS, REMESH_VOXEL_DIVISIONS};
///
/// assert_eq!(REMESH_VOXEL_DIVISIONS.len(), MAX_REMESH_ATTEMPTS as usize);
/// assert!(REMESH_VOXEL_DIVISIONS[0] > REMESH_VOXEL_DIVISIONS[1]);
/// ```
pub const REMESH_VOXEL_DIVISIONS: [f64; 2] = [256.0, 128.0];

/// Step applied to the normalized split position per nudge event while
/// adjusting a split axis interactively.
pub const SPLIT_NUDGE_STEP: f64 = 0.01;

/// Normalized split position change per pixel of vertical drag.
pub const SPLIT_DRAG_SENSITIVITY: f64 = 0.001;

// =============================================================================
// CONNECTOR CONSTANTS (millimetres)
// =============================================================================

/// Default diameter of a cylindrical pin.
pub const DEFAULT_PIN_DIAMETER_MM: f64 = 5.0;

/// Default length of a cylindrical pin.
pub const DEFAULT_PIN_LENGTH_MM: f64 = 8.0;

/// Default cross-section side of a rectangular tenon.
pub const DEFAULT_TENON_WIDTH_MM: f64 = 6.0;

/// Default length of a rectangular tenon.
pub const DEFAULT_TENON_LENGTH_MM: f64 = 8.0;

/// Default chamfer applied to the tip of a pin or tenon.
pub const DEFAULT_CHAMFER_MM: f64 = 0.3;

/// Default fraction of the connector length that is inserted into the
/// socket part.
///
/// # Example
///
/// ```rust
/// use config::constants::DEFAULT_DEPTH_FRACTION;
///
/// assert!(DEFAULT_DEPTH_FRACTION > 0.0 && DEFAULT_DEPTH_FRACTION <= 1.0);
/// ```
pub const DEFAULT_DEPTH_FRACTION: f64 = 0.5;

/// Default placement margin, in percent of the seam extent.
pub const DEFAULT_MARGIN_PCT: f64 = 10.0;

/// Upper bound (exclusive) for the placement margin, in percent.
pub const MAX_MARGIN_PCT: f64 = 50.0;

/// Default number of connectors per seam for explicit-count line placement.
pub const DEFAULT_CONNECTORS_PER_SEAM: usize = 3;

/// Maximum number of connectors on a single seam.
pub const MAX_CONNECTORS_PER_SEAM: usize = 64;

/// Radial height of the retention ring on snap pins.
pub const SNAP_RING_HEIGHT_MM: f64 = 0.3;

/// Axial width of the retention ring on snap pins.
pub const SNAP_RING_WIDTH_MM: f64 = 1.0;

/// Minimum extra socket depth beyond the inserted pin length.
///
/// # Example
///
/// ```rust
/// use config::constants::MIN_SOCKET_CLEARANCE_MM;
///
/// let tolerance: f64 = 0.05;
/// assert_eq!(tolerance.max(MIN_SOCKET_CLEARANCE_MM), MIN_SOCKET_CLEARANCE_MM);
/// ```
pub const MIN_SOCKET_CLEARANCE_MM: f64 = 0.1;

/// Material selected when no profile is requested.
pub const DEFAULT_MATERIAL: &str = "PLA";

/// Name under which split parts are grouped by the grouping service.
pub const PARTS_COLLECTION_NAME: &str = "_SnapSplit_Parts";

// =============================================================================
// LIMIT CONSTANTS
// =============================================================================

/// Bytes of stack space reserved when growing recursion limits using the
/// `stacker` crate during BSP traversal.
///
/// # Example
///
/// ```rust
/// use config::constants::STACKER_STACK_SIZE_BYTES;
///
/// assert!(STACKER_STACK_SIZE_BYTES >= 1024);
/// ```
pub const STACKER_STACK_SIZE_BYTES: usize = 8 * 1024 * 1024;

/// Remaining stack below which `stacker` allocates a new segment.
pub const STACKER_RED_ZONE_BYTES: usize = 128 * 1024;

/// Maximum number of vertices accepted into the kernel.
pub const MAX_VERTICES: usize = 10_000_000;

/// Maximum number of triangles accepted into the kernel.
pub const MAX_TRIANGLES: usize = 10_000_000;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Checks if two f64 values are approximately equal within EPSILON.
///
/// # Example
///
/// ```rust
/// use config::constants::approx_equal;
///
/// assert!(approx_equal(1.0, 1.0 + 1e-11));
/// assert!(!approx_equal(1.0, 1.1));
/// ```
#[inline]
pub fn approx_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// Checks if a f64 value is approximately zero within EPSILON.
///
/// # Example
///
/// ```rust
/// use config::constants::approx_zero;
///
/// assert!(approx_zero(1e-11));
/// assert!(!approx_zero(0.1));
/// ```
#[inline]
pub fn approx_zero(value: f64) -> bool {
    value.abs() < EPSILON
}

/// Clamps a requested segment count into the supported range.
///
/// # Example
///
/// ```rust
/// use config::constants::{clamp_segments, MIN_SEGMENTS};
///
/// assert_eq!(clamp_segments(1), MIN_SEGMENTS);
/// assert_eq!(clamp_segments(48), 48);
/// ```
pub fn clamp_segments(requested: u32) -> u32 {
    requested.clamp(MIN_SEGMENTS, MAX_SEGMENTS)
}
