//! # Tests for Config Constants
//!
//! Unit tests verifying the consistency of configuration constants
//! and helper functions.

use crate::constants::*;

// =============================================================================
// PRECISION TESTS
// =============================================================================

#[test]
fn test_epsilon_is_positive() {
    assert!(EPSILON > 0.0, "EPSILON must be positive");
}

#[test]
fn test_plane_epsilon_coarser_than_epsilon() {
    assert!(PLANE_EPSILON > EPSILON);
}

#[test]
fn test_weld_epsilon_covers_plane_band() {
    assert!(
        WELD_EPSILON >= PLANE_EPSILON,
        "vertices snapped onto a plane must weld with exact intersections"
    );
}

#[test]
fn test_repair_welds_start_exact_and_coarsen() {
    assert_eq!(REPAIR_WELD_SCALES[0], 1.0);
    for pair in REPAIR_WELD_SCALES.windows(2) {
        assert!(pair[0] < pair[1]);
    }
    // Even the coarsest weld stays far below printable feature sizes
    assert!(WELD_EPSILON * REPAIR_WELD_SCALES[REPAIR_WELD_SCALES.len() - 1] < 0.01);
}

#[test]
fn test_area_epsilon_small() {
    assert!(AREA_EPSILON < WELD_EPSILON * WELD_EPSILON * 10.0);
}

// =============================================================================
// SEGMENTATION TESTS
// =============================================================================

#[test]
fn test_part_bounds_ordered() {
    assert!(MIN_PARTS >= 2);
    assert!(MAX_PARTS >= 8, "splits into up to eight parts must be allowed");
}

#[test]
fn test_remesh_divisions_match_attempts() {
    assert_eq!(REMESH_VOXEL_DIVISIONS.len(), MAX_REMESH_ATTEMPTS as usize);
    for pair in REMESH_VOXEL_DIVISIONS.windows(2) {
        assert!(pair[0] > pair[1], "remediation must coarsen");
    }
}

#[test]
fn test_cutter_margin_positive() {
    assert!(CUTTER_MARGIN_FRACTION > 0.0);
}

// =============================================================================
// CONNECTOR TESTS
// =============================================================================

#[test]
fn test_default_depth_fraction_in_range() {
    assert!(DEFAULT_DEPTH_FRACTION > 0.0 && DEFAULT_DEPTH_FRACTION <= 1.0);
}

#[test]
fn test_default_margin_below_max() {
    assert!(DEFAULT_MARGIN_PCT >= 0.0 && DEFAULT_MARGIN_PCT < MAX_MARGIN_PCT);
}

#[test]
fn test_chamfer_smaller_than_pin() {
    assert!(DEFAULT_CHAMFER_MM * 2.0 < DEFAULT_PIN_DIAMETER_MM);
    assert!(DEFAULT_CHAMFER_MM * 2.0 < DEFAULT_TENON_WIDTH_MM);
}

#[test]
fn test_snap_ring_fits_pin_length() {
    assert!(SNAP_RING_WIDTH_MM < DEFAULT_PIN_LENGTH_MM * DEFAULT_DEPTH_FRACTION);
}

// =============================================================================
// HELPER TESTS
// =============================================================================

#[test]
fn test_approx_equal_same_values() {
    assert!(approx_equal(1.0, 1.0));
}

#[test]
fn test_approx_equal_different_values() {
    assert!(!approx_equal(1.0, 1.0001));
}

#[test]
fn test_approx_zero() {
    assert!(approx_zero(0.0));
    assert!(approx_zero(-1e-12));
    assert!(!approx_zero(1e-3));
}

#[test]
fn test_clamp_segments_bounds() {
    assert_eq!(clamp_segments(0), MIN_SEGMENTS);
    assert_eq!(clamp_segments(10_000), MAX_SEGMENTS);
    assert_eq!(clamp_segments(DEFAULT_SEGMENTS), DEFAULT_SEGMENTS);
}
