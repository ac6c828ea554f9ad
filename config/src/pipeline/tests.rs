//! Tests for the pipeline configuration value.

use super::*;

/// Ensures default settings are sane and positive.
#[test]
fn default_config_is_valid() {
    let cfg = PipelineConfig::default();
    assert!(cfg.plane_epsilon > 0.0);
    assert!(cfg.weld_epsilon >= cfg.plane_epsilon);
    assert!(cfg.segments >= MIN_SEGMENTS);
    assert_eq!(cfg.units_per_mm, 1.0);
    assert_eq!(cfg.remesh_attempts, MAX_REMESH_ATTEMPTS);
}

/// Validates the builder rejects invalid values.
#[test]
fn new_validates_inputs() {
    assert_eq!(
        PipelineConfig::new(0.0, 1.0e-5, 24).unwrap_err(),
        ConfigError::InvalidTolerance(0.0)
    );
    assert_eq!(
        PipelineConfig::new(1.0e-5, 1.0e-6, 24).unwrap_err(),
        ConfigError::WeldBelowPlane {
            weld: 1.0e-6,
            plane: 1.0e-5
        }
    );
    assert_eq!(
        PipelineConfig::new(1.0e-5, 1.0e-5, 2).unwrap_err(),
        ConfigError::InvalidSegments(2)
    );
}

#[test]
fn presets_differ_from_default() {
    assert!(PipelineConfig::fine().segments > PipelineConfig::default().segments);
    assert!(PipelineConfig::draft().segments < PipelineConfig::default().segments);
    assert!(PipelineConfig::fine().plane_epsilon < PLANE_EPSILON);
}

#[test]
fn unit_scale_round_trips_lengths() {
    let cfg = PipelineConfig::default().with_units_per_mm(0.001).unwrap();
    assert!((cfg.mm(200.0) - 0.2).abs() < 1e-12);
    assert!((cfg.to_mm(0.2) - 200.0).abs() < 1e-9);
}

#[test]
fn unit_scale_rejects_zero() {
    assert_eq!(
        PipelineConfig::default().with_units_per_mm(0.0).unwrap_err(),
        ConfigError::InvalidUnitScale(0.0)
    );
}

#[test]
fn remesh_attempts_are_capped() {
    let cfg = PipelineConfig::default().with_remesh_attempts(10);
    assert_eq!(cfg.remesh_attempts, MAX_REMESH_ATTEMPTS);
}

#[test]
fn worker_threads_default_to_pool_choice() {
    assert_eq!(PipelineConfig::default().worker_threads, 0);
    assert_eq!(PipelineConfig::default().with_worker_threads(4).worker_threads, 4);
}
