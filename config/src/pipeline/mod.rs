//! Explicit pipeline configuration passed into every SnapSplit component.
//!
//! Nothing in the pipeline reads ambient or global settings; callers build a
//! [`PipelineConfig`] once and thread it through.

use std::fmt;

use crate::constants::{
    DEFAULT_SEGMENTS, MAX_REMESH_ATTEMPTS, MAX_SEGMENTS, MIN_SEGMENTS, PLANE_EPSILON,
    WELD_EPSILON,
};

/// Immutable snapshot of the settings shared by the kernel and the pipeline.
///
/// # Examples
/// ```
/// use config::pipeline::PipelineConfig;
/// let config = PipelineConfig::default();
/// assert!(config.plane_epsilon > 0.0);
/// assert_eq!(config.units_per_mm, 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Half-width of the "on plane" band used by boolean classification.
    pub plane_epsilon: f64,
    /// Distance below which vertices are welded after a boolean.
    pub weld_epsilon: f64,
    /// Segment count used to tessellate round connectors.
    pub segments: u32,
    /// Mesh units per millimetre (1.0 for millimetre scenes, 0.001 for metres).
    pub units_per_mm: f64,
    /// Worker threads for batch synthesis; 0 lets rayon decide.
    pub worker_threads: usize,
    /// Voxel remesh attempts before a failed cut is reported.
    pub remesh_attempts: u32,
}

impl PipelineConfig {
    /// Builds a configuration enforcing strict validation of the supplied
    /// tolerances and segment count.
    ///
    /// # Examples
    /// ```
    /// use config::pipeline::PipelineConfig;
    /// let cfg = PipelineConfig::new(1.0e-5, 1.0e-5, 24).expect("valid config");
    /// assert_eq!(cfg.segments, 24);
    /// ```
    pub fn new(plane_epsilon: f64, weld_epsilon: f64, segments: u32) -> Result<Self, ConfigError> {
        if !(plane_epsilon > 0.0) {
            return Err(ConfigError::InvalidTolerance(plane_epsilon));
        }
        if weld_epsilon < plane_epsilon {
            return Err(ConfigError::WeldBelowPlane {
                weld: weld_epsilon,
                plane: plane_epsilon,
            });
        }
        if !(MIN_SEGMENTS..=MAX_SEGMENTS).contains(&segments) {
            return Err(ConfigError::InvalidSegments(segments));
        }
        Ok(Self {
            plane_epsilon,
            weld_epsilon,
            segments,
            ..Self::default()
        })
    }

    /// Tighter tolerances and finer tessellation for small, detailed parts.
    pub fn fine() -> Self {
        Self {
            plane_epsilon: PLANE_EPSILON * 0.1,
            weld_epsilon: WELD_EPSILON * 0.1,
            segments: 64,
            ..Self::default()
        }
    }

    /// Coarse tessellation for quick previews.
    pub fn draft() -> Self {
        Self {
            segments: 16,
            remesh_attempts: 1,
            ..Self::default()
        }
    }

    /// Sets the unit scale, rejecting non-positive values.
    ///
    /// # Examples
    /// ```
    /// use config::pipeline::PipelineConfig;
    /// let metres = PipelineConfig::default().with_units_per_mm(0.001).unwrap();
    /// assert_eq!(metres.mm(5.0), 0.005);
    /// ```
    pub fn with_units_per_mm(mut self, units_per_mm: f64) -> Result<Self, ConfigError> {
        if !(units_per_mm > 0.0) || !units_per_mm.is_finite() {
            return Err(ConfigError::InvalidUnitScale(units_per_mm));
        }
        self.units_per_mm = units_per_mm;
        Ok(self)
    }

    /// Sets the number of batch worker threads (0 = rayon default).
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    /// Sets the number of remediation attempts, capped at the supported maximum.
    pub fn with_remesh_attempts(mut self, attempts: u32) -> Self {
        self.remesh_attempts = attempts.min(MAX_REMESH_ATTEMPTS);
        self
    }

    /// Converts a length in millimetres into mesh units.
    #[inline]
    pub fn mm(&self, millimetres: f64) -> f64 {
        millimetres * self.units_per_mm
    }

    /// Converts a length in mesh units into millimetres.
    #[inline]
    pub fn to_mm(&self, units: f64) -> f64 {
        units / self.units_per_mm
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            plane_epsilon: PLANE_EPSILON,
            weld_epsilon: WELD_EPSILON,
            segments: DEFAULT_SEGMENTS,
            units_per_mm: 1.0,
            worker_threads: 0,
            remesh_attempts: MAX_REMESH_ATTEMPTS,
        }
    }
}

/// Error returned when invalid configuration values are provided.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Raised when a tolerance is zero, negative or NaN.
    InvalidTolerance(f64),
    /// Raised when the weld distance is smaller than the plane band.
    WeldBelowPlane { weld: f64, plane: f64 },
    /// Raised when the segment count is outside the supported range.
    InvalidSegments(u32),
    /// Raised when the unit scale is not a positive finite number.
    InvalidUnitScale(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidTolerance(value) => {
                write!(f, "tolerance must be positive: {value}")
            }
            ConfigError::WeldBelowPlane { weld, plane } => {
                write!(f, "weld epsilon {weld} must be >= plane epsilon {plane}")
            }
            ConfigError::InvalidSegments(value) => {
                write!(
                    f,
                    "segments must be within {MIN_SEGMENTS}..={MAX_SEGMENTS}: {value}"
                )
            }
            ConfigError::InvalidUnitScale(value) => {
                write!(f, "units per millimetre must be positive: {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests;
