//! # Config Crate
//!
//! Centralized configuration for the SnapSplit pipeline. Magic numbers live in
//! [`constants`]; the runtime settings every component receives are bundled in
//! [`pipeline::PipelineConfig`].
//!
//! ## Usage
//!
//! ```rust
//! use config::constants::{DEFAULT_PIN_DIAMETER_MM, EPSILON};
//! use config::pipeline::PipelineConfig;
//!
//! let value: f64 = 0.00000000001; // 1e-11, smaller than EPSILON (1e-10)
//! assert!(value.abs() < EPSILON);
//!
//! let cfg = PipelineConfig::default();
//! assert_eq!(cfg.mm(DEFAULT_PIN_DIAMETER_MM), 5.0);
//! ```
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All constants defined once, used everywhere
//! - **Explicit**: Runtime settings are passed by value, never read globally
//! - **Millimetre Defaults**: Connector dimensions are given in millimetres

pub mod constants;
pub mod pipeline;

#[cfg(test)]
mod tests;
