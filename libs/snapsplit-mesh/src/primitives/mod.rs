//! # Primitives
//!
//! Mesh generation for the solids the pipeline needs: boxes for half-space
//! cutters, lofts for pins, tenons, sockets and snap rings.

pub mod cube;
pub mod loft;

pub use cube::{create_box, create_cube};
pub use loft::{circle_outline, create_loft, rect_outline, Station};
