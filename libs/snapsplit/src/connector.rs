//! # Connector Specifications
//!
//! Dimensions of a connector in mesh units. Defaults come from
//! `config::constants` in millimetres and are scaled with
//! [`PipelineConfig::mm`].

use config::constants::{
    DEFAULT_CHAMFER_MM, DEFAULT_DEPTH_FRACTION, DEFAULT_PIN_DIAMETER_MM, DEFAULT_PIN_LENGTH_MM,
    DEFAULT_TENON_LENGTH_MM, DEFAULT_TENON_WIDTH_MM, MIN_SOCKET_CLEARANCE_MM, SNAP_RING_HEIGHT_MM,
    SNAP_RING_WIDTH_MM,
};
use config::pipeline::PipelineConfig;
use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::tolerance::ResolvedTolerance;

/// Connector variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectorKind {
    CylindricalPin,
    RectangularTenon,
    /// Cylindrical pin with a retention ring near the tip.
    SnapPin,
    /// Rectangular tenon with a retention band near the tip.
    SnapTenon,
}

impl ConnectorKind {
    pub fn is_round(self) -> bool {
        matches!(self, ConnectorKind::CylindricalPin | ConnectorKind::SnapPin)
    }

    pub fn is_snap(self) -> bool {
        matches!(self, ConnectorKind::SnapPin | ConnectorKind::SnapTenon)
    }
}

/// Nominal cross-section of the pin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CrossSection {
    Round { diameter: f64 },
    Rect { width: f64, height: f64 },
}

impl CrossSection {
    /// Diameter of the smallest circle containing the cross-section.
    pub fn circumscribed_diameter(&self) -> f64 {
        match *self {
            CrossSection::Round { diameter } => diameter,
            CrossSection::Rect { width, height } => width.hypot(height),
        }
    }

    /// Half of the smallest side (the radius for a round section).
    pub fn min_half_extent(&self) -> f64 {
        match *self {
            CrossSection::Round { diameter } => diameter * 0.5,
            CrossSection::Rect { width, height } => width.min(height) * 0.5,
        }
    }
}

/// Retention ring of snap variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapRing {
    /// Radial height above the pin surface.
    pub height: f64,
    /// Axial width of the band.
    pub width: f64,
}

/// Full description of one connector, in mesh units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectorSpec {
    pub kind: ConnectorKind,
    pub section: CrossSection,
    /// Total pin length.
    pub length: f64,
    /// Fraction of `length` inserted into the female part, in `(0, 1]`.
    pub depth_fraction: f64,
    /// Clearance per side.
    pub tolerance: f64,
    /// Tip chamfer; zero for a square tip.
    pub chamfer: f64,
    pub snap_ring: SnapRing,
    /// Extra socket depth beyond the inserted length.
    pub clearance: f64,
    /// Segments of round sections.
    pub segments: u32,
}

impl ConnectorSpec {
    /// Default dimensions for a connector kind at the given tolerance.
    ///
    /// # Example
    ///
    /// ```rust
    /// use config::pipeline::PipelineConfig;
    /// use snapsplit::connector::{ConnectorKind, ConnectorSpec, CrossSection};
    /// use snapsplit::tolerance::ResolvedTolerance;
    ///
    /// let spec = ConnectorSpec::defaults(
    ///     ConnectorKind::CylindricalPin,
    ///     &ResolvedTolerance::exact(0.2),
    ///     &PipelineConfig::default(),
    /// );
    /// assert_eq!(spec.section, CrossSection::Round { diameter: 5.0 });
    /// assert_eq!(spec.length, 8.0);
    /// ```
    pub fn defaults(kind: ConnectorKind, tolerance: &ResolvedTolerance, config: &PipelineConfig) -> Self {
        let (section, length) = if kind.is_round() {
            (
                CrossSection::Round {
                    diameter: config.mm(DEFAULT_PIN_DIAMETER_MM),
                },
                config.mm(DEFAULT_PIN_LENGTH_MM),
            )
        } else {
            let side = config.mm(DEFAULT_TENON_WIDTH_MM);
            (
                CrossSection::Rect {
                    width: side,
                    height: side,
                },
                config.mm(DEFAULT_TENON_LENGTH_MM),
            )
        };
        let tolerance = tolerance.in_units(config);
        Self {
            kind,
            section,
            length,
            depth_fraction: DEFAULT_DEPTH_FRACTION,
            tolerance,
            chamfer: config.mm(DEFAULT_CHAMFER_MM),
            snap_ring: SnapRing {
                height: config.mm(SNAP_RING_HEIGHT_MM),
                width: config.mm(SNAP_RING_WIDTH_MM),
            },
            clearance: tolerance.max(config.mm(MIN_SOCKET_CLEARANCE_MM)),
            segments: config.segments,
        }
    }

    pub fn with_section(mut self, section: CrossSection) -> Self {
        self.section = section;
        self
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }

    pub fn with_depth_fraction(mut self, depth_fraction: f64) -> Self {
        self.depth_fraction = depth_fraction;
        self
    }

    pub fn with_chamfer(mut self, chamfer: f64) -> Self {
        self.chamfer = chamfer;
        self
    }

    /// Length of the pin inside the female part.
    pub fn inserted_length(&self) -> f64 {
        self.depth_fraction * self.length
    }

    /// Length of the pin inside the male part.
    pub fn embedded_length(&self) -> f64 {
        self.length - self.inserted_length()
    }

    /// Circumscribed diameter of the pin, ring included.
    pub fn footprint(&self) -> f64 {
        let ring = if self.kind.is_snap() {
            2.0 * self.snap_ring.height
        } else {
            0.0
        };
        self.section.circumscribed_diameter() + ring
    }

    /// Smallest centre-to-centre distance two instances must exceed.
    pub fn min_spacing(&self) -> f64 {
        self.footprint() + 2.0 * self.tolerance
    }

    /// Checks the dimensions for consistency.
    ///
    /// # Errors
    ///
    /// [`InputError::InvalidConnector`] naming the first problem.
    pub fn validate(&self) -> Result<(), InputError> {
        let fail = |message: String| Err(InputError::InvalidConnector(message));
        match (self.kind.is_round(), self.section) {
            (true, CrossSection::Round { diameter }) if !(diameter > 0.0) => {
                return fail(format!("diameter must be positive: {diameter}"))
            }
            (false, CrossSection::Rect { width, height }) if !(width > 0.0 && height > 0.0) => {
                return fail(format!("tenon section must be positive: {width} x {height}"))
            }
            (true, CrossSection::Rect { .. }) | (false, CrossSection::Round { .. }) => {
                return fail(format!("{:?} does not take a {:?} section", self.kind, self.section))
            }
            _ => {}
        }
        if !(self.length > 0.0) {
            return fail(format!("length must be positive: {}", self.length));
        }
        if !(self.depth_fraction > 0.0 && self.depth_fraction <= 1.0) {
            return fail(format!(
                "insertion depth fraction must be in (0, 1]: {}",
                self.depth_fraction
            ));
        }
        if !(self.tolerance >= 0.0) {
            return fail(format!("tolerance must not be negative: {}", self.tolerance));
        }
        if !(self.chamfer >= 0.0
            && self.chamfer < self.section.min_half_extent()
            && self.chamfer < self.inserted_length())
        {
            return fail(format!("chamfer {} does not fit the pin", self.chamfer));
        }
        if self.kind.is_snap() {
            let ring = self.snap_ring;
            if !(ring.height > 0.0 && ring.width > 0.0) {
                return fail("snap ring must have positive height and width".to_string());
            }
            if ring.width * 1.5 + self.chamfer >= self.inserted_length() {
                return fail(format!(
                    "snap ring of width {} does not fit the inserted length {}",
                    ring.width,
                    self.inserted_length()
                ));
            }
        }
        if self.segments < 3 {
            return fail(format!("round sections need at least 3 segments: {}", self.segments));
        }
        Ok(())
    }
}

/// Orthonormal frame of a connector: `z` along the seam normal, pointing
/// into the female part.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub x: DVec3,
    pub y: DVec3,
    pub z: DVec3,
}

impl Frame {
    /// Frame for a seam normal. `x` follows world X unless the normal is
    /// parallel to it, then world Y.
    ///
    /// # Example
    ///
    /// ```rust
    /// use glam::DVec3;
    /// use snapsplit::connector::Frame;
    ///
    /// let frame = Frame::from_normal(DVec3::X);
    /// assert_eq!(frame.z, DVec3::X);
    /// assert!(frame.x.dot(DVec3::X).abs() < 1e-12);
    /// ```
    pub fn from_normal(normal: DVec3) -> Self {
        let z = normal.normalize_or_zero();
        let seed = if z.dot(DVec3::X).abs() > 0.9 {
            DVec3::Y
        } else {
            DVec3::X
        };
        let y = z.cross(seed).normalize();
        let x = y.cross(z);
        Self { x, y, z }
    }

    /// Matrix taking connector-local coordinates to world space at `origin`.
    pub fn to_matrix(&self, origin: DVec3) -> DMat4 {
        DMat4::from_cols(
            self.x.extend(0.0),
            self.y.extend(0.0),
            self.z.extend(0.0),
            origin.extend(1.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pin() -> ConnectorSpec {
        ConnectorSpec::defaults(
            ConnectorKind::CylindricalPin,
            &ResolvedTolerance::exact(0.2),
            &PipelineConfig::default(),
        )
    }

    #[test]
    fn test_default_pin_is_valid() {
        let spec = pin();
        assert!(spec.validate().is_ok());
        assert_relative_eq!(spec.inserted_length(), 4.0);
        assert_relative_eq!(spec.min_spacing(), 5.4);
        assert_relative_eq!(spec.clearance, 0.2);
    }

    #[test]
    fn test_clearance_has_floor() {
        let spec = ConnectorSpec::defaults(
            ConnectorKind::CylindricalPin,
            &ResolvedTolerance::exact(0.05),
            &PipelineConfig::default(),
        );
        assert_relative_eq!(spec.clearance, 0.1);
    }

    #[test]
    fn test_tenon_footprint_is_diagonal() {
        let spec = ConnectorSpec::defaults(
            ConnectorKind::RectangularTenon,
            &ResolvedTolerance::exact(0.0),
            &PipelineConfig::default(),
        );
        assert_relative_eq!(spec.footprint(), 72.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_snap_footprint_includes_ring() {
        let spec = ConnectorSpec::defaults(
            ConnectorKind::SnapPin,
            &ResolvedTolerance::exact(0.2),
            &PipelineConfig::default(),
        );
        assert!(spec.validate().is_ok());
        assert_relative_eq!(spec.footprint(), 5.6, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_mismatched_section() {
        let spec = pin().with_section(CrossSection::Rect {
            width: 4.0,
            height: 4.0,
        });
        assert!(matches!(spec.validate(), Err(InputError::InvalidConnector(_))));
    }

    #[test]
    fn test_rejects_depth_fraction() {
        assert!(pin().with_depth_fraction(0.0).validate().is_err());
        assert!(pin().with_depth_fraction(1.0).validate().is_ok());
        assert!(pin().with_depth_fraction(1.2).validate().is_err());
    }

    #[test]
    fn test_chamfer_must_fit_the_pin() {
        assert!(pin().with_chamfer(0.0).validate().is_ok());
        assert!(pin().with_chamfer(1.0).validate().is_ok());
        assert!(pin().with_chamfer(2.5).validate().is_err());
        assert!(pin().with_chamfer(-0.1).validate().is_err());
    }

    #[test]
    fn test_millimetre_scaling() {
        let config = PipelineConfig::default().with_units_per_mm(0.001).unwrap();
        let spec = ConnectorSpec::defaults(ConnectorKind::CylindricalPin, &ResolvedTolerance::exact(0.2), &config);
        assert_relative_eq!(spec.length, 0.008, epsilon = 1e-15);
        assert_relative_eq!(spec.tolerance, 0.0002, epsilon = 1e-15);
    }

    #[test]
    fn test_frame_is_right_handed() {
        for normal in [DVec3::X, DVec3::Y, DVec3::NEG_Z, DVec3::new(1.0, 2.0, 3.0).normalize()] {
            let frame = Frame::from_normal(normal);
            assert_relative_eq!(frame.x.cross(frame.y).dot(frame.z), 1.0, epsilon = 1e-12);
            assert_relative_eq!(frame.to_matrix(DVec3::ZERO).determinant(), 1.0, epsilon = 1e-12);
        }
    }
}
