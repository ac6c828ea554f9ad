//! # Tolerance Profiles
//!
//! Material-keyed clearance presets (millimetres per side) and resolution of
//! user overrides.
//!
//! ## Example
//!
//! ```rust
//! use snapsplit::tolerance::{resolve, BuiltinProfiles};
//!
//! let profiles = BuiltinProfiles::default();
//! let pla = resolve(&profiles, "PLA", None).unwrap();
//! assert_eq!(pla.per_side_mm, 0.20);
//!
//! let loose = resolve(&profiles, "PLA", Some(0.4)).unwrap();
//! assert!(loose.out_of_guideline);
//! ```

use std::collections::HashMap;

use config::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ToleranceError;

/// Clearance range for one material, in millimetres per side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceProfile {
    pub material: String,
    pub per_side_min: f64,
    pub per_side_max: f64,
    pub per_side_default: f64,
}

impl ToleranceProfile {
    /// Creates a profile, checking `0 <= min <= default <= max`.
    pub fn new(
        material: impl Into<String>,
        per_side_min: f64,
        per_side_default: f64,
        per_side_max: f64,
    ) -> Result<Self, ToleranceError> {
        let material = material.into();
        if !(per_side_min >= 0.0 && per_side_min <= per_side_default && per_side_default <= per_side_max)
        {
            return Err(ToleranceError::InvalidProfile {
                message: format!(
                    "expected 0 <= {per_side_min} <= {per_side_default} <= {per_side_max}"
                ),
                material,
            });
        }
        Ok(Self {
            material,
            per_side_min,
            per_side_max,
            per_side_default,
        })
    }

    /// Whether `value` lies in the recommended range.
    pub fn contains(&self, value: f64) -> bool {
        (self.per_side_min..=self.per_side_max).contains(&value)
    }
}

/// The clearance a connector is built with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTolerance {
    /// Clearance per side in millimetres.
    pub per_side_mm: f64,
    /// An override was applied instead of the profile default.
    pub overridden: bool,
    /// The override lies outside the profile's recommended range.
    pub out_of_guideline: bool,
}

impl ResolvedTolerance {
    /// A tolerance given directly, without a profile.
    pub fn exact(per_side_mm: f64) -> Self {
        Self {
            per_side_mm,
            overridden: true,
            out_of_guideline: false,
        }
    }

    /// Clearance per side in mesh units.
    pub fn in_units(&self, config: &PipelineConfig) -> f64 {
        config.mm(self.per_side_mm)
    }
}

/// Source of material profiles and remembered overrides.
pub trait ProfileStore: Send + Sync {
    /// Names of all known materials.
    fn materials(&self) -> Vec<String>;

    /// Profile for a material (case-insensitive).
    fn profile(&self, material: &str) -> Option<ToleranceProfile>;

    /// Override remembered for a material, if any.
    fn stored_override(&self, _material: &str) -> Option<f64> {
        None
    }
}

/// The built-in FDM and resin presets.
pub fn builtin_profiles() -> Vec<ToleranceProfile> {
    [
        ("PLA", 0.15, 0.20, 0.25),
        ("PETG", 0.25, 0.30, 0.35),
        ("ABS", 0.20, 0.25, 0.30),
        ("ASA", 0.20, 0.25, 0.30),
        ("TPU", 0.30, 0.375, 0.45),
        ("SLA", 0.05, 0.10, 0.15),
    ]
    .into_iter()
    .map(|(material, min, default, max)| ToleranceProfile {
        material: material.to_string(),
        per_side_min: min,
        per_side_max: max,
        per_side_default: default,
    })
    .collect()
}

/// In-memory profile store seeded with [`builtin_profiles`].
#[derive(Debug, Clone)]
pub struct BuiltinProfiles {
    profiles: Vec<ToleranceProfile>,
    overrides: HashMap<String, f64>,
}

impl Default for BuiltinProfiles {
    fn default() -> Self {
        Self {
            profiles: builtin_profiles(),
            overrides: HashMap::new(),
        }
    }
}

impl BuiltinProfiles {
    /// Adds or replaces a profile.
    pub fn with_profile(mut self, profile: ToleranceProfile) -> Self {
        self.profiles
            .retain(|p| !p.material.eq_ignore_ascii_case(&profile.material));
        self.profiles.push(profile);
        self
    }

    /// Remembers an override for a material.
    pub fn with_override(mut self, material: &str, per_side_mm: f64) -> Self {
        self.overrides.insert(material.to_ascii_uppercase(), per_side_mm);
        self
    }
}

impl ProfileStore for BuiltinProfiles {
    fn materials(&self) -> Vec<String> {
        self.profiles.iter().map(|p| p.material.clone()).collect()
    }

    fn profile(&self, material: &str) -> Option<ToleranceProfile> {
        self.profiles
            .iter()
            .find(|p| p.material.eq_ignore_ascii_case(material))
            .cloned()
    }

    fn stored_override(&self, material: &str) -> Option<f64> {
        self.overrides.get(&material.to_ascii_uppercase()).copied()
    }
}

/// Resolves the clearance for a material.
///
/// An explicit override wins over a stored one; without either the profile
/// default is used. Overrides outside the recommended range are accepted
/// and flagged.
///
/// # Errors
///
/// [`ToleranceError::UnknownMaterial`] for a material the store does not
/// know, [`ToleranceError::NegativeOverride`] for a negative override.
pub fn resolve(
    store: &dyn ProfileStore,
    material: &str,
    override_mm: Option<f64>,
) -> Result<ResolvedTolerance, ToleranceError> {
    let profile = store
        .profile(material)
        .ok_or_else(|| ToleranceError::UnknownMaterial(material.to_string()))?;

    let Some(value) = override_mm.or_else(|| store.stored_override(material)) else {
        return Ok(ResolvedTolerance {
            per_side_mm: profile.per_side_default,
            overridden: false,
            out_of_guideline: false,
        });
    };

    if !(value >= 0.0) {
        return Err(ToleranceError::NegativeOverride(value));
    }
    let out_of_guideline = !profile.contains(value);
    if out_of_guideline {
        warn!(
            material = %profile.material,
            value,
            min = profile.per_side_min,
            max = profile.per_side_max,
            "tolerance override outside recommended range"
        );
    }
    Ok(ResolvedTolerance {
        per_side_mm: value,
        overridden: true,
        out_of_guideline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_ordered() {
        for profile in builtin_profiles() {
            assert!(profile.per_side_min >= 0.0, "{}", profile.material);
            assert!(profile.per_side_min <= profile.per_side_default, "{}", profile.material);
            assert!(profile.per_side_default <= profile.per_side_max, "{}", profile.material);
        }
    }

    #[test]
    fn test_defaults() {
        let store = BuiltinProfiles::default();
        let expected = [
            ("PLA", 0.20),
            ("PETG", 0.30),
            ("ABS", 0.25),
            ("ASA", 0.25),
            ("TPU", 0.375),
            ("SLA", 0.10),
        ];
        for (material, default) in expected {
            let resolved = resolve(&store, material, None).unwrap();
            assert_eq!(resolved.per_side_mm, default);
            assert!(!resolved.overridden);
        }
    }

    #[test]
    fn test_lookup_ignores_case() {
        let store = BuiltinProfiles::default();
        assert_eq!(resolve(&store, "petg", None).unwrap().per_side_mm, 0.30);
    }

    #[test]
    fn test_override_in_range() {
        let store = BuiltinProfiles::default();
        let resolved = resolve(&store, "PLA", Some(0.22)).unwrap();
        assert_eq!(resolved.per_side_mm, 0.22);
        assert!(resolved.overridden);
        assert!(!resolved.out_of_guideline);
    }

    #[test]
    fn test_override_out_of_range_is_flagged() {
        let store = BuiltinProfiles::default();
        let resolved = resolve(&store, "SLA", Some(0.5)).unwrap();
        assert_eq!(resolved.per_side_mm, 0.5);
        assert!(resolved.out_of_guideline);
    }

    #[test]
    fn test_zero_override_is_allowed() {
        let store = BuiltinProfiles::default();
        let resolved = resolve(&store, "PLA", Some(0.0)).unwrap();
        assert_eq!(resolved.per_side_mm, 0.0);
        assert!(resolved.out_of_guideline);
    }

    #[test]
    fn test_negative_override_rejected() {
        let store = BuiltinProfiles::default();
        assert_eq!(
            resolve(&store, "PLA", Some(-0.1)),
            Err(ToleranceError::NegativeOverride(-0.1))
        );
    }

    #[test]
    fn test_unknown_material() {
        let store = BuiltinProfiles::default();
        assert!(matches!(
            resolve(&store, "Nylon", None),
            Err(ToleranceError::UnknownMaterial(_))
        ));
    }

    #[test]
    fn test_stored_override_used_when_no_explicit() {
        let store = BuiltinProfiles::default().with_override("pla", 0.18);
        assert_eq!(resolve(&store, "PLA", None).unwrap().per_side_mm, 0.18);
        assert_eq!(resolve(&store, "PLA", Some(0.24)).unwrap().per_side_mm, 0.24);
    }

    #[test]
    fn test_custom_profile_validated() {
        assert!(ToleranceProfile::new("PA12", 0.1, 0.3, 0.2).is_err());
        let profile = ToleranceProfile::new("PA12", 0.1, 0.15, 0.2).unwrap();
        let store = BuiltinProfiles::default().with_profile(profile);
        assert_eq!(resolve(&store, "PA12", None).unwrap().per_side_mm, 0.15);
        assert!(store.materials().contains(&"PA12".to_string()));
    }

    #[test]
    fn test_units_conversion() {
        let config = PipelineConfig::default().with_units_per_mm(0.001).unwrap();
        let resolved = ResolvedTolerance::exact(0.2);
        assert!((resolved.in_units(&config) - 0.0002).abs() < 1e-15);
    }
}
