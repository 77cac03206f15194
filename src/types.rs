use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Planetary geomagnetic disturbance index (Kp-style). Domain [0, 9];
/// higher means more severe space-weather activity. Deserialization goes
/// through the validating constructor.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64")]
pub struct GeomagIndex(f64);

impl TryFrom<f64> for GeomagIndex {
    type Error = InputError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl GeomagIndex {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 9.0;

    /// Boundary constructor: rejects NaN and values outside [0, 9].
    /// Caller-supplied indices go through here, never through `clamped`.
    pub fn new(value: f64) -> Result<Self, InputError> {
        if Self::in_domain(value) {
            Ok(GeomagIndex(value))
        } else {
            Err(InputError::IndexOutOfRange(value))
        }
    }

    /// Domain rule for values produced by internal arithmetic (bump/cap):
    /// clamp into [0, 9]. Inputs here are always finite by construction.
    pub fn clamped(value: f64) -> Self {
        debug_assert!(value.is_finite(), "non-finite index {value}");
        GeomagIndex(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// True when a raw feed token lies inside the index domain. Out-of-range
    /// numbers in feed text (years, ap values) are noise and are discarded
    /// by the parsers, not clamped.
    pub fn in_domain(value: f64) -> bool {
        value.is_finite() && (Self::MIN..=Self::MAX).contains(&value)
    }
}

/// Event probability. Domain [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64")]
pub struct Probability(f64);

impl TryFrom<f64> for Probability {
    type Error = InputError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Probability {
    /// Boundary constructor: rejects NaN and values outside [0, 1].
    /// An out-of-range probability is a caller error, never silently clamped.
    pub fn new(value: f64) -> Result<Self, InputError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Probability(value))
        } else {
            Err(InputError::ProbabilityOutOfRange(value))
        }
    }

    /// Clamp a probability produced by internal adjustment chains
    /// (shielding × aging × underwriter factor) back into [0, 1].
    pub fn clamped(value: f64) -> Self {
        debug_assert!(value.is_finite(), "non-finite probability {value}");
        Probability(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Physical radiation-shielding tier of an insured satellite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shielding {
    Hardened,
    Standard,
    #[serde(rename = "Light/Legacy")]
    LightLegacy,
}

impl Shielding {
    /// Match the labels used by upstream request payloads ("Hardened",
    /// "Standard", "Light/Legacy"). Unrecognised labels fall back to
    /// Standard, the same default the upstream request handler applies.
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_ascii_lowercase();
        if lower.contains("hardened") {
            Shielding::Hardened
        } else if lower.contains("light") || lower.contains("legacy") {
            Shielding::LightLegacy
        } else {
            Shielding::Standard
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Shielding::Hardened => "Hardened",
            Shielding::Standard => "Standard",
            Shielding::LightLegacy => "Light/Legacy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_new_accepts_domain_bounds() {
        assert!(GeomagIndex::new(0.0).is_ok());
        assert!(GeomagIndex::new(9.0).is_ok());
        assert!(GeomagIndex::new(6.33).is_ok());
    }

    #[test]
    fn index_new_rejects_out_of_domain() {
        assert!(GeomagIndex::new(-0.1).is_err());
        assert!(GeomagIndex::new(9.01).is_err());
        assert!(GeomagIndex::new(f64::NAN).is_err());
        assert!(GeomagIndex::new(f64::INFINITY).is_err());
    }

    #[test]
    fn index_clamped_caps_at_domain_bounds() {
        assert_eq!(GeomagIndex::clamped(11.0).value(), 9.0);
        assert_eq!(GeomagIndex::clamped(-2.0).value(), 0.0);
        assert_eq!(GeomagIndex::clamped(4.5).value(), 4.5);
    }

    #[test]
    fn probability_new_rejects_out_of_domain() {
        assert!(Probability::new(1.000_001).is_err());
        assert!(Probability::new(-0.000_001).is_err());
        assert!(Probability::new(0.5).is_ok());
    }

    #[test]
    fn probability_clamped_stays_in_unit_interval() {
        assert_eq!(Probability::clamped(1.8).value(), 1.0);
        assert_eq!(Probability::clamped(-0.3).value(), 0.0);
    }

    #[test]
    fn shielding_from_label_matches_upstream_strings() {
        assert_eq!(Shielding::from_label("Hardened"), Shielding::Hardened);
        assert_eq!(Shielding::from_label("Light/Legacy"), Shielding::LightLegacy);
        assert_eq!(Shielding::from_label("legacy"), Shielding::LightLegacy);
        assert_eq!(Shielding::from_label("Standard"), Shielding::Standard);
        assert_eq!(Shielding::from_label("anything else"), Shielding::Standard);
    }
}
