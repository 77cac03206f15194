use serde::{Deserialize, Serialize};

use crate::config::RiskParameters;
use crate::types::{GeomagIndex, Probability, Shielding};

/// Logistic index-to-probability curve:
/// `p = 1 / (1 + e^(−k·(index − midpoint)))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticCurve {
    pub midpoint: f64,
    pub steepness: f64,
}

/// Early-model calibration: 50 % anomaly probability at index 5.5, so risk
/// prices up sooner. Used by the demo pricing model.
pub const CONSERVATIVE: LogisticCurve = LogisticCurve { midpoint: 5.5, steepness: 1.5 };

/// Production calibration: 50 % midpoint at index 7. GEO surface-charging
/// risk is negligible below 4 and grows rapidly above 5.
pub const AGGRESSIVE: LogisticCurve = LogisticCurve { midpoint: 7.0, steepness: 1.5 };

impl LogisticCurve {
    pub fn anomaly_probability(&self, index: GeomagIndex) -> Probability {
        let p = 1.0 / (1.0 + (-self.steepness * (index.value() - self.midpoint)).exp());
        Probability::clamped(p)
    }
}

/// Safety-margin policy applied to the worst-case index before it enters
/// the logistic curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskIndexPolicy {
    /// Additive safety margin on the worst-case index.
    pub bump: f64,
    /// Round the bumped value up to the next whole index step.
    pub round_bump_up: bool,
    /// Ceiling for the bumped index; never exceeds the domain maximum.
    pub cap: f64,
}

impl RiskIndexPolicy {
    /// Bump, optionally round up, then cap. A bump landing exactly on or
    /// past the cap clamps exactly at the cap.
    pub fn apply(&self, worst_case: GeomagIndex) -> GeomagIndex {
        let mut bumped = worst_case.value() + self.bump;
        if self.round_bump_up {
            bumped = bumped.ceil();
        }
        GeomagIndex::clamped(bumped.min(self.cap))
    }
}

/// Tier derived purely from the incident probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Moderate,
    High,
    Severe,
}

impl RiskCategory {
    pub fn from_probability(p: Probability) -> Self {
        let p = p.value();
        if p < 0.02 {
            RiskCategory::Low
        } else if p < 0.08 {
            RiskCategory::Moderate
        } else if p < 0.50 {
            RiskCategory::High
        } else {
            RiskCategory::Severe
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskCategory::Low => "Low",
            RiskCategory::Moderate => "Moderate",
            RiskCategory::High => "High",
            RiskCategory::Severe => "Severe",
        }
    }
}

/// Individual-asset risk assessment. Created fresh per pricing request;
/// never persisted across requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub incident_probability: Probability,
    pub risk_category: RiskCategory,
    /// Diagnostic narrative only — downstream math never reads it.
    pub reasoning: String,
}

impl RiskAssessment {
    /// Asset-level probability: curve output adjusted for shielding, years
    /// in service, and the underwriter's factor, clamped into [0, 1]. The
    /// clamp is a domain rule; out-of-range caller inputs are rejected
    /// before this point.
    pub fn assess(
        risk_index: GeomagIndex,
        shielding: Shielding,
        years_in_orbit: u32,
        adjustment_factor: f64,
        params: &RiskParameters,
    ) -> RiskAssessment {
        let base = params.curve.anomaly_probability(risk_index);
        let shield = params.shielding_multiplier(shielding);
        let aging = 1.0 + params.aging_rate_per_year * f64::from(years_in_orbit);
        let adjusted = Probability::clamped(base.value() * shield * aging * adjustment_factor);
        let risk_category = RiskCategory::from_probability(adjusted);
        let reasoning = format!(
            "risk index {:.2} -> base probability {:.4}; shielding {} x{:.2}, \
             {} yr in orbit x{:.3}, underwriter x{:.2} -> {:.4} ({})",
            risk_index.value(),
            base.value(),
            shielding.label(),
            shield,
            years_in_orbit,
            aging,
            adjustment_factor,
            adjusted.value(),
            risk_category.label(),
        );
        RiskAssessment { incident_probability: adjusted, risk_category, reasoning }
    }
}
