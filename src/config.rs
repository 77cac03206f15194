use serde::{Deserialize, Serialize};

use crate::portfolio::InsuredAsset;
use crate::risk::{AGGRESSIVE, LogisticCurve, RiskIndexPolicy};
use crate::types::Shielding;

/// Actuarial parameters for one pricing run. Supplied by the caller and
/// never mutated by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskParameters {
    /// Profit load on the expected loss (0.20 = 20 %).
    pub profit_margin: f64,
    /// Flat administrative fee added to every base premium.
    pub base_fee_usd: f64,
    /// Bump/round/cap policy for the worst-case index.
    pub index_policy: RiskIndexPolicy,
    /// Index-to-probability curve preset.
    pub curve: LogisticCurve,
    pub hardened_multiplier: f64,
    pub standard_multiplier: f64,
    pub light_legacy_multiplier: f64,
    /// Linear risk growth per year in service (0.015 = +1.5 %/yr).
    pub aging_rate_per_year: f64,
}

impl RiskParameters {
    /// Production defaults.
    pub fn canonical() -> Self {
        RiskParameters {
            profit_margin: 0.20,
            base_fee_usd: 10_000.0,
            index_policy: RiskIndexPolicy { bump: 1.0, round_bump_up: true, cap: 9.0 },
            curve: AGGRESSIVE,
            hardened_multiplier: 0.55,
            standard_multiplier: 1.0,
            light_legacy_multiplier: 1.35,
            aging_rate_per_year: 0.015,
        }
    }

    pub fn shielding_multiplier(&self, shielding: Shielding) -> f64 {
        match shielding {
            Shielding::Hardened => self.hardened_multiplier,
            Shielding::Standard => self.standard_multiplier,
            Shielding::LightLegacy => self.light_legacy_multiplier,
        }
    }
}

/// Retry policy for transient source failures. Parse failures are never
/// retried — they are deterministic given the same payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Seed for backoff jitter, fixed so a run's wall-clock behaviour is
    /// reproducible. Quote numerics never depend on it.
    pub jitter_seed: u64,
}

impl RetryPolicy {
    pub fn canonical() -> Self {
        RetryPolicy { max_attempts: 3, base_delay_ms: 250, max_delay_ms: 2_000, jitter_seed: 42 }
    }
}

/// Orchestrator configuration: one forecast horizon, one set of actuarial
/// parameters, one retry policy, one cache TTL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Forecast horizon in hours (24-hour policies price off the next 24 h).
    pub horizon_hours: i64,
    pub risk: RiskParameters,
    pub retry: RetryPolicy,
    /// How long a fetched window may be reused before a re-fetch.
    pub cache_ttl_secs: u64,
}

impl PipelineConfig {
    pub fn canonical() -> Self {
        PipelineConfig {
            horizon_hours: 24,
            risk: RiskParameters::canonical(),
            retry: RetryPolicy::canonical(),
            cache_ttl_secs: 600,
        }
    }
}

/// Built-in demonstration book used by the binaries when no portfolio file
/// is supplied. Values in millions USD; total exposure $825M.
pub fn canonical_portfolio() -> Vec<InsuredAsset> {
    let asset = |name: &str, value_millions: f64| InsuredAsset {
        name: Some(name.to_string()),
        value_millions,
    };
    vec![
        asset("AuroraSat-3 (broadcast)", 150.0),
        asset("Meridian-9 (comms relay)", 220.0),
        asset("Polaris Weather East", 85.0),
        asset("Equator Express 2 (transponder lease)", 250.0),
        asset("Northlink Legacy 1", 120.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_parameters_match_the_production_model() {
        let p = RiskParameters::canonical();
        assert_eq!(p.profit_margin, 0.20);
        assert_eq!(p.base_fee_usd, 10_000.0);
        assert_eq!(p.curve.midpoint, 7.0);
        assert_eq!(p.index_policy.bump, 1.0);
        assert!(p.index_policy.round_bump_up);
        assert_eq!(p.index_policy.cap, 9.0);
    }

    #[test]
    fn shielding_multipliers_bracket_standard() {
        let p = RiskParameters::canonical();
        assert!(p.shielding_multiplier(Shielding::Hardened) < 1.0);
        assert_eq!(p.shielding_multiplier(Shielding::Standard), 1.0);
        assert!(p.shielding_multiplier(Shielding::LightLegacy) > 1.0);
    }

    #[test]
    fn canonical_portfolio_totals_825_million() {
        let total: f64 = canonical_portfolio().iter().map(|a| a.value_millions).sum();
        assert_eq!(total, 825.0);
    }

    #[test]
    fn risk_parameters_round_trip_through_json() {
        let p = RiskParameters::canonical();
        let json = serde_json::to_string(&p).unwrap();
        let back: RiskParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
