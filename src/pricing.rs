use serde::Serialize;

use crate::config::RiskParameters;
use crate::error::InputError;
use crate::portfolio::Recommendation;
use crate::types::Probability;

const MILLION: f64 = 1_000_000.0;

/// Premium share of asset value above which full coverage is rejected.
const REJECT_THRESHOLD: f64 = 0.50;
/// Premium share of asset value above which coverage is reduced.
const MODIFY_THRESHOLD: f64 = 0.15;
/// Premium cap, as a share of asset value, for modified and alternative
/// offers. Equal to the modify threshold: a capped quote sits exactly at
/// the economic limit.
const PREMIUM_CAP: f64 = 0.15;
/// Coverage of the alternative offer attached to a rejected full quote.
const ALTERNATIVE_COVERAGE: f64 = 0.50;
/// Deductibles, as shares of asset value.
const REJECTED_DEDUCTIBLE: f64 = 0.25;
const MODIFIED_DEDUCTIBLE: f64 = 0.10;

/// Economic-viability outcome of a quote. REJECTED and MODIFIED are
/// first-class results carrying an alternative offer, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyStatus {
    Approved,
    Modified,
    Rejected,
}

/// Terminal artifact of one pricing request. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingResult {
    pub base_premium_usd: f64,
    pub surcharge_multiplier: f64,
    /// Base premium with the portfolio surcharge applied, before the
    /// viability check.
    pub calculated_premium_usd: f64,
    pub final_premium_usd: f64,
    pub policy_status: PolicyStatus,
    pub coverage_fraction: f64,
    pub deductible_usd: f64,
}

/// Price one 24-hour policy.
///
/// `base = p · value · (1 + margin) + fee`, surcharged by the portfolio
/// recommendation tier, then checked against the economic-viability caps.
/// The probability is already validated by its type; the asset value is
/// validated here as the remaining boundary input.
pub fn price(
    probability: Probability,
    asset_value_millions: f64,
    recommendation: Recommendation,
    params: &RiskParameters,
) -> Result<PricingResult, InputError> {
    if !asset_value_millions.is_finite() || asset_value_millions <= 0.0 {
        return Err(InputError::InvalidAssetValue(asset_value_millions));
    }

    let value_usd = asset_value_millions * MILLION;
    let expected_loss = probability.value() * value_usd;
    let base_premium_usd = expected_loss * (1.0 + params.profit_margin) + params.base_fee_usd;
    let surcharge_multiplier = recommendation.surcharge_multiplier();
    let calculated_premium_usd = base_premium_usd * surcharge_multiplier;

    let result = if calculated_premium_usd > REJECT_THRESHOLD * value_usd {
        // Not economically viable at full coverage. Attach the partial-
        // coverage alternative instead of walking away with nothing.
        PricingResult {
            base_premium_usd,
            surcharge_multiplier,
            calculated_premium_usd,
            final_premium_usd: PREMIUM_CAP * value_usd,
            policy_status: PolicyStatus::Rejected,
            coverage_fraction: ALTERNATIVE_COVERAGE,
            deductible_usd: REJECTED_DEDUCTIBLE * value_usd,
        }
    } else if calculated_premium_usd > MODIFY_THRESHOLD * value_usd {
        let cap = PREMIUM_CAP * value_usd;
        PricingResult {
            base_premium_usd,
            surcharge_multiplier,
            calculated_premium_usd,
            final_premium_usd: cap,
            policy_status: PolicyStatus::Modified,
            // calculated > cap here, so the ratio is in (0, 1).
            coverage_fraction: cap / calculated_premium_usd,
            deductible_usd: MODIFIED_DEDUCTIBLE * value_usd,
        }
    } else {
        PricingResult {
            base_premium_usd,
            surcharge_multiplier,
            calculated_premium_usd,
            final_premium_usd: calculated_premium_usd,
            policy_status: PolicyStatus::Approved,
            coverage_fraction: 1.0,
            deductible_usd: 0.0,
        }
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> RiskParameters {
        RiskParameters::canonical()
    }

    /// Dollar amounts computed through f64 chains: equal to within a cent.
    fn assert_usd(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 0.01,
            "expected ${expected:.2}, got ${actual:.2}"
        );
    }

    #[test]
    fn severe_storm_quote_is_rejected_with_alternative_offer() {
        // p = 0.85 on a $400M asset under the high-surcharge tier:
        // base = 0.85 · 400e6 · 1.20 + 10_000 = $408,010,000
        // calculated = base · 2.5 = $1,020,025,000 > 50 % of value
        let result = price(
            Probability::clamped(0.85),
            400.0,
            Recommendation::HighSurcharge,
            &params(),
        )
        .unwrap();
        assert_usd(result.base_premium_usd, 408_010_000.0);
        assert_usd(result.calculated_premium_usd, 1_020_025_000.0);
        assert_eq!(result.policy_status, PolicyStatus::Rejected);
        assert_usd(result.final_premium_usd, 60_000_000.0);
        assert_eq!(result.coverage_fraction, 0.50);
        assert_usd(result.deductible_usd, 100_000_000.0);
    }

    #[test]
    fn moderately_expensive_quote_is_modified_proportionally() {
        // p = 0.10 on a $100M asset, continue tier:
        // calculated = 0.10 · 100e6 · 1.20 + 10_000 = $12,010,000
        // 15 % < 12.01 % — approved. Bump the tier to force modification:
        // ×1.75 = $21,017,500 which is 21 % of value.
        let result = price(
            Probability::clamped(0.10),
            100.0,
            Recommendation::ModerateSurcharge,
            &params(),
        )
        .unwrap();
        assert_eq!(result.policy_status, PolicyStatus::Modified);
        assert_usd(result.final_premium_usd, 15_000_000.0);
        let expected_coverage = 15_000_000.0 / 21_017_500.0;
        assert!((result.coverage_fraction - expected_coverage).abs() < 1e-9);
        assert_usd(result.deductible_usd, 10_000_000.0);
    }

    #[test]
    fn quiet_forecast_quote_is_approved_at_full_coverage() {
        let result =
            price(Probability::clamped(0.01), 250.0, Recommendation::Continue, &params()).unwrap();
        assert_eq!(result.policy_status, PolicyStatus::Approved);
        assert_eq!(result.coverage_fraction, 1.0);
        assert_eq!(result.deductible_usd, 0.0);
        // 0.01 · 250e6 · 1.20 + 10_000
        assert_usd(result.final_premium_usd, 3_010_000.0);
    }

    #[test]
    fn halt_tier_applies_the_five_x_surcharge() {
        let result =
            price(Probability::clamped(0.01), 250.0, Recommendation::HaltNewPolicies, &params())
                .unwrap();
        assert_eq!(result.surcharge_multiplier, 5.0);
        assert_eq!(result.calculated_premium_usd, result.base_premium_usd * 5.0);
    }

    #[test]
    fn pricing_is_idempotent_bit_for_bit() {
        let p = Probability::clamped(0.137);
        let a = price(p, 313.0, Recommendation::UrgentReinsurance, &params()).unwrap();
        let b = price(p, 313.0, Recommendation::UrgentReinsurance, &params()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.final_premium_usd.to_bits(), b.final_premium_usd.to_bits());
    }

    #[test]
    fn zero_probability_still_charges_the_base_fee() {
        let result =
            price(Probability::clamped(0.0), 100.0, Recommendation::Continue, &params()).unwrap();
        assert_eq!(result.final_premium_usd, params().base_fee_usd);
        assert_eq!(result.policy_status, PolicyStatus::Approved);
    }

    #[test]
    fn all_currency_outputs_are_non_negative() {
        for p in [0.0, 0.01, 0.2, 0.85, 1.0] {
            for tier in [
                Recommendation::Continue,
                Recommendation::ModerateSurcharge,
                Recommendation::HighSurcharge,
                Recommendation::UrgentReinsurance,
                Recommendation::HaltNewPolicies,
            ] {
                let r = price(Probability::clamped(p), 42.0, tier, &params()).unwrap();
                assert!(r.base_premium_usd >= 0.0);
                assert!(r.final_premium_usd >= 0.0);
                assert!(r.deductible_usd >= 0.0);
                assert!(r.coverage_fraction > 0.0 && r.coverage_fraction <= 1.0);
            }
        }
    }

    #[test]
    fn invalid_asset_value_is_rejected_at_the_boundary() {
        let p = Probability::clamped(0.1);
        assert!(price(p, 0.0, Recommendation::Continue, &params()).is_err());
        assert!(price(p, -5.0, Recommendation::Continue, &params()).is_err());
        assert!(price(p, f64::NAN, Recommendation::Continue, &params()).is_err());
    }
}
