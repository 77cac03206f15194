use serde::{Deserialize, Serialize};

use crate::types::Probability;

/// One insured satellite in the book. Caller-supplied, read-only input;
/// portfolio aggregation only needs the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuredAsset {
    #[serde(default)]
    pub name: Option<String>,
    pub value_millions: f64,
}

/// Strategic recommendation tiers, ordered by severity. The surcharge the
/// pricing desk applies grows monotonically with the tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    Continue,
    ModerateSurcharge,
    HighSurcharge,
    UrgentReinsurance,
    HaltNewPolicies,
}

impl Recommendation {
    /// Tier by PML / total-exposure ratio.
    pub fn from_loss_ratio(ratio: f64) -> Self {
        if ratio < 0.03 {
            Recommendation::Continue
        } else if ratio < 0.08 {
            Recommendation::ModerateSurcharge
        } else if ratio < 0.15 {
            Recommendation::HighSurcharge
        } else if ratio < 0.25 {
            Recommendation::UrgentReinsurance
        } else {
            Recommendation::HaltNewPolicies
        }
    }

    /// Premium multiplier the pricing desk applies for this tier.
    pub fn surcharge_multiplier(self) -> f64 {
        match self {
            Recommendation::Continue => 1.0,
            Recommendation::ModerateSurcharge => 1.75,
            Recommendation::HighSurcharge => 2.5,
            Recommendation::UrgentReinsurance => 3.0,
            Recommendation::HaltNewPolicies => 5.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Recommendation::Continue => "Continue Writing New Policies",
            Recommendation::ModerateSurcharge => "Apply Moderate Risk Surcharge",
            Recommendation::HighSurcharge => "Apply High Risk Surcharge",
            Recommendation::UrgentReinsurance => "Urgent Reinsurance Required",
            Recommendation::HaltNewPolicies => "Temporarily Halt New Policies",
        }
    }
}

/// Book-wide assessment. Always recomputable from the portfolio and the
/// shared probability; never mutated independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioAssessment {
    pub total_exposure_millions: f64,
    pub probable_maximum_loss_millions: f64,
    /// PML / exposure. Guarded: 0 for an empty or zero-value book.
    pub loss_ratio: f64,
    pub strategic_recommendation: Recommendation,
    pub reasoning: String,
}

/// Aggregate the book under one shared anomaly probability. A single
/// geomagnetic storm is a fully correlated event for every GEO asset, so
/// the same probability applies across the portfolio. Order-independent:
/// the sums are commutative.
pub fn assess(portfolio: &[InsuredAsset], probability: Probability) -> PortfolioAssessment {
    let p = probability.value();
    let total_exposure_millions: f64 = portfolio.iter().map(|a| a.value_millions).sum();
    let probable_maximum_loss_millions: f64 =
        portfolio.iter().map(|a| a.value_millions * p).sum();
    let loss_ratio = if total_exposure_millions > 0.0 {
        probable_maximum_loss_millions / total_exposure_millions
    } else {
        0.0
    };
    let strategic_recommendation = Recommendation::from_loss_ratio(loss_ratio);
    let reasoning = format!(
        "{} assets, total exposure ${:.1}M; PML ${:.1}M at shared probability {:.4} \
         ({:.1}% of exposure) -> {}",
        portfolio.len(),
        total_exposure_millions,
        probable_maximum_loss_millions,
        p,
        loss_ratio * 100.0,
        strategic_recommendation.label(),
    );
    PortfolioAssessment {
        total_exposure_millions,
        probable_maximum_loss_millions,
        loss_ratio,
        strategic_recommendation,
        reasoning,
    }
}
