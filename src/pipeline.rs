use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::breakdown::{self, ParseStrategy};
use crate::config::{PipelineConfig, RetryPolicy};
use crate::daily;
use crate::error::{FeedError, InputError, ParseError, PricingError};
use crate::forecast::{ForecastWindow, GeomagneticSample};
use crate::portfolio::{self, InsuredAsset, PortfolioAssessment};
use crate::pricing::{self, PricingResult};
use crate::risk::RiskAssessment;
use crate::series;
use crate::types::{GeomagIndex, Shielding};

/// Payload shape a source produces, selecting the parser applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeedKind {
    /// 3-day / 3-hourly plain-text breakdown.
    BreakdownText,
    /// JSON array-of-arrays time series.
    JsonSeries,
    /// Daily-indices plain-text table.
    DailyIndices,
}

/// One upstream forecast source. `fetch` is the single blocking call in the
/// pipeline; implementations own its timeout and return `Unavailable` when
/// the bound is exceeded.
pub trait FeedSource {
    fn name(&self) -> &str;
    fn kind(&self) -> FeedKind;
    fn fetch(&self) -> Result<String, FeedError>;
}

/// Where the priced index came from. Attached to every quote so the number
/// is auditable back to a source, a parse strategy, or a replayed event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IndexProvenance {
    Feed {
        source: String,
        kind: FeedKind,
        /// Breakdown-text extraction level, when that parser ran.
        strategy: Option<ParseStrategy>,
        /// Forecast slot at which the worst case occurs.
        peak_at: Option<DateTime<Utc>>,
    },
    HistoricalReplay {
        label: String,
        date: NaiveDate,
    },
    ManualOverride,
}

/// One policy-pricing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRequest {
    pub asset_value_millions: f64,
    pub shielding_level: Shielding,
    pub years_in_orbit: u32,
    /// Underwriter's human-in-the-loop multiplier on the assessed
    /// probability. 1.0 means no change.
    pub adjustment_factor: f64,
}

impl PricingRequest {
    fn validate(&self) -> Result<(), InputError> {
        if !self.asset_value_millions.is_finite() || self.asset_value_millions <= 0.0 {
            return Err(InputError::InvalidAssetValue(self.asset_value_millions));
        }
        if !self.adjustment_factor.is_finite() || self.adjustment_factor <= 0.0 {
            return Err(InputError::InvalidAdjustmentFactor(self.adjustment_factor));
        }
        Ok(())
    }
}

/// Historical-replay stand-in for live feed data. The rest of the pipeline
/// consumes the fixed index identically; label and date are provenance
/// metadata only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayEvent {
    pub index: GeomagIndex,
    pub label: String,
    pub date: NaiveDate,
}

/// Full output of one pricing request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteReport {
    pub worst_case_index: GeomagIndex,
    /// Worst case after the bump/cap safety margin.
    pub risk_index: GeomagIndex,
    pub provenance: IndexProvenance,
    pub individual: RiskAssessment,
    pub portfolio: PortfolioAssessment,
    pub pricing: PricingResult,
}

/// A fetched window with its provenance and fetch time, reused until the
/// TTL lapses or `refresh` is called. Owned by the pipeline — there is no
/// process-global feed state.
struct CachedWindow {
    window: ForecastWindow,
    provenance: IndexProvenance,
    fetched_at: Instant,
}

/// Sequences feed acquisition, risk transform, portfolio aggregation and
/// premium calculation for one pricing request at a time.
pub struct Pipeline {
    config: PipelineConfig,
    sources: Vec<Box<dyn FeedSource>>,
    cache: Option<CachedWindow>,
}

impl Pipeline {
    /// `sources` is the fallback chain, most authoritative first. They are
    /// attempted sequentially so fallback order stays deterministic and a
    /// success stops further fetching.
    pub fn new(config: PipelineConfig, sources: Vec<Box<dyn FeedSource>>) -> Self {
        Pipeline { config, sources, cache: None }
    }

    /// Drop the cached window; the next request re-fetches.
    pub fn refresh(&mut self) {
        self.cache = None;
    }

    /// Price one policy from live feed data.
    pub fn price(
        &mut self,
        request: &PricingRequest,
        book: &[InsuredAsset],
        now: DateTime<Utc>,
    ) -> Result<QuoteReport, PricingError> {
        request.validate()?;
        let (window, provenance) = self.acquire_window(now)?;
        let worst_case = window
            .max_index()
            .ok_or(FeedError::Parse(ParseError::NoUsableValues))?;
        Ok(self.quote(request, book, worst_case, provenance))
    }

    /// Price one policy against a fixed historical event instead of live
    /// feed data.
    pub fn price_replay(
        &self,
        request: &PricingRequest,
        book: &[InsuredAsset],
        replay: &ReplayEvent,
    ) -> Result<QuoteReport, PricingError> {
        request.validate()?;
        let provenance = IndexProvenance::HistoricalReplay {
            label: replay.label.clone(),
            date: replay.date,
        };
        Ok(self.quote(request, book, replay.index, provenance))
    }

    /// Price one policy from an operator-supplied index value.
    pub fn price_fixed(
        &self,
        request: &PricingRequest,
        book: &[InsuredAsset],
        index: GeomagIndex,
    ) -> Result<QuoteReport, PricingError> {
        request.validate()?;
        Ok(self.quote(request, book, index, IndexProvenance::ManualOverride))
    }

    fn quote(
        &self,
        request: &PricingRequest,
        book: &[InsuredAsset],
        worst_case: GeomagIndex,
        provenance: IndexProvenance,
    ) -> QuoteReport {
        let params = &self.config.risk;
        let risk_index = params.index_policy.apply(worst_case);
        // The book and the new asset share the storm, not the asset
        // adjustments: PML uses the raw curve probability, the individual
        // assessment layers shielding/aging/underwriter factors on top.
        let shared_probability = params.curve.anomaly_probability(risk_index);
        let individual = RiskAssessment::assess(
            risk_index,
            request.shielding_level,
            request.years_in_orbit,
            request.adjustment_factor,
            params,
        );
        let portfolio = portfolio::assess(book, shared_probability);
        let pricing = pricing::price(
            individual.incident_probability,
            request.asset_value_millions,
            portfolio.strategic_recommendation,
            params,
        )
        .expect("request validated before quoting");
        info!(
            "quoted: worst-case {:.2} -> risk index {:.2}, p={:.4}, {:?}, premium ${:.2}",
            worst_case.value(),
            risk_index.value(),
            individual.incident_probability.value(),
            pricing.policy_status,
            pricing.final_premium_usd,
        );
        QuoteReport { worst_case_index: worst_case, risk_index, provenance, individual, portfolio, pricing }
    }

    /// Walk the source chain until one yields a non-empty window. Each
    /// source gets its own retry budget for transient failures; parse
    /// failures fall straight through to the next source.
    fn acquire_window(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<(ForecastWindow, IndexProvenance), FeedError> {
        let ttl = Duration::from_secs(self.config.cache_ttl_secs);
        if let Some(cached) = &self.cache
            && cached.fetched_at.elapsed() < ttl
        {
            debug!("serving cached forecast window");
            return Ok((cached.window.clone(), cached.provenance.clone()));
        }

        let mut acquired: Option<(ForecastWindow, IndexProvenance)> = None;
        for source in &self.sources {
            match try_source(source.as_ref(), &self.config, now) {
                Ok((window, provenance)) => {
                    info!("forecast acquired from '{}' ({} samples)", source.name(), window.len());
                    acquired = Some((window, provenance));
                    break;
                }
                Err(e) => warn!("source '{}' failed: {e}", source.name()),
            }
        }

        let Some((window, provenance)) = acquired else {
            return Err(FeedError::Exhausted { attempted: self.sources.len() });
        };
        self.cache = Some(CachedWindow {
            window: window.clone(),
            provenance: provenance.clone(),
            fetched_at: Instant::now(),
        });
        Ok((window, provenance))
    }
}

fn try_source(
    source: &dyn FeedSource,
    config: &PipelineConfig,
    now: DateTime<Utc>,
) -> Result<(ForecastWindow, IndexProvenance), FeedError> {
    let payload = fetch_with_retry(source, &config.retry)?;
    let kind = source.kind();
    let (window, strategy) = match kind {
        FeedKind::BreakdownText => {
            let parsed = breakdown::parse(&payload)?;
            let day_start = now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .expect("midnight is always valid")
                .and_utc();
            (parsed.first_day_window(day_start), Some(parsed.strategy))
        }
        FeedKind::JsonSeries => (series::parse(&payload, now, config.horizon_hours)?, None),
        FeedKind::DailyIndices => (latest_daily_window(&payload)?, None),
    };
    if window.is_empty() {
        return Err(ParseError::NoUsableValues.into());
    }
    let provenance = IndexProvenance::Feed {
        source: source.name().to_string(),
        kind,
        strategy,
        peak_at: window.peak().map(|s| s.timestamp),
    };
    Ok((window, provenance))
}

/// Most recent daily-indices record as a 3-hourly window. The daily table
/// is historical rather than forward-looking, which is why it sits last in
/// the fallback chain.
fn latest_daily_window(payload: &str) -> Result<ForecastWindow, FeedError> {
    let days = daily::parse(payload)?;
    let latest = days.last().expect("daily::parse returns at least one record");
    let day_start = latest
        .date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc();
    let samples = latest
        .kp_values
        .iter()
        .enumerate()
        .map(|(slot, &v)| GeomagneticSample {
            timestamp: day_start + chrono::Duration::hours(3 * slot as i64),
            index: GeomagIndex::clamped(v),
        })
        .collect();
    Ok(ForecastWindow::new(samples))
}

/// Bounded exponential backoff with seeded jitter for transient failures.
/// Deterministic (parse-class) failures propagate immediately.
fn fetch_with_retry(source: &dyn FeedSource, policy: &RetryPolicy) -> Result<String, FeedError> {
    let mut rng = ChaCha20Rng::seed_from_u64(policy.jitter_seed);
    let mut last_err = FeedError::Unavailable {
        src: source.name().to_string(),
        detail: "no fetch attempted".to_string(),
    };
    for attempt in 0..policy.max_attempts.max(1) {
        if attempt > 0 {
            let backoff = policy
                .base_delay_ms
                .saturating_mul(1 << (attempt - 1))
                .min(policy.max_delay_ms);
            let jitter = if backoff > 0 { rng.random_range(0..=backoff / 4) } else { 0 };
            debug!("retrying '{}' after {} ms (attempt {})", source.name(), backoff + jitter, attempt + 1);
            std::thread::sleep(Duration::from_millis(backoff + jitter));
        }
        match source.fetch() {
            Ok(payload) => return Ok(payload),
            Err(e @ FeedError::Unavailable { .. }) => {
                warn!("fetch attempt {} on '{}' failed: {e}", attempt + 1, source.name());
                last_err = e;
            }
            Err(other) => return Err(other),
        }
    }
    Err(last_err)
}
