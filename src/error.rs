use chrono::NaiveDate;
use thiserror::Error;

/// Parse-level failures. Deterministic given the same payload, so the
/// orchestrator never retries these — it moves to the next parsing
/// strategy or source instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("feed text is empty")]
    EmptyFeed,

    #[error("found {found} of 8 forecast periods and no fallback recovered a series")]
    PeriodsIncomplete { found: usize },

    #[error("time-series header is missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("time-series payload has no records")]
    NoRecords,

    #[error("no usable numeric values in the payload")]
    NoUsableValues,

    /// The daily-indices feed carries exactly three integer groups before
    /// the planetary ap value. Fewer on a record line means the upstream
    /// column layout changed; guessing would silently mis-assign values.
    #[error("daily-indices layout changed: record for {date} has fewer than 3 integer ap candidates")]
    PlanetaryApLayout { date: NaiveDate },

    #[error("malformed JSON payload: {0}")]
    Json(String),
}

/// Feed-level failures, classified for the orchestrator's fallback chain.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Source unreachable or no payload within its timeout. Transient:
    /// retried with bounded backoff before falling through.
    #[error("source '{src}' unavailable: {detail}")]
    Unavailable { src: String, detail: String },

    /// Payload fetched but unusable. Deterministic: fall through to the
    /// next source without retrying.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Every configured source failed. Forecast data is unavailable — the
    /// caller must not substitute a zero index.
    #[error("all {attempted} forecast sources exhausted")]
    Exhausted { attempted: usize },
}

/// Caller-supplied values outside their domain, rejected at the API
/// boundary. Clamping past this point (risk-index cap, probability clamp
/// after adjustments) is a modeled domain rule, not error recovery.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum InputError {
    #[error("geomagnetic index {0} outside [0, 9]")]
    IndexOutOfRange(f64),

    #[error("probability {0} outside [0, 1]")]
    ProbabilityOutOfRange(f64),

    #[error("asset value {0} must be positive and finite (millions USD)")]
    InvalidAssetValue(f64),

    #[error("adjustment factor {0} must be positive and finite")]
    InvalidAdjustmentFactor(f64),
}

/// Top-level failure of one pricing request. A REJECTED or MODIFIED quote
/// is a successful pricing outcome, never one of these.
#[derive(Error, Debug)]
pub enum PricingError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Input(#[from] InputError),
}
