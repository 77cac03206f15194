use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use log::debug;
use serde::Serialize;

use crate::error::ParseError;
use crate::forecast::{ForecastWindow, GeomagneticSample};
use crate::types::GeomagIndex;

/// The eight 3-hour UT periods of a forecast day, in fixed order.
pub const PERIOD_LABELS: [&str; 8] = [
    "00-03UT", "03-06UT", "06-09UT", "09-12UT", "12-15UT", "15-18UT", "18-21UT", "21-00UT",
];

/// Day columns per period in the 3-day grid.
const MAX_VALUES_PER_PERIOD: usize = 3;

/// Which extraction level produced the series. Carried through to quote
/// provenance so a priced index is auditable back to its parse path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseStrategy {
    /// Full 8-period grid located via the period labels.
    Structured,
    /// Fallback A: numeric run taken from a single line naming the index.
    KeywordLine,
    /// Fallback B: first in-range numbers anywhere in the text. Least
    /// precise, last resort.
    BareTokens,
}

/// One period row of the grid. `values` holds the day columns left to
/// right, so `values[0]` is the next-24h column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRow {
    pub label: &'static str,
    pub values: Vec<f64>,
}

/// Parsed 3-day breakdown forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownForecast {
    pub rows: Vec<PeriodRow>,
    pub strategy: ParseStrategy,
    /// ":Issued:" header timestamp, when present.
    pub issued: Option<DateTime<Utc>>,
    /// Headline "greatest expected 3 hr Kp" value, when present.
    pub expected_max: Option<f64>,
}

impl BreakdownForecast {
    /// First-day value of each recovered period: the next-24h series.
    pub fn first_day(&self) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.values.first().copied()).collect()
    }

    /// Next-24h series as a window at 3-hour cadence from `day_start`.
    /// Slot i covers hours [3i, 3i+3) of the forecast day.
    pub fn first_day_window(&self, day_start: DateTime<Utc>) -> ForecastWindow {
        let samples = self
            .rows
            .iter()
            .enumerate()
            .filter_map(|(slot, row)| {
                row.values.first().map(|&v| GeomagneticSample {
                    timestamp: day_start + Duration::hours(3 * slot as i64),
                    index: GeomagIndex::clamped(v),
                })
            })
            .collect();
        ForecastWindow::new(samples)
    }
}

/// Parse an upstream 3-day breakdown text.
///
/// The feed's formatting is not stable — delimiters, column spacing and
/// preamble change between issues — so extraction runs in three levels:
/// the structured 8-period grid, then a keyword-line scan (fallback A),
/// then a bare in-range token sweep (fallback B). Only when all three fail
/// is the forecast reported unavailable; a failure is never turned into a
/// series of zeros.
pub fn parse(text: &str) -> Result<BreakdownForecast, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyFeed);
    }

    let normalized = normalize(text);
    let issued = parse_issued(text);
    let expected_max = parse_expected_max(text);

    let (rows, strategy) = match parse_structured(&normalized) {
        Ok(rows) => (rows, ParseStrategy::Structured),
        Err(found) => {
            debug!("structured extraction found {found}/8 periods; trying fallbacks");
            if let Some(values) = parse_keyword_line(text) {
                (flat_rows(values), ParseStrategy::KeywordLine)
            } else if let Some(values) = parse_bare_tokens(&normalized) {
                (flat_rows(values), ParseStrategy::BareTokens)
            } else {
                return Err(ParseError::PeriodsIncomplete { found });
            }
        }
    };

    Ok(BreakdownForecast { rows, strategy, issued, expected_max })
}

/// Collapse delimiter characters (commas, tabs, slashes) and whitespace
/// runs into single spaces, flattening the text into one token stream.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == ',' || c == '/' || c.is_whitespace() {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
    out.truncate(out.trim_end().len());
    out
}

/// `DD-DDUT` shape check. Label-shaped tokens also terminate value
/// collection for the preceding period.
fn is_period_shape(token: &str) -> bool {
    let b = token.as_bytes();
    b.len() == 7
        && b[0].is_ascii_digit()
        && b[1].is_ascii_digit()
        && b[2] == b'-'
        && b[3].is_ascii_digit()
        && b[4].is_ascii_digit()
        && b[5] == b'U'
        && b[6] == b'T'
}

/// Structured extraction: locate the first period label, discard the
/// preamble, then for each expected label in order collect the in-range
/// numeric tokens that follow it, stopping at the next label-shaped token.
/// Out-of-range numbers (years, ap values) are noise and are skipped, not
/// clamped. Errs with the count of periods recovered before failing.
fn parse_structured(normalized: &str) -> Result<Vec<PeriodRow>, usize> {
    let Some(start) = normalized.find(PERIOD_LABELS[0]) else {
        return Err(0);
    };
    let tokens: Vec<&str> = normalized[start..].split(' ').collect();

    let mut rows: Vec<PeriodRow> = Vec::with_capacity(PERIOD_LABELS.len());
    let mut cursor = 0usize;
    for &label in &PERIOD_LABELS {
        let Some(offset) = tokens[cursor..].iter().position(|t| *t == label) else {
            return Err(rows.len());
        };
        let pos = cursor + offset;

        let mut values = Vec::with_capacity(MAX_VALUES_PER_PERIOD);
        for token in &tokens[pos + 1..] {
            if is_period_shape(token) {
                break;
            }
            if values.len() == MAX_VALUES_PER_PERIOD {
                continue;
            }
            if let Ok(v) = token.parse::<f64>()
                && GeomagIndex::in_domain(v)
            {
                values.push(v);
            }
        }
        if values.is_empty() {
            return Err(rows.len());
        }
        rows.push(PeriodRow { label, values });
        cursor = pos + 1;
    }
    Ok(rows)
}

/// Fallback A: a single raw line naming the index ("kp", case-insensitive)
/// that carries a full 8-value run. Demanding all 8 keeps headline
/// sentences ("expected 3 hr Kp is 6.33") from being mistaken for the grid.
fn parse_keyword_line(text: &str) -> Option<Vec<f64>> {
    for line in text.lines() {
        if !line.to_ascii_lowercase().contains("kp") {
            continue;
        }
        let values: Vec<f64> = normalize(line)
            .split(' ')
            .filter_map(|t| t.parse::<f64>().ok())
            .filter(|v| GeomagIndex::in_domain(*v))
            .take(PERIOD_LABELS.len())
            .collect();
        if values.len() == PERIOD_LABELS.len() {
            return Some(values);
        }
    }
    None
}

/// Fallback B: every in-range numeric token of the whole normalized text,
/// first 8. Accepts a short series — any non-empty run beats total failure.
fn parse_bare_tokens(normalized: &str) -> Option<Vec<f64>> {
    let values: Vec<f64> = normalized
        .split(' ')
        .filter_map(|t| t.parse::<f64>().ok())
        .filter(|v| GeomagIndex::in_domain(*v))
        .take(PERIOD_LABELS.len())
        .collect();
    if values.is_empty() { None } else { Some(values) }
}

/// Wrap a flat fallback series into period rows, one value per slot.
fn flat_rows(values: Vec<f64>) -> Vec<PeriodRow> {
    values
        .into_iter()
        .zip(PERIOD_LABELS)
        .map(|(v, label)| PeriodRow { label, values: vec![v] })
        .collect()
}

/// ":Issued: 2025 Sep 26 1230 UTC" header line.
fn parse_issued(text: &str) -> Option<DateTime<Utc>> {
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix(":Issued:") {
            let rest = rest.trim().trim_end_matches("UTC").trim();
            if let Ok(dt) = NaiveDateTime::parse_from_str(rest, "%Y %b %d %H%M") {
                return Some(dt.and_utc());
            }
        }
    }
    None
}

/// Headline value from the "greatest expected 3 hr Kp" line: its first
/// decimal token inside the index domain. The decimal requirement keeps
/// the "3" of "3 hr" and stray day numbers out.
fn parse_expected_max(text: &str) -> Option<f64> {
    let line = text.lines().find(|l| l.contains("greatest expected 3 hr Kp"))?;
    line.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_ascii_digit()))
        .filter(|t| t.contains('.'))
        .filter_map(|t| t.parse::<f64>().ok())
        .find(|v| GeomagIndex::in_domain(*v))
}
