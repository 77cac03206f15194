use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, warn};
use serde_json::Value;

use crate::error::ParseError;
use crate::forecast::{ForecastWindow, GeomagneticSample};
use crate::types::GeomagIndex;

/// Column names of the upstream JSON time-series payload. The payload is an
/// array of arrays whose first row is the header.
const TIME_COLUMN: &str = "time_tag";
const INDEX_COLUMN: &str = "kp";

/// Forecast cadence of the upstream series, used to size the horizon
/// approximation when no record falls inside the requested window.
const CADENCE_HOURS: i64 = 3;

/// Parse a JSON array-of-arrays time series into a forecast window limited
/// to `[now, now + horizon_hours]`.
///
/// Records whose index value does not coerce to a number are dropped, not
/// defaulted. When the horizon filter leaves nothing (a stale payload),
/// the first `horizon_hours / 3` raw records stand in as an approximation
/// rather than failing the whole source.
pub fn parse(
    payload: &str,
    now: DateTime<Utc>,
    horizon_hours: i64,
) -> Result<ForecastWindow, ParseError> {
    let rows: Vec<Vec<Value>> =
        serde_json::from_str(payload).map_err(|e| ParseError::Json(e.to_string()))?;
    let Some((header, records)) = rows.split_first() else {
        return Err(ParseError::NoRecords);
    };
    if records.is_empty() {
        return Err(ParseError::NoRecords);
    }

    let time_col = column_position(header, TIME_COLUMN)?;
    let index_col = column_position(header, INDEX_COLUMN)?;

    let mut samples = Vec::with_capacity(records.len());
    for record in records {
        let Some(timestamp) = record.get(time_col).and_then(parse_timestamp) else {
            continue;
        };
        let Some(value) = record.get(index_col).and_then(coerce_numeric) else {
            continue;
        };
        // The index column is authoritative, so a slightly out-of-range
        // value is clamped into the domain rather than treated as noise.
        samples.push(GeomagneticSample { timestamp, index: GeomagIndex::clamped(value) });
    }
    if samples.is_empty() {
        return Err(ParseError::NoUsableValues);
    }

    let full = ForecastWindow::new(samples);
    let clipped = full.clipped(now, horizon_hours);
    let window = if clipped.is_empty() {
        let n = ((horizon_hours / CADENCE_HOURS).max(1) as usize).min(full.len());
        warn!(
            "no series records inside the {horizon_hours} h horizon; approximating with the first {n} records"
        );
        ForecastWindow::new(full.samples()[..n].to_vec())
    } else {
        clipped
    };

    if let Some(summary) = window.summary() {
        let daily = window.daily_summaries();
        debug!(
            "series window: {} samples over {} day(s), max {:.2} min {:.2} mean {:.2}",
            window.len(),
            daily.len(),
            summary.max,
            summary.min,
            summary.mean,
        );
    }
    Ok(window)
}

fn column_position(header: &[Value], name: &'static str) -> Result<usize, ParseError> {
    header
        .iter()
        .position(|col| col.as_str() == Some(name))
        .ok_or(ParseError::MissingColumn(name))
}

/// The feed emits `"YYYY-MM-DD HH:MM:SS"`; accept RFC 3339 as well.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?;
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc)))
}

/// Index values arrive as JSON numbers or numeric strings.
fn coerce_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
