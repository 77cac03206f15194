use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::types::GeomagIndex;

/// One timestamped forecast value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeomagneticSample {
    pub timestamp: DateTime<Utc>,
    pub index: GeomagIndex,
}

/// Ordered forecast series over a bounded horizon (typically the next 24 h
/// at 3-hour cadence, up to 8 samples).
///
/// Construction sorts by timestamp. Duplicate timestamps are not expected
/// from well-behaved feeds but must not break parsing: the last sample for
/// a given instant wins, matching how the upstream feed overwrites revised
/// periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastWindow {
    samples: Vec<GeomagneticSample>,
}

/// Aggregates over a whole window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowSummary {
    pub max: f64,
    pub min: f64,
    pub mean: f64,
}

/// Aggregates for one UTC calendar date within a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub max: f64,
    pub min: f64,
    pub mean: f64,
}

impl ForecastWindow {
    pub fn new(mut samples: Vec<GeomagneticSample>) -> Self {
        samples.sort_by_key(|s| s.timestamp);
        // Last-wins on duplicate timestamps: the sort is stable, so within a
        // duplicate group the feed's later sample overwrites the kept slot.
        samples.dedup_by(|later, kept| {
            if later.timestamp == kept.timestamp {
                *kept = *later;
                true
            } else {
                false
            }
        });
        ForecastWindow { samples }
    }

    pub fn samples(&self) -> &[GeomagneticSample] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Worst-case index: the maximum value in the window.
    pub fn max_index(&self) -> Option<GeomagIndex> {
        self.samples
            .iter()
            .map(|s| s.index)
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Sample at which the worst case occurs (first occurrence on ties).
    pub fn peak(&self) -> Option<GeomagneticSample> {
        let max = self.max_index()?;
        self.samples.iter().copied().find(|s| s.index == max)
    }

    pub fn summary(&self) -> Option<WindowSummary> {
        if self.samples.is_empty() {
            return None;
        }
        let values: Vec<f64> = self.samples.iter().map(|s| s.index.value()).collect();
        let max = values.iter().cloned().fold(f64::MIN, f64::max);
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(WindowSummary { max, min, mean })
    }

    /// Per-day aggregates, grouped by UTC calendar date, ascending.
    pub fn daily_summaries(&self) -> Vec<DailySummary> {
        let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for s in &self.samples {
            by_day.entry(s.timestamp.date_naive()).or_default().push(s.index.value());
        }
        by_day
            .into_iter()
            .map(|(date, values)| DailySummary {
                date,
                max: values.iter().cloned().fold(f64::MIN, f64::max),
                min: values.iter().cloned().fold(f64::MAX, f64::min),
                mean: values.iter().sum::<f64>() / values.len() as f64,
            })
            .collect()
    }

    /// Samples inside `[now, now + horizon_hours]`. May be empty — the
    /// series parser decides whether to approximate in that case.
    pub fn clipped(&self, now: DateTime<Utc>, horizon_hours: i64) -> ForecastWindow {
        let end = now + Duration::hours(horizon_hours);
        let samples = self
            .samples
            .iter()
            .copied()
            .filter(|s| s.timestamp >= now && s.timestamp <= end)
            .collect();
        ForecastWindow { samples }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample(hour: u32, value: f64) -> GeomagneticSample {
        GeomagneticSample {
            timestamp: Utc.with_ymd_and_hms(2025, 9, 26, hour, 0, 0).unwrap(),
            index: GeomagIndex::clamped(value),
        }
    }

    #[test]
    fn new_sorts_by_timestamp() {
        let w = ForecastWindow::new(vec![sample(9, 3.0), sample(0, 1.0), sample(3, 2.0)]);
        let hours: Vec<u32> = w.samples().iter().map(|s| s.timestamp.format("%H").to_string().parse().unwrap()).collect();
        assert_eq!(hours, vec![0, 3, 9]);
    }

    #[test]
    fn duplicate_timestamps_last_wins() {
        let mut dup = sample(3, 2.0);
        dup.index = GeomagIndex::clamped(7.0);
        let w = ForecastWindow::new(vec![sample(0, 1.0), sample(3, 2.0), dup]);
        assert_eq!(w.len(), 2);
        assert_eq!(w.samples()[1].index.value(), 7.0, "later sample must win");
    }

    #[test]
    fn max_index_is_the_worst_case() {
        let w = ForecastWindow::new(vec![sample(0, 2.33), sample(3, 6.67), sample(6, 4.0)]);
        assert_eq!(w.max_index().unwrap().value(), 6.67);
    }

    #[test]
    fn peak_reports_the_worst_case_slot() {
        let w = ForecastWindow::new(vec![sample(0, 2.33), sample(3, 6.67), sample(6, 4.0)]);
        let peak = w.peak().unwrap();
        assert_eq!(peak.timestamp, Utc.with_ymd_and_hms(2025, 9, 26, 3, 0, 0).unwrap());
    }

    #[test]
    fn empty_window_has_no_aggregates() {
        let w = ForecastWindow::new(vec![]);
        assert!(w.max_index().is_none());
        assert!(w.summary().is_none());
        assert!(w.daily_summaries().is_empty());
    }

    #[test]
    fn summary_matches_hand_computation() {
        let w = ForecastWindow::new(vec![sample(0, 2.0), sample(3, 4.0), sample(6, 6.0)]);
        let s = w.summary().unwrap();
        assert_eq!(s.max, 6.0);
        assert_eq!(s.min, 2.0);
        assert!((s.mean - 4.0).abs() < 1e-12);
    }

    #[test]
    fn daily_summaries_group_by_utc_date() {
        let day2 = GeomagneticSample {
            timestamp: Utc.with_ymd_and_hms(2025, 9, 27, 0, 0, 0).unwrap(),
            index: GeomagIndex::clamped(8.0),
        };
        let w = ForecastWindow::new(vec![sample(0, 2.0), sample(21, 4.0), day2]);
        let daily = w.daily_summaries();
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2025, 9, 26).unwrap());
        assert_eq!(daily[0].max, 4.0);
        assert_eq!(daily[1].max, 8.0);
    }

    #[test]
    fn clipped_keeps_only_the_horizon() {
        let w = ForecastWindow::new(vec![sample(0, 2.0), sample(12, 4.0), sample(21, 6.0)]);
        let now = Utc.with_ymd_and_hms(2025, 9, 26, 10, 0, 0).unwrap();
        let clipped = w.clipped(now, 6);
        assert_eq!(clipped.len(), 1);
        assert_eq!(clipped.samples()[0].index.value(), 4.0);
    }

    #[test]
    fn clipped_outside_horizon_is_empty_not_zeroed() {
        let w = ForecastWindow::new(vec![sample(0, 2.0)]);
        let now = Utc.with_ymd_and_hms(2025, 9, 28, 0, 0, 0).unwrap();
        assert!(w.clipped(now, 24).is_empty());
    }
}
