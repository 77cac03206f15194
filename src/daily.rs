use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ParseError;
use crate::types::GeomagIndex;

/// Most per-period values a daily record carries.
const PERIODS_PER_DAY: usize = 8;

/// Integer groups preceding the planetary ap value in the known feed
/// layout. A fixed assumption about the upstream column order, not
/// something inferred per line.
const AP_CANDIDATE_OFFSET: usize = 3;

/// Upper bound for plausible ap values; also excludes the -1 the feed
/// uses for missing data.
const AP_MAX: i32 = 400;

/// One parsed daily-indices record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyIndices {
    pub date: NaiveDate,
    /// Planetary daily ap value (third integer group after the date).
    pub planetary_ap: u16,
    /// Up to 8 three-hourly Kp values, in period order.
    pub kp_values: Vec<f64>,
}

impl DailyIndices {
    pub fn kp_max(&self) -> Option<f64> {
        self.kp_values.iter().cloned().reduce(f64::max)
    }

    pub fn kp_mean(&self) -> Option<f64> {
        if self.kp_values.is_empty() {
            None
        } else {
            Some(self.kp_values.iter().sum::<f64>() / self.kp_values.len() as f64)
        }
    }
}

/// Parse a daily-indices text table.
///
/// A physical line is a daily record iff its first three whitespace tokens
/// form a plausible `YYYY MM DD` triple; all other lines (headers, notes)
/// are skipped, not errored. Within a record the decimal tokens scanned
/// backward from line end are the canonical per-period Kp values, and the
/// third qualifying integer after the date is the planetary ap. A record
/// that carries Kp values but fewer than three integer candidates means
/// the upstream layout changed — that fails the whole parse loudly instead
/// of mis-assigning a value.
pub fn parse(text: &str) -> Result<Vec<DailyIndices>, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyFeed);
    }

    let mut days = Vec::new();
    for line in text.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            continue;
        }
        let Some(date) = date_triple(&parts) else {
            continue;
        };

        let kp_values = scan_kp_decimals(&parts[3..]);
        if kp_values.is_empty() {
            // Date-shaped line with no decimal columns — not a record in
            // the known layout.
            continue;
        }

        let Some(planetary_ap) = third_integer_candidate(&parts[3..]) else {
            return Err(ParseError::PlanetaryApLayout { date });
        };

        days.push(DailyIndices { date, planetary_ap, kp_values });
    }

    if days.is_empty() {
        return Err(ParseError::NoUsableValues);
    }
    days.sort_by_key(|d| d.date);
    Ok(days)
}

/// Parse an operator-style Kp token: `"5"`, `"5+"`, `"5-"`, `"5o"` (NOAA
/// thirds notation), or a plain decimal. Returns values inside [0, 9] only.
pub fn parse_kp_token(token: &str) -> Option<f64> {
    let token = token.trim();
    let b = token.as_bytes();
    if b.len() <= 2 && !b.is_empty() && b[0].is_ascii_digit() && !b.get(1).is_some_and(|c| c.is_ascii_digit()) {
        let base = f64::from(b[0] - b'0');
        let value = match b.get(1) {
            None | Some(b'o') => base,
            Some(b'+') => base + 1.0 / 3.0,
            Some(b'-') => base - 1.0 / 3.0,
            Some(_) => return None,
        };
        return GeomagIndex::in_domain(value).then_some(value);
    }
    token.parse::<f64>().ok().filter(|v| GeomagIndex::in_domain(*v))
}

/// `YYYY MM DD` gate: year ≥ 1900 and a real calendar date.
fn date_triple(parts: &[&str]) -> Option<NaiveDate> {
    let year: i32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let day: u32 = parts[2].parse().ok()?;
    if year < 1900 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Decimal tokens (containing a literal point) in [0, 9], scanned backward
/// from line end — the Kp columns sit after all the integer K-index and ap
/// columns. The backward scan is reversed to restore period order.
fn scan_kp_decimals(parts: &[&str]) -> Vec<f64> {
    let mut values: Vec<f64> = Vec::with_capacity(PERIODS_PER_DAY);
    for token in parts.iter().rev() {
        if !token.contains('.') {
            continue;
        }
        if let Ok(v) = token.parse::<f64>()
            && GeomagIndex::in_domain(v)
        {
            values.push(v);
            if values.len() == PERIODS_PER_DAY {
                break;
            }
        }
    }
    values.reverse();
    values
}

/// Third pure-integer token in [0, 400] after the date columns.
fn third_integer_candidate(parts: &[&str]) -> Option<u16> {
    let mut seen = 0usize;
    for token in parts {
        if token.contains('.') {
            continue;
        }
        if let Ok(v) = token.parse::<i32>()
            && (0..=AP_MAX).contains(&v)
        {
            seen += 1;
            if seen == AP_CANDIDATE_OFFSET {
                return Some(v as u16);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    // Layout: date, two leading ap-style integer groups, the planetary ap,
    // eight integer K-indices, then eight decimal Kp columns.
    const WELL_FORMED: &str = "\
#  Prepared by the Space Weather Prediction Desk
#  yyyy mm dd  Fredericksburg  College  Planetary  ...
2025 09 25     8              10        12   2 2 3 3 4 4 3 2   2.00 2.33 2.67 3.00 3.67 4.00 3.33 2.33
2025 09 26    12              15        27   3 4 5 5 6 6 5 4   3.33 4.00 4.67 5.00 5.67 6.33 5.00 4.33
";

    #[test]
    fn record_lines_parse_date_ap_and_kp_columns() {
        let days = parse(WELL_FORMED).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2025, 9, 26).unwrap());
        assert_eq!(days[1].planetary_ap, 27);
        assert_eq!(days[1].kp_values.len(), 8);
        assert_eq!(days[1].kp_values[0], 3.33);
        assert_eq!(days[1].kp_max(), Some(6.33));
    }

    #[test]
    fn backward_scan_preserves_period_order() {
        let days = parse(WELL_FORMED).unwrap();
        assert_eq!(
            days[0].kp_values,
            vec![2.00, 2.33, 2.67, 3.00, 3.67, 4.00, 3.33, 2.33]
        );
    }

    #[test]
    fn header_and_note_lines_are_skipped_not_errored() {
        let days = parse(WELL_FORMED).unwrap();
        // Only the two record lines survive the date gate.
        assert_eq!(days.len(), 2);
    }

    #[test]
    fn implausible_date_triples_fail_the_gate() {
        let text = "\
1850 01 01 8 10 12 2.00 2.33 2.67
2025 02 31 8 10 12 2.00 2.33 2.67
2025 09 26 8 10 12 2.00 2.33 2.67
";
        let days = parse(text).unwrap();
        assert_eq!(days.len(), 1, "pre-1900 and Feb 31 lines must be skipped");
    }

    #[test]
    fn changed_ap_layout_fails_loudly() {
        // Kp decimals present but only two integer groups before them.
        let text = "2025 09 26 8 10 2.00 2.33 2.67\n";
        let err = parse(text).unwrap_err();
        assert_eq!(
            err,
            ParseError::PlanetaryApLayout { date: NaiveDate::from_ymd_opt(2025, 9, 26).unwrap() }
        );
    }

    #[test]
    fn missing_data_markers_do_not_count_as_ap_candidates() {
        // -1 is the feed's missing-data marker; it must not satisfy the
        // three-candidate layout check.
        let text = "2025 09 26 -1 -1 -1 2.00 2.33 2.67\n";
        assert!(matches!(parse(text), Err(ParseError::PlanetaryApLayout { .. })));
    }

    #[test]
    fn empty_feed_fails() {
        assert_eq!(parse(""), Err(ParseError::EmptyFeed));
    }

    #[test]
    fn feed_with_no_record_lines_fails() {
        assert_eq!(parse("# header only\n# nothing else\n"), Err(ParseError::NoUsableValues));
    }

    #[test]
    fn days_are_sorted_ascending() {
        let text = "\
2025 09 26 12 15 27 3.33 4.00
2025 09 25 8 10 12 2.00 2.33
";
        let days = parse(text).unwrap();
        assert!(days[0].date < days[1].date);
    }

    // ── parse_kp_token ────────────────────────────────────────────────────

    #[test]
    fn kp_token_thirds_notation() {
        assert_eq!(parse_kp_token("3o"), Some(3.0));
        assert!((parse_kp_token("3+").unwrap() - (3.0 + 1.0 / 3.0)).abs() < 1e-12);
        assert!((parse_kp_token("3-").unwrap() - (3.0 - 1.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn kp_token_plain_forms() {
        assert_eq!(parse_kp_token("5"), Some(5.0));
        assert_eq!(parse_kp_token("6.33"), Some(6.33));
        assert_eq!(parse_kp_token(" 4.67 "), Some(4.67));
    }

    #[test]
    fn kp_token_rejects_out_of_domain_and_garbage() {
        assert_eq!(parse_kp_token("9+"), None, "9⅓ is outside the index domain");
        assert_eq!(parse_kp_token("10"), None);
        assert_eq!(parse_kp_token("-1"), None);
        assert_eq!(parse_kp_token(""), None);
        assert_eq!(parse_kp_token("abc"), None);
    }
}
