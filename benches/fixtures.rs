//! Shared feed fixtures for the parser benchmarks.

/// Well-formed 3-day breakdown text, as issued.
pub const BREAKDOWN_CLEAN: &str = "\
:Product: 3-Day Forecast
:Issued: 2025 Sep 26 1230 UTC
# Prepared by the Space Weather Prediction Desk
NOAA Kp index breakdown Sep 26-Sep 28 2025

             Sep 26       Sep 27       Sep 28
00-03UT       2.33         3.00         2.67
03-06UT       2.00         2.67         2.33
06-09UT       1.67         2.33         2.00
09-12UT       3.33         3.67         3.00
12-15UT       4.00         4.33         3.67
15-18UT       5.67         5.00         4.33
18-21UT       6.33         5.67         5.00
21-00UT       4.67         4.00         3.67

Rationale: G2 storm levels likely late on day one.
";

/// The same grid with the delimiter inconsistencies seen in the wild.
pub const BREAKDOWN_MESSY: &str = "\
junk preamble 2025, more text
00-03UT,2.33/3.00\t2.67
03-06UT\t2.00, 2.67 / 2.33
06-09UT 1.67 2.33 2.00
09-12UT 3.33,3.67,3.00
12-15UT 4.00/4.33/3.67
15-18UT 5.67\t5.00\t4.33
18-21UT 6.33 5.67 5.00
21-00UT 4.67 4.00 3.67
";

/// Structureless text that only the keyword-line fallback can recover.
pub const BREAKDOWN_FALLBACK: &str = "\
forecast bulletin (experimental format)
kp values next 24h: 2.33 2.00 1.67 3.33 4.00 5.67 6.33 4.67
no period grid in this revision
";

/// Daily-indices table: two months of records.
pub fn daily_text() -> String {
    let mut out = String::from("#  yyyy mm dd  indices\n");
    for day in 1..=60u32 {
        let month = 7 + (day - 1) / 30;
        let dom = (day - 1) % 30 + 1;
        out.push_str(&format!(
            "2025 {month:02} {dom:02}  8 10 12  2 2 3 3 4 4 3 2  2.00 2.33 2.67 3.00 3.67 4.00 3.33 2.33\n"
        ));
    }
    out
}

/// JSON array-of-arrays series: `records` rows at 3-hour cadence.
pub fn series_json(records: usize) -> String {
    use chrono::{Duration, TimeZone, Utc};

    let start = Utc.with_ymd_and_hms(2025, 9, 26, 0, 0, 0).unwrap();
    let mut rows = vec![r#"["time_tag","kp","observed"]"#.to_string()];
    for i in 0..records {
        let stamp = start + Duration::hours(3 * i as i64);
        let kp = 2.0 + (i % 7) as f64 * 0.67;
        rows.push(format!(
            r#"["{}","{kp:.2}","predicted"]"#,
            stamp.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    format!("[{}]", rows.join(","))
}
