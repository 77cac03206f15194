use chrono::NaiveDate;
use rayon::prelude::*;

use borealis::config::{self, PipelineConfig};
use borealis::pipeline::{Pipeline, PricingRequest, QuoteReport, ReplayEvent};
use borealis::portfolio::InsuredAsset;
use borealis::pricing::PolicyStatus;
use borealis::types::{GeomagIndex, Shielding};

/// Catalogued storms used to replay the pricing model against known severe
/// space-weather events.
const HISTORICAL_STORMS: [(&str, &str, f64); 7] = [
    ("Halloween Storm 2001", "2001-03-31", 8.67),
    ("November 2003 Solar Storm", "2003-11-20", 8.67),
    ("Bastille Day Storm 2004", "2004-07-27", 8.67),
    ("Superstorm November 2004", "2004-11-10", 8.67),
    ("August 2005 Solar Event", "2005-08-24", 8.67),
    ("March 2012 Storm", "2012-03-09", 8.00),
    ("St. Patrick's Day Storm 2015", "2015-03-17", 6.50),
];

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    let mut portfolio_path = "portfolio_data.json".to_string();
    let mut asset_value = 250.0_f64;
    let mut quiet = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--portfolio" => {
                i += 1;
                portfolio_path = args[i].clone();
            }
            "--value" => {
                i += 1;
                asset_value = args[i].parse().expect("--value requires a number (millions USD)");
            }
            "--quiet" => quiet = true,
            _ => {}
        }
        i += 1;
    }

    let book: Vec<InsuredAsset> = match std::fs::read_to_string(&portfolio_path) {
        Ok(text) => serde_json::from_str(&text).expect("portfolio file is not valid JSON"),
        Err(_) => config::canonical_portfolio(),
    };

    let request = PricingRequest {
        asset_value_millions: asset_value,
        shielding_level: Shielding::Standard,
        years_in_orbit: 5,
        adjustment_factor: 1.0,
    };

    // ── Historical replays ────────────────────────────────────────────────
    let replays: Vec<(String, QuoteReport)> = HISTORICAL_STORMS
        .into_par_iter()
        .map(|(label, date, kp)| {
            let pipeline = Pipeline::new(PipelineConfig::canonical(), vec![]);
            let replay = ReplayEvent {
                index: GeomagIndex::new(kp).expect("catalogue values are in domain"),
                label: label.to_string(),
                date: date.parse::<NaiveDate>().expect("catalogue dates are valid"),
            };
            let report = pipeline
                .price_replay(&request, &book, &replay)
                .expect("replay pricing failed");
            (label.to_string(), report)
        })
        .collect();

    // ── Kp ladder: 0.0 to 9.0 in half-steps ──────────────────────────────
    let ladder: Vec<QuoteReport> = (0..=18)
        .into_par_iter()
        .map(|step| {
            let kp = step as f64 * 0.5;
            let pipeline = Pipeline::new(PipelineConfig::canonical(), vec![]);
            pipeline
                .price_fixed(&request, &book, GeomagIndex::new(kp).expect("ladder is in domain"))
                .expect("ladder pricing failed")
        })
        .collect();

    if quiet {
        return;
    }

    println!("=== Historical storm replays (asset ${asset_value:.0}M, Standard, 5 yr) ===");
    println!(
        "{:<30} | {:>5} | {:>5} | {:>7} | {:>6} | {:>8} | {:>14}",
        "Event", "Kp", "Risk", "Prob", "PML%", "Status", "Final premium"
    );
    println!("{}", "-".repeat(94));
    for (label, report) in &replays {
        print_row(label, report);
    }

    println!("\n=== Kp ladder ===");
    println!(
        "{:<30} | {:>5} | {:>5} | {:>7} | {:>6} | {:>8} | {:>14}",
        "Scenario", "Kp", "Risk", "Prob", "PML%", "Status", "Final premium"
    );
    println!("{}", "-".repeat(94));
    for report in &ladder {
        let label = format!("fixed Kp {:.1}", report.worst_case_index.value());
        print_row(&label, report);
    }
}

fn print_row(label: &str, report: &QuoteReport) {
    let status = match report.pricing.policy_status {
        PolicyStatus::Approved => "APPROVED",
        PolicyStatus::Modified => "MODIFIED",
        PolicyStatus::Rejected => "REJECTED",
    };
    println!(
        "{:<30} | {:>5.2} | {:>5.2} | {:>7.4} | {:>5.1}% | {:>8} | {:>14.2}",
        label,
        report.worst_case_index.value(),
        report.risk_index.value(),
        report.individual.incident_probability.value(),
        report.portfolio.loss_ratio * 100.0,
        status,
        report.pricing.final_premium_usd,
    );
}
