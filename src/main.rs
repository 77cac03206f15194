use std::fs::File;
use std::io::{BufWriter, Write};

use chrono::{NaiveDate, Utc};

use borealis::config::{self, PipelineConfig};
use borealis::daily;
use borealis::error::FeedError;
use borealis::pipeline::{
    FeedKind, FeedSource, IndexProvenance, Pipeline, PricingRequest, QuoteReport, ReplayEvent,
};
use borealis::portfolio::InsuredAsset;
use borealis::pricing::PolicyStatus;
use borealis::types::{GeomagIndex, Shielding};

/// Feed source backed by a file on disk — the fetch boundary for feeds that
/// an upstream collector has already mirrored locally. An unreadable file
/// is the file-based equivalent of an unreachable endpoint.
struct FileSource {
    name: String,
    kind: FeedKind,
    path: String,
}

impl FeedSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> FeedKind {
        self.kind
    }

    fn fetch(&self) -> Result<String, FeedError> {
        std::fs::read_to_string(&self.path).map_err(|e| FeedError::Unavailable {
            src: self.name.clone(),
            detail: format!("{}: {e}", self.path),
        })
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    let mut portfolio_path = "portfolio_data.json".to_string();
    let mut breakdown_path: Option<String> = None;
    let mut series_path: Option<String> = None;
    let mut daily_path: Option<String> = None;
    let mut fixed_kp: Option<String> = None;
    let mut event_label: Option<String> = None;
    let mut event_date: Option<String> = None;
    let mut asset_value = 250.0_f64;
    let mut shielding = Shielding::Standard;
    let mut years_in_orbit = 5_u32;
    let mut adjustment_factor = 1.0_f64;
    let mut output_path = "quote.json".to_string();
    let mut quiet = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--portfolio" => {
                i += 1;
                portfolio_path = args[i].clone();
            }
            "--breakdown" => {
                i += 1;
                breakdown_path = Some(args[i].clone());
            }
            "--series" => {
                i += 1;
                series_path = Some(args[i].clone());
            }
            "--daily" => {
                i += 1;
                daily_path = Some(args[i].clone());
            }
            "--kp" => {
                i += 1;
                fixed_kp = Some(args[i].clone());
            }
            "--event" => {
                i += 1;
                event_label = Some(args[i].clone());
            }
            "--date" => {
                i += 1;
                event_date = Some(args[i].clone());
            }
            "--value" => {
                i += 1;
                asset_value = args[i].parse().expect("--value requires a number (millions USD)");
            }
            "--shielding" => {
                i += 1;
                shielding = Shielding::from_label(&args[i]);
            }
            "--years" => {
                i += 1;
                years_in_orbit = args[i].parse().expect("--years requires a whole number");
            }
            "--adjust" => {
                i += 1;
                adjustment_factor = args[i].parse().expect("--adjust requires a number");
            }
            "--output" => {
                i += 1;
                output_path = args[i].clone();
            }
            "--quiet" => quiet = true,
            other => {
                eprintln!("unknown argument: {other}");
                std::process::exit(2);
            }
        }
        i += 1;
    }

    let book = load_portfolio(&portfolio_path);

    let request = PricingRequest {
        asset_value_millions: asset_value,
        shielding_level: shielding,
        years_in_orbit,
        adjustment_factor,
    };

    // Fallback order: 3-day breakdown is the most authoritative forward
    // view, the JSON series next, the daily table last.
    let mut sources: Vec<Box<dyn FeedSource>> = Vec::new();
    if let Some(path) = breakdown_path {
        sources.push(Box::new(FileSource { name: "3-day-forecast".to_string(), kind: FeedKind::BreakdownText, path }));
    }
    if let Some(path) = series_path {
        sources.push(Box::new(FileSource { name: "json-series".to_string(), kind: FeedKind::JsonSeries, path }));
    }
    if let Some(path) = daily_path {
        sources.push(Box::new(FileSource { name: "daily-indices".to_string(), kind: FeedKind::DailyIndices, path }));
    }

    let mut pipeline = Pipeline::new(PipelineConfig::canonical(), sources);

    let report = match fixed_kp {
        Some(token) => {
            let value = daily::parse_kp_token(&token)
                .unwrap_or_else(|| panic!("--kp '{token}' is not a Kp value in [0, 9]"));
            let index = GeomagIndex::new(value).expect("token parser stays in domain");
            match (event_label, event_date) {
                (Some(label), Some(date)) => {
                    let date: NaiveDate =
                        date.parse().expect("--date requires YYYY-MM-DD");
                    pipeline
                        .price_replay(&request, &book, &ReplayEvent { index, label, date })
                        .expect("replay pricing failed")
                }
                _ => pipeline.price_fixed(&request, &book, index).expect("fixed-index pricing failed"),
            }
        }
        None => match pipeline.price(&request, &book, Utc::now()) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("pricing failed: {e}");
                std::process::exit(1);
            }
        },
    };

    if !quiet {
        print_report(&report, &request);
    }

    let file = File::create(&output_path).expect("failed to create output file");
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &report).expect("failed to serialize quote");
    writeln!(writer).expect("failed to write newline");
    if !quiet {
        println!("\nQuote written to {output_path}");
    }
}

fn load_portfolio(path: &str) -> Vec<InsuredAsset> {
    match std::fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text)
            .unwrap_or_else(|e| panic!("portfolio file {path} is not valid JSON: {e}")),
        Err(_) => {
            eprintln!("portfolio file {path} not found; using the built-in demonstration book");
            config::canonical_portfolio()
        }
    }
}

fn provenance_line(provenance: &IndexProvenance) -> String {
    match provenance {
        IndexProvenance::Feed { source, strategy, peak_at, .. } => {
            let mut line = source.clone();
            if let Some(strategy) = strategy {
                line.push_str(&format!(", {strategy:?}"));
            }
            if let Some(peak) = peak_at {
                line.push_str(&format!(", peak {}", peak.format("%Y-%m-%d %H:%MZ")));
            }
            line
        }
        IndexProvenance::HistoricalReplay { label, date } => format!("replay: {label} ({date})"),
        IndexProvenance::ManualOverride => "manual override".to_string(),
    }
}

fn print_report(report: &QuoteReport, request: &PricingRequest) {
    println!("=== Borealis 24h policy quote ===");
    println!(
        "Asset: ${:.1}M, {} shielding, {} yr in orbit, underwriter x{:.2}",
        request.asset_value_millions,
        request.shielding_level.label(),
        request.years_in_orbit,
        request.adjustment_factor,
    );

    println!("\n--- Forecast ---");
    println!("Worst-case index:      {:.2}", report.worst_case_index.value());
    println!("Risk index (bumped):   {:.2}", report.risk_index.value());
    println!("Source:                {}", provenance_line(&report.provenance));

    println!("\n--- Individual risk ---");
    println!(
        "Incident probability:  {:.4}  ({})",
        report.individual.incident_probability.value(),
        report.individual.risk_category.label(),
    );

    println!("\n--- Portfolio ---");
    println!("Total exposure:        ${:.1}M", report.portfolio.total_exposure_millions);
    println!(
        "PML:                   ${:.1}M  ({:.1}% of exposure)",
        report.portfolio.probable_maximum_loss_millions,
        report.portfolio.loss_ratio * 100.0,
    );
    println!("Recommendation:        {}", report.portfolio.strategic_recommendation.label());

    println!("\n--- Premium ---");
    println!("Base premium:          ${:.2}", report.pricing.base_premium_usd);
    println!("Surcharge multiplier:  x{:.2}", report.pricing.surcharge_multiplier);
    println!("Calculated premium:    ${:.2}", report.pricing.calculated_premium_usd);
    let status = match report.pricing.policy_status {
        PolicyStatus::Approved => "APPROVED",
        PolicyStatus::Modified => "MODIFIED (coverage reduced)",
        PolicyStatus::Rejected => "REJECTED (alternative offer below)",
    };
    println!("Status:                {status}");
    println!(
        "Final premium:         ${:.2}  ({:.0}% coverage, deductible ${:.2})",
        report.pricing.final_premium_usd,
        report.pricing.coverage_fraction * 100.0,
        report.pricing.deductible_usd,
    );
}
