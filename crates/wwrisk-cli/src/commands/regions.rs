//! Regions command - score states or counties for a date window.

use std::path::{Path, PathBuf};

use colored::{ColoredString, Colorize};
use wwrisk::input::parse_sample_date;
use wwrisk::{
    CsvRecordSource, FallbackSource, JsonRecordSource, RecordSource, RegionSummary, RiskCategory,
    RiskEngine, RiskTrend,
};

type BoxedSource = Box<dyn RecordSource + Send + Sync>;

pub fn run(
    records: PathBuf,
    fallback: Option<PathBuf>,
    start: String,
    end: String,
    state: Option<String>,
    json: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = record_source(&records, fallback.as_deref())?;
    let start = parse_sample_date(&start)?;
    let end = parse_sample_date(&end)?;
    let engine = RiskEngine::new(source);

    let report = match &state {
        Some(state) => engine.county_report(start, end, state)?,
        None => engine.state_report(start, end)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let level = if state.is_some() { "counties" } else { "states" };
    println!(
        "{} {} {} between {} and {}",
        "Scored".cyan().bold(),
        report.len().to_string().white().bold(),
        level,
        start,
        end
    );
    println!();
    println!(
        "  {:24} {:>7} {:10} {:11} {:>12} {:>10}",
        "Region", "Score", "Category", "Trend", "Population", "Facilities"
    );
    for region in &report {
        print_region(region, verbose);
    }

    Ok(())
}

/// The primary records file, behind the fallback file when one is given.
/// A missing primary is only an error without a fallback.
fn record_source(
    records: &Path,
    fallback: Option<&Path>,
) -> Result<BoxedSource, Box<dyn std::error::Error>> {
    match fallback {
        Some(path) => Ok(Box::new(FallbackSource::new(
            source_for(records),
            source_for(path),
        ))),
        None if !records.exists() => {
            Err(format!("File not found: {}", records.display()).into())
        }
        None => Ok(source_for(records)),
    }
}

fn source_for(path: &Path) -> BoxedSource {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        Box::new(CsvRecordSource::new(path))
    } else {
        Box::new(JsonRecordSource::new(path))
    }
}

fn print_region(region: &RegionSummary, verbose: bool) {
    let category = match region.risk_category {
        Some(category) => colorize(category),
        None => "no data".dimmed(),
    };
    let trend = match region.risk_trend {
        RiskTrend::Increasing => "increasing".red(),
        RiskTrend::Decreasing => "decreasing".green(),
        RiskTrend::Static => "static".normal(),
    };
    println!(
        "  {:24} {:>7.1} {:10} {:11} {:>12} {:>10}",
        region.name,
        region.risk_score,
        category,
        trend,
        region.monitored_population,
        region.facility_count
    );
    if verbose {
        println!("  {:24} risk_id {}", "", region.risk_id);
    }
}

fn colorize(category: RiskCategory) -> ColoredString {
    let label = category.label();
    match category {
        RiskCategory::VeryHigh => label.red().bold(),
        RiskCategory::High => label.red(),
        RiskCategory::Medium => label.yellow(),
        RiskCategory::Low => label.green(),
        RiskCategory::VeryLow => label.green().dimmed(),
    }
}
