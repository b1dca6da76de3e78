//! Intersectional command - stream case data into the intersectional table.

use std::path::PathBuf;

use colored::Colorize;
use wwrisk::multipliers::{IntersectionalBuilder, IntersectionalConfig};

pub fn run(
    cases: PathBuf,
    output: PathBuf,
    chunk_size: usize,
    min_sample_size: u64,
    checkpoint_dir: Option<PathBuf>,
    checkpoint_every: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    if !cases.exists() {
        return Err(format!("File not found: {}", cases.display()).into());
    }

    let mut config = IntersectionalConfig::default()
        .with_chunk_size(chunk_size)
        .with_min_sample_size(min_sample_size);
    if let Some(dir) = checkpoint_dir {
        config = config.with_checkpoints(dir, checkpoint_every);
    }

    println!(
        "{} {}",
        "Analyzing".cyan().bold(),
        cases.display().to_string().white()
    );

    let mut builder = IntersectionalBuilder::new(config);
    builder.process_csv(&cases)?;
    let (table, report) = builder.finish();

    println!(
        "Processed {} records, {} valid ({:.1}%) in {} chunks",
        report.processed_records.to_string().white().bold(),
        report.valid_records.to_string().white().bold(),
        report.valid_percent(),
        report.chunks
    );
    println!("Kept {} group multipliers", table.len().to_string().white().bold());

    table.save(&output)?;
    println!(
        "{} {}",
        "Saved to".green().bold(),
        output.display().to_string().white()
    );
    Ok(())
}
