//! Multipliers command - build the single-factor multiplier table.

use std::path::PathBuf;

use colored::Colorize;
use wwrisk::multipliers::{build_single_factor, load_mortality_stats};

pub fn run(stats: PathBuf, output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    if !stats.exists() {
        return Err(format!("File not found: {}", stats.display()).into());
    }

    println!(
        "{} {}",
        "Building multipliers from".cyan().bold(),
        stats.display().to_string().white()
    );

    let mortality_stats = load_mortality_stats(&stats)?;
    let table = build_single_factor(&mortality_stats);

    for factor in table.factor_names() {
        let groups = table.factor(factor).map_or(0, |g| g.len());
        println!("  {:20} {} groups", factor, groups);
    }

    table.save(&output)?;
    println!();
    println!(
        "{} {}",
        "Saved to".green().bold(),
        output.display().to_string().white()
    );
    Ok(())
}
