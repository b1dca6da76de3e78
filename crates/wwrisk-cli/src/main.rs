//! wwrisk CLI - wastewater surveillance risk engine.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::Regions {
            records,
            fallback,
            start,
            end,
            state,
            json,
        } => commands::regions::run(records, fallback, start, end, state, json, cli.verbose),

        Commands::Multipliers { stats, output } => commands::multipliers::run(stats, output),

        Commands::Intersectional {
            cases,
            output,
            chunk_size,
            min_sample_size,
            checkpoint_dir,
            checkpoint_every,
        } => commands::intersectional::run(
            cases,
            output,
            chunk_size,
            min_sample_size,
            checkpoint_dir,
            checkpoint_every,
        ),

        Commands::Personal {
            multipliers,
            risk_score,
            age_group,
            birth_year,
            sex,
            race,
            ethnicity,
            json,
        } => commands::personal::run(
            multipliers,
            risk_score,
            age_group,
            birth_year,
            sex,
            race,
            ethnicity,
            json,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
