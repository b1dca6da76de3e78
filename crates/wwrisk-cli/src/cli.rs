//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// wwrisk: wastewater surveillance risk engine
#[derive(Parser)]
#[command(name = "wwrisk")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score states (or the counties of one state) for a date window
    Regions {
        /// Raw sample records (JSON array or CSV export)
        #[arg(long, value_name = "FILE")]
        records: PathBuf,

        /// Historic records consulted when the primary file has nothing
        #[arg(long, value_name = "FILE")]
        fallback: Option<PathBuf>,

        /// First day of the window (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// Last day of the window (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Score the counties of this state instead of all states
        #[arg(long)]
        state: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build the single-factor multiplier table from mortality statistics
    Multipliers {
        /// Mortality statistics JSON ({factor: {group: {deaths, cases}}})
        #[arg(long, value_name = "FILE")]
        stats: PathBuf,

        /// Where to write the multiplier table
        #[arg(short, long, default_value = "mortality_multipliers.json")]
        output: PathBuf,
    },

    /// Build the intersectional multiplier table from a case-level CSV
    Intersectional {
        /// Case surveillance CSV (age_group, race, sex, ethnicity, death_yn)
        #[arg(long, value_name = "FILE")]
        cases: PathBuf,

        /// Where to write the multiplier table
        #[arg(short, long, default_value = "intersectional_multipliers.json")]
        output: PathBuf,

        /// Rows per chunk
        #[arg(long, default_value = "50000")]
        chunk_size: usize,

        /// Minimum cases for a group to get a multiplier
        #[arg(long, default_value = "1000")]
        min_sample_size: u64,

        /// Directory for periodic checkpoints of the raw tallies
        #[arg(long)]
        checkpoint_dir: Option<PathBuf>,

        /// Chunks between checkpoints
        #[arg(long, default_value = "10")]
        checkpoint_every: usize,
    },

    /// Estimate personalized mortality risk for a region risk score
    Personal {
        /// Single-factor multiplier table
        #[arg(long, value_name = "FILE")]
        multipliers: PathBuf,

        /// Region risk score (0-100)
        #[arg(long, allow_hyphen_values = true)]
        risk_score: String,

        /// CDC age group label (e.g. "65+ years")
        #[arg(long, conflicts_with = "birth_year")]
        age_group: Option<String>,

        /// Birth year, converted to an age group
        #[arg(long)]
        birth_year: Option<i32>,

        #[arg(long)]
        sex: Option<String>,

        #[arg(long)]
        race: Option<String>,

        #[arg(long)]
        ethnicity: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
