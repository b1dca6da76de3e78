//! Single-factor multipliers from aggregated mortality statistics.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, RiskError};
use super::table::MultiplierTable;
use super::{entry_for, rate};

/// Group labels that carry no demographic meaning.
pub const PLACEHOLDER_GROUPS: [&str; 3] = ["NaN", "Unknown", "Missing"];

/// Death and case tallies for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCounts {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub deaths: u64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub cases: u64,
}

impl GroupCounts {
    pub fn new(deaths: u64, cases: u64) -> Self {
        Self { deaths, cases }
    }

    /// Record one case.
    pub fn record(&mut self, died: bool) {
        self.cases += 1;
        if died {
            self.deaths += 1;
        }
    }

    /// Add another tally into this one.
    pub fn merge(&mut self, other: GroupCounts) {
        self.deaths += other.deaths;
        self.cases += other.cases;
    }
}

fn null_as_zero<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

/// Tallies keyed by factor then group, e.g. `{"sex": {"Male": {...}}}`.
pub type MortalityStats = IndexMap<String, IndexMap<String, GroupCounts>>;

/// Read a mortality-statistics JSON document.
pub fn load_mortality_stats(path: impl AsRef<Path>) -> Result<MortalityStats> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| RiskError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Derive the single-factor table.
///
/// Each factor's baseline is computed over every group, placeholders
/// included. Placeholder groups and groups with no cases get no entry. There
/// is no minimum sample size.
pub fn build_single_factor(stats: &MortalityStats) -> MultiplierTable {
    let mut table = MultiplierTable::new();

    for (factor, groups) in stats {
        table.ensure_factor(factor.as_str());

        let mut total = GroupCounts::default();
        for counts in groups.values() {
            total.merge(*counts);
        }
        let baseline_rate = rate(total.deaths, total.cases);
        debug!("Baseline death rate for {}: {:.4}%", factor, baseline_rate * 100.0);

        for (group, counts) in groups {
            if PLACEHOLDER_GROUPS.contains(&group.as_str()) || counts.cases == 0 {
                continue;
            }
            table.insert(factor.as_str(), group.as_str(), entry_for(*counts, baseline_rate));
        }
    }

    info!("Built {} single-factor multipliers", table.len());
    table
}
