//! Intersectional multipliers from a per-case surveillance dataset.
//!
//! The dataset can run to millions of rows, so it is read in fixed-size
//! chunks. Each chunk is tallied into local counters which are then added
//! into the running totals; only the totals are kept between chunks.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};
use crate::input::is_missing_value;
use super::single::{GroupCounts, MortalityStats};
use super::table::MultiplierTable;
use super::{entry_for, rate};

/// A demographic factor recorded per case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Age,
    Race,
    Sex,
    Ethnicity,
}

impl Factor {
    pub const ALL: [Factor; 4] = [Factor::Age, Factor::Race, Factor::Sex, Factor::Ethnicity];

    /// Short name used when building combination keys.
    pub fn short_name(self) -> &'static str {
        match self {
            Factor::Age => "age",
            Factor::Race => "race",
            Factor::Sex => "sex",
            Factor::Ethnicity => "ethnicity",
        }
    }
}

/// Every combination of two or more factors, smallest first, each in
/// [`Factor::ALL`] order.
static COMBINATIONS: Lazy<Vec<Vec<Factor>>> = Lazy::new(|| {
    let n = Factor::ALL.len();
    let mut combos: Vec<Vec<Factor>> = (1u32..(1 << n))
        .filter(|mask| mask.count_ones() >= 2)
        .map(|mask| {
            Factor::ALL
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, f)| *f)
                .collect()
        })
        .collect();
    let position = |f: &Factor| Factor::ALL.iter().position(|x| x == f).unwrap_or(0);
    combos.sort_by(|a, b| {
        a.len()
            .cmp(&b.len())
            .then_with(|| a.iter().map(position).cmp(b.iter().map(position)))
    });
    combos
});

/// The factor combinations that are tallied, with their table key
/// (`"age_race"`, ..., `"age_race_sex_ethnicity"`).
pub fn combinations() -> impl Iterator<Item = (String, &'static [Factor])> {
    COMBINATIONS.iter().map(|combo| {
        let key = combo
            .iter()
            .map(|f| f.short_name())
            .collect::<Vec<_>>()
            .join("_");
        (key, combo.as_slice())
    })
}

/// One row of the case-surveillance dataset. Other columns are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseRecord {
    pub age_group: Option<String>,
    pub race: Option<String>,
    pub sex: Option<String>,
    pub ethnicity: Option<String>,
    pub death_yn: Option<String>,
}

impl CaseRecord {
    pub fn new(age_group: &str, race: &str, sex: &str, ethnicity: &str, died: bool) -> Self {
        Self {
            age_group: Some(age_group.to_string()),
            race: Some(race.to_string()),
            sex: Some(sex.to_string()),
            ethnicity: Some(ethnicity.to_string()),
            death_yn: Some(if died { "Yes" } else { "No" }.to_string()),
        }
    }

    /// The value of one factor, `None` if missing.
    pub fn value(&self, factor: Factor) -> Option<&str> {
        let value = match factor {
            Factor::Age => self.age_group.as_deref(),
            Factor::Race => self.race.as_deref(),
            Factor::Sex => self.sex.as_deref(),
            Factor::Ethnicity => self.ethnicity.as_deref(),
        };
        value.filter(|v| !is_missing_value(v))
    }

    /// Whether every factor is present.
    pub fn is_complete(&self) -> bool {
        Factor::ALL.iter().all(|f| self.value(*f).is_some())
    }

    pub fn died(&self) -> bool {
        self.death_yn.as_deref().map(str::trim) == Some("Yes")
    }

    /// Group key for a combination, e.g. `"65+ years_White"`.
    fn group_key(&self, combo: &[Factor]) -> Option<String> {
        let values: Option<Vec<&str>> = combo.iter().map(|f| self.value(*f)).collect();
        values.map(|v| v.join("_"))
    }
}

/// Settings for an intersectional build.
#[derive(Debug, Clone)]
pub struct IntersectionalConfig {
    /// Rows read per chunk.
    pub chunk_size: usize,
    /// Groups with fewer cases get no entry.
    pub min_sample_size: u64,
    /// Write a checkpoint of the raw tallies every this many chunks (0 = never).
    pub checkpoint_every: usize,
    /// Where checkpoints go. Checkpoints are skipped when unset.
    pub checkpoint_dir: Option<PathBuf>,
}

impl Default for IntersectionalConfig {
    fn default() -> Self {
        Self {
            chunk_size: 50_000,
            min_sample_size: 1000,
            checkpoint_every: 10,
            checkpoint_dir: None,
        }
    }
}

impl IntersectionalConfig {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_min_sample_size(mut self, min_sample_size: u64) -> Self {
        self.min_sample_size = min_sample_size;
        self
    }

    pub fn with_checkpoints(mut self, dir: impl Into<PathBuf>, every: usize) -> Self {
        self.checkpoint_dir = Some(dir.into());
        self.checkpoint_every = every;
        self
    }
}

/// Counts from a finished build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub processed_records: u64,
    /// Records with every factor present.
    pub valid_records: u64,
    pub chunks: usize,
}

impl BuildReport {
    /// Share of processed records that were usable, in percent.
    pub fn valid_percent(&self) -> f64 {
        rate(self.valid_records, self.processed_records) * 100.0
    }
}

/// Streaming tally of deaths and cases for every factor combination.
pub struct IntersectionalBuilder {
    config: IntersectionalConfig,
    totals: MortalityStats,
    report: BuildReport,
}

impl IntersectionalBuilder {
    pub fn new(config: IntersectionalConfig) -> Self {
        let mut totals = MortalityStats::new();
        for (key, _) in combinations() {
            totals.insert(key, IndexMap::new());
        }
        Self {
            config,
            totals,
            report: BuildReport::default(),
        }
    }

    /// Running tallies so far.
    pub fn totals(&self) -> &MortalityStats {
        &self.totals
    }

    pub fn report(&self) -> BuildReport {
        self.report
    }

    /// Tally one chunk and merge it into the running totals.
    pub fn process_chunk(&mut self, chunk: &[CaseRecord]) -> Result<()> {
        let local = tally(chunk);
        let chunk_valid = local.valid;

        for (combo_key, groups) in local.stats {
            let totals = self.totals.entry(combo_key).or_default();
            for (group, counts) in groups {
                totals.entry(group).or_default().merge(counts);
            }
        }

        let chunk_num = self.report.chunks;
        self.report.chunks += 1;
        self.report.processed_records += chunk.len() as u64;
        self.report.valid_records += chunk_valid;

        info!(
            "Chunk {}: {} valid out of {} records. Running totals: {} valid out of {} ({:.1}%)",
            chunk_num + 1,
            chunk_valid,
            chunk.len(),
            self.report.valid_records,
            self.report.processed_records,
            self.report.valid_percent()
        );

        if self.config.checkpoint_every > 0
            && chunk_num > 0
            && chunk_num % self.config.checkpoint_every == 0
        {
            self.write_checkpoint()?;
        }
        Ok(())
    }

    /// Stream a CSV dataset through the builder.
    pub fn process_csv(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| RiskError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(BufReader::new(file));

        info!("Starting analysis of {}", path.display());
        let chunk_size = self.config.chunk_size.max(1);
        let mut chunk = Vec::with_capacity(chunk_size);
        for result in reader.deserialize::<CaseRecord>() {
            chunk.push(result?);
            if chunk.len() == chunk_size {
                self.process_chunk(&chunk)?;
                chunk.clear();
            }
        }
        if !chunk.is_empty() {
            self.process_chunk(&chunk)?;
        }
        Ok(())
    }

    /// Turn the tallies into a multiplier table.
    pub fn finish(self) -> (MultiplierTable, BuildReport) {
        info!(
            "Final totals: {} valid records out of {} ({:.1}%)",
            self.report.valid_records,
            self.report.processed_records,
            self.report.valid_percent()
        );

        let mut table = MultiplierTable::new();
        for (combo_key, groups) in &self.totals {
            table.ensure_factor(combo_key.as_str());

            let mut total = GroupCounts::default();
            for counts in groups.values() {
                total.merge(*counts);
            }
            let baseline_rate = rate(total.deaths, total.cases);
            debug!("Baseline death rate for {}: {:.4}%", combo_key, baseline_rate * 100.0);

            for (group, counts) in groups {
                if counts.cases < self.config.min_sample_size {
                    continue;
                }
                let entry = entry_for(*counts, baseline_rate);
                debug!(
                    "{}: {:.2}x ({} cases, {:.4}% death rate)",
                    group,
                    entry.multiplier,
                    counts.cases,
                    entry.death_rate * 100.0
                );
                table.insert(combo_key.as_str(), group.as_str(), entry);
            }
        }

        (table, self.report)
    }

    fn write_checkpoint(&self) -> Result<()> {
        let Some(dir) = &self.config.checkpoint_dir else {
            return Ok(());
        };
        fs::create_dir_all(dir).map_err(|e| RiskError::Io {
            path: dir.clone(),
            source: e,
        })?;

        let path = dir.join(format!(
            "intersectional_stats_checkpoint_{}.json",
            self.report.processed_records
        ));
        info!("Saving intermediate results to {}", path.display());
        let file = File::create(&path).map_err(|e| RiskError::Io {
            path: path.clone(),
            source: e,
        })?;
        serde_json::to_writer(BufWriter::new(file), &self.totals)?;
        Ok(())
    }
}

/// Chunk-local tallies.
struct ChunkTally {
    stats: MortalityStats,
    valid: u64,
}

fn tally(chunk: &[CaseRecord]) -> ChunkTally {
    let mut stats = MortalityStats::new();
    let mut valid = 0;

    for record in chunk.iter().filter(|r| r.is_complete()) {
        valid += 1;
        let died = record.died();
        for (combo_key, combo) in combinations() {
            if let Some(group) = record.group_key(combo) {
                stats
                    .entry(combo_key)
                    .or_default()
                    .entry(group)
                    .or_default()
                    .record(died);
            }
        }
    }

    ChunkTally { stats, valid }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combination_keys() {
        let keys: Vec<String> = combinations().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                "age_race",
                "age_sex",
                "age_ethnicity",
                "race_sex",
                "race_ethnicity",
                "sex_ethnicity",
                "age_race_sex",
                "age_race_ethnicity",
                "age_sex_ethnicity",
                "race_sex_ethnicity",
                "age_race_sex_ethnicity",
            ]
        );
    }

    #[test]
    fn test_incomplete_records_skipped() {
        let mut partial = CaseRecord::new("65+ years", "White", "Male", "Non-Hispanic", true);
        partial.sex = Some("NA".to_string());
        let mut builder = IntersectionalBuilder::new(IntersectionalConfig::default());
        builder
            .process_chunk(&[
                partial,
                CaseRecord::new("65+ years", "White", "Male", "Non-Hispanic", true),
            ])
            .unwrap();

        let report = builder.report();
        assert_eq!(report.processed_records, 2);
        assert_eq!(report.valid_records, 1);
        assert_eq!(
            builder.totals()["age_race"]["65+ years_White"],
            GroupCounts::new(1, 1)
        );
        assert_eq!(
            builder.totals()["age_race_sex_ethnicity"]["65+ years_White_Male_Non-Hispanic"],
            GroupCounts::new(1, 1)
        );
    }

    #[test]
    fn test_chunking_does_not_change_totals() {
        let records: Vec<CaseRecord> = (0..30)
            .map(|i| {
                CaseRecord::new(
                    if i % 3 == 0 { "65+ years" } else { "18 to 49 years" },
                    if i % 2 == 0 { "White" } else { "Black" },
                    "Female",
                    "Hispanic",
                    i % 5 == 0,
                )
            })
            .collect();

        let mut whole = IntersectionalBuilder::new(IntersectionalConfig::default());
        whole.process_chunk(&records).unwrap();

        let mut chunked = IntersectionalBuilder::new(IntersectionalConfig::default());
        for chunk in records.chunks(7) {
            chunked.process_chunk(chunk).unwrap();
        }

        assert_eq!(whole.totals(), chunked.totals());
        assert_eq!(chunked.report().chunks, 5);
    }

    #[test]
    fn test_min_sample_size_filter() {
        let mut records = Vec::new();
        for i in 0..1000 {
            records.push(CaseRecord::new("65+ years", "White", "Male", "Non-Hispanic", i < 100));
        }
        for i in 0..999 {
            records.push(CaseRecord::new("18 to 49 years", "White", "Male", "Non-Hispanic", i < 10));
        }

        let mut builder = IntersectionalBuilder::new(IntersectionalConfig::default());
        builder.process_chunk(&records).unwrap();
        let (table, _) = builder.finish();

        let old = table.get("age_sex", "65+ years_Male").unwrap();
        assert_eq!(old.sample_size, 1000);
        // baseline = 110 / 1999
        assert!((old.multiplier - 0.1 / (110.0 / 1999.0)).abs() < 1e-9);
        let interval = crate::multipliers::wilson_interval(100, 1000);
        let baseline = 110.0 / 1999.0;
        assert!((old.confidence_range.low - interval.low / baseline).abs() < 1e-9);
        assert!((old.confidence_range.high - interval.high / baseline).abs() < 1e-9);
        assert!(table.get("age_sex", "18 to 49 years_Male").is_none());

        // race_sex pools both age groups
        assert_eq!(table.get("race_sex", "White_Male").unwrap().sample_size, 1999);
    }

    #[test]
    fn test_died_flag() {
        assert!(CaseRecord::new("a", "b", "c", "d", true).died());
        let mut record = CaseRecord::new("a", "b", "c", "d", false);
        assert!(!record.died());
        record.death_yn = Some("Unknown".to_string());
        assert!(!record.died());
        record.death_yn = None;
        assert!(!record.died());
    }
}
