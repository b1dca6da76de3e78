//! The persisted multiplier table: factor name -> group name -> entry.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};

/// Confidence bounds expressed as multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceRange {
    pub low: f64,
    pub high: f64,
}

/// Mortality multiplier for one demographic group (or group combination).
///
/// The field names are the persisted schema; the personalized calculator
/// reads `multiplier` and `sample_size`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiplierEntry {
    /// Group death rate relative to the factor's baseline rate.
    pub multiplier: f64,
    pub confidence_range: ConfidenceRange,
    /// Number of cases the multiplier was derived from.
    pub sample_size: u64,
    pub death_rate: f64,
}

/// Lookup table keyed by factor (`"age_groups"`, `"race"`, `"age_race"`, ...)
/// then by group value. Key order is preserved through save/load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MultiplierTable {
    factors: IndexMap<String, IndexMap<String, MultiplierEntry>>,
}

impl MultiplierTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `group` under `factor`.
    pub fn insert(
        &mut self,
        factor: impl Into<String>,
        group: impl Into<String>,
        entry: MultiplierEntry,
    ) {
        self.factors
            .entry(factor.into())
            .or_default()
            .insert(group.into(), entry);
    }

    /// Make sure `factor` exists, even with no groups.
    pub fn ensure_factor(&mut self, factor: impl Into<String>) {
        self.factors.entry(factor.into()).or_default();
    }

    pub fn get(&self, factor: &str, group: &str) -> Option<&MultiplierEntry> {
        self.factors.get(factor)?.get(group)
    }

    /// All groups under one factor.
    pub fn factor(&self, factor: &str) -> Option<&IndexMap<String, MultiplierEntry>> {
        self.factors.get(factor)
    }

    /// Factor names in table order.
    pub fn factor_names(&self) -> impl Iterator<Item = &str> {
        self.factors.keys().map(String::as_str)
    }

    /// Total number of group entries across all factors.
    pub fn len(&self) -> usize {
        self.factors.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Save the table as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    RiskError::Persistence(format!(
                        "Failed to create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let file = File::create(path).map_err(|e| {
            RiskError::Persistence(format!("Failed to create file '{}': {}", path.display(), e))
        })?;

        serde_json::to_writer_pretty(BufWriter::new(file), self).map_err(|e| {
            RiskError::Persistence(format!("Failed to serialize multiplier table: {}", e))
        })
    }

    /// Load a table saved by [`MultiplierTable::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| {
            RiskError::Persistence(format!("Failed to open file '{}': {}", path.display(), e))
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            RiskError::Persistence(format!(
                "Failed to parse multiplier table '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(multiplier: f64, sample_size: u64) -> MultiplierEntry {
        MultiplierEntry {
            multiplier,
            confidence_range: ConfidenceRange {
                low: multiplier * 0.9,
                high: multiplier * 1.1,
            },
            sample_size,
            death_rate: 0.01 * multiplier,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let mut table = MultiplierTable::new();
        table.insert("sex", "Male", entry(1.2, 500));
        table.insert("sex", "Female", entry(0.8, 600));
        table.ensure_factor("race");

        assert_eq!(table.get("sex", "Male").unwrap().multiplier, 1.2);
        assert!(table.get("sex", "Other").is_none());
        assert!(table.get("age_groups", "65+ years").is_none());
        assert_eq!(table.len(), 2);
        assert_eq!(table.factor_names().collect::<Vec<_>>(), vec!["sex", "race"]);
    }

    #[test]
    fn test_schema_key_names() {
        let mut table = MultiplierTable::new();
        table.insert("sex", "Male", entry(1.0, 10));
        let json: serde_json::Value = serde_json::to_value(&table).unwrap();
        let male = &json["sex"]["Male"];

        assert!(male["multiplier"].is_number());
        assert!(male["confidence_range"]["low"].is_number());
        assert!(male["confidence_range"]["high"].is_number());
        assert_eq!(male["sample_size"], 10);
        assert!(male["death_rate"].is_number());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tables").join("mortality_multipliers.json");

        let mut table = MultiplierTable::new();
        table.insert("race", "White", entry(0.9, 1000));
        table.insert("age_groups", "65+ years", entry(7.5, 2000));
        table.save(&path).unwrap();

        let loaded = MultiplierTable::load(&path).unwrap();
        assert_eq!(loaded, table);
        assert_eq!(
            loaded.factor_names().collect::<Vec<_>>(),
            vec!["race", "age_groups"]
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = MultiplierTable::load("/nonexistent/multipliers.json").unwrap_err();
        assert!(matches!(err, RiskError::Persistence(_)));
    }
}
