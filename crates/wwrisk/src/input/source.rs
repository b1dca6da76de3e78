//! Record sources: anything that can answer "which raw samples overlap this
//! date window, optionally within this jurisdiction".

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::{debug, warn};

use crate::error::{Result, RiskError};
use super::sample::RawSample;

/// A date-window query, optionally narrowed to one jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    /// First day of the search window.
    pub start: NaiveDate,
    /// Last day of the search window.
    pub end: NaiveDate,
    /// Restrict to one jurisdiction (state name). `None` = nationwide.
    pub jurisdiction: Option<String>,
    /// A second jurisdiction reported separately but belonging to the same
    /// state (e.g. "New York City" for "New York").
    pub override_jurisdiction: Option<String>,
}

impl RecordQuery {
    /// Create a nationwide query. Rejects windows that end before they start.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(RiskError::InvalidInput(format!(
                "search window ends ({}) before it starts ({})",
                end, start
            )));
        }
        Ok(Self {
            start,
            end,
            jurisdiction: None,
            override_jurisdiction: None,
        })
    }

    /// Narrow the query to a jurisdiction.
    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.jurisdiction = Some(jurisdiction.into());
        self
    }

    /// Also accept records from an override jurisdiction.
    pub fn with_override(mut self, jurisdiction: impl Into<String>) -> Self {
        self.override_jurisdiction = Some(jurisdiction.into());
        self
    }

    /// Whether a sample falls in this query: its window overlaps the search
    /// window (`date_start <= end AND date_end >= start`) and its
    /// jurisdiction matches, when one is set. Samples with unparseable dates
    /// never match.
    pub fn matches(&self, sample: &RawSample) -> bool {
        let (Ok(sample_start), Ok(sample_end)) = (sample.start_date(), sample.end_date()) else {
            return false;
        };
        if sample_start > self.end || sample_end < self.start {
            return false;
        }

        match &self.jurisdiction {
            None => true,
            Some(jurisdiction) => {
                sample.wwtp_jurisdiction == *jurisdiction
                    || self
                        .override_jurisdiction
                        .as_ref()
                        .is_some_and(|o| sample.wwtp_jurisdiction == *o)
            }
        }
    }

    fn describe(&self) -> String {
        let mut text = format!("date_start <= {} AND date_end >= {}", self.end, self.start);
        if let Some(j) = &self.jurisdiction {
            text.push_str(&format!(" AND wwtp_jurisdiction = '{}'", j));
            if let Some(o) = &self.override_jurisdiction {
                text.push_str(&format!(" OR '{}'", o));
            }
        }
        text
    }
}

/// A supplier of raw wastewater records.
///
/// Live API clients and historic tables implement the same contract; the
/// engine does not care which one answered.
pub trait RecordSource {
    /// Short name used in log output.
    fn name(&self) -> &str;

    /// Return every record matching the query. An empty vector is a valid
    /// answer; the engine turns it into `NoDataFound`.
    fn fetch_records(&self, query: &RecordQuery) -> Result<Vec<RawSample>>;
}

impl<T: RecordSource + ?Sized> RecordSource for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_records(&self, query: &RecordQuery) -> Result<Vec<RawSample>> {
        (**self).fetch_records(query)
    }
}

/// Records held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<RawSample>,
}

impl InMemorySource {
    pub fn new(records: Vec<RawSample>) -> Self {
        Self { records }
    }
}

impl RecordSource for InMemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch_records(&self, query: &RecordQuery) -> Result<Vec<RawSample>> {
        Ok(filter_records(&self.records, query))
    }
}

/// A JSON array of records on disk, as saved from the CDC API.
#[derive(Debug, Clone)]
pub struct JsonRecordSource {
    path: PathBuf,
}

impl JsonRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for JsonRecordSource {
    fn name(&self) -> &str {
        "json"
    }

    fn fetch_records(&self, query: &RecordQuery) -> Result<Vec<RawSample>> {
        let file = open(&self.path)?;
        let records: Vec<RawSample> = serde_json::from_reader(BufReader::new(file))?;
        debug!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(filter_records(&records, query))
    }
}

/// A historic CSV export (NWSS metric data).
#[derive(Debug, Clone)]
pub struct CsvRecordSource {
    path: PathBuf,
}

impl CsvRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for CsvRecordSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch_records(&self, query: &RecordQuery) -> Result<Vec<RawSample>> {
        let file = open(&self.path)?;
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(BufReader::new(file));

        let mut matched = Vec::new();
        let mut skipped = 0usize;
        for result in reader.deserialize::<RawSample>() {
            match result {
                Ok(sample) if query.matches(&sample) => matched.push(sample),
                Ok(_) => {}
                Err(e) => {
                    skipped += 1;
                    debug!("Skipping unreadable row in {}: {}", self.path.display(), e);
                }
            }
        }
        if skipped > 0 {
            warn!("Skipped {} unreadable rows in {}", skipped, self.path.display());
        }
        Ok(matched)
    }
}

/// Try a primary source and fall back to a secondary one when the primary is
/// unreachable or has nothing for the query.
pub struct FallbackSource {
    primary: Box<dyn RecordSource + Send + Sync>,
    secondary: Box<dyn RecordSource + Send + Sync>,
}

impl FallbackSource {
    pub fn new(
        primary: impl RecordSource + Send + Sync + 'static,
        secondary: impl RecordSource + Send + Sync + 'static,
    ) -> Self {
        Self {
            primary: Box::new(primary),
            secondary: Box::new(secondary),
        }
    }
}

impl RecordSource for FallbackSource {
    fn name(&self) -> &str {
        "fallback"
    }

    fn fetch_records(&self, query: &RecordQuery) -> Result<Vec<RawSample>> {
        match self.primary.fetch_records(query) {
            Ok(records) if !records.is_empty() => return Ok(records),
            Ok(_) => debug!(
                "Source '{}' returned nothing for {}, trying '{}'",
                self.primary.name(),
                query.describe(),
                self.secondary.name()
            ),
            Err(e) if e.is_recoverable_by_fallback() => warn!(
                "Source '{}' failed ({}), trying '{}'",
                self.primary.name(),
                e,
                self.secondary.name()
            ),
            Err(e) => return Err(e),
        }
        self.secondary.fetch_records(query)
    }
}

fn filter_records(records: &[RawSample], query: &RecordQuery) -> Vec<RawSample> {
    let matched: Vec<RawSample> = records
        .iter()
        .filter(|r| query.matches(r))
        .cloned()
        .collect();
    debug!("{} of {} records match {}", matched.len(), records.len(), query.describe());
    matched
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| RiskError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample(id: &str, state: &str, start: &str, end: &str) -> RawSample {
        RawSample::new(id)
            .with_jurisdiction(state)
            .with_window(start, end)
    }

    #[test]
    fn test_query_rejects_inverted_window() {
        let err = RecordQuery::new(date("2024-02-01"), date("2024-01-01")).unwrap_err();
        assert!(matches!(err, RiskError::InvalidInput(_)));
    }

    #[test]
    fn test_query_overlap() {
        let query = RecordQuery::new(date("2024-01-10"), date("2024-01-20")).unwrap();
        assert!(query.matches(&sample("1", "Ohio", "2024-01-01", "2024-01-10")));
        assert!(query.matches(&sample("1", "Ohio", "2024-01-20", "2024-01-30")));
        assert!(!query.matches(&sample("1", "Ohio", "2024-01-01", "2024-01-09")));
        assert!(!query.matches(&sample("1", "Ohio", "2024-01-21", "2024-01-30")));
        assert!(!query.matches(&RawSample::new("1")));
    }

    #[test]
    fn test_query_jurisdiction_with_override() {
        let query = RecordQuery::new(date("2024-01-01"), date("2024-01-31"))
            .unwrap()
            .with_jurisdiction("New York")
            .with_override("New York City");
        assert!(query.matches(&sample("1", "New York", "2024-01-01", "2024-01-15")));
        assert!(query.matches(&sample("2", "New York City", "2024-01-01", "2024-01-15")));
        assert!(!query.matches(&sample("3", "New Jersey", "2024-01-01", "2024-01-15")));
    }

    struct Unreachable;

    impl RecordSource for Unreachable {
        fn name(&self) -> &str {
            "unreachable"
        }

        fn fetch_records(&self, _query: &RecordQuery) -> Result<Vec<RawSample>> {
            Err(RiskError::DataUnavailable("CDC website could not be reached".to_string()))
        }
    }

    #[test]
    fn test_fallback_after_failure() {
        let historic = InMemorySource::new(vec![sample("1", "Ohio", "2024-01-01", "2024-01-15")]);
        let source = FallbackSource::new(Unreachable, historic);
        let query = RecordQuery::new(date("2024-01-01"), date("2024-01-31")).unwrap();

        assert_eq!(source.fetch_records(&query).unwrap().len(), 1);
    }

    #[test]
    fn test_fallback_after_empty_primary() {
        let live = InMemorySource::new(vec![]);
        let historic = InMemorySource::new(vec![sample("1", "Ohio", "2024-01-01", "2024-01-15")]);
        let source = FallbackSource::new(live, historic);
        let query = RecordQuery::new(date("2024-01-01"), date("2024-01-31")).unwrap();

        assert_eq!(source.fetch_records(&query).unwrap().len(), 1);
    }

    #[test]
    fn test_json_source_missing_file() {
        let source = JsonRecordSource::new("/nonexistent/records.json");
        let query = RecordQuery::new(date("2024-01-01"), date("2024-01-31")).unwrap();
        assert!(matches!(source.fetch_records(&query), Err(RiskError::Io { .. })));
    }
}
