//! Main engine struct: fetch records for a query and turn them into scored
//! regions.

use std::sync::Arc;

use chrono::NaiveDate;
use log::debug;

use crate::aggregation::{Facility, GeographicRegion, RegionLevel, RegionSummary, group_facilities};
use crate::error::{Result, RiskError};
use crate::geo::{JurisdictionOverrides, county_in_state, state_by_name};
use crate::input::{RawSample, RecordQuery, RecordSource};

/// Configuration for region reports.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Extra jurisdictions to include in county searches of a state.
    pub jurisdiction_overrides: JurisdictionOverrides,
    /// Drop counties whose FIPS code is outside the searched state.
    pub restrict_counties_to_state: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            jurisdiction_overrides: JurisdictionOverrides::default(),
            restrict_counties_to_state: true,
        }
    }
}

/// Build regions from raw records: group by facility, score, then group the
/// facilities at `level`.
pub fn build_regions(records: &[RawSample], level: RegionLevel) -> Vec<GeographicRegion> {
    let facilities: Vec<Arc<Facility>> = group_facilities(records)
        .into_iter()
        .map(Arc::new)
        .collect();
    let regions = GeographicRegion::group_at(&facilities, level);
    for region in &regions {
        debug!("{}", region);
    }
    regions
}

/// The wastewater risk engine.
pub struct RiskEngine {
    source: Box<dyn RecordSource + Send + Sync>,
    config: EngineConfig,
}

impl RiskEngine {
    /// Create an engine over a record source with default configuration.
    pub fn new(source: impl RecordSource + Send + Sync + 'static) -> Self {
        Self::with_config(source, EngineConfig::default())
    }

    pub fn with_config(
        source: impl RecordSource + Send + Sync + 'static,
        config: EngineConfig,
    ) -> Self {
        Self {
            source: Box::new(source),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetch the records for a query. No records is `NoDataFound`.
    pub fn fetch(&self, query: &RecordQuery) -> Result<Vec<RawSample>> {
        let records = self.source.fetch_records(query)?;
        if records.is_empty() {
            return Err(RiskError::NoDataFound(match &query.jurisdiction {
                Some(j) => format!("no samples for {} between {} and {}", j, query.start, query.end),
                None => format!("no samples between {} and {}", query.start, query.end),
            }));
        }
        debug!("Fetched {} records from '{}'", records.len(), self.source.name());
        Ok(records)
    }

    /// Score every state with samples in the window.
    pub fn state_regions(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<GeographicRegion>> {
        let query = RecordQuery::new(start, end)?;
        let records = self.fetch(&query)?;
        Ok(build_regions(&records, RegionLevel::State))
    }

    /// Score every county of `state` with samples in the window.
    pub fn county_regions(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        state: &str,
    ) -> Result<Vec<GeographicRegion>> {
        let mut query = RecordQuery::new(start, end)?.with_jurisdiction(state);
        if let Some(extra) = self.config.jurisdiction_overrides.get(state) {
            query = query.with_override(extra);
        }
        let records = self.fetch(&query)?;
        let mut regions = build_regions(&records, RegionLevel::County);

        if self.config.restrict_counties_to_state {
            if let Some(info) = state_by_name(state) {
                regions.retain(|r| county_in_state(r.name(), info.fips));
            }
        }
        Ok(regions)
    }

    pub fn state_report(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<RegionSummary>> {
        Ok(self
            .state_regions(start, end)?
            .iter()
            .map(GeographicRegion::summary)
            .collect())
    }

    pub fn county_report(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        state: &str,
    ) -> Result<Vec<RegionSummary>> {
        Ok(self
            .county_regions(start, end, state)?
            .iter()
            .map(GeographicRegion::summary)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InMemorySource;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample(id: &str, state: &str, fips: &str, end: &str) -> RawSample {
        RawSample::new(id)
            .with_jurisdiction(state)
            .with_county("", fips)
            .with_population(1000)
            .with_window("2024-01-01", end)
            .with_metrics(50.0, 0.0, 50.0)
    }

    #[test]
    fn test_no_records_is_no_data_found() {
        let engine = RiskEngine::new(InMemorySource::new(vec![]));
        let err = engine
            .state_report(date("2024-01-01"), date("2024-01-31"))
            .unwrap_err();
        assert!(matches!(err, RiskError::NoDataFound(_)));
    }

    #[test]
    fn test_state_report() {
        let engine = RiskEngine::new(InMemorySource::new(vec![
            sample("1", "Ohio", "39049", "2024-01-10"),
            sample("2", "Texas", "48201", "2024-01-10"),
            sample("3", "Ohio", "39035", "2024-01-10"),
        ]));
        let report = engine.state_report(date("2024-01-01"), date("2024-01-31")).unwrap();

        let names: Vec<&str> = report.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Ohio", "Texas"]);
        assert_eq!(report[0].facility_count, 2);
        assert_eq!(report[0].monitored_population, 2000);
    }

    #[test]
    fn test_county_report_includes_override_and_drops_foreign_counties() {
        let engine = RiskEngine::new(InMemorySource::new(vec![
            sample("1", "New York", "36001", "2024-01-10"),
            sample("2", "New York City", "36061", "2024-01-10"),
            sample("3", "New York", "36001,34003", "2024-01-10"),
            sample("4", "New Jersey", "34013", "2024-01-10"),
        ]));
        let report = engine
            .county_report(date("2024-01-01"), date("2024-01-31"), "New York")
            .unwrap();

        let names: Vec<&str> = report.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["36001", "36061"]);
        assert_eq!(report[0].facility_count, 2);
    }

    #[test]
    fn test_inverted_window_is_invalid_input() {
        let engine = RiskEngine::new(InMemorySource::new(vec![]));
        let err = engine
            .state_report(date("2024-02-01"), date("2024-01-01"))
            .unwrap_err();
        assert!(matches!(err, RiskError::InvalidInput(_)));
    }
}
