//! Population-weighted aggregation of facilities into states and counties.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::scoring::{NO_DATA_RISK_ID, RiskCategory};
use super::facility::{Facility, RiskTrend};

/// Which geographic level facilities are grouped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionLevel {
    /// Keyed by the facility's jurisdiction.
    State,
    /// Keyed by each county FIPS code the facility serves.
    County,
}

impl RegionLevel {
    /// The region keys a facility belongs to at this level.
    pub fn keys(self, facility: &Facility) -> Vec<String> {
        match self {
            RegionLevel::State => vec![facility.state.clone()],
            RegionLevel::County => facility.county_fips_tokens(),
        }
    }
}

/// What the map renderer reads for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    /// State name or county FIPS.
    pub name: String,
    /// Category ordinal 0-4, or 404 when the region has no usable data.
    pub risk_id: u16,
    pub risk_score: f64,
    /// `None` when the region has no usable data.
    pub risk_category: Option<RiskCategory>,
    pub risk_trend: RiskTrend,
    pub monitored_population: u64,
    pub facility_count: usize,
}

/// A state or county and the facilities monitoring it.
#[derive(Debug, Clone)]
pub struct GeographicRegion {
    name: String,
    facilities: Vec<Arc<Facility>>,
    monitored_population: u64,
}

impl GeographicRegion {
    pub fn new(name: impl Into<String>, facilities: Vec<Arc<Facility>>) -> Self {
        let monitored_population = facilities
            .iter()
            .fold(0u64, |total, f| total.saturating_add(f.population_served));
        Self {
            name: name.into(),
            facilities,
            monitored_population,
        }
    }

    /// Group facilities into regions using `key`, which returns every region
    /// key a facility belongs to. A facility listed under several keys is
    /// shared, not copied. Regions come back ordered by name.
    pub fn group_by<F>(facilities: &[Arc<Facility>], key: F) -> Vec<Self>
    where
        F: Fn(&Facility) -> Vec<String>,
    {
        let mut grouped: BTreeMap<String, Vec<Arc<Facility>>> = BTreeMap::new();
        for facility in facilities {
            for region_key in key(facility) {
                let members = grouped.entry(region_key).or_default();
                if !members.iter().any(|m| Arc::ptr_eq(m, facility)) {
                    members.push(Arc::clone(facility));
                }
            }
        }

        grouped
            .into_iter()
            .map(|(name, members)| Self::new(name, members))
            .collect()
    }

    /// Group facilities at a standard level.
    pub fn group_at(facilities: &[Arc<Facility>], level: RegionLevel) -> Vec<Self> {
        Self::group_by(facilities, |f| level.keys(f))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn facilities(&self) -> &[Arc<Facility>] {
        &self.facilities
    }

    pub fn facility_count(&self) -> usize {
        self.facilities.len()
    }

    /// Total population served by the region's facilities.
    pub fn monitored_population(&self) -> u64 {
        self.monitored_population
    }

    /// Whether there is anything to weight: at least one facility and a
    /// nonzero monitored population.
    pub fn has_data(&self) -> bool {
        !self.facilities.is_empty() && self.monitored_population > 0
    }

    /// Population-weighted mean of each facility's latest risk score.
    ///
    /// Returns 0 when the monitored population is zero.
    pub fn risk_score(&self) -> f64 {
        if self.monitored_population == 0 {
            return 0.0;
        }
        // Summed in f64: the u64 total saturates on absurd populations.
        let total: f64 = self.facilities.iter().map(|f| f.population_served as f64).sum();
        self.facilities
            .iter()
            .map(|f| f.latest().risk_score() * (f.population_served as f64 / total))
            .sum()
    }

    /// `None` when the region has no usable data.
    pub fn risk_category(&self) -> Option<RiskCategory> {
        self.has_data()
            .then(|| RiskCategory::from_score(self.risk_score()))
    }

    /// Category ordinal, or [`NO_DATA_RISK_ID`].
    pub fn risk_id(&self) -> u16 {
        self.risk_category()
            .map_or(NO_DATA_RISK_ID, RiskCategory::risk_id)
    }

    /// Sign of the mean facility trend.
    pub fn risk_trend(&self) -> RiskTrend {
        if self.facilities.is_empty() {
            return RiskTrend::Static;
        }
        let sum: i64 = self
            .facilities
            .iter()
            .map(|f| i64::from(f.risk_trend().value()))
            .sum();
        RiskTrend::from_sign(sum as f64 / self.facilities.len() as f64)
    }

    pub fn summary(&self) -> RegionSummary {
        RegionSummary {
            name: self.name.clone(),
            risk_id: self.risk_id(),
            risk_score: self.risk_score(),
            risk_category: self.risk_category(),
            risk_trend: self.risk_trend(),
            monitored_population: self.monitored_population,
            facility_count: self.facility_count(),
        }
    }
}

impl fmt::Display for GeographicRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<GeographicRegion name: {} facility_count: {}>",
            self.name,
            self.facility_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::RawSample;

    fn facility(id: &str, fips: &str, population: u64, scores: &[(&str, f64)]) -> Arc<Facility> {
        // percentile p with ptc=-100 and detect=0 gives risk_score 0.45 * p
        let samples: Vec<RawSample> = scores
            .iter()
            .map(|(date, percentile)| {
                RawSample::new(id)
                    .with_jurisdiction("Ohio")
                    .with_county("", fips)
                    .with_population(population)
                    .with_window("2024-01-01", *date)
                    .with_metrics(*percentile, -100.0, 0.0)
            })
            .collect();
        Arc::new(Facility::from_samples(&samples).unwrap())
    }

    /// A facility whose latest risk score is `score`.
    fn scored(id: &str, population: u64, score: f64) -> Arc<Facility> {
        let (percentile, ptc_15d, detect_prop) = if score <= 45.0 {
            (score / 0.45, -100.0, 0.0)
        } else if score <= 85.0 {
            (100.0, 2.0 * (score - 45.0) / 0.40 - 100.0, 0.0)
        } else {
            (100.0, 100.0, (score - 85.0) / 0.15)
        };
        let sample = RawSample::new(id)
            .with_jurisdiction("Ohio")
            .with_population(population)
            .with_window("2024-01-01", "2024-01-08")
            .with_metrics(percentile, ptc_15d, detect_prop);
        Arc::new(Facility::from_samples(&[sample]).unwrap())
    }

    #[test]
    fn test_population_weighted_score() {
        let region = GeographicRegion::new("Ohio", vec![scored("a", 100, 20.0), scored("b", 300, 60.0)]);
        assert_eq!(region.monitored_population(), 400);
        assert!((region.risk_score() - 50.0).abs() < 1e-9);
        assert_eq!(region.risk_category(), Some(RiskCategory::Medium));
        assert_eq!(region.risk_id(), 2);
    }

    #[test]
    fn test_uses_latest_sample_only() {
        let f = facility("a", "39049", 10, &[("2024-01-01", 100.0), ("2024-01-08", 20.0)]);
        let region = GeographicRegion::new("Ohio", vec![f]);
        assert!((region.risk_score() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_region_is_no_data() {
        let region = GeographicRegion::new("Nowhere", vec![]);
        assert_eq!(region.risk_score(), 0.0);
        assert_eq!(region.risk_category(), None);
        assert_eq!(region.risk_id(), NO_DATA_RISK_ID);
        assert_eq!(region.risk_trend(), RiskTrend::Static);
    }

    #[test]
    fn test_zero_population_region_is_no_data() {
        let region = GeographicRegion::new("Ohio", vec![scored("a", 0, 70.0), scored("b", 0, 90.0)]);
        assert_eq!(region.facility_count(), 2);
        assert_eq!(region.risk_score(), 0.0);
        assert_eq!(region.risk_id(), NO_DATA_RISK_ID);
    }

    #[test]
    fn test_huge_populations_saturate() {
        let region = GeographicRegion::new(
            "Ohio",
            vec![scored("a", u64::MAX, 20.0), scored("b", u64::MAX, 60.0)],
        );
        assert_eq!(region.monitored_population(), u64::MAX);
        assert!((region.risk_score() - 40.0).abs() < 1e-9);
        assert_eq!(region.risk_category(), Some(RiskCategory::Medium));
    }

    #[test]
    fn test_region_trend_is_mean_of_facilities() {
        let up = facility("a", "1", 10, &[("2024-01-01", 10.0), ("2024-01-08", 20.0)]);
        let up2 = facility("b", "1", 10, &[("2024-01-01", 10.0), ("2024-01-08", 30.0)]);
        let down = facility("c", "1", 10, &[("2024-01-01", 50.0), ("2024-01-08", 20.0)]);
        let flat = facility("d", "1", 10, &[("2024-01-08", 20.0)]);

        let region = GeographicRegion::new("1", vec![up.clone(), down.clone()]);
        assert_eq!(region.risk_trend(), RiskTrend::Static);

        let region = GeographicRegion::new("1", vec![up, up2, down.clone()]);
        assert_eq!(region.risk_trend(), RiskTrend::Increasing);

        let region = GeographicRegion::new("1", vec![down, flat]);
        assert_eq!(region.risk_trend(), RiskTrend::Decreasing);
    }

    #[test]
    fn test_county_grouping_shares_facilities() {
        let shared = facility("a", "39049,39041", 100, &[("2024-01-08", 50.0)]);
        let single = facility("b", "39049", 300, &[("2024-01-08", 50.0)]);

        let regions = GeographicRegion::group_at(&[shared, single], RegionLevel::County);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].name(), "39041");
        assert_eq!(regions[0].facility_count(), 1);
        assert_eq!(regions[0].monitored_population(), 100);
        assert_eq!(regions[1].name(), "39049");
        assert_eq!(regions[1].facility_count(), 2);
        assert_eq!(regions[1].monitored_population(), 400);
    }

    #[test]
    fn test_duplicate_keys_counted_once() {
        let f = facility("a", "39049,39049", 100, &[("2024-01-08", 50.0)]);
        let regions = GeographicRegion::group_at(&[f], RegionLevel::County);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].facility_count(), 1);
    }

    #[test]
    fn test_state_grouping() {
        let regions = GeographicRegion::group_at(
            &[scored("a", 100, 20.0), scored("b", 300, 60.0)],
            RegionLevel::State,
        );
        assert_eq!(regions.len(), 1);
        let summary = regions[0].summary();
        assert_eq!(summary.name, "Ohio");
        assert_eq!(summary.facility_count, 2);
        assert_eq!(summary.risk_category, Some(RiskCategory::Medium));
    }
}
