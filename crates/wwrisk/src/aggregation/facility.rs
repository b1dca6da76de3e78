//! Wastewater treatment plant (WWTP) aggregation.

use std::collections::HashSet;

use chrono::NaiveDate;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::input::{RawSample, split_fips_list};
use crate::scoring::DataPoint;

/// Direction of risk between consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTrend {
    Decreasing,
    Static,
    Increasing,
}

impl RiskTrend {
    /// -1, 0 or +1.
    pub fn value(self) -> i8 {
        match self {
            RiskTrend::Decreasing => -1,
            RiskTrend::Static => 0,
            RiskTrend::Increasing => 1,
        }
    }

    /// Map a signed quantity onto a trend by its sign.
    pub fn from_sign(value: f64) -> Self {
        if value > 0.0 {
            RiskTrend::Increasing
        } else if value < 0.0 {
            RiskTrend::Decreasing
        } else {
            RiskTrend::Static
        }
    }
}

/// Sampling summary for a facility over the queried window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringInfo {
    pub total_samples: usize,
    pub days_monitored: i64,
    pub avg_days_between_samples: f64,
}

/// One treatment plant and its scored samples for the queried window.
#[derive(Debug, Clone)]
pub struct Facility {
    pub site_id: String,
    pub population_served: u64,
    /// Jurisdiction the plant reports under.
    pub state: String,
    pub county: String,
    /// Comma-joined county FIPS codes; a plant may serve several counties.
    pub county_fips: String,
    /// Scored samples ordered by `date_end` ascending. Never empty.
    risk_over_time: Vec<DataPoint>,
    sampling_dates: Vec<NaiveDate>,
    unique_samples: usize,
}

impl Facility {
    /// Build a facility from all raw samples sharing one facility id.
    ///
    /// Static attributes come from the first record. Samples without a
    /// parseable `date_end` cannot be ordered and are dropped. Returns `None`
    /// when nothing usable is left.
    pub fn from_samples(samples: &[RawSample]) -> Option<Self> {
        let first = samples.first()?;

        let mut dated: Vec<(NaiveDate, DataPoint)> = Vec::with_capacity(samples.len());
        for sample in samples {
            match sample.end_date() {
                Ok(date) => dated.push((date, DataPoint::from_raw(sample))),
                Err(e) => warn!("Dropping sample from facility '{}': {}", sample.wwtp_id, e),
            }
        }
        if dated.is_empty() {
            debug!("Facility '{}' has no dated samples", first.wwtp_id);
            return None;
        }

        dated.sort_by_key(|(date, _)| *date);
        let (sampling_dates, risk_over_time): (Vec<NaiveDate>, Vec<DataPoint>) =
            dated.into_iter().unzip();
        let unique_samples = sampling_dates.iter().collect::<HashSet<_>>().len();

        Some(Self {
            site_id: first.wwtp_id.clone(),
            population_served: first.population(),
            state: first.wwtp_jurisdiction.clone(),
            county: first.county_names.clone(),
            county_fips: first.county_fips.clone(),
            risk_over_time,
            sampling_dates,
            unique_samples,
        })
    }

    /// The county FIPS codes this facility serves.
    pub fn county_fips_tokens(&self) -> Vec<String> {
        split_fips_list(&self.county_fips)
    }

    /// Scored samples, oldest first.
    pub fn data_points(&self) -> &[DataPoint] {
        &self.risk_over_time
    }

    /// The most recent sample.
    pub fn latest(&self) -> &DataPoint {
        &self.risk_over_time[self.risk_over_time.len() - 1]
    }

    /// Number of distinct sampling dates.
    pub fn unique_samples(&self) -> usize {
        self.unique_samples
    }

    /// Days between the first and last sample.
    pub fn monitoring_period(&self) -> i64 {
        match (self.sampling_dates.first(), self.sampling_dates.last()) {
            (Some(first), Some(last)) => (*last - *first).num_days(),
            _ => 0,
        }
    }

    pub fn monitoring_info(&self) -> MonitoringInfo {
        let days_monitored = self.monitoring_period();
        let intervals = self.unique_samples.saturating_sub(1).max(1);
        MonitoringInfo {
            total_samples: self.unique_samples,
            days_monitored,
            avg_days_between_samples: days_monitored as f64 / intervals as f64,
        }
    }

    /// Risk score of every sample, oldest first.
    pub fn all_readings(&self) -> Vec<f64> {
        self.risk_over_time.iter().map(DataPoint::risk_score).collect()
    }

    /// Arithmetic mean of every sample's risk score.
    pub fn mean_risk(&self) -> f64 {
        let readings = self.all_readings();
        readings.iter().sum::<f64>() / readings.len() as f64
    }

    /// Compare the two most recent samples. Fewer than two samples is static.
    pub fn risk_trend(&self) -> RiskTrend {
        match self.risk_over_time.as_slice() {
            [.., previous, latest] => {
                let (latest, previous) = (latest.risk_score(), previous.risk_score());
                if latest > previous {
                    RiskTrend::Increasing
                } else if latest < previous {
                    RiskTrend::Decreasing
                } else {
                    RiskTrend::Static
                }
            }
            _ => RiskTrend::Static,
        }
    }

    /// Whether the latest percentile is above the previous one.
    pub fn percentile_trend(&self) -> Option<bool> {
        match self.risk_over_time.as_slice() {
            [.., previous, latest] => Some(latest.percentile > previous.percentile),
            _ => None,
        }
    }
}

/// Group raw records by facility id and build one facility per group, in
/// first-seen order.
pub fn group_facilities(records: &[RawSample]) -> Vec<Facility> {
    let mut groups: IndexMap<&str, Vec<RawSample>> = IndexMap::new();
    for record in records {
        groups
            .entry(record.wwtp_id.as_str())
            .or_default()
            .push(record.clone());
    }

    let facilities: Vec<Facility> = groups
        .values()
        .filter_map(|samples| Facility::from_samples(samples))
        .collect();
    debug!("Grouped {} records into {} facilities", records.len(), facilities.len());
    facilities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, end: &str, percentile: f64) -> RawSample {
        RawSample::new(id)
            .with_jurisdiction("Ohio")
            .with_county("Franklin", "39049")
            .with_population(1000)
            .with_window("2024-01-01", end)
            .with_metrics(percentile, 0.0, 100.0)
    }

    #[test]
    fn test_samples_sorted_by_date() {
        let facility = Facility::from_samples(&[
            sample("1", "2024-01-20", 60.0),
            sample("1", "2024-01-05", 10.0),
            sample("1", "2024-01-12", 30.0),
        ])
        .unwrap();

        let percentiles: Vec<f64> = facility.data_points().iter().map(|p| p.percentile).collect();
        assert_eq!(percentiles, vec![10.0, 30.0, 60.0]);
        assert_eq!(facility.latest().percentile, 60.0);
        assert_eq!(facility.monitoring_period(), 15);
    }

    #[test]
    fn test_monitoring_info() {
        let facility = Facility::from_samples(&[
            sample("1", "2024-01-01", 10.0),
            sample("1", "2024-01-11", 10.0),
            sample("1", "2024-01-11", 20.0),
            sample("1", "2024-01-21", 30.0),
        ])
        .unwrap();

        let info = facility.monitoring_info();
        assert_eq!(info.total_samples, 3);
        assert_eq!(info.days_monitored, 20);
        assert_eq!(info.avg_days_between_samples, 10.0);
    }

    #[test]
    fn test_single_sample_facility() {
        let facility = Facility::from_samples(&[sample("1", "2024-01-01", 10.0)]).unwrap();
        let info = facility.monitoring_info();
        assert_eq!(info.days_monitored, 0);
        assert_eq!(info.avg_days_between_samples, 0.0);
        assert_eq!(facility.risk_trend(), RiskTrend::Static);
        assert_eq!(facility.percentile_trend(), None);
    }

    #[test]
    fn test_risk_trend() {
        let up = Facility::from_samples(&[
            sample("1", "2024-01-01", 10.0),
            sample("1", "2024-01-08", 20.0),
        ])
        .unwrap();
        assert_eq!(up.risk_trend(), RiskTrend::Increasing);
        assert_eq!(up.percentile_trend(), Some(true));

        let down = Facility::from_samples(&[
            sample("1", "2024-01-01", 50.0),
            sample("1", "2024-01-08", 20.0),
        ])
        .unwrap();
        assert_eq!(down.risk_trend(), RiskTrend::Decreasing);

        let flat = Facility::from_samples(&[
            sample("1", "2024-01-01", 10.0),
            sample("1", "2024-01-08", 20.0),
            sample("1", "2024-01-15", 20.0),
        ])
        .unwrap();
        assert_eq!(flat.risk_trend(), RiskTrend::Static);
    }

    #[test]
    fn test_mean_risk() {
        let facility = Facility::from_samples(&[
            RawSample::new("1").with_window("2024-01-01", "2024-01-01").with_metrics(100.0, 100.0, 100.0),
            RawSample::new("1").with_window("2024-01-01", "2024-01-08").with_metrics(0.0, -100.0, 0.0),
        ])
        .unwrap();
        assert_eq!(facility.all_readings(), vec![100.0, 0.0]);
        assert_eq!(facility.mean_risk(), 50.0);
    }

    #[test]
    fn test_undated_samples_dropped() {
        let mut undated = sample("1", "2024-01-01", 10.0);
        undated.date_end = Some("last tuesday".to_string());

        assert!(Facility::from_samples(&[undated.clone()]).is_none());
        let facility = Facility::from_samples(&[undated, sample("1", "2024-01-03", 40.0)]).unwrap();
        assert_eq!(facility.data_points().len(), 1);
    }

    #[test]
    fn test_county_fips_tokens() {
        let record = RawSample::new("1")
            .with_county("Franklin,Delaware", " 39049,,39041 ")
            .with_window("2024-01-01", "2024-01-08");
        let facility = Facility::from_samples(&[record.clone()]).unwrap();
        assert_eq!(facility.county_fips_tokens(), vec!["39049", "39041"]);
        assert_eq!(facility.county_fips_tokens(), record.county_fips_tokens());
    }

    #[test]
    fn test_group_facilities() {
        let records = vec![
            sample("b", "2024-01-01", 10.0),
            sample("a", "2024-01-01", 10.0),
            sample("b", "2024-01-08", 10.0),
        ];
        let facilities = group_facilities(&records);
        assert_eq!(facilities.len(), 2);
        assert_eq!(facilities[0].site_id, "b");
        assert_eq!(facilities[0].data_points().len(), 2);
        assert_eq!(facilities[1].site_id, "a");
    }
}
