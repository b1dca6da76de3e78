//! Validation and scoring of a single wastewater sample.

use serde::{Deserialize, Serialize};

use crate::input::{RawSample, parse_number};
use super::category::RiskCategory;

/// Weight of the national percentile in the risk score.
pub const PERCENTILE_WEIGHT: f64 = 0.45;
/// Weight of the 15-day trend score in the risk score.
pub const TREND_WEIGHT: f64 = 0.40;
/// Weight of the 15-day detection proportion in the risk score.
pub const DETECT_PROP_WEIGHT: f64 = 0.15;
/// Largest believable 15-day percent change; anything beyond is sensor noise.
pub const MAX_ABS_PTC_15D: f64 = 1000.0;

/// A validated view of one raw sample.
///
/// Out-of-range inputs are made inert (set to 0) rather than rejected, so
/// scoring is total over dirty upstream data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// National percentile of viral concentration, in [0, 100].
    pub percentile: f64,
    /// 15-day percent change, with |value| <= 1000.
    pub ptc_15d: f64,
    /// 15-day detection proportion, in [0, 100].
    pub detect_prop: f64,
}

impl DataPoint {
    /// Validate raw measurements.
    pub fn new(percentile: f64, ptc_15d: f64, detect_prop: f64) -> Self {
        Self {
            percentile: zero_outside(percentile, 0.0, 100.0),
            ptc_15d: zero_outside(ptc_15d, -MAX_ABS_PTC_15D, MAX_ABS_PTC_15D),
            detect_prop: zero_outside(detect_prop, 0.0, 100.0),
        }
    }

    /// Build from a raw record. Missing or non-numeric fields read as 0.
    pub fn from_raw(sample: &RawSample) -> Self {
        Self::new(
            parse_number(sample.percentile.as_deref()),
            parse_number(sample.ptc_15d.as_deref()),
            parse_number(sample.detect_prop_15d.as_deref()),
        )
    }

    /// The percent change mapped onto 0-100 (-100% -> 0, 0% -> 50, +100% -> 100).
    pub fn trend_score(&self) -> f64 {
        ((self.ptc_15d + 100.0) / 2.0).clamp(0.0, 100.0)
    }

    pub fn risk_score(&self) -> f64 {
        self.percentile * PERCENTILE_WEIGHT
            + self.trend_score() * TREND_WEIGHT
            + self.detect_prop * DETECT_PROP_WEIGHT
    }

    pub fn risk_category(&self) -> RiskCategory {
        RiskCategory::from_score(self.risk_score())
    }
}

fn zero_outside(value: f64, low: f64, high: f64) -> f64 {
    if (low..=high).contains(&value) { value } else { 0.0 }
}
