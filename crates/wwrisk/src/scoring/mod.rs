//! Per-sample scoring and the category vocabularies built on the score scale.

mod category;
mod datapoint;

pub use category::{MortalityCategory, NO_DATA_RISK_ID, RiskCategory};
pub use datapoint::{
    DETECT_PROP_WEIGHT, DataPoint, MAX_ABS_PTC_15D, PERCENTILE_WEIGHT, TREND_WEIGHT,
};
