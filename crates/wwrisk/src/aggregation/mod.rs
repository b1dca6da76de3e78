//! Facility and region aggregation of scored samples.

mod facility;
mod region;

pub use facility::{Facility, MonitoringInfo, RiskTrend, group_facilities};
pub use region::{GeographicRegion, RegionLevel, RegionSummary};
