//! wwrisk: wastewater surveillance risk engine.
//!
//! Turns raw per-facility wastewater samples into per-region (state or
//! county) risk scores, categories and trends, and combines a region's score
//! with demographic mortality multipliers into a personalized risk estimate.
//!
//! # Pipeline
//!
//! - **Scoring**: each raw sample becomes a validated [`DataPoint`]
//! - **Facilities**: samples are grouped per treatment plant and ordered by date
//! - **Regions**: facilities are population-weighted into a state or county score
//! - **Multipliers**: offline builders derive mortality multipliers from case data
//! - **Personalization**: [`MortalityCalculator`] adjusts a region score for a user
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use wwrisk::{JsonRecordSource, RiskEngine};
//!
//! let engine = RiskEngine::new(JsonRecordSource::new("samples.json"));
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
//!
//! for region in engine.state_report(start, end).unwrap() {
//!     println!("{}: {:.1} ({:?})", region.name, region.risk_score, region.risk_trend);
//! }
//! ```

pub mod aggregation;
pub mod error;
pub mod geo;
pub mod input;
pub mod mortality;
pub mod multipliers;
pub mod scoring;

mod engine;

pub use crate::engine::{EngineConfig, RiskEngine, build_regions};
pub use aggregation::{Facility, GeographicRegion, RegionLevel, RegionSummary, RiskTrend};
pub use error::{Result, RiskError};
pub use input::{
    CsvRecordSource, FallbackSource, InMemorySource, JsonRecordSource, RawSample, RecordQuery,
    RecordSource,
};
pub use mortality::{Demographics, MortalityCalculator, PersonalizedRisk};
pub use multipliers::{MultiplierEntry, MultiplierTable};
pub use scoring::{DataPoint, MortalityCategory, RiskCategory};
