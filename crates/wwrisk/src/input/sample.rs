//! The raw wastewater sample record, as delivered by CDC-shaped sources.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, RiskError};

/// One wastewater measurement record.
///
/// Upstream data is noisy, so every measurement field is kept as the text the
/// source delivered. Interpretation (lenient number parsing, clamping) happens
/// when the sample is scored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSample {
    /// Facility identifier.
    #[serde(deserialize_with = "null_as_empty")]
    pub wwtp_id: String,
    /// Jurisdiction (state name) the facility reports under.
    #[serde(deserialize_with = "null_as_empty")]
    pub wwtp_jurisdiction: String,
    /// County name(s), comma-joined.
    #[serde(deserialize_with = "null_as_empty")]
    pub county_names: String,
    /// County FIPS code(s), comma-joined.
    #[serde(deserialize_with = "null_as_empty")]
    pub county_fips: String,
    #[serde(deserialize_with = "lenient_text")]
    pub population_served: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub date_start: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub date_end: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub percentile: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub ptc_15d: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub detect_prop_15d: Option<String>,
}

/// Any scalar a JSON or CSV source may put in a measurement column.
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LenientValue>::deserialize(deserializer)?;
    Ok(value
        .map(|v| match v {
            LenientValue::Text(s) => s,
            LenientValue::Integer(i) => i.to_string(),
            LenientValue::Float(f) => f.to_string(),
            LenientValue::Flag(b) => b.to_string(),
        })
        .filter(|s| !s.trim().is_empty()))
}

/// Text columns: `null` reads as empty. Kept as text so FIPS codes keep
/// their leading zeros.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl RawSample {
    /// Start a sample for a facility. The remaining fields are filled with the
    /// `with_*` setters.
    pub fn new(wwtp_id: impl Into<String>) -> Self {
        Self {
            wwtp_id: wwtp_id.into(),
            ..Self::default()
        }
    }

    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.wwtp_jurisdiction = jurisdiction.into();
        self
    }

    pub fn with_county(mut self, names: impl Into<String>, fips: impl Into<String>) -> Self {
        self.county_names = names.into();
        self.county_fips = fips.into();
        self
    }

    pub fn with_population(mut self, population: u64) -> Self {
        self.population_served = Some(population.to_string());
        self
    }

    pub fn with_window(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.date_start = Some(start.into());
        self.date_end = Some(end.into());
        self
    }

    pub fn with_metrics(mut self, percentile: f64, ptc_15d: f64, detect_prop_15d: f64) -> Self {
        self.percentile = Some(percentile.to_string());
        self.ptc_15d = Some(ptc_15d.to_string());
        self.detect_prop_15d = Some(detect_prop_15d.to_string());
        self
    }

    /// Population served, parsed leniently. Missing, negative or garbage
    /// values count as zero.
    pub fn population(&self) -> u64 {
        let Some(raw) = self.population_served.as_deref().map(str::trim) else {
            return 0;
        };
        if let Ok(value) = raw.parse::<u64>() {
            return value;
        }
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => value.trunc() as u64,
            _ => 0,
        }
    }

    /// The county FIPS tokens this facility belongs to.
    pub fn county_fips_tokens(&self) -> Vec<String> {
        split_fips_list(&self.county_fips)
    }

    /// Parsed `date_end`.
    pub fn end_date(&self) -> Result<NaiveDate> {
        match self.date_end.as_deref() {
            Some(raw) => parse_sample_date(raw),
            None => Err(RiskError::InvalidDate(format!(
                "sample from facility '{}' has no date_end",
                self.wwtp_id
            ))),
        }
    }

    /// Parsed `date_start`.
    pub fn start_date(&self) -> Result<NaiveDate> {
        match self.date_start.as_deref() {
            Some(raw) => parse_sample_date(raw),
            None => Err(RiskError::InvalidDate(format!(
                "sample from facility '{}' has no date_start",
                self.wwtp_id
            ))),
        }
    }
}

/// Split a comma-joined county FIPS list, dropping blanks.
pub fn split_fips_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a sample date. Accepts `YYYY-MM-DD` and the ISO timestamps the CDC
/// API returns (`2024-01-15T00:00:00.000`).
pub fn parse_sample_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.split(['T', ' ']).next().unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| RiskError::InvalidDate(format!("'{}': {}", raw, e)))
}

/// Parse a measurement leniently: missing, non-numeric and non-finite values
/// become 0.
pub fn parse_number(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Check if a value represents a missing/placeholder demographic value.
pub fn is_missing_value(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
}
