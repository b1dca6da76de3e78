//! Personalized mortality risk: a region's wastewater risk score adjusted by
//! the user's demographic multipliers.

use std::path::Path;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};
use crate::multipliers::MultiplierTable;
use crate::scoring::MortalityCategory;

/// Share of the multiplier-driven shift from the baseline that is kept.
pub const DAMPENING: f64 = 0.2;
/// Relative width of the confidence band around the combined multiplier.
const CONFIDENCE_SPREAD: f64 = 0.2;

/// A demographic factor looked up in the single-factor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DemographicFactor {
    AgeGroup,
    Sex,
    Race,
    Ethnicity,
}

impl DemographicFactor {
    pub const ALL: [DemographicFactor; 4] = [
        DemographicFactor::AgeGroup,
        DemographicFactor::Sex,
        DemographicFactor::Race,
        DemographicFactor::Ethnicity,
    ];

    /// Factor key in the multiplier table.
    pub fn table_key(self) -> &'static str {
        match self {
            DemographicFactor::AgeGroup => "age_groups",
            DemographicFactor::Sex => "sex",
            DemographicFactor::Race => "race",
            DemographicFactor::Ethnicity => "ethnicity",
        }
    }
}

/// Map a birth year to the CDC age-group label used by the multiplier table.
pub fn age_group_for(birth_year: i32, current_year: i32) -> Option<&'static str> {
    match current_year.checked_sub(birth_year)? {
        0..=17 => Some("0 - 17 years"),
        18..=49 => Some("18 to 49 years"),
        50..=64 => Some("50 to 64 years"),
        age if age >= 65 => Some("65+ years"),
        _ => None,
    }
}

/// A user's demographic profile. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    pub age_group: Option<String>,
    pub sex: Option<String>,
    pub race: Option<String>,
    pub ethnicity: Option<String>,
}

impl Demographics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_age_group(mut self, age_group: impl Into<String>) -> Self {
        self.age_group = Some(age_group.into());
        self
    }

    pub fn with_sex(mut self, sex: impl Into<String>) -> Self {
        self.sex = Some(sex.into());
        self
    }

    pub fn with_race(mut self, race: impl Into<String>) -> Self {
        self.race = Some(race.into());
        self
    }

    pub fn with_ethnicity(mut self, ethnicity: impl Into<String>) -> Self {
        self.ethnicity = Some(ethnicity.into());
        self
    }

    /// The value for one factor, treating empty strings as absent.
    pub fn value(&self, factor: DemographicFactor) -> Option<&str> {
        let value = match factor {
            DemographicFactor::AgeGroup => self.age_group.as_deref(),
            DemographicFactor::Sex => self.sex.as_deref(),
            DemographicFactor::Race => self.race.as_deref(),
            DemographicFactor::Ethnicity => self.ethnicity.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Confidence band around a personalized risk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskConfidence {
    pub low: f64,
    pub high: f64,
    /// Cases behind the matched multipliers, summed.
    pub sample_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonalizedRisk {
    /// Adjusted risk on the 0-100 scale.
    pub final_risk: f64,
    pub confidence: RiskConfidence,
    /// Product of the matched factor multipliers.
    pub combined_multiplier: f64,
}

impl PersonalizedRisk {
    pub fn category(&self) -> MortalityCategory {
        MortalityCategory::from_score(self.final_risk)
    }
}

/// Combines a region risk score with single-factor mortality multipliers.
///
/// The table is read-only after construction and can be shared between
/// threads.
#[derive(Debug, Clone)]
pub struct MortalityCalculator {
    multipliers: Arc<MultiplierTable>,
}

impl MortalityCalculator {
    pub fn new(multipliers: MultiplierTable) -> Self {
        Self {
            multipliers: Arc::new(multipliers),
        }
    }

    /// Share an already loaded table.
    pub fn with_shared(multipliers: Arc<MultiplierTable>) -> Self {
        Self { multipliers }
    }

    /// Load the single-factor table from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(MultiplierTable::load(path)?))
    }

    pub fn multipliers(&self) -> &MultiplierTable {
        &self.multipliers
    }

    /// Personalize `county_risk_score`.
    ///
    /// Factors that are absent or not in the table leave the score alone.
    /// The shift away from the county score is dampened once, after all
    /// multipliers are combined.
    pub fn compute(
        &self,
        demographics: &Demographics,
        county_risk_score: f64,
    ) -> Result<PersonalizedRisk> {
        if !county_risk_score.is_finite() {
            return Err(RiskError::InvalidInput(format!(
                "risk score must be a finite number, got {}",
                county_risk_score
            )));
        }

        let mut combined_multiplier = 1.0;
        let mut total_sample_size = 0u64;
        for factor in DemographicFactor::ALL {
            let Some(value) = demographics.value(factor) else {
                continue;
            };
            if let Some(entry) = self.multipliers.get(factor.table_key(), value) {
                combined_multiplier *= entry.multiplier;
                total_sample_size += entry.sample_size;
            }
        }

        let base = county_risk_score;
        let final_risk = dampen(base, base * combined_multiplier);
        let confidence = RiskConfidence {
            low: dampen(base, base * combined_multiplier * (1.0 - CONFIDENCE_SPREAD)),
            high: dampen(base, base * combined_multiplier * (1.0 + CONFIDENCE_SPREAD)),
            sample_size: total_sample_size,
        };
        debug!(
            "Personalized risk {:.2} (county {:.2}, multiplier {:.3})",
            final_risk, base, combined_multiplier
        );

        Ok(PersonalizedRisk {
            final_risk,
            confidence,
            combined_multiplier,
        })
    }

    /// Like [`compute`](Self::compute), for a risk score given as text.
    pub fn compute_from_str(
        &self,
        demographics: &Demographics,
        county_risk_score: &str,
    ) -> Result<PersonalizedRisk> {
        let score = county_risk_score.trim().parse::<f64>().map_err(|_| {
            RiskError::InvalidInput(format!("Invalid risk score '{}'", county_risk_score))
        })?;
        self.compute(demographics, score)
    }

    /// The category answer for a risk score given as text.
    pub fn risk_category(
        &self,
        demographics: &Demographics,
        county_risk_score: &str,
    ) -> Result<MortalityCategory> {
        Ok(self.compute_from_str(demographics, county_risk_score)?.category())
    }
}

/// Keep only [`DAMPENING`] of the move from `base` to `raw`, clamped to 0-100.
fn dampen(base: f64, raw: f64) -> f64 {
    (base + (raw - base) * DAMPENING).clamp(0.0, 100.0)
}
