//! Score categories.
//!
//! Both vocabularies share the same breakpoints on the 0-100 score scale;
//! each tier is closed on its lower bound.

use std::fmt;

use serde::{Deserialize, Serialize};

/// `risk_id` reported for a region with no facilities. The map renderer
/// treats it as "no data".
pub const NO_DATA_RISK_ID: u16 = 404;

/// Lower bounds of tiers 1..=4 (tier 0 is everything below 20).
const TIER_FLOORS: [f64; 4] = [20.0, 40.0, 60.0, 80.0];

/// Tier index 0-4 for a score. NaN falls in the lowest tier.
fn tier(score: f64) -> usize {
    TIER_FLOORS.iter().take_while(|&&floor| score >= floor).count()
}

/// Wastewater risk category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskCategory {
    #[serde(rename = "Very Low")]
    VeryLow,
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "Medium")]
    Medium,
    #[serde(rename = "High")]
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskCategory {
    /// All categories in ascending order; a category's position is its `risk_id`.
    pub const ALL: [RiskCategory; 5] = [
        RiskCategory::VeryLow,
        RiskCategory::Low,
        RiskCategory::Medium,
        RiskCategory::High,
        RiskCategory::VeryHigh,
    ];

    /// Categorize a score.
    pub fn from_score(score: f64) -> Self {
        Self::ALL[tier(score)]
    }

    /// Ordinal used by the map renderer (0-4).
    pub fn risk_id(self) -> u16 {
        self as u16
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            RiskCategory::VeryLow => "Very Low",
            RiskCategory::Low => "Low",
            RiskCategory::Medium => "Medium",
            RiskCategory::High => "High",
            RiskCategory::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Answer to "will COVID get me?", shown to a signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MortalityCategory {
    #[serde(rename = "I don't think so")]
    DontThinkSo,
    #[serde(rename = "Probably not")]
    ProbablyNot,
    #[serde(rename = "Maybe?")]
    Maybe,
    #[serde(rename = "Probably")]
    Probably,
    #[serde(rename = "Absolutely it will")]
    AbsolutelyItWill,
}

impl MortalityCategory {
    pub const ALL: [MortalityCategory; 5] = [
        MortalityCategory::DontThinkSo,
        MortalityCategory::ProbablyNot,
        MortalityCategory::Maybe,
        MortalityCategory::Probably,
        MortalityCategory::AbsolutelyItWill,
    ];

    pub fn from_score(score: f64) -> Self {
        Self::ALL[tier(score)]
    }

    pub fn label(self) -> &'static str {
        match self {
            MortalityCategory::DontThinkSo => "I don't think so",
            MortalityCategory::ProbablyNot => "Probably not",
            MortalityCategory::Maybe => "Maybe?",
            MortalityCategory::Probably => "Probably",
            MortalityCategory::AbsolutelyItWill => "Absolutely it will",
        }
    }
}

impl fmt::Display for MortalityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
