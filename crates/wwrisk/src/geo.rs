//! US state lookup and jurisdiction overrides.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A state-level jurisdiction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateInfo {
    pub name: &'static str,
    pub abbreviation: &'static str,
    /// Two-digit state FIPS code.
    pub fips: &'static str,
}

const fn state(name: &'static str, abbreviation: &'static str, fips: &'static str) -> StateInfo {
    StateInfo {
        name,
        abbreviation,
        fips,
    }
}

static STATES: &[StateInfo] = &[
    state("Alabama", "AL", "01"),
    state("Alaska", "AK", "02"),
    state("Arizona", "AZ", "04"),
    state("Arkansas", "AR", "05"),
    state("California", "CA", "06"),
    state("Colorado", "CO", "08"),
    state("Connecticut", "CT", "09"),
    state("Delaware", "DE", "10"),
    state("District of Columbia", "DC", "11"),
    state("Florida", "FL", "12"),
    state("Georgia", "GA", "13"),
    state("Hawaii", "HI", "15"),
    state("Idaho", "ID", "16"),
    state("Illinois", "IL", "17"),
    state("Indiana", "IN", "18"),
    state("Iowa", "IA", "19"),
    state("Kansas", "KS", "20"),
    state("Kentucky", "KY", "21"),
    state("Louisiana", "LA", "22"),
    state("Maine", "ME", "23"),
    state("Maryland", "MD", "24"),
    state("Massachusetts", "MA", "25"),
    state("Michigan", "MI", "26"),
    state("Minnesota", "MN", "27"),
    state("Mississippi", "MS", "28"),
    state("Missouri", "MO", "29"),
    state("Montana", "MT", "30"),
    state("Nebraska", "NE", "31"),
    state("Nevada", "NV", "32"),
    state("New Hampshire", "NH", "33"),
    state("New Jersey", "NJ", "34"),
    state("New Mexico", "NM", "35"),
    state("New York", "NY", "36"),
    state("North Carolina", "NC", "37"),
    state("North Dakota", "ND", "38"),
    state("Ohio", "OH", "39"),
    state("Oklahoma", "OK", "40"),
    state("Oregon", "OR", "41"),
    state("Pennsylvania", "PA", "42"),
    state("Rhode Island", "RI", "44"),
    state("South Carolina", "SC", "45"),
    state("South Dakota", "SD", "46"),
    state("Tennessee", "TN", "47"),
    state("Texas", "TX", "48"),
    state("Utah", "UT", "49"),
    state("Vermont", "VT", "50"),
    state("Virginia", "VA", "51"),
    state("Washington", "WA", "53"),
    state("West Virginia", "WV", "54"),
    state("Wisconsin", "WI", "55"),
    state("Wyoming", "WY", "56"),
    state("Guam", "GU", "66"),
    state("Puerto Rico", "PR", "72"),
    state("Virgin Islands", "VI", "78"),
];

/// All known states and territories.
pub fn states() -> &'static [StateInfo] {
    STATES
}

/// Look a state up by full name (case-insensitive).
pub fn state_by_name(name: &str) -> Option<&'static StateInfo> {
    let name = name.trim();
    STATES.iter().find(|s| s.name.eq_ignore_ascii_case(name))
}

/// Look a state up by its two-digit FIPS code.
pub fn state_by_fips(fips: &str) -> Option<&'static StateInfo> {
    let fips = fips.trim();
    STATES.iter().find(|s| s.fips == fips)
}

/// Whether a five-digit county FIPS code lies in the given state.
pub fn county_in_state(county_fips: &str, state_fips: &str) -> bool {
    county_fips.trim().len() == 5 && county_fips.trim().starts_with(state_fips)
}

/// Jurisdictions the CDC reports separately from the state containing them,
/// keyed by the containing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JurisdictionOverrides(IndexMap<String, String>);

impl Default for JurisdictionOverrides {
    fn default() -> Self {
        let mut overrides = IndexMap::new();
        overrides.insert("New York".to_string(), "New York City".to_string());
        Self(overrides)
    }
}

impl JurisdictionOverrides {
    /// No overrides at all.
    pub fn none() -> Self {
        Self(IndexMap::new())
    }

    pub fn with(mut self, state: impl Into<String>, jurisdiction: impl Into<String>) -> Self {
        self.0.insert(state.into(), jurisdiction.into());
        self
    }

    /// The extra jurisdiction to include when searching `state`.
    pub fn get(&self, state: &str) -> Option<&str> {
        self.0.get(state).map(String::as_str)
    }
}
