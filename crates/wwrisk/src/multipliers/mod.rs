//! Demographic mortality multipliers: derivation from case data and the
//! persisted lookup tables consumed at serving time.

mod intersectional;
mod single;
mod table;
mod wilson;

pub use intersectional::{
    BuildReport, CaseRecord, Factor, IntersectionalBuilder, IntersectionalConfig, combinations,
};
pub use single::{
    GroupCounts, MortalityStats, PLACEHOLDER_GROUPS, build_single_factor, load_mortality_stats,
};
pub use table::{ConfidenceRange, MultiplierEntry, MultiplierTable};
pub use wilson::{WilsonInterval, Z_95, wilson_interval};

/// Deaths over cases, 0 when there are no cases.
pub(crate) fn rate(deaths: u64, cases: u64) -> f64 {
    if cases == 0 {
        0.0
    } else {
        deaths as f64 / cases as f64
    }
}

/// Build one table entry for a group measured against its factor's baseline
/// death rate. A zero baseline yields zero multipliers instead of dividing
/// by zero.
pub(crate) fn entry_for(counts: GroupCounts, baseline_rate: f64) -> MultiplierEntry {
    let death_rate = rate(counts.deaths, counts.cases);
    let interval = wilson_interval(counts.deaths, counts.cases);
    let relative = |value: f64| {
        if baseline_rate > 0.0 {
            value / baseline_rate
        } else {
            0.0
        }
    };

    MultiplierEntry {
        multiplier: relative(death_rate),
        confidence_range: ConfidenceRange {
            low: relative(interval.low.max(0.0)),
            high: relative(interval.high.min(1.0)),
        },
        sample_size: counts.cases,
        death_rate,
    }
}
