//! Wilson score interval for a binomial proportion.

use serde::{Deserialize, Serialize};

/// z value for a two-sided 95% interval.
pub const Z_95: f64 = 1.96;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WilsonInterval {
    pub low: f64,
    pub center: f64,
    pub high: f64,
}

/// 95% Wilson score interval for `deaths` out of `cases`.
///
/// Zero cases gives an all-zero interval.
pub fn wilson_interval(deaths: u64, cases: u64) -> WilsonInterval {
    if cases == 0 {
        return WilsonInterval {
            low: 0.0,
            center: 0.0,
            high: 0.0,
        };
    }

    let n = cases as f64;
    let p = deaths as f64 / n;
    let z2 = Z_95 * Z_95;

    let denominator = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denominator;
    let spread = Z_95 * ((p * (1.0 - p) + z2 / (4.0 * n)) / n).sqrt() / denominator;

    WilsonInterval {
        low: center - spread,
        center,
        high: center + spread,
    }
}
