//! CLI command implementations.

pub mod intersectional;
pub mod multipliers;
pub mod personal;
pub mod regions;
