//! Percentage-of-elective bonus.

use ac_core::rules::ElectiveFilter;

use crate::{BonusBasis, ConvertedScores, ElectiveTier};

#[derive(Clone, Copy, Debug)]
pub struct RateSpec<'a> {
    pub filter: &'a ElectiveFilter,
    pub rate: f64,
    pub advanced_rate: Option<f64>,
    pub by_count: &'a [f64],
    pub min_qualifying: u8,
    pub basis: BonusBasis,
}

/// `Σ value_j × rate_j` over qualifying chosen electives.
///
/// `rate_j` is `advanced_rate` for Ⅱ electives when set, else `by_count[n-1]`
/// (n = number qualifying), else `rate`. Nothing is awarded below
/// `min_qualifying`.
pub fn elective_rate(spec: RateSpec<'_>, scores: &ConvertedScores) -> f64 {
    let qualifying: Vec<_> = scores
        .electives
        .iter()
        .filter(|e| spec.filter.admits(e.name.as_str(), e.area, e.tier))
        .collect();
    let n = qualifying.len();
    if n == 0 || n < usize::from(spec.min_qualifying) {
        return 0.0;
    }
    let base_rate = spec.by_count.get(n - 1).copied().unwrap_or(spec.rate);
    qualifying
        .iter()
        .map(|e| {
            let rate = match (e.tier, spec.advanced_rate) {
                (ElectiveTier::Advanced, Some(r)) => r,
                _ => base_rate,
            };
            e.value.by_basis(spec.basis) * rate
        })
        .sum()
}
