//! Rank-indexed selection: "top-k of n" aggregation, n-th rank operands and
//! the default elective choice.

use ac_core::determinism::{cmp_score_desc, rank_desc_stable};

use crate::{BonusBasis, ConvertedElective, ConvertedScores, ElectiveArea, Slot};

/// The `k` largest values, descending; equal values keep input order.
pub fn select_top_k(values: &[f64], k: usize) -> Vec<f64> {
    rank_desc_stable(values).into_iter().take(k).map(|i| values[i]).collect()
}

/// `Σ coefficients[r] × (r+1)-th largest pool value`, with `k = coefficients.len()`.
/// A pool shorter than `k` contributes only the ranks it has.
pub fn top_k_weighted(pool: &[Slot], coefficients: &[f64], scores: &ConvertedScores) -> f64 {
    let values: Vec<f64> = pool.iter().map(|s| scores.value(*s)).collect();
    select_top_k(&values, coefficients.len())
        .into_iter()
        .zip(coefficients)
        .map(|(v, c)| v * c)
        .sum()
}

/// The `rank`-th (1-based) largest value of `pool` under `basis`.
pub fn nth_largest(pool: &[Slot], rank: u8, scores: &ConvertedScores, basis: BonusBasis) -> f64 {
    let values: Vec<f64> = pool.iter().map(|s| scores.value_by(*s, basis)).collect();
    let idx = usize::from(rank.max(1)) - 1;
    rank_desc_stable(&values).get(idx).map_or(0.0, |i| values[*i])
}

/// Default elective choice: the `count` best by converted score within
/// `area` (if any). Candidates arrive in name order, so ties go to name order.
pub fn select_top_electives(
    candidates: &[ConvertedElective],
    count: usize,
    area: Option<ElectiveArea>,
) -> Vec<ConvertedElective> {
    let mut pool: Vec<&ConvertedElective> =
        candidates.iter().filter(|e| area.map_or(true, |a| e.area == a)).collect();
    pool.sort_by(|a, b| cmp_score_desc(a.value.converted, b.value.converted));
    pool.into_iter().take(count).cloned().collect()
}
