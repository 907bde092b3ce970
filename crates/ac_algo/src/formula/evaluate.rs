//! Formula Pattern Evaluator: `evaluate(pattern, converted) → raw aggregate`.
//!
//! Civic auto-inclusion: with `auto_civic` set, the civic converted score is
//! added once (coefficient 1) unless the scheme already consumes civic, i.e.
//! weights it non-zero or pools it. Max-of decides this per alternative; a
//! `Sum` decides it once at its top level.

use ac_core::rules::{Aggregation, FormulaPattern};

use crate::formula::{alternatives::max_of, top_k::top_k_weighted, weighted::weighted_sum};
use crate::{ConvertedScores, Slot};

/// Raw aggregate of a whole pattern, base points included.
pub fn evaluate(pattern: &FormulaPattern, scores: &ConvertedScores) -> f64 {
    evaluate_scheme(&pattern.aggregation, scores, pattern.auto_civic) + pattern.base_points
}

/// One complete scheme with civic auto-inclusion applied.
pub fn evaluate_scheme(agg: &Aggregation, scores: &ConvertedScores, auto_civic: bool) -> f64 {
    if let Aggregation::MaxOf { alternatives } = agg {
        return max_of(alternatives, scores, auto_civic);
    }
    let civic = if auto_civic && !agg.consumes(Slot::Civic) { scores.value(Slot::Civic) } else { 0.0 };
    aggregate(agg, scores) + civic
}

/// The aggregation alone, without civic auto-inclusion.
pub fn aggregate(agg: &Aggregation, scores: &ConvertedScores) -> f64 {
    match agg {
        Aggregation::WeightedSum { weights } => weighted_sum(weights, scores),
        Aggregation::TopK { pool, coefficients } => top_k_weighted(pool, coefficients, scores),
        Aggregation::MaxOf { alternatives } => max_of(alternatives, scores, false),
        Aggregation::Sum { parts } => parts.iter().map(|p| aggregate(p, scores)).sum(),
    }
}
