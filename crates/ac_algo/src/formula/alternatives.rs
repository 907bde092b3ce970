//! Max over complete alternative schemes.

use ac_core::rules::Aggregation;

use crate::formula::evaluate::evaluate_scheme;
use crate::ConvertedScores;

/// Evaluate each alternative on its own (civic auto-inclusion decided per
/// alternative) and keep the largest. An empty list yields 0.
pub fn max_of(alternatives: &[Aggregation], scores: &ConvertedScores, auto_civic: bool) -> f64 {
    alternatives
        .iter()
        .map(|a| evaluate_scheme(a, scores, auto_civic))
        .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))))
        .unwrap_or(0.0)
}
