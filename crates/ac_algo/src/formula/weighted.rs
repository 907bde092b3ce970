//! Plain weighted sum over fixed slots.

use std::collections::BTreeMap;

use crate::{ConvertedScores, Slot};

/// `Σ weight × value`. Slots the student lacks read as 0.
pub fn weighted_sum(weights: &BTreeMap<Slot, f64>, scores: &ConvertedScores) -> f64 {
    weights
        .iter()
        .filter(|(_, w)| **w != 0.0)
        .map(|(slot, w)| w * scores.value(*slot))
        .sum()
}
