//! Advantage report: the actual conversion against the optimizer's best,
//! placed on the program's percentile bands and, when configured, against
//! the peer average for the student's standard-score sum.

use ac_algo::{peer_average, percentile_for};
use ac_core::{rounding::round2, StudentScoreSet};
use serde::Serialize;
use tracing::debug;

use crate::convert::try_convert;
use crate::optimize::{find_best_score, ConsideredSubset};
use crate::result::ConversionError;
use crate::EngineData;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AdvantageReport {
    pub program: String,
    pub actual_score: f64,
    pub actual_electives: Vec<String>,
    pub best_score: f64,
    pub best_electives: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_percentile: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_percentile: Option<f64>,
    /// `actual_percentile − best_percentile`; positive means the actual choice ranks lower.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advantage_percentile: Option<f64>,
    pub standard_score_sum: i32,
    /// Peer-average row actually used (nearest to `standard_score_sum`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_row: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_average: Option<f64>,
    /// `peer_average − actual_score`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_difference: Option<f64>,
    pub considered: Vec<ConsideredSubset>,
}

pub fn advantage(data: &EngineData, student: &StudentScoreSet, program: &str) -> Result<AdvantageReport, ConversionError> {
    let best = find_best_score(data, student, program)?;
    let actual = try_convert(data, student, program)?;

    let bands = data.percentiles.bands(program).unwrap_or(&[]);
    let actual_percentile = percentile_for(bands, actual.final_score);
    let best_percentile = percentile_for(bands, best.conversion.final_score);
    let advantage_percentile = match (actual_percentile, best_percentile) {
        (Some(a), Some(b)) => Some(round2(a - b)),
        _ => None,
    };

    let peer = data
        .peer_averages
        .as_ref()
        .and_then(|t| peer_average(t, actual.standard_score_sum, program));
    let score_difference = peer.map(|(_, avg)| round2(avg - actual.final_score));
    debug!(program, ?actual_percentile, ?best_percentile, peer_row = ?peer.map(|p| p.0), "advantage computed");

    Ok(AdvantageReport {
        program: program.to_string(),
        actual_score: round2(actual.final_score),
        actual_electives: actual.electives_used.iter().map(|n| n.to_string()).collect(),
        best_score: round2(best.conversion.final_score),
        best_electives: best.best_electives(),
        actual_percentile,
        best_percentile,
        advantage_percentile,
        standard_score_sum: actual.standard_score_sum,
        peer_row: peer.map(|(row, _)| row),
        peer_average: peer.map(|(_, avg)| avg),
        score_difference,
        considered: best.considered,
    })
}
