//! Percentile placement, peer averages and risk levels.

use ac_core::rules::RiskThreshold;
use ac_core::tables::{PeerAverageTable, PercentileBand};

use crate::fallback::resolve;

/// Cumulative percentile of `score`: the first band (ascending percentile)
/// whose threshold is ≤ `score`; below every threshold gives the last band.
pub fn percentile_for(bands: &[PercentileBand], score: f64) -> Option<f64> {
    bands
        .iter()
        .find(|b| score >= b.score)
        .or_else(|| bands.last())
        .map(|b| b.percentile)
}

/// Peer average for `program` on the row nearest `standard_sum`; returns the matched row key too.
pub fn peer_average(table: &PeerAverageTable, standard_sum: i32, program: &str) -> Option<(i32, f64)> {
    let key = resolve(table.keys(), standard_sum)?;
    let avg = table.row(key)?.get(program)?;
    Some((key, *avg))
}

/// Highest level whose threshold is met; below all thresholds gives −5.
/// No thresholds, or a zero score, gives `None`.
pub fn risk_level(score: f64, thresholds: &[RiskThreshold]) -> Option<i8> {
    if thresholds.is_empty() || score == 0.0 {
        return None;
    }
    let mut ordered: Vec<&RiskThreshold> = thresholds.iter().collect();
    ordered.sort_by(|a, b| b.level.cmp(&a.level));
    Some(ordered.into_iter().find(|t| score >= t.score).map_or(-5, |t| t.level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ac_core::ProgramKey;
    use std::collections::BTreeMap;

    fn bands() -> Vec<PercentileBand> {
        vec![
            PercentileBand { percentile: 0.5, score: 680.0 },
            PercentileBand { percentile: 1.0, score: 660.0 },
            PercentileBand { percentile: 3.0, score: 620.0 },
        ]
    }

    #[test]
    fn percentile_walks_bands_ascending() {
        assert_eq!(percentile_for(&bands(), 690.0), Some(0.5));
        assert_eq!(percentile_for(&bands(), 660.0), Some(1.0));
        assert_eq!(percentile_for(&bands(), 640.0), Some(3.0));
        assert_eq!(percentile_for(&bands(), 100.0), Some(3.0));
        assert_eq!(percentile_for(&[], 100.0), None);
    }

    #[test]
    fn peer_average_uses_nearest_row() {
        let row = |v: f64| -> BTreeMap<ProgramKey, f64> { [("P".parse().unwrap(), v)].into_iter().collect() };
        let t = PeerAverageTable::from_rows([(400, row(600.0)), (410, row(615.0))]);
        assert_eq!(peer_average(&t, 404, "P"), Some((400, 600.0)));
        assert_eq!(peer_average(&t, 405, "P"), Some((400, 600.0)));
        assert_eq!(peer_average(&t, 409, "P"), Some((410, 615.0)));
        assert_eq!(peer_average(&t, 409, "Q"), None);
    }

    #[test]
    fn risk_levels() {
        let t: Vec<RiskThreshold> = [(5, 650.0), (1, 620.0), (-1, 600.0), (-5, 560.0)]
            .into_iter()
            .map(|(level, score)| RiskThreshold { level, score })
            .collect();
        assert_eq!(risk_level(655.0, &t), Some(5));
        assert_eq!(risk_level(620.0, &t), Some(1));
        assert_eq!(risk_level(610.0, &t), Some(-1));
        assert_eq!(risk_level(500.0, &t), Some(-5));
        assert_eq!(risk_level(0.0, &t), None);
        assert_eq!(risk_level(600.0, &[]), None);
    }
}
