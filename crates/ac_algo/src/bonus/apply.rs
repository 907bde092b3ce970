//! Bonus Rule Evaluator: `apply_bonus(raw, converted, rule) → final`.
//!
//! Bonuses are additive and never negative, so `final_score ≥ raw`.

use ac_core::rules::BonusRule;

use crate::bonus::comparative::{comparative, ComparativeSpec};
use crate::bonus::elective_rate::{elective_rate, RateSpec};
use crate::bonus::fixed::fixed_per_elective;
use crate::ConvertedScores;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BonusOutcome {
    pub final_score: f64,
    pub bonus: f64,
}

pub fn bonus_amount(rule: &BonusRule, scores: &ConvertedScores) -> f64 {
    let raw = match rule {
        BonusRule::ElectiveRate { filter, rate, advanced_rate, by_count, min_qualifying, basis } => elective_rate(
            RateSpec {
                filter,
                rate: *rate,
                advanced_rate: *advanced_rate,
                by_count,
                min_qualifying: *min_qualifying,
                basis: *basis,
            },
            scores,
        ),
        BonusRule::FixedPerElective { filter, amount, min_qualifying, max_counted } => {
            fixed_per_elective(filter, *amount, *min_qualifying, *max_counted, scores)
        }
        BonusRule::Comparative { lhs, rhs, coefficient, award, basis, award_on, award_basis, math, electives } => {
            comparative(
                ComparativeSpec {
                    lhs,
                    rhs: rhs.as_ref(),
                    coefficient: *coefficient,
                    award: *award,
                    basis: *basis,
                    award_on: award_on.as_ref(),
                    award_basis: *award_basis,
                    math: *math,
                    electives: electives.as_ref(),
                },
                scores,
            )
        }
    };
    // NaN and negatives both collapse to 0
    if raw > 0.0 { raw } else { 0.0 }
}

pub fn apply_bonus(raw_aggregate: f64, scores: &ConvertedScores, rule: Option<&BonusRule>) -> BonusOutcome {
    let bonus = rule.map_or(0.0, |r| bonus_amount(r, scores));
    BonusOutcome { final_score: raw_aggregate + bonus, bonus }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{elective, scores};
    use crate::{ElectiveArea, Slot};
    use ac_core::rules::{ComparativeAward, ElectiveFilter, Operand};
    use crate::BonusBasis;

    #[test]
    fn no_rule_passes_through() {
        let s = scores(&[], vec![]);
        assert_eq!(apply_bonus(500.0, &s, None), BonusOutcome { final_score: 500.0, bonus: 0.0 });
    }

    #[test]
    fn elective_rate_adds_to_raw() {
        let s = scores(&[], vec![elective("Physics1", ElectiveArea::Science, 60.0)]);
        let rule = BonusRule::ElectiveRate {
            filter: ElectiveFilter::default(),
            rate: 0.1,
            advanced_rate: None,
            by_count: vec![],
            min_qualifying: 1,
            basis: BonusBasis::Converted,
        };
        let out = apply_bonus(400.0, &s, Some(&rule));
        assert!((out.final_score - 406.0).abs() < 1e-9);
    }

    #[test]
    fn negative_coefficient_never_lowers_the_score() {
        let s = scores(&[(Slot::Math, 140.0), (Slot::Korean, 120.0)], vec![]);
        let rule = BonusRule::Comparative {
            lhs: Operand::Slot(Slot::Math),
            rhs: Some(Operand::Slot(Slot::Korean)),
            coefficient: -1.0,
            award: ComparativeAward::Difference,
            basis: BonusBasis::Converted,
            award_on: None,
            award_basis: None,
            math: None,
            electives: None,
        };
        let out = apply_bonus(300.0, &s, Some(&rule));
        assert_eq!(out.final_score, 300.0);
        assert_eq!(out.bonus, 0.0);
    }
}
