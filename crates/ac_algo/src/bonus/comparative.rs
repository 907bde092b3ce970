//! Comparison-based bonus between two operands.
//!
//! `lhs` and `rhs` are compared on `basis`; the awarded amount is read from
//! `award_on` (else `lhs`) on `award_basis` (else `basis`).

use ac_core::rules::{ComparativeAward, ElectiveGate, MathRequirement, Operand};

use crate::formula::top_k::nth_largest;
use crate::{BonusBasis, ConvertedScores};

fn operand_value(op: &Operand, scores: &ConvertedScores, basis: BonusBasis) -> f64 {
    match op {
        Operand::Slot(slot) => scores.value_by(*slot, basis),
        Operand::Rank { pool, rank } => nth_largest(pool, *rank, scores, basis),
    }
}

fn gate_open(gate: &ElectiveGate, scores: &ConvertedScores) -> bool {
    let n = scores
        .electives
        .iter()
        .filter(|e| gate.filter.admits(e.name.as_str(), e.area, e.tier))
        .count();
    n == usize::from(gate.count)
}

#[derive(Clone, Copy, Debug)]
pub struct ComparativeSpec<'a> {
    pub lhs: &'a Operand,
    pub rhs: Option<&'a Operand>,
    pub coefficient: f64,
    pub award: ComparativeAward,
    pub basis: BonusBasis,
    pub award_on: Option<&'a Operand>,
    pub award_basis: Option<BonusBasis>,
    pub math: Option<MathRequirement>,
    pub electives: Option<&'a ElectiveGate>,
}

impl<'a> ComparativeSpec<'a> {
    pub fn new(lhs: &'a Operand, rhs: Option<&'a Operand>, coefficient: f64, award: ComparativeAward) -> Self {
        ComparativeSpec {
            lhs,
            rhs,
            coefficient,
            award,
            basis: BonusBasis::Converted,
            award_on: None,
            award_basis: None,
            math: None,
            electives: None,
        }
    }
}

pub fn comparative(spec: ComparativeSpec<'_>, scores: &ConvertedScores) -> f64 {
    if let Some(req) = spec.math {
        if !req.admits(scores.math_branch) {
            return 0.0;
        }
    }
    if let Some(gate) = spec.electives {
        if !gate_open(gate, scores) {
            return 0.0;
        }
    }
    if let Some(rhs) = spec.rhs {
        let a = operand_value(spec.lhs, scores, spec.basis);
        let b = operand_value(rhs, scores, spec.basis);
        if a <= b {
            return 0.0;
        }
    }

    let award_basis = spec.award_basis.unwrap_or(spec.basis);
    let amount = operand_value(spec.award_on.unwrap_or(spec.lhs), scores, award_basis);
    match (spec.award, spec.rhs) {
        (ComparativeAward::Difference, Some(rhs)) => {
            (amount - operand_value(rhs, scores, award_basis)).max(0.0) * spec.coefficient
        }
        _ => amount * spec.coefficient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{elective, scores};
    use crate::{ElectiveArea, MathBranch, SlotValue, Slot};
    use ac_core::rules::ElectiveFilter;

    fn spec<'a>(lhs: &'a Operand, rhs: Option<&'a Operand>, award: ComparativeAward) -> ComparativeSpec<'a> {
        ComparativeSpec::new(lhs, rhs, 0.5, award)
    }

    fn third_of_four() -> Operand {
        Operand::Rank { pool: vec![Slot::Korean, Slot::Math, Slot::English, Slot::Electives], rank: 3 }
    }

    #[test]
    fn difference_is_clamped_at_zero() {
        let s = scores(&[(Slot::Math, 140.0), (Slot::Korean, 120.0)], vec![]);
        let math = Operand::Slot(Slot::Math);
        let kor = Operand::Slot(Slot::Korean);
        assert_eq!(comparative(spec(&math, Some(&kor), ComparativeAward::Difference), &s), 10.0);
        assert_eq!(comparative(spec(&kor, Some(&math), ComparativeAward::Difference), &s), 0.0);
    }

    #[test]
    fn lhs_award_requires_strictly_greater() {
        let s = scores(&[(Slot::Math, 120.0), (Slot::Korean, 120.0)], vec![]);
        let math = Operand::Slot(Slot::Math);
        let kor = Operand::Slot(Slot::Korean);
        assert_eq!(comparative(spec(&math, Some(&kor), ComparativeAward::Lhs), &s), 0.0);
        assert_eq!(comparative(spec(&math, None, ComparativeAward::Lhs), &s), 60.0);
    }

    #[test]
    fn rank_operand_and_math_gate() {
        let mut s = scores(&[(Slot::Math, 140.0), (Slot::Korean, 120.0), (Slot::English, 100.0)], vec![]);
        let math = Operand::Slot(Slot::Math);
        let second = Operand::Rank { pool: vec![Slot::Korean, Slot::Math, Slot::English], rank: 2 };
        let mut sp = spec(&math, Some(&second), ComparativeAward::Difference);
        sp.math = Some(MathRequirement::CalculusOrGeometry);
        assert_eq!(comparative(sp, &s), 0.0);
        s.math_branch = Some(MathBranch::Geometry);
        assert_eq!(comparative(sp, &s), 10.0);
    }

    #[test]
    fn converted_comparison_awards_math_percentile() {
        // converted: math 141.75 beats the 3rd of {160, 141.75, 140, 130}
        let mut s = scores(&[(Slot::English, 130.0)], vec![]);
        s.subjects.insert(Slot::Korean, SlotValue { converted: 140.0, standard_score: None, percentile: Some(96.0) });
        s.subjects.insert(Slot::Math, SlotValue { converted: 141.75, standard_score: None, percentile: Some(95.0) });
        s.electives = vec![elective("Physics1", ElectiveArea::Science, 80.0), elective("Chemistry1", ElectiveArea::Science, 80.0)];
        for e in &mut s.electives {
            e.value.percentile = Some(90.0);
        }
        s.math_branch = Some(MathBranch::Calculus);

        let math = Operand::Slot(Slot::Math);
        let third = third_of_four();
        let mut sp = ComparativeSpec::new(&math, Some(&third), 0.1, ComparativeAward::Lhs);
        sp.math = Some(MathRequirement::CalculusOrGeometry);
        sp.award_basis = Some(BonusBasis::Percentile);
        assert!((comparative(sp, &s) - 9.5).abs() < 1e-9);

        // comparing on percentiles instead ranks {180, 96, 95, 0}; 95 > 95 fails
        sp.basis = BonusBasis::Percentile;
        sp.award_basis = None;
        assert_eq!(comparative(sp, &s), 0.0);

        s.math_branch = Some(MathBranch::Statistics);
        sp.basis = BonusBasis::Converted;
        sp.award_basis = Some(BonusBasis::Percentile);
        assert_eq!(comparative(sp, &s), 0.0);
    }

    #[test]
    fn elective_count_gate_and_award_operand() {
        // electives 70 + 75 = 145 beat the 3rd of {145, 140, 135, 120}; award the math score
        let s = scores(
            &[(Slot::Korean, 140.0), (Slot::Math, 135.0), (Slot::English, 120.0)],
            vec![elective("Biology1", ElectiveArea::Science, 70.0), elective("Chemistry1", ElectiveArea::Science, 75.0)],
        );
        let inquiry = Operand::Slot(Slot::Electives);
        let math = Operand::Slot(Slot::Math);
        let third = third_of_four();
        let gate = ElectiveGate {
            filter: ElectiveFilter { area: Some(ElectiveArea::Science), ..ElectiveFilter::default() },
            count: 2,
        };
        let mut sp = ComparativeSpec::new(&inquiry, Some(&third), 1.0, ComparativeAward::Lhs);
        sp.award_on = Some(&math);
        sp.electives = Some(&gate);
        assert_eq!(comparative(sp, &s), 135.0);

        let mixed = scores(
            &[(Slot::Korean, 140.0), (Slot::Math, 135.0), (Slot::English, 120.0)],
            vec![elective("Biology1", ElectiveArea::Science, 70.0), elective("History", ElectiveArea::Society, 75.0)],
        );
        assert_eq!(comparative(sp, &mixed), 0.0);
    }
}
