//! Conversion Orchestrator: one (student, program) pair through every stage.

use std::collections::BTreeSet;

use ac_algo::{
    apply_bonus, check_eligibility, evaluate, formula::select_top_electives, lookup_score, risk_level,
    ConvertedElective, ConvertedScores, SlotValue,
};
use ac_core::{
    BonusRule, ElectiveRef, Operand, ProgramRule, Slot, StudentScoreSet, SubjectName, SubjectScore,
};
use ac_core::determinism::sort_canonical;
use tracing::{debug, info, warn};

use crate::result::{ConversionError, ConversionResult, Stage};
use crate::EngineData;

/// Unrounded outcome of a successful conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct Conversion {
    pub final_score: f64,
    pub raw_aggregate: f64,
    pub bonus: f64,
    pub electives_used: Vec<SubjectName>,
    pub standard_score_sum: i32,
    pub risk_level: Option<i8>,
}

/// A program with its eligibility checked and every non-elective slot converted.
pub(crate) struct Prepared<'a> {
    pub rule: &'a ProgramRule,
    pub base: ConvertedScores,
}

fn operand_slots(op: &Operand, out: &mut BTreeSet<Slot>) {
    match op {
        Operand::Slot(s) => {
            out.insert(*s);
        }
        Operand::Rank { pool, .. } => out.extend(pool.iter().copied()),
    }
}

/// Single-subject slots a rule reads, bonus operands included.
fn slots_read(rule: &ProgramRule) -> BTreeSet<Slot> {
    let mut slots = rule.pattern.aggregation.slots();
    if rule.pattern.auto_civic {
        slots.insert(Slot::Civic);
    }
    if let Some(BonusRule::Comparative { lhs, rhs, award_on, .. }) = &rule.bonus {
        operand_slots(lhs, &mut slots);
        for op in rhs.iter().chain(award_on) {
            operand_slots(op, &mut slots);
        }
    }
    slots.remove(&Slot::Electives);
    slots
}

fn slot_value(converted: f64, score: &SubjectScore) -> SlotValue {
    SlotValue { converted, standard_score: score.standard_score, percentile: score.percentile }
}

pub(crate) fn prepare<'a>(
    data: &'a EngineData,
    student: &StudentScoreSet,
    program: &str,
) -> Result<Prepared<'a>, ConversionError> {
    let rule = data
        .registry
        .get(program)
        .ok_or_else(|| ConversionError::UnsupportedFormula(program.to_string()))?;

    debug!(program, stage = ?Stage::Eligibility, "convert");
    check_eligibility(student, &rule.pattern)?;

    debug!(program, stage = ?Stage::TableLookup, "convert");
    let mut base = ConvertedScores { math_branch: student.math_branch(), ..ConvertedScores::default() };
    for slot in slots_read(rule) {
        let Some(area) = slot.area() else { continue };
        // absent optional subjects read as 0; required ones were checked above
        let Some((name, score)) = student.subject_in(area) else { continue };
        if score.key_for(area.key_basis()).is_none() && !slot.is_required() {
            continue;
        }
        let hit = lookup_score(&data.scores, name.as_str(), score, area, program)?;
        if hit.used_fallback() {
            debug!(program, subject = name.as_str(), requested = hit.requested, matched = hit.matched, "nearest-key fallback");
        }
        base.subjects.insert(slot, slot_value(hit.points, score));
    }
    Ok(Prepared { rule, base })
}

/// Look up one elective for `program`.
pub(crate) fn convert_elective(
    data: &EngineData,
    e: &ElectiveRef<'_>,
    program: &str,
) -> Result<ConvertedElective, ConversionError> {
    let area = StudentScoreSet::area_of(e.name, e.score);
    let hit = lookup_score(&data.scores, e.name.as_str(), e.score, area, program)?;
    Ok(ConvertedElective { name: e.name.clone(), area: e.area, tier: e.tier, value: slot_value(hit.points, e.score) })
}

/// Candidate electives: those with a standard score, in the required area if any, name order.
pub(crate) fn candidates<'s>(student: &'s StudentScoreSet, rule: &ProgramRule) -> Vec<ElectiveRef<'s>> {
    let area = rule.pattern.required.elective_area;
    student
        .electives()
        .into_iter()
        .filter(|e| e.score.standard_score.is_some() && area.map_or(true, |a| e.area == a))
        .collect()
}

/// Aggregate and apply the bonus over a fixed elective selection.
pub(crate) fn finish(
    prepared: &Prepared<'_>,
    student: &StudentScoreSet,
    program: &str,
    electives: Vec<ConvertedElective>,
) -> Conversion {
    let mut scores = prepared.base.clone();
    scores.electives = electives;

    debug!(program, stage = ?Stage::Aggregation, "convert");
    let raw = evaluate(&prepared.rule.pattern, &scores);

    debug!(program, stage = ?Stage::Bonus, "convert");
    let outcome = apply_bonus(raw, &scores, prepared.rule.bonus.as_ref());

    let mut electives_used: Vec<SubjectName> = scores.electives.iter().map(|e| e.name.clone()).collect();
    sort_canonical(&mut electives_used);
    Conversion {
        final_score: outcome.final_score,
        raw_aggregate: raw,
        bonus: outcome.bonus,
        electives_used,
        standard_score_sum: student.standard_score_sum(),
        risk_level: risk_level(outcome.final_score, &prepared.rule.risk),
    }
}

/// Convert with the default elective choice: the best `elective_count` by converted score.
///
/// Electives the tables cannot convert are left out of the ranking, as the
/// optimizer leaves out subsets containing them. When too few remain, the
/// first lookup error is the failure.
pub fn try_convert(data: &EngineData, student: &StudentScoreSet, program: &str) -> Result<Conversion, ConversionError> {
    let prepared = prepare(data, student, program)?;
    let pattern = &prepared.rule.pattern;
    let needed = usize::from(pattern.elective_count);

    let mut converted = Vec::new();
    let mut first_err = None;
    for e in candidates(student, prepared.rule) {
        match convert_elective(data, &e, program) {
            Ok(c) => converted.push(c),
            Err(err) => {
                debug!(program, subject = e.name.as_str(), reason = %err, "elective skipped");
                first_err.get_or_insert(err);
            }
        }
    }
    if converted.len() < needed {
        if let Some(err) = first_err {
            return Err(err);
        }
    }
    let chosen = select_top_electives(&converted, needed, pattern.required.elective_area);
    let c = finish(&prepared, student, program, chosen);
    debug!(program, stage = ?Stage::Done, score = c.final_score, "convert");
    Ok(c)
}

/// `try_convert` folded into a response entry; failures are logged, never raised.
pub fn convert(data: &EngineData, student: &StudentScoreSet, program: &str) -> ConversionResult {
    match try_convert(data, student, program) {
        Ok(c) => ConversionResult::success(program, &c),
        Err(e) => {
            warn!(program, state = ?e.state(), reason = %e, "conversion failed");
            ConversionResult::failure(program, &e)
        }
    }
}

/// One result per requested program, in request order.
pub fn convert_batch<S: AsRef<str>>(data: &EngineData, student: &StudentScoreSet, programs: &[S]) -> Vec<ConversionResult> {
    let results: Vec<ConversionResult> = programs.iter().map(|p| convert(data, student, p.as_ref())).collect();
    let succeeded = results.iter().filter(|r| r.success).count();
    info!(requested = results.len(), succeeded, failed = results.len() - succeeded, "batch converted");
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::FailureState;
    use crate::testdata::{engine, student};
    use ac_core::{MathRequirement, SubjectScore};

    #[test]
    fn weighted_sum_with_auto_civic() {
        let c = try_convert(&engine(), &student(), "P").unwrap();
        assert!((c.final_score - 619.85).abs() < 0.01, "got {}", c.final_score);
        let names: Vec<&str> = c.electives_used.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["Biology1", "Chemistry1"]);
        assert_eq!(c.standard_score_sum, 145 + 130 + 69 + 68);
    }

    #[test]
    fn rounded_result_reports_two_decimals() {
        let r = convert(&engine(), &student(), "P");
        assert!(r.success);
        assert_eq!(r.converted_score, Some(619.85));
    }

    #[test]
    fn unknown_program_is_missing_formula_pattern() {
        let r = convert(&engine(), &student(), "NOPE");
        assert_eq!(r.failure, Some(FailureState::MissingFormulaPattern));
        assert!(!r.success);
    }

    #[test]
    fn missing_required_subject_is_ineligible() {
        let s: StudentScoreSet = student().iter().filter(|(n, _)| n.as_str() != "Korean").map(|(n, v)| (n.clone(), v.clone())).collect();
        let r = convert(&engine(), &s, "P");
        assert_eq!(r.failure, Some(FailureState::Ineligible));
    }

    #[test]
    fn math_branch_gate() {
        let mut data = engine();
        let mut rule = data.registry.get("P").unwrap().clone();
        rule.pattern.required.math = Some(MathRequirement::Statistics);
        data.registry = ac_core::FormulaRegistry::from_rules([("P".parse().unwrap(), rule)]);
        let r = convert(&data, &student(), "P");
        assert_eq!(r.failure, Some(FailureState::Ineligible));
        assert!(r.failure_reason.unwrap().contains("statistics"));
    }

    #[test]
    fn elective_without_table_is_left_out_of_the_ranking() {
        let mut s = student();
        s.insert("Astronomy9".parse().unwrap(), SubjectScore::standard(70));
        let c = try_convert(&engine(), &s, "P").unwrap();
        assert!((c.final_score - 619.85).abs() < 0.01);
        let names: Vec<&str> = c.electives_used.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["Biology1", "Chemistry1"]);
    }

    #[test]
    fn too_few_convertible_electives_is_lookup_failure() {
        let mut s: StudentScoreSet =
            student().iter().filter(|(n, _)| n.as_str() != "Chemistry1").map(|(n, v)| (n.clone(), v.clone())).collect();
        s.insert("Astronomy9".parse().unwrap(), SubjectScore::standard(70));
        let r = convert(&engine(), &s, "P");
        assert_eq!(r.failure, Some(FailureState::TableLookupFailed));
        assert!(r.failure_reason.unwrap().contains("Astronomy9"));
    }

    #[test]
    fn fallback_key_is_used_for_sparse_rows() {
        let mut s = student();
        s.insert("Korean".parse().unwrap(), SubjectScore::standard(143));
        // 143 is nearer to 145 than 140
        let c = try_convert(&engine(), &s, "P").unwrap();
        assert!((c.final_score - 619.85).abs() < 0.01);
    }

    #[test]
    fn batch_keeps_request_order() {
        let results = convert_batch(&engine(), &student(), &["NOPE", "P"]);
        let programs: Vec<&str> = results.iter().map(|r| r.program.as_str()).collect();
        assert_eq!(programs, vec!["NOPE", "P"]);
        assert!(!results[0].success && results[1].success);
    }
}
