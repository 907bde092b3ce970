//! Declarative rule registry: one `ProgramRule` per program key.
//!
//! Every program is data: a `FormulaPattern` (eligibility + aggregation) and an
//! optional `BonusRule`. Modes are closed enums; an unknown `mode`/`kind` in an
//! authored file fails deserialisation at load time.

use std::collections::{BTreeMap, BTreeSet};
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::ProgramKey;
use crate::subjects::{ElectiveArea, ElectiveTier, MathBranch, SubjectArea};

/* -------------------------------------------------------------------------- */
/*                                   Slots                                    */
/* -------------------------------------------------------------------------- */

/// A converted input the aggregation can refer to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Slot {
    Korean,
    Math,
    English,
    Civic,
    /// Sum of the chosen electives' converted scores.
    Electives,
    /// Optional; contributes 0 when the student sat no second language.
    SecondLanguage,
}

impl Slot {
    /// Area backing a single-subject slot (`Electives` has none).
    pub fn area(self) -> Option<SubjectArea> {
        match self {
            Slot::Korean => Some(SubjectArea::Korean),
            Slot::Math => Some(SubjectArea::Math),
            Slot::English => Some(SubjectArea::English),
            Slot::Civic => Some(SubjectArea::Civic),
            Slot::SecondLanguage => Some(SubjectArea::SecondLanguage),
            Slot::Electives => None,
        }
    }

    /// Whether a student lacking this subject fails eligibility.
    pub fn is_required(self) -> bool {
        !matches!(self, Slot::SecondLanguage | Slot::Electives)
    }
}

/* -------------------------------------------------------------------------- */
/*                                Requirements                                */
/* -------------------------------------------------------------------------- */

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MathRequirement {
    CalculusOrGeometry,
    Statistics,
}

impl MathRequirement {
    /// An unrecognised math branch never satisfies a mandatory branch.
    pub fn admits(self, branch: Option<MathBranch>) -> bool {
        match (self, branch) {
            (MathRequirement::CalculusOrGeometry, Some(MathBranch::Calculus | MathBranch::Geometry)) => true,
            (MathRequirement::Statistics, Some(MathBranch::Statistics)) => true,
            _ => false,
        }
    }
}

/// Structural requirements checked before any lookup.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct RequiredSubjects {
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub math: Option<MathRequirement>,
    /// All counted electives must come from this area.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub elective_area: Option<ElectiveArea>,
}

/* -------------------------------------------------------------------------- */
/*                                Aggregation                                 */
/* -------------------------------------------------------------------------- */

/// Aggregation family applied to converted slot values.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "mode", rename_all = "snake_case"))]
pub enum Aggregation {
    /// `Σ weight × value` over a fixed slot list.
    WeightedSum { weights: BTreeMap<Slot, f64> },
    /// Rank-indexed coefficients applied to the largest `coefficients.len()` pool values.
    TopK { pool: Vec<Slot>, coefficients: Vec<f64> },
    /// Best of several complete schemes.
    MaxOf { alternatives: Vec<Aggregation> },
    /// Sum of sub-aggregations (e.g. top-2 of Korean/Math/Electives plus max of English/Civic).
    Sum { parts: Vec<Aggregation> },
}

impl Aggregation {
    /// True when the scheme reads `slot` with a nonzero weight or pools it.
    pub fn consumes(&self, slot: Slot) -> bool {
        match self {
            Aggregation::WeightedSum { weights } => weights.get(&slot).is_some_and(|w| *w != 0.0),
            Aggregation::TopK { pool, .. } => pool.contains(&slot),
            Aggregation::MaxOf { alternatives } => alternatives.iter().any(|a| a.consumes(slot)),
            Aggregation::Sum { parts } => parts.iter().any(|p| p.consumes(slot)),
        }
    }

    /// Every slot consumed anywhere in the scheme.
    pub fn slots(&self) -> BTreeSet<Slot> {
        let mut out = BTreeSet::new();
        self.collect_slots(&mut out);
        out
    }

    fn collect_slots(&self, out: &mut BTreeSet<Slot>) {
        match self {
            Aggregation::WeightedSum { weights } => {
                out.extend(weights.iter().filter(|(_, w)| **w != 0.0).map(|(s, _)| *s));
            }
            Aggregation::TopK { pool, .. } => out.extend(pool.iter().copied()),
            Aggregation::MaxOf { alternatives } => alternatives.iter().for_each(|a| a.collect_slots(out)),
            Aggregation::Sum { parts } => parts.iter().for_each(|p| p.collect_slots(out)),
        }
    }
}

/// A program's formula.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct FormulaPattern {
    #[cfg_attr(feature = "serde", serde(default))]
    pub required: RequiredSubjects,
    /// Number of electives counted into the `Electives` slot.
    #[cfg_attr(feature = "serde", serde(default))]
    pub elective_count: u8,
    pub aggregation: Aggregation,
    /// Add the civic converted score once when the scheme does not consume it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub auto_civic: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub base_points: f64,
}

impl FormulaPattern {
    /// Slots a student must be able to fill, including an auto-included civic score.
    pub fn required_slots(&self) -> BTreeSet<Slot> {
        let mut slots: BTreeSet<Slot> = self.aggregation.slots().into_iter().filter(|s| s.is_required()).collect();
        if self.auto_civic {
            slots.insert(Slot::Civic);
        }
        slots
    }
}

/* -------------------------------------------------------------------------- */
/*                                   Bonus                                    */
/* -------------------------------------------------------------------------- */

/// Which number of an elective/operand a bonus multiplies.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BonusBasis {
    #[default]
    Converted,
    Percentile,
    StandardScore,
}

/// Which chosen electives qualify for a bonus. Empty fields admit everything.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct ElectiveFilter {
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub area: Option<ElectiveArea>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub tier: Option<ElectiveTier>,
    /// Name fragments; an elective qualifies if its name contains any of them.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub names: Vec<String>,
}

impl ElectiveFilter {
    pub fn admits(&self, name: &str, area: ElectiveArea, tier: ElectiveTier) -> bool {
        self.area.map_or(true, |a| a == area)
            && self.tier.map_or(true, |t| t == tier)
            && (self.names.is_empty() || self.names.iter().any(|n| name.contains(n.as_str())))
    }
}

/// Operand of a comparative bonus.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Operand {
    Slot(Slot),
    /// The `rank`-th largest (1-based) value of `pool`.
    Rank { pool: Vec<Slot>, rank: u8 },
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ComparativeAward {
    /// `max(0, lhs − rhs) × coefficient`
    #[default]
    Difference,
    /// `lhs × coefficient` when `lhs > rhs` (or unconditionally without `rhs`).
    Lhs,
}

/// Exact-count condition on the chosen electives (e.g. "two science electives").
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct ElectiveGate {
    #[cfg_attr(feature = "serde", serde(default))]
    pub filter: ElectiveFilter,
    pub count: u8,
}

#[cfg(feature = "serde")]
fn one() -> u8 {
    1
}

/// Additive, never-negative adjustment applied after aggregation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum BonusRule {
    ElectiveRate {
        #[cfg_attr(feature = "serde", serde(default))]
        filter: ElectiveFilter,
        rate: f64,
        /// Rate for higher-tier (Ⅱ) electives.
        #[cfg_attr(feature = "serde", serde(default))]
        advanced_rate: Option<f64>,
        /// `by_count[n - 1]` replaces `rate` when exactly `n` electives qualify.
        #[cfg_attr(feature = "serde", serde(default))]
        by_count: Vec<f64>,
        #[cfg_attr(feature = "serde", serde(default = "one"))]
        min_qualifying: u8,
        #[cfg_attr(feature = "serde", serde(default))]
        basis: BonusBasis,
    },
    FixedPerElective {
        #[cfg_attr(feature = "serde", serde(default))]
        filter: ElectiveFilter,
        amount: f64,
        #[cfg_attr(feature = "serde", serde(default = "one"))]
        min_qualifying: u8,
        #[cfg_attr(feature = "serde", serde(default))]
        max_counted: Option<u8>,
    },
    Comparative {
        lhs: Operand,
        #[cfg_attr(feature = "serde", serde(default))]
        rhs: Option<Operand>,
        coefficient: f64,
        #[cfg_attr(feature = "serde", serde(default))]
        award: ComparativeAward,
        /// Basis of the `lhs`/`rhs` comparison.
        #[cfg_attr(feature = "serde", serde(default))]
        basis: BonusBasis,
        /// Operand whose value is awarded in place of `lhs`.
        #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
        award_on: Option<Operand>,
        /// Basis of the awarded amount; `basis` when unset.
        #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
        award_basis: Option<BonusBasis>,
        /// Award only when the student's math branch satisfies this.
        #[cfg_attr(feature = "serde", serde(default))]
        math: Option<MathRequirement>,
        /// Award only when the chosen electives satisfy this.
        #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
        electives: Option<ElectiveGate>,
    },
}

/* -------------------------------------------------------------------------- */
/*                               Program rules                                */
/* -------------------------------------------------------------------------- */

/// Score threshold for a risk level (+5 safest … −5 riskiest).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RiskThreshold {
    pub level: i8,
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct ProgramRule {
    /// Human-readable university / track name.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub label: Option<String>,
    pub pattern: FormulaPattern,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub bonus: Option<BonusRule>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub risk: Vec<RiskThreshold>,
}

/// Authoring errors found when validating a rule.
#[derive(Clone, Debug, PartialEq)]
pub enum RuleError {
    NotFinite(&'static str),
    Negative(&'static str),
    EmptyPool,
    EmptyCoefficients,
    CoefficientsExceedPool { pool: usize, coefficients: usize },
    TooFewAlternatives(usize),
    EmptyParts,
    ElectivesWithoutCount,
    RankOutOfRange { rank: u8, pool: usize },
    RiskLevelOutOfRange(i8),
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use RuleError::*;
        match self {
            NotFinite(k) => write!(f, "{k} must be a finite number"),
            Negative(k) => write!(f, "{k} must not be negative"),
            EmptyPool => write!(f, "top_k pool is empty"),
            EmptyCoefficients => write!(f, "top_k needs at least one coefficient"),
            CoefficientsExceedPool { pool, coefficients } => {
                write!(f, "top_k has {coefficients} coefficients for a pool of {pool}")
            }
            TooFewAlternatives(n) => write!(f, "max_of needs at least 2 alternatives, got {n}"),
            EmptyParts => write!(f, "sum needs at least one part"),
            ElectivesWithoutCount => write!(f, "electives are used but elective_count is 0"),
            RankOutOfRange { rank, pool } => write!(f, "rank {rank} outside pool of {pool}"),
            RiskLevelOutOfRange(l) => write!(f, "risk level {l} outside -5..=5 (0 excluded)"),
        }
    }
}

impl std::error::Error for RuleError {}

fn non_negative(label: &'static str, x: f64) -> Result<(), RuleError> {
    if !x.is_finite() {
        return Err(RuleError::NotFinite(label));
    }
    if x < 0.0 {
        return Err(RuleError::Negative(label));
    }
    Ok(())
}

fn validate_aggregation(agg: &Aggregation) -> Result<(), RuleError> {
    match agg {
        Aggregation::WeightedSum { weights } => {
            weights.values().try_for_each(|w| non_negative("weight", *w))
        }
        Aggregation::TopK { pool, coefficients } => {
            if pool.is_empty() {
                return Err(RuleError::EmptyPool);
            }
            if coefficients.is_empty() {
                return Err(RuleError::EmptyCoefficients);
            }
            if coefficients.len() > pool.len() {
                return Err(RuleError::CoefficientsExceedPool {
                    pool: pool.len(),
                    coefficients: coefficients.len(),
                });
            }
            coefficients.iter().try_for_each(|c| non_negative("coefficient", *c))
        }
        Aggregation::MaxOf { alternatives } => {
            if alternatives.len() < 2 {
                return Err(RuleError::TooFewAlternatives(alternatives.len()));
            }
            alternatives.iter().try_for_each(validate_aggregation)
        }
        Aggregation::Sum { parts } => {
            if parts.is_empty() {
                return Err(RuleError::EmptyParts);
            }
            parts.iter().try_for_each(validate_aggregation)
        }
    }
}

fn validate_operand(op: &Operand) -> Result<(), RuleError> {
    match op {
        Operand::Slot(_) => Ok(()),
        Operand::Rank { pool, rank } => {
            if *rank == 0 || usize::from(*rank) > pool.len() {
                Err(RuleError::RankOutOfRange { rank: *rank, pool: pool.len() })
            } else {
                Ok(())
            }
        }
    }
}

fn validate_bonus(bonus: &BonusRule) -> Result<(), RuleError> {
    match bonus {
        BonusRule::ElectiveRate { rate, advanced_rate, by_count, .. } => {
            non_negative("rate", *rate)?;
            if let Some(r) = advanced_rate {
                non_negative("advanced_rate", *r)?;
            }
            by_count.iter().try_for_each(|r| non_negative("by_count rate", *r))
        }
        BonusRule::FixedPerElective { amount, .. } => non_negative("amount", *amount),
        BonusRule::Comparative { lhs, rhs, coefficient, award_on, .. } => {
            non_negative("coefficient", *coefficient)?;
            validate_operand(lhs)?;
            rhs.iter().chain(award_on).try_for_each(validate_operand)
        }
    }
}

impl ProgramRule {
    /// Authoring checks; run once at load.
    pub fn validate(&self) -> Result<(), RuleError> {
        let p = &self.pattern;
        validate_aggregation(&p.aggregation)?;
        if !p.base_points.is_finite() {
            return Err(RuleError::NotFinite("base_points"));
        }
        let uses_electives = p.aggregation.consumes(Slot::Electives)
            || p.required.elective_area.is_some()
            || matches!(self.bonus, Some(BonusRule::ElectiveRate { .. } | BonusRule::FixedPerElective { .. }));
        if uses_electives && p.elective_count == 0 {
            return Err(RuleError::ElectivesWithoutCount);
        }
        if let Some(b) = &self.bonus {
            validate_bonus(b)?;
        }
        for t in &self.risk {
            if t.level == 0 || !(-5..=5).contains(&t.level) {
                return Err(RuleError::RiskLevelOutOfRange(t.level));
            }
            if !t.score.is_finite() {
                return Err(RuleError::NotFinite("risk score"));
            }
        }
        Ok(())
    }
}

/// Program key → rule. Built once, read-only afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct FormulaRegistry {
    programs: BTreeMap<ProgramKey, ProgramRule>,
}

impl FormulaRegistry {
    pub fn from_rules<I: IntoIterator<Item = (ProgramKey, ProgramRule)>>(rules: I) -> Self {
        Self { programs: rules.into_iter().collect() }
    }

    pub fn get(&self, program: &str) -> Option<&ProgramRule> {
        self.programs.get(program)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ProgramKey> {
        self.programs.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProgramKey, &ProgramRule)> {
        self.programs.iter()
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Every invalid rule with its key, in key order.
    pub fn validate_all(&self) -> Vec<(ProgramKey, RuleError)> {
        self.programs
            .iter()
            .filter_map(|(k, r)| r.validate().err().map(|e| (k.clone(), e)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weighted(pairs: &[(Slot, f64)]) -> Aggregation {
        Aggregation::WeightedSum { weights: pairs.iter().copied().collect() }
    }

    fn rule(aggregation: Aggregation, elective_count: u8) -> ProgramRule {
        ProgramRule {
            label: None,
            pattern: FormulaPattern {
                required: RequiredSubjects::default(),
                elective_count,
                aggregation,
                auto_civic: false,
                base_points: 0.0,
            },
            bonus: None,
            risk: vec![],
        }
    }

    #[test]
    fn zero_weight_does_not_consume() {
        let agg = weighted(&[(Slot::Korean, 1.0), (Slot::Civic, 0.0)]);
        assert!(agg.consumes(Slot::Korean));
        assert!(!agg.consumes(Slot::Civic));
        assert!(!agg.slots().contains(&Slot::Civic));
    }

    #[test]
    fn pooled_slot_is_consumed_inside_composites() {
        let agg = Aggregation::Sum {
            parts: vec![
                weighted(&[(Slot::Korean, 1.0)]),
                Aggregation::TopK { pool: vec![Slot::English, Slot::Civic], coefficients: vec![1.0] },
            ],
        };
        assert!(agg.consumes(Slot::Civic));
    }

    #[test]
    fn math_requirement_admits() {
        assert!(MathRequirement::CalculusOrGeometry.admits(Some(MathBranch::Geometry)));
        assert!(!MathRequirement::CalculusOrGeometry.admits(Some(MathBranch::Statistics)));
        assert!(!MathRequirement::Statistics.admits(None));
    }

    #[test]
    fn validate_rejects_bad_authoring() {
        let r = rule(Aggregation::TopK { pool: vec![Slot::Korean], coefficients: vec![1.0, 2.0] }, 0);
        assert_eq!(r.validate(), Err(RuleError::CoefficientsExceedPool { pool: 1, coefficients: 2 }));

        let r = rule(weighted(&[(Slot::Electives, 1.0)]), 0);
        assert_eq!(r.validate(), Err(RuleError::ElectivesWithoutCount));

        let r = rule(Aggregation::MaxOf { alternatives: vec![weighted(&[(Slot::Korean, 1.0)])] }, 0);
        assert_eq!(r.validate(), Err(RuleError::TooFewAlternatives(1)));

        let mut r = rule(weighted(&[(Slot::Korean, 1.0)]), 0);
        r.bonus = Some(BonusRule::Comparative {
            lhs: Operand::Slot(Slot::Math),
            rhs: Some(Operand::Slot(Slot::Korean)),
            coefficient: -0.1,
            award: ComparativeAward::Difference,
            basis: BonusBasis::Converted,
            award_on: None,
            award_basis: None,
            math: None,
            electives: None,
        });
        assert_eq!(r.validate(), Err(RuleError::Negative("coefficient")));
    }

    #[test]
    fn elective_filter_matches_fragments() {
        let f = ElectiveFilter {
            area: Some(ElectiveArea::Science),
            tier: None,
            names: vec!["화학".into(), "생명과학".into()],
        };
        assert!(f.admits("화학 Ⅱ", ElectiveArea::Science, ElectiveTier::Advanced));
        assert!(!f.admits("물리학 Ⅰ", ElectiveArea::Science, ElectiveTier::Standard));
        assert!(!f.admits("화학 Ⅰ", ElectiveArea::Society, ElectiveTier::Standard));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn registry_json_roundtrips_tagged_modes() {
        let json = r#"{
          "programs": {
            "P-WS": {
              "pattern": {
                "elective_count": 2,
                "aggregation": {"mode": "weighted_sum", "weights": {"korean": 1, "math": 1, "english": 1, "electives": 1, "civic": 0}},
                "auto_civic": true
              },
              "bonus": {"kind": "elective_rate", "rate": 0.05, "advanced_rate": 0.07, "filter": {"area": "science"}}
            }
          }
        }"#;
        let reg: FormulaRegistry = serde_json::from_str(json).unwrap();
        let r = reg.get("P-WS").unwrap();
        assert!(r.pattern.auto_civic);
        assert!(matches!(r.bonus, Some(BonusRule::ElectiveRate { min_qualifying: 1, .. })));
        assert!(reg.validate_all().is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn comparative_reads_award_operand_basis_and_gate() {
        let json = r#"{"kind": "comparative",
            "lhs": {"slot": "electives"},
            "rhs": {"rank": {"pool": ["korean", "math", "english", "electives"], "rank": 3}},
            "coefficient": 1,
            "award": "lhs",
            "award_on": {"slot": "math"},
            "award_basis": "percentile",
            "electives": {"filter": {"area": "science"}, "count": 2}}"#;
        let bonus: BonusRule = serde_json::from_str(json).unwrap();
        match &bonus {
            BonusRule::Comparative { award_on, award_basis, electives, basis, .. } => {
                assert_eq!(award_on, &Some(Operand::Slot(Slot::Math)));
                assert_eq!(*award_basis, Some(BonusBasis::Percentile));
                assert_eq!(*basis, BonusBasis::Converted);
                let gate = electives.as_ref().unwrap();
                assert_eq!((gate.filter.area, gate.count), (Some(ElectiveArea::Science), 2));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(validate_bonus(&bonus), Ok(()));

        let bad = BonusRule::Comparative {
            lhs: Operand::Slot(Slot::Math),
            rhs: None,
            coefficient: 1.0,
            award: ComparativeAward::Lhs,
            basis: BonusBasis::Converted,
            award_on: Some(Operand::Rank { pool: vec![Slot::Korean], rank: 2 }),
            award_basis: None,
            math: None,
            electives: None,
        };
        assert_eq!(validate_bonus(&bad), Err(RuleError::RankOutOfRange { rank: 2, pool: 1 }));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn unknown_mode_is_a_load_error() {
        let json = r#"{"programs": {"X": {"pattern": {"aggregation": {"mode": "median"}}}}}"#;
        assert!(serde_json::from_str::<FormulaRegistry>(json).is_err());
    }
}
