// crates/ac_algo/src/lib.rs
#![forbid(unsafe_code)]

use std::collections::BTreeMap;

pub use ac_core::{
    rules::{BonusBasis, Slot},
    subjects::{ElectiveArea, ElectiveTier, MathBranch},
    SubjectName,
};

// ----------------------------- Converted per-slot values -----------------------------

/// One converted subject together with the raw numbers bonus rules may read.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SlotValue {
    pub converted: f64,
    pub standard_score: Option<i32>,
    pub percentile: Option<f64>,
}

impl SlotValue {
    #[inline]
    pub fn by_basis(&self, basis: BonusBasis) -> f64 {
        match basis {
            BonusBasis::Converted => self.converted,
            BonusBasis::Percentile => self.percentile.unwrap_or(0.0),
            BonusBasis::StandardScore => self.standard_score.map(f64::from).unwrap_or(0.0),
        }
    }
}

/// A chosen elective after table lookup.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvertedElective {
    pub name: SubjectName,
    pub area: ElectiveArea,
    pub tier: ElectiveTier,
    pub value: SlotValue,
}

/// Everything the evaluators see for one (student, program, elective subset).
/// Missing single-subject slots read as 0; eligibility runs first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConvertedScores {
    pub subjects: BTreeMap<Slot, SlotValue>,
    /// Chosen electives in selection order.
    pub electives: Vec<ConvertedElective>,
    pub math_branch: Option<MathBranch>,
}

impl ConvertedScores {
    /// Converted value of a slot; `Electives` is the elective sum.
    #[inline]
    pub fn value(&self, slot: Slot) -> f64 {
        self.value_by(slot, BonusBasis::Converted)
    }

    pub fn value_by(&self, slot: Slot, basis: BonusBasis) -> f64 {
        match slot {
            Slot::Electives => self.electives.iter().map(|e| e.value.by_basis(basis)).sum(),
            other => self.subjects.get(&other).map_or(0.0, |v| v.by_basis(basis)),
        }
    }

    pub fn elective_sum(&self) -> f64 {
        self.value(Slot::Electives)
    }
}

// ----------------------------- Lookup & fallback ---------------------------

pub mod fallback;
pub mod lookup;

pub use fallback::{resolve, resolve_in};
pub use lookup::{lookup, lookup_score, LookupError, Resolved};

// ----------------------------- Eligibility ---------------------------

pub mod eligibility;

pub use eligibility::{check as check_eligibility, check_selection, is_eligible, Ineligibility};

// ----------------------------- Formula evaluation (public surface) ---------------------------

pub mod formula {
    // File modules (actual implementations)
    pub mod weighted;
    pub mod top_k;
    pub mod alternatives;
    pub mod evaluate;

    pub use evaluate::{aggregate, evaluate, evaluate_scheme};
    pub use top_k::{nth_largest, select_top_electives, select_top_k, top_k_weighted};
    pub use weighted::weighted_sum;
    pub use alternatives::max_of;
}

pub use formula::{evaluate, select_top_k};

// ----------------------------- Bonus evaluation (public surface) ---------------------------

pub mod bonus {
    pub mod elective_rate;
    pub mod fixed;
    pub mod comparative;
    pub mod apply;

    pub use apply::{apply_bonus, BonusOutcome};
}

pub use bonus::{apply_bonus, BonusOutcome};

// ----------------------------- Optimizer & percentile ---------------------------

pub mod optimizer;
pub mod percentile;

pub use optimizer::{combinations, optimize, OptimizeError, Optimum, SubsetScore};
pub use percentile::{peer_average, percentile_for, risk_level};

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    pub fn slot(converted: f64) -> SlotValue {
        SlotValue { converted, standard_score: None, percentile: None }
    }

    pub fn elective(name: &str, area: ElectiveArea, converted: f64) -> ConvertedElective {
        ConvertedElective {
            name: name.parse().unwrap(),
            area,
            tier: ElectiveTier::of(name),
            value: slot(converted),
        }
    }

    pub fn scores(pairs: &[(Slot, f64)], electives: Vec<ConvertedElective>) -> ConvertedScores {
        ConvertedScores {
            subjects: pairs.iter().map(|(s, v)| (*s, slot(*v))).collect(),
            electives,
            math_branch: None,
        }
    }
}
