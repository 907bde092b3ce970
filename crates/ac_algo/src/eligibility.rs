//! Eligibility Filter: structural checks run before any lookup.
//!
//! Order of checks (first failure wins):
//! 1. mandatory math branch
//! 2. every subject the formula consumes is present with its key number
//! 3. enough electives overall, or from the required elective area
//!
//! Elective subsets proposed by the optimizer go through `check_selection`.

use core::fmt;

use ac_core::{
    rules::{FormulaPattern, MathRequirement, Slot},
    subjects::{ElectiveArea, ElectiveRef, MathBranch, StudentScoreSet},
};

#[derive(Clone, Debug, PartialEq)]
pub enum Ineligibility {
    MathBranch { required: MathRequirement, found: Option<MathBranch> },
    MissingSubject(Slot),
    TooFewElectives { required: u8, found: usize, area: Option<ElectiveArea> },
    /// An optimizer subset contains an elective outside the required area.
    ForeignElective { subject: String, required: ElectiveArea },
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ineligibility::MathBranch { required, found } => {
                let need = match required {
                    MathRequirement::CalculusOrGeometry => "calculus or geometry",
                    MathRequirement::Statistics => "probability and statistics",
                };
                match found {
                    Some(b) => write!(f, "math branch {need} required, found {b:?}"),
                    None => write!(f, "math branch {need} required, found none"),
                }
            }
            Ineligibility::MissingSubject(slot) => write!(f, "required subject missing: {slot:?}"),
            Ineligibility::TooFewElectives { required, found, area } => match area {
                Some(a) => write!(f, "{required} {a:?} electives required, found {found}"),
                None => write!(f, "{required} electives required, found {found}"),
            },
            Ineligibility::ForeignElective { subject, required } => {
                write!(f, "{subject} is not a {required:?} elective")
            }
        }
    }
}

impl std::error::Error for Ineligibility {}

pub fn check(student: &StudentScoreSet, pattern: &FormulaPattern) -> Result<(), Ineligibility> {
    if let Some(required) = pattern.required.math {
        let found = student.math_branch();
        if !required.admits(found) {
            return Err(Ineligibility::MathBranch { required, found });
        }
    }

    for slot in pattern.required_slots() {
        let Some(area) = slot.area() else { continue };
        let present = student
            .subject_in(area)
            .and_then(|(_, s)| s.key_for(area.key_basis()))
            .is_some();
        if !present {
            return Err(Ineligibility::MissingSubject(slot));
        }
    }

    let need = pattern.elective_count;
    if need > 0 {
        let area = pattern.required.elective_area;
        let found = student
            .electives()
            .iter()
            .filter(|e| area.map_or(true, |a| e.area == a) && e.score.standard_score.is_some())
            .count();
        if found < usize::from(need) {
            return Err(Ineligibility::TooFewElectives { required: need, found, area });
        }
    }
    Ok(())
}

#[inline]
pub fn is_eligible(student: &StudentScoreSet, pattern: &FormulaPattern) -> bool {
    check(student, pattern).is_ok()
}

/// A concrete elective subset must have exactly `elective_count` members from the required area.
pub fn check_selection(selection: &[ElectiveRef<'_>], pattern: &FormulaPattern) -> Result<(), Ineligibility> {
    if selection.len() != usize::from(pattern.elective_count) {
        return Err(Ineligibility::TooFewElectives {
            required: pattern.elective_count,
            found: selection.len(),
            area: pattern.required.elective_area,
        });
    }
    if let Some(required) = pattern.required.elective_area {
        if let Some(e) = selection.iter().find(|e| e.area != required) {
            return Err(Ineligibility::ForeignElective { subject: e.name.to_string(), required });
        }
    }
    Ok(())
}
