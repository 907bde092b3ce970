//! Typed outcomes of one conversion.

use ac_algo::{Ineligibility, LookupError};
use ac_core::rounding::round2;
use serde::Serialize;
use thiserror::Error;

use crate::convert::Conversion;

/// Orchestrator stages, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Eligibility,
    TableLookup,
    Aggregation,
    Bonus,
    Done,
}

/// Terminal failure states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureState {
    Ineligible,
    MissingFormulaPattern,
    TableLookupFailed,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConversionError {
    /// A subject the student reported has no score table (authoring gap).
    #[error("unknown subject: {0}")]
    UnknownSubject(String),
    #[error("ineligible: {0}")]
    IneligibleProgram(String),
    #[error("no formula registered for program {0}")]
    UnsupportedFormula(String),
    /// The program is missing from a resolved row, or the student lacks the key number.
    #[error("missing table data: {0}")]
    MissingTableData(String),
}

impl ConversionError {
    pub fn state(&self) -> FailureState {
        match self {
            ConversionError::UnknownSubject(_) | ConversionError::MissingTableData(_) => {
                FailureState::TableLookupFailed
            }
            ConversionError::IneligibleProgram(_) => FailureState::Ineligible,
            ConversionError::UnsupportedFormula(_) => FailureState::MissingFormulaPattern,
        }
    }

    /// Stage at which the pipeline stopped.
    pub fn stage(&self) -> Stage {
        match self.state() {
            FailureState::Ineligible | FailureState::MissingFormulaPattern => Stage::Eligibility,
            FailureState::TableLookupFailed => Stage::TableLookup,
        }
    }
}

impl From<LookupError> for ConversionError {
    fn from(e: LookupError) -> Self {
        match e {
            LookupError::UnknownSubject(s) => ConversionError::UnknownSubject(s),
            other => ConversionError::MissingTableData(other.to_string()),
        }
    }
}

impl From<Ineligibility> for ConversionError {
    fn from(e: Ineligibility) -> Self {
        ConversionError::IneligibleProgram(e.to_string())
    }
}

/// Response entry for one requested program. Scores are rounded to two decimals.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConversionResult {
    pub program: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_aggregate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub electives_used: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_score_sum: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<i8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl ConversionResult {
    pub fn success(program: &str, c: &Conversion) -> Self {
        Self {
            program: program.to_string(),
            success: true,
            converted_score: Some(round2(c.final_score)),
            raw_aggregate: Some(round2(c.raw_aggregate)),
            bonus: Some(round2(c.bonus)),
            electives_used: c.electives_used.iter().map(|n| n.to_string()).collect(),
            standard_score_sum: Some(c.standard_score_sum),
            risk_level: c.risk_level,
            failure: None,
            failure_reason: None,
        }
    }

    pub fn failure(program: &str, e: &ConversionError) -> Self {
        Self {
            program: program.to_string(),
            success: false,
            converted_score: None,
            raw_aggregate: None,
            bonus: None,
            electives_used: Vec::new(),
            standard_score_sum: None,
            risk_level: None,
            failure: Some(e.state()),
            failure_reason: Some(e.to_string()),
        }
    }
}
