//! ac_core: Core types for the admission score conversion engine.
//!
//! This crate is **I/O-free**. It defines stable types/APIs used across the
//! engine (`ac_io`, `ac_algo`, `ac_pipeline`, `ac_cli`).
//!
//! - Registry tokens: `SubjectName`, `ProgramKey`
//! - Subject vocabulary: areas, math branches, elective tiers, score sets
//! - Immutable lookup tables: score table, percentile bands, peer averages
//! - Declarative rule registry: formula patterns and bonus rules
//! - Deterministic ordering helpers and two-decimal rounding
//!
//! Serialization derives are gated behind the `serde` feature.

#![forbid(unsafe_code)]

pub mod errors {
    use core::fmt;

    /// Minimal error set for core-domain validation & parsing.
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum CoreError {
        EmptyToken,
        InvalidToken(String),
        DuplicateSubject(String),
        UnsortedBands(String),
        DomainOutOfRange(&'static str),
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::EmptyToken => write!(f, "empty token"),
                CoreError::InvalidToken(t) => write!(f, "invalid token: {t:?}"),
                CoreError::DuplicateSubject(s) => write!(f, "subject defined twice: {s}"),
                CoreError::UnsortedBands(p) => {
                    write!(f, "percentile bands not ascending for program {p}")
                }
                CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub mod ids;
pub mod subjects;
pub mod tables;
pub mod rules;
pub mod determinism;

pub mod rounding {
    //! Score rounding. Converted scores are reported with two decimals.

    /// Round half away from zero to `places` decimals.
    #[inline]
    pub fn round_to(x: f64, places: u32) -> f64 {
        let scale = 10f64.powi(places as i32);
        (x * scale).round() / scale
    }

    /// Two-decimal rounding used for every reported score.
    #[inline]
    pub fn round2(x: f64) -> f64 {
        round_to(x, 2)
    }

    /// Approximate equality within `tol` (used by fixtures and tests).
    #[inline]
    pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

}

pub use errors::CoreError;
pub use ids::{ProgramKey, SubjectName};
pub use rules::{
    Aggregation, BonusBasis, BonusRule, ComparativeAward, ElectiveFilter, ElectiveGate, FormulaPattern,
    FormulaRegistry, MathRequirement, Operand, ProgramRule, RequiredSubjects, RiskThreshold,
    RuleError, Slot,
};
pub use subjects::{
    ElectiveArea, ElectiveRef, ElectiveTier, KeyBasis, MathBranch, StudentScoreSet, SubjectArea,
    SubjectScore,
};
pub use tables::{
    PeerAverageTable, PercentileBand, PercentileTable, ScoreTable, SubjectTable, TableCell, TableRow,
};
