//! Score Table Store lookup.
//!
//! `lookup(subject, key, program)`:
//! - unknown subject → `LookupError::UnknownSubject`
//! - absent key → nearest key via `fallback`
//! - non-numeric cell → 0 (the "not awarded" marker)
//! - row without the program → `LookupError::MissingProgram`
//!
//! Pure and referentially transparent over the immutable table.

use core::fmt;

use ac_core::{
    subjects::{KeyBasis, SubjectArea, SubjectScore},
    tables::ScoreTable,
};

use crate::fallback::resolve_in;

#[derive(Clone, Debug, PartialEq)]
pub enum LookupError {
    /// The subject has no table at all.
    UnknownSubject(String),
    /// The subject table exists but holds no numeric keys.
    EmptySubject(String),
    /// The student gave no number for the subject's key convention.
    MissingKey { subject: String, basis: KeyBasis },
    /// The resolved row does not list the program.
    MissingProgram { subject: String, key: i32, program: String },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::UnknownSubject(s) => write!(f, "unknown subject: {s}"),
            LookupError::EmptySubject(s) => write!(f, "score table for {s} has no rows"),
            LookupError::MissingKey { subject, basis } => {
                let what = match basis {
                    KeyBasis::StandardScore => "standard score",
                    KeyBasis::Grade => "grade",
                };
                write!(f, "{subject}: no {what} supplied")
            }
            LookupError::MissingProgram { subject, key, program } => {
                write!(f, "{subject}[{key}] has no entry for program {program}")
            }
        }
    }
}

impl std::error::Error for LookupError {}

/// A successful lookup; `matched != requested` means the fallback was used.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolved {
    pub requested: i32,
    pub matched: i32,
    pub points: f64,
}

impl Resolved {
    #[inline]
    pub fn used_fallback(&self) -> bool {
        self.requested != self.matched
    }
}

pub fn lookup(table: &ScoreTable, subject: &str, key: i32, program: &str) -> Result<Resolved, LookupError> {
    let st = table
        .subject(subject)
        .ok_or_else(|| LookupError::UnknownSubject(subject.to_string()))?;
    let matched = resolve_in(st, key).ok_or_else(|| LookupError::EmptySubject(subject.to_string()))?;
    let cell = st
        .row(matched)
        .and_then(|row| row.get(program))
        .ok_or_else(|| LookupError::MissingProgram {
            subject: subject.to_string(),
            key: matched,
            program: program.to_string(),
        })?;
    Ok(Resolved { requested: key, matched, points: cell.points() })
}

/// Coerce a student's score to the subject's key convention, then `lookup`.
pub fn lookup_score(
    table: &ScoreTable,
    subject: &str,
    score: &SubjectScore,
    area: SubjectArea,
    program: &str,
) -> Result<Resolved, LookupError> {
    let basis = area.key_basis();
    let key = score
        .key_for(basis)
        .ok_or_else(|| LookupError::MissingKey { subject: subject.to_string(), basis })?;
    lookup(table, subject, key, program)
}
