//! Cross-checks between the rule registry and the loaded tables.
//!
//! Load already rejects malformed files; this pass looks for authoring
//! gaps that only show up per program at conversion time. Deterministic:
//! issues are sorted by (severity, code, where, message).

use std::collections::BTreeSet;

use ac_core::{ProgramKey, ProgramRule, SubjectArea};
use serde::Serialize;

use crate::EngineData;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// Where the issue occurred.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    Root,
    Program(String),
    Subject(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    #[serde(rename = "where")]
    pub where_: EntityRef,
}

/// `pass` = no `Error` issues.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub pass: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn errors(&self) -> usize {
        self.issues.iter().filter(|i| i.severity == Severity::Error).count()
    }

    pub fn warnings(&self) -> usize {
        self.issues.len() - self.errors()
    }
}

pub fn validate(data: &EngineData) -> ValidationReport {
    let mut issues = Vec::new();

    issues.extend(check_registry_not_empty(data));
    issues.extend(check_programs_have_table_data(data));
    issues.extend(check_table_columns_registered(data));
    issues.extend(check_consumed_areas_covered(data));
    issues.extend(check_percentile_bands(data));
    issues.extend(check_risk_thresholds(data));
    issues.extend(check_peer_columns(data));

    sort_issues_stably(&mut issues);
    ValidationReport { pass: !issues.iter().any(|i| i.severity == Severity::Error), issues }
}

fn issue(severity: Severity, code: &'static str, where_: EntityRef, message: String) -> ValidationIssue {
    ValidationIssue { severity, code, message, where_ }
}

fn program_ref(k: &ProgramKey) -> EntityRef {
    EntityRef::Program(k.to_string())
}

fn check_registry_not_empty(data: &EngineData) -> Vec<ValidationIssue> {
    if data.registry.is_empty() {
        vec![issue(Severity::Error, "Registry.Empty", EntityRef::Root, "no programs registered".into())]
    } else {
        Vec::new()
    }
}

/// Errors:
/// - "Program.NoTableData" when no score table row lists the program
fn check_programs_have_table_data(data: &EngineData) -> Vec<ValidationIssue> {
    let columns = data.scores.program_keys();
    data.registry
        .keys()
        .filter(|k| !columns.contains(k))
        .map(|k| issue(Severity::Error, "Program.NoTableData", program_ref(k), "no score table lists this program".into()))
        .collect()
}

/// Warnings:
/// - "Table.UnregisteredProgram" for a table column with no rule
fn check_table_columns_registered(data: &EngineData) -> Vec<ValidationIssue> {
    data.scores
        .program_keys()
        .into_iter()
        .filter(|k| data.registry.get(k.as_str()).is_none())
        .map(|k| {
            issue(Severity::Warning, "Table.UnregisteredProgram", program_ref(k), "table column has no registered rule".into())
        })
        .collect()
}

fn areas_listing(data: &EngineData, program: &str) -> BTreeSet<SubjectArea> {
    data.scores
        .subjects()
        .filter(|(_, t)| t.rows().any(|(_, row)| row.contains_key(program)))
        .map(|(name, _)| SubjectArea::classify(name.as_str()))
        .collect()
}

fn consumed_areas(rule: &ProgramRule) -> BTreeSet<SubjectArea> {
    let mut areas: BTreeSet<SubjectArea> = rule.pattern.required_slots().into_iter().filter_map(|s| s.area()).collect();
    if rule.pattern.elective_count > 0 {
        match rule.pattern.required.elective_area {
            Some(ac_core::ElectiveArea::Science) => {
                areas.insert(SubjectArea::Science);
            }
            Some(ac_core::ElectiveArea::Society) => {
                areas.insert(SubjectArea::Society);
            }
            None => {}
        }
    }
    areas
}

/// Warnings:
/// - "Program.AreaNotCovered" when a consumed area has no table listing the program
fn check_consumed_areas_covered(data: &EngineData) -> Vec<ValidationIssue> {
    let mut out = Vec::new();
    for (k, rule) in data.registry.iter() {
        let listed = areas_listing(data, k.as_str());
        if listed.is_empty() {
            // already an error above
            continue;
        }
        for area in consumed_areas(rule).difference(&listed) {
            out.push(issue(
                Severity::Warning,
                "Program.AreaNotCovered",
                program_ref(k),
                format!("no {area:?} table lists this program"),
            ));
        }
    }
    out
}

/// Warnings:
/// - "Percentile.Missing" for a program without bands (advantage reports omit percentiles)
fn check_percentile_bands(data: &EngineData) -> Vec<ValidationIssue> {
    data.registry
        .keys()
        .filter(|k| data.percentiles.bands(k.as_str()).map_or(true, |b| b.is_empty()))
        .map(|k| issue(Severity::Warning, "Percentile.Missing", program_ref(k), "no percentile bands".into()))
        .collect()
}

/// Warnings:
/// - "Risk.DuplicateLevel"
/// - "Risk.NonMonotonic" when a higher level has a lower threshold than a lower level
fn check_risk_thresholds(data: &EngineData) -> Vec<ValidationIssue> {
    let mut out = Vec::new();
    for (k, rule) in data.registry.iter() {
        let mut t = rule.risk.clone();
        t.sort_by(|a, b| b.level.cmp(&a.level));
        if t.windows(2).any(|w| w[0].level == w[1].level) {
            out.push(issue(Severity::Warning, "Risk.DuplicateLevel", program_ref(k), "risk level listed twice".into()));
        }
        if t.windows(2).any(|w| w[0].score < w[1].score) {
            out.push(issue(
                Severity::Warning,
                "Risk.NonMonotonic",
                program_ref(k),
                "risk thresholds do not decrease with level".into(),
            ));
        }
    }
    out
}

/// Warnings:
/// - "Peer.MissingColumn" when a peer table is configured but never lists the program
fn check_peer_columns(data: &EngineData) -> Vec<ValidationIssue> {
    let Some(peers) = data.peer_averages.as_ref() else { return Vec::new() };
    data.registry
        .keys()
        .filter(|k| !peers.keys().any(|row| peers.row(row).is_some_and(|r| r.contains_key(k.as_str()))))
        .map(|k| issue(Severity::Warning, "Peer.MissingColumn", program_ref(k), "no peer average for this program".into()))
        .collect()
}

fn sort_issues_stably(issues: &mut [ValidationIssue]) {
    issues.sort_by(|a, b| {
        (a.severity, a.code, &a.where_, &a.message).cmp(&(b.severity, b.code, &b.where_, &b.message))
    });
}
