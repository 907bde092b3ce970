//! ac_pipeline: per (student, program) conversion over an immutable engine context.
//!
//! Stages: `Eligibility → TableLookup → Aggregation → Bonus → Done`. Each
//! program fails independently with a typed reason; a batch never aborts.
//! All file access goes through `ac_io` before an `EngineData` exists.

use std::path::Path;

use ac_core::{FormulaRegistry, PeerAverageTable, PercentileTable, ScoreTable};
use ac_io::loader::{self, InputDigests, LoadedData};
use serde::Serialize;
use thiserror::Error;

pub mod advantage;
pub mod build_run_record;
pub mod convert;
pub mod optimize;
pub mod result;
pub mod validate;

pub use advantage::{advantage, AdvantageReport};
pub use build_run_record::{build_run_record, RunCounts, RunRecord};
pub use convert::{convert, convert_batch, try_convert, Conversion};
pub use optimize::{find_best_score, ConsideredSubset, OptimizedConversion};
pub use result::{ConversionError, ConversionResult, FailureState, Stage};
pub use validate::{validate, EntityRef, Severity, ValidationIssue, ValidationReport};

/// Engine identifiers recorded in run records and checked against `expect.engine_version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineMeta {
    pub vendor: String,
    pub name: String,
    pub version: String,
    pub build: String,
}

/// Baked at compile time when the build sets `AC_ENGINE_*`; falls back to the package version.
pub fn engine_identifiers() -> EngineMeta {
    EngineMeta {
        vendor: option_env!("AC_ENGINE_VENDOR").unwrap_or("ac").to_string(),
        name: option_env!("AC_ENGINE_NAME").unwrap_or("ac_engine").to_string(),
        version: option_env!("AC_ENGINE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION")).to_string(),
        build: option_env!("AC_ENGINE_BUILD").unwrap_or("dev").to_string(),
    }
}

/// Immutable engine context. Built once at startup, shared by reference (or `Arc`) afterwards.
#[derive(Debug, Clone)]
pub struct EngineData {
    pub scores: ScoreTable,
    pub percentiles: PercentileTable,
    pub registry: FormulaRegistry,
    pub peer_averages: Option<PeerAverageTable>,
}

impl EngineData {
    pub fn new(scores: ScoreTable, percentiles: PercentileTable, registry: FormulaRegistry) -> Self {
        Self { scores, percentiles, registry, peer_averages: None }
    }

    pub fn with_peer_averages(mut self, table: PeerAverageTable) -> Self {
        self.peer_averages = Some(table);
        self
    }
}

impl From<LoadedData> for EngineData {
    fn from(l: LoadedData) -> Self {
        Self { scores: l.scores, percentiles: l.percentiles, registry: l.registry, peer_averages: l.peer_averages }
    }
}

/// Startup failures; per-program failures are `ConversionError`s instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("io: {0}")]
    Io(String),
    #[error("json {pointer}: {msg}")]
    Json { pointer: String, msg: String },
    #[error("validate: {0}")]
    Validate(String),
    /// Digest or engine-version mismatch against the manifest.
    #[error("integrity: {0}")]
    Integrity(String),
    #[error("build: {0}")]
    Build(String),
}

impl From<ac_io::IoError> for PipelineError {
    fn from(e: ac_io::IoError) -> Self {
        use ac_io::{IoError, ManifestError};
        match e {
            IoError::Path(m) => PipelineError::Io(m),
            IoError::Json { pointer, msg } => PipelineError::Json { pointer, msg },
            IoError::Hash(m) => PipelineError::Build(format!("hash: {m}")),
            IoError::Invalid(m) => PipelineError::Validate(m),
            IoError::Manifest(m @ (ManifestError::DigestMismatch(..) | ManifestError::ExpectationMismatch(..))) => {
                PipelineError::Integrity(m.to_string())
            }
            IoError::Manifest(m @ ManifestError::Io(..)) => PipelineError::Io(m.to_string()),
            IoError::Manifest(m) => PipelineError::Validate(format!("manifest: {m}")),
        }
    }
}

/// Load the manifest and every data file it lists into an engine context.
pub fn load_engine<P: AsRef<Path>>(manifest: P, meta: &EngineMeta) -> Result<(EngineData, InputDigests), PipelineError> {
    let loaded = loader::load_all_from_manifest(manifest.as_ref(), &meta.version)?;
    let digests = loaded.digests.clone();
    tracing::info!(
        subjects = loaded.scores.subjects().count(),
        programs = loaded.registry.len(),
        peer_averages = loaded.peer_averages.is_some(),
        "engine data loaded"
    );
    Ok((EngineData::from(loaded), digests))
}

#[cfg(test)]
pub(crate) mod testdata {
    //! Small in-memory engine used by the unit tests.
    use super::*;
    use ac_core::{
        Aggregation, FormulaPattern, ProgramRule, RequiredSubjects, Slot, StudentScoreSet, SubjectScore, SubjectTable,
        TableCell, TableRow,
    };

    pub fn rows(program: &str, pairs: &[(i32, f64)]) -> SubjectTable {
        SubjectTable::from_rows(pairs.iter().map(|(k, v)| {
            let mut row = TableRow::new();
            row.insert(program.parse().unwrap(), TableCell::Points(*v));
            (*k, row)
        }))
    }

    pub fn engine() -> EngineData {
        let mut t = ScoreTable::new();
        for (subject, pairs) in [
            ("Korean", vec![(140, 140.0), (145, 145.0)]),
            ("Math(Calculus)", vec![(130, 136.5)]),
            ("English", vec![(1, 200.0), (2, 195.0)]),
            ("CivicKnowledge", vec![(1, 10.0), (2, 10.0), (3, 9.6)]),
            ("Biology1", vec![(69, 64.2)]),
            ("Chemistry1", vec![(68, 64.15)]),
            ("Physics1", vec![(60, 55.0)]),
        ] {
            t.insert_subject(subject.parse().unwrap(), rows("P", &pairs)).unwrap();
        }
        let rule = ProgramRule {
            label: Some("Sample University / Natural Sciences".into()),
            pattern: FormulaPattern {
                required: RequiredSubjects::default(),
                elective_count: 2,
                aggregation: Aggregation::WeightedSum {
                    weights: [
                        (Slot::Korean, 1.0),
                        (Slot::Math, 1.0),
                        (Slot::English, 1.0),
                        (Slot::Electives, 1.0),
                        (Slot::Civic, 0.0),
                    ]
                    .into(),
                },
                auto_civic: true,
                base_points: 0.0,
            },
            bonus: None,
            risk: vec![],
        };
        let registry = FormulaRegistry::from_rules([("P".parse().unwrap(), rule)]);
        EngineData::new(t, PercentileTable::default(), registry)
    }

    pub fn student() -> StudentScoreSet {
        [
            ("Korean", SubjectScore::standard(145)),
            ("Math(Calculus)", SubjectScore::standard(130)),
            ("English", SubjectScore::graded(1)),
            ("CivicKnowledge", SubjectScore::graded(2)),
            ("Biology1", SubjectScore::standard(69)),
            ("Chemistry1", SubjectScore::standard(68)),
        ]
        .into_iter()
        .map(|(n, s)| (n.parse().unwrap(), s))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_data_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<EngineData>();
    }

    #[test]
    fn engine_meta_falls_back_to_package_version() {
        let m = engine_identifiers();
        assert!(!m.version.is_empty());
        assert!(!m.name.is_empty());
    }

    #[test]
    fn digest_mismatch_maps_to_integrity() {
        let e = ac_io::IoError::Manifest(ac_io::ManifestError::DigestMismatch("a.json".into(), "x".into()));
        assert!(matches!(PipelineError::from(e), PipelineError::Integrity(_)));
    }
}
