// crates/ac_cli/src/main.rs
//
// engine meta → load (manifest, digests) → student scores → convert or
// optimize per program → results + run record.
// Exit codes: 0 ok, 2 validation, 3 digest/version mismatch, 4 I/O.

#![forbid(unsafe_code)]

mod args;
mod telemetry;

mod exitcodes {
    pub const OK: u8 = 0;
    pub const VALIDATION: u8 = 2;
    pub const SELF_VERIFY: u8 = 3;
    pub const IO: u8 = 4;
}

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use ac_core::StudentScoreSet;
use ac_io::{canonical_json, loader, IoError};
use ac_pipeline::{
    advantage, build_run_record, convert_batch, engine_identifiers, load_engine, validate, AdvantageReport,
    ConversionResult, EngineData, PipelineError, RunCounts, RunRecord,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use args::{parse_and_validate, Args};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug, Error)]
enum MainError {
    /// Arguments, JSON shape, manifest, rule registry, cross-check failures
    #[error("{0}")]
    Validation(String),
    /// Digest or engine-version mismatch against the manifest
    #[error("{0}")]
    SelfVerify(String),
    #[error("{0}")]
    Io(String),
}

impl From<PipelineError> for MainError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Io(m) => MainError::Io(m),
            PipelineError::Json { .. } | PipelineError::Validate(_) => MainError::Validation(e.to_string()),
            PipelineError::Integrity(m) | PipelineError::Build(m) => MainError::SelfVerify(m),
        }
    }
}

impl From<IoError> for MainError {
    fn from(e: IoError) -> Self {
        MainError::from(PipelineError::from(e))
    }
}

impl MainError {
    fn exit_code(&self) -> u8 {
        match self {
            MainError::Validation(_) => exitcodes::VALIDATION,
            MainError::SelfVerify(_) => exitcodes::SELF_VERIFY,
            MainError::Io(_) => exitcodes::IO,
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_and_validate() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("admit: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION);
        }
    };
    if let Err(e) = telemetry::init(&args.log_level) {
        eprintln!("admit: error: {e}");
        return ExitCode::from(exitcodes::VALIDATION);
    }

    let outcome = if args.validate_only { validate_only(&args) } else { run_once(&args) };
    match outcome {
        Ok(()) => ExitCode::from(exitcodes::OK),
        Err(e) => {
            eprintln!("admit: error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

/// Load + registry/table cross-check; the report goes to stdout.
fn validate_only(args: &Args) -> Result<(), MainError> {
    let (data, _) = load_engine(&args.manifest, &engine_identifiers())?;
    let report = validate(&data);
    print_json(&report)?;
    if !report.pass {
        return Err(MainError::Validation(format!("{} validation error(s)", report.errors())));
    }
    if !args.quiet {
        eprintln!("validate-only: inputs OK ({} warning(s))", report.warnings());
    }
    Ok(())
}

/// One entry per requested program: an advantage report, or the failure.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum OptimizedEntry {
    Report(AdvantageReport),
    Failed(ConversionResult),
}

#[derive(Debug, Serialize)]
struct Document<'a, T: Serialize> {
    results: &'a T,
    run_record: &'a RunRecord,
}

fn run_once(args: &Args) -> Result<(), MainError> {
    let meta = engine_identifiers();
    let (data, digests) = load_engine(&args.manifest, &meta)?;
    let scores_path = args.scores.as_deref().ok_or_else(|| MainError::Validation("--scores is required".into()))?;
    let student = loader::load_student_scores(scores_path)?;
    let programs = requested_programs(args, &data);

    if args.optimize {
        let entries = optimize_all(&data, &student, &programs);
        let succeeded = entries.iter().filter(|e| matches!(e, OptimizedEntry::Report(_))).count();
        let counts = RunCounts { requested: entries.len(), succeeded, failed: entries.len() - succeeded };
        let record = build_run_record(&meta, &digests, &student, &entries, counts)?;
        emit(args, &entries, &record)
    } else {
        let results = convert_batch(&data, &student, &programs);
        let record = build_run_record(&meta, &digests, &student, &results, RunCounts::of(&results))?;
        emit(args, &results, &record)
    }
}

fn requested_programs(args: &Args, data: &EngineData) -> Vec<String> {
    if args.programs.is_empty() {
        data.registry.keys().map(|k| k.to_string()).collect()
    } else {
        args.programs.clone()
    }
}

fn optimize_all(data: &EngineData, student: &StudentScoreSet, programs: &[String]) -> Vec<OptimizedEntry> {
    programs
        .iter()
        .map(|p| match advantage(data, student, p) {
            Ok(r) => OptimizedEntry::Report(r),
            Err(e) => {
                warn!(program = p.as_str(), reason = %e, "optimization failed");
                OptimizedEntry::Failed(ConversionResult::failure(p, &e))
            }
        })
        .collect()
}

fn emit<T: Serialize>(args: &Args, results: &T, record: &RunRecord) -> Result<(), MainError> {
    match &args.out {
        Some(dir) => {
            write_artifacts(dir, results, record)?;
            if !args.quiet {
                eprintln!("run: artifacts written to {}", dir.display());
            }
            Ok(())
        }
        None => print_json(&Document { results, run_record: record }),
    }
}

fn write_artifacts<T: Serialize>(out_dir: &Path, results: &T, record: &RunRecord) -> Result<(), MainError> {
    fs::create_dir_all(out_dir).map_err(|e| MainError::Io(format!("mkdir {}: {e}", out_dir.display())))?;
    canonical_json::write_canonical_file(&out_dir.join("results.json"), &to_value(results)?)?;
    canonical_json::write_canonical_file(&out_dir.join("run_record.json"), &to_value(record)?)?;
    info!(dir = %out_dir.display(), result_id = record.result_id.as_str(), "artifacts written");
    Ok(())
}

fn to_value<T: Serialize>(v: &T) -> Result<serde_json::Value, MainError> {
    serde_json::to_value(v).map_err(|e| MainError::Io(format!("serialize: {e}")))
}

fn print_json<T: Serialize>(v: &T) -> Result<(), MainError> {
    let text = serde_json::to_string_pretty(v).map_err(|e| MainError::Io(format!("serialize: {e}")))?;
    println!("{text}");
    Ok(())
}
