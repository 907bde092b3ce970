// crates/ac_cli/src/args.rs
//
// Offline CLI argument surface.
// - Paths are local files; URLs are refused with the same rule the manifest uses
// - --manifest is always required; --scores unless --validate-only
// - --program is repeatable; omitted means every registered program
// - --out writes results.json + run_record.json; otherwise one JSON document on stdout

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use ac_io::manifest::has_any_scheme;
use clap::Parser;
use thiserror::Error;

/// `admit` command line.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "admit",
    disable_help_subcommand = true,
    about = "Offline, deterministic admission score conversion"
)]
pub struct Args {
    /// Manifest JSON listing score tables, percentile bands, rules and optional peer averages.
    #[arg(long)]
    pub manifest: PathBuf,

    /// Student request: subject → {standardScore?, grade?, percentile?, area?}.
    #[arg(long, required_unless_present = "validate_only")]
    pub scores: Option<PathBuf>,

    /// Target program key; repeat for several. Default: every registered program.
    #[arg(long = "program", value_name = "KEY")]
    pub programs: Vec<String>,

    /// Search every elective subset and emit advantage reports.
    #[arg(long)]
    pub optimize: bool,

    /// Output directory for results.json and run_record.json.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Load inputs and cross-check the registry against the tables, then exit.
    #[arg(long)]
    pub validate_only: bool,

    /// Suppress non-essential stderr notes.
    #[arg(long)]
    pub quiet: bool,

    /// Log filter used when RUST_LOG is unset (e.g. "info", "ac_pipeline=debug").
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Errors surfaced by argument validation. Messages are short and stable.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("path must be local file (no scheme): {0}")]
    NonLocalPath(String),
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("empty program key")]
    EmptyProgram,
}

fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    match p.to_str() {
        Some(s) if has_any_scheme(s) => Err(CliError::NonLocalPath(s.to_string())),
        _ => Ok(()),
    }
}

fn ensure_local_file(p: &Path, flag: &'static str) -> Result<(), CliError> {
    ensure_local_path(p)?;
    match fs::metadata(p) {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(CliError::NotFound(format!("{flag} {}", p.display()))),
    }
}

/// Absolute form of `p`; paths that do not exist yet (like `--out`) are joined onto the CWD.
fn absolute(p: &Path) -> PathBuf {
    if let Ok(c) = fs::canonicalize(p) {
        return c;
    }
    if p.is_absolute() {
        return p.to_path_buf();
    }
    env::current_dir().map(|cwd| cwd.join(p)).unwrap_or_else(|_| p.to_path_buf())
}

/// Local-path and existence checks, then normalization.
pub fn validate(mut args: Args) -> Result<Args, CliError> {
    ensure_local_file(&args.manifest, "--manifest")?;
    if let Some(s) = &args.scores {
        ensure_local_file(s, "--scores")?;
    }
    if let Some(o) = &args.out {
        ensure_local_path(o)?;
    }
    if args.programs.iter().any(|p| p.trim().is_empty()) {
        return Err(CliError::EmptyProgram);
    }

    args.manifest = absolute(&args.manifest);
    args.scores = args.scores.as_deref().map(absolute);
    args.out = args.out.as_deref().map(absolute);
    Ok(args)
}

pub fn parse_and_validate() -> Result<Args, CliError> {
    validate(Args::parse())
}
