// crates/ac_io/src/manifest.rs
//
// External manifest → validated → resolved paths → verified digests.
//
// • Inputs are local paths only; any "<scheme>://" (and bare http:/https:) is rejected.
// • `score_tables` lists one file per subject domain; at least one is required.
// • Digests (optional) are keyed by the path string exactly as written in the
//   manifest, must be 64-lower-hex, and may only name listed inputs.
// • Digests are computed over canonical JSON bytes (sorted keys), so formatting
//   changes in a data file do not invalidate them.
// • `expect.engine_version`, when present, must equal the running engine's version.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::hasher::{is_lower_hex_64, sha256_canonical_value};

/// External manifest accepted by the loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Optional, non-normative identifier.
    #[serde(default)]
    pub id: Option<String>,

    pub score_tables: Vec<String>,
    pub percentile_table: String,
    pub rules: String,
    #[serde(default)]
    pub peer_averages: Option<String>,

    /// Manifest path string → lowercase sha256 of the file's canonical JSON.
    #[serde(default)]
    pub inputs_sha256: BTreeMap<String, String>,

    #[serde(default)]
    pub expect: Option<Expectations>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectations {
    #[serde(default)]
    pub engine_version: Option<String>,
}

/// One resolved input: the manifest spelling and the joined path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    pub label: String,
    pub path: PathBuf,
}

/// Paths resolved against the manifest's directory.
#[derive(Debug, Clone)]
pub struct ResolvedManifest {
    pub score_tables: Vec<ResolvedInput>,
    pub percentile_table: ResolvedInput,
    pub rules: ResolvedInput,
    pub peer_averages: Option<ResolvedInput>,
    pub digests: BTreeMap<String, String>,
    pub expect: Option<Expectations>,
}

impl ResolvedManifest {
    /// Every input in manifest order.
    pub fn inputs(&self) -> impl Iterator<Item = &ResolvedInput> {
        self.score_tables
            .iter()
            .chain([&self.percentile_table, &self.rules])
            .chain(self.peer_averages.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    Empty(&'static str),
    UrlPath(&'static str, String),
    DuplicateInput(String),
    Io(&'static str, String),
    NotAFile(&'static str, String),
    /// Not a lowercase 64-hex string.
    DigestShape(String, String),
    /// Provided digest doesn't match the computed canonical sha256.
    DigestMismatch(String, String),
    /// Digest given for a path the manifest does not list.
    DigestForMissing(String),
    ExpectationMismatch(&'static str, String),
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ManifestError::*;
        match self {
            Empty(k) => write!(f, "field must not be empty: {k}"),
            UrlPath(k, v) => write!(f, "path must be offline (no scheme) for {k}: {v}"),
            DuplicateInput(v) => write!(f, "input listed twice: {v}"),
            Io(k, v) => write!(f, "cannot access {k}: {v}"),
            NotAFile(k, v) => write!(f, "path is not a file for {k}: {v}"),
            DigestShape(k, v) => write!(f, "invalid sha256 format for {k}: {v}"),
            DigestMismatch(k, v) => write!(f, "sha256 mismatch for {k}: {v}"),
            DigestForMissing(k) => write!(f, "digest supplied for unlisted input: {k}"),
            ExpectationMismatch(k, v) => write!(f, "expectation mismatch for {k}: {v}"),
        }
    }
}

impl std::error::Error for ManifestError {}

const MAX_MANIFEST_BYTES: u64 = 4 * 1024 * 1024;

/// True when `s` names a URL rather than a local file (`x://`, `http:`, `https:`, `file:`).
pub fn has_any_scheme(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.contains("://") || ["http:", "https:", "file:"].iter().any(|p| lower.starts_with(p))
}

fn check_path(label: &'static str, path: &str) -> Result<(), ManifestError> {
    if path.trim().is_empty() {
        return Err(ManifestError::Empty(label));
    }
    if has_any_scheme(path) {
        return Err(ManifestError::UrlPath(label, path.to_string()));
    }
    Ok(())
}

/// Shape and offline policy; no I/O.
pub fn validate_manifest(man: &Manifest) -> Result<(), ManifestError> {
    if man.score_tables.is_empty() {
        return Err(ManifestError::Empty("score_tables"));
    }
    let mut listed: Vec<&str> = Vec::new();
    for p in &man.score_tables {
        check_path("score_tables", p)?;
        listed.push(p);
    }
    check_path("percentile_table", &man.percentile_table)?;
    check_path("rules", &man.rules)?;
    listed.push(&man.percentile_table);
    listed.push(&man.rules);
    if let Some(p) = &man.peer_averages {
        check_path("peer_averages", p)?;
        listed.push(p);
    }

    let mut seen = std::collections::BTreeSet::new();
    for p in &listed {
        if !seen.insert(*p) {
            return Err(ManifestError::DuplicateInput((*p).to_string()));
        }
    }

    for (k, h) in &man.inputs_sha256 {
        if !seen.contains(k.as_str()) {
            return Err(ManifestError::DigestForMissing(k.clone()));
        }
        if !is_lower_hex_64(h) {
            return Err(ManifestError::DigestShape(k.clone(), h.clone()));
        }
    }
    Ok(())
}

fn join_under(base: &Path, rel: &str) -> PathBuf {
    let p = Path::new(rel);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

fn must_exist_file(label: &'static str, p: &Path) -> Result<(), ManifestError> {
    let md = fs::metadata(p).map_err(|e| ManifestError::Io(label, format!("{} ({e})", p.display())))?;
    if !md.is_file() {
        return Err(ManifestError::NotAFile(label, p.display().to_string()));
    }
    Ok(())
}

/// Join every path under `base_dir` and check it is an existing file.
pub fn resolve_paths(base_dir: &Path, man: &Manifest) -> Result<ResolvedManifest, ManifestError> {
    let resolve = |label: &'static str, rel: &str| -> Result<ResolvedInput, ManifestError> {
        let path = join_under(base_dir, rel);
        must_exist_file(label, &path)?;
        Ok(ResolvedInput { label: rel.to_string(), path })
    };

    let score_tables = man
        .score_tables
        .iter()
        .map(|p| resolve("score_tables", p))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ResolvedManifest {
        score_tables,
        percentile_table: resolve("percentile_table", &man.percentile_table)?,
        rules: resolve("rules", &man.rules)?,
        peer_averages: man.peer_averages.as_deref().map(|p| resolve("peer_averages", p)).transpose()?,
        digests: man.inputs_sha256.clone(),
        expect: man.expect.clone(),
    })
}

/// Canonical-JSON sha256 of one input file.
pub fn canonical_digest_of_file(p: &Path) -> Result<String, ManifestError> {
    let buf = fs::read(p).map_err(|e| ManifestError::Io("read", format!("{} ({e})", p.display())))?;
    let v: serde_json::Value = serde_json::from_slice(&buf)
        .map_err(|e| ManifestError::Io("parse", format!("{} ({e})", p.display())))?;
    sha256_canonical_value(&v).map_err(|e| ManifestError::Io("canonicalize", e.to_string()))
}

/// Check every provided digest; no digests means nothing to check.
pub fn verify_digests(resolved: &ResolvedManifest) -> Result<(), ManifestError> {
    for input in resolved.inputs() {
        let Some(want) = resolved.digests.get(&input.label) else { continue };
        let got = canonical_digest_of_file(&input.path)?;
        if &got != want {
            return Err(ManifestError::DigestMismatch(
                input.label.clone(),
                format!("expected={want} got={got}"),
            ));
        }
    }
    Ok(())
}

pub fn enforce_expectations(resolved: &ResolvedManifest, actual_engine_version: &str) -> Result<(), ManifestError> {
    let Some(want) = resolved.expect.as_ref().and_then(|e| e.engine_version.as_ref()) else {
        return Ok(());
    };
    if want != actual_engine_version {
        return Err(ManifestError::ExpectationMismatch(
            "engine_version",
            format!("expected={want} got={actual_engine_version}"),
        ));
    }
    Ok(())
}

/// Read, validate and resolve a manifest; digests and expectations are not checked.
pub fn load_and_resolve_manifest(manifest_path: &Path) -> Result<ResolvedManifest, ManifestError> {
    let f = fs::File::open(manifest_path)
        .map_err(|e| ManifestError::Io("read", format!("{} ({e})", manifest_path.display())))?;
    let mut buf = Vec::new();
    f.take(MAX_MANIFEST_BYTES)
        .read_to_end(&mut buf)
        .map_err(|e| ManifestError::Io("read", format!("{} ({e})", manifest_path.display())))?;

    let man: Manifest = serde_json::from_slice(&buf)
        .map_err(|e| ManifestError::Io("parse", format!("{} ({e})", manifest_path.display())))?;
    validate_manifest(&man)?;

    let base = manifest_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    resolve_paths(&base, &man)
}

/// Full pipeline: load → validate → resolve → verify digests → enforce expectations.
pub fn load_verify_manifest(manifest_path: &Path, actual_engine_version: &str) -> Result<ResolvedManifest, ManifestError> {
    let resolved = load_and_resolve_manifest(manifest_path)?;
    verify_digests(&resolved)?;
    enforce_expectations(&resolved, actual_engine_version)?;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(score_tables: &[&str]) -> Manifest {
        Manifest {
            id: None,
            score_tables: score_tables.iter().map(|s| s.to_string()).collect(),
            percentile_table: "percentiles.json".into(),
            rules: "programs.json".into(),
            peer_averages: None,
            inputs_sha256: BTreeMap::new(),
            expect: None,
        }
    }

    #[test]
    fn rejects_urls_and_empty_lists() {
        assert_eq!(validate_manifest(&manifest(&[])), Err(ManifestError::Empty("score_tables")));
        let m = manifest(&["https://example.org/core.json"]);
        assert!(matches!(validate_manifest(&m), Err(ManifestError::UrlPath("score_tables", _))));
        let m = manifest(&["file:///tmp/core.json"]);
        assert!(matches!(validate_manifest(&m), Err(ManifestError::UrlPath(..))));
    }

    #[test]
    fn digest_must_name_a_listed_input() {
        let mut m = manifest(&["core.json"]);
        m.inputs_sha256.insert("other.json".into(), "0".repeat(64));
        assert_eq!(validate_manifest(&m), Err(ManifestError::DigestForMissing("other.json".into())));
        let mut m = manifest(&["core.json"]);
        m.inputs_sha256.insert("core.json".into(), "ABC".into());
        assert!(matches!(validate_manifest(&m), Err(ManifestError::DigestShape(..))));
    }

    #[test]
    fn duplicate_inputs_are_rejected() {
        let m = manifest(&["core.json", "core.json"]);
        assert_eq!(validate_manifest(&m), Err(ManifestError::DuplicateInput("core.json".into())));
    }

    #[test]
    fn verifies_canonical_digest_and_engine_version() {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in [
            ("core.json", r#"{ "Korean": {"145": {"P": 145}} }"#),
            ("percentiles.json", r#"{}"#),
            ("programs.json", r#"{"programs": {}}"#),
        ] {
            fs::write(dir.path().join(name), body).unwrap();
        }
        let want = sha256_canonical_value(&serde_json::json!({"Korean": {"145": {"P": 145}}})).unwrap();
        let mut m = manifest(&["core.json"]);
        m.inputs_sha256.insert("core.json".into(), want);
        m.expect = Some(Expectations { engine_version: Some("1.2.3".into()) });

        let resolved = resolve_paths(dir.path(), &m).unwrap();
        assert!(verify_digests(&resolved).is_ok());
        assert!(enforce_expectations(&resolved, "1.2.3").is_ok());
        assert!(matches!(
            enforce_expectations(&resolved, "9.9.9"),
            Err(ManifestError::ExpectationMismatch("engine_version", _))
        ));

        fs::write(dir.path().join("core.json"), r#"{"Korean": {"145": {"P": 146}}}"#).unwrap();
        assert!(matches!(verify_digests(&resolved), Err(ManifestError::DigestMismatch(..))));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_paths(dir.path(), &manifest(&["core.json"])).unwrap_err();
        assert!(matches!(err, ManifestError::Io("score_tables", _)));
    }
}
