//! Loader: read local JSON artifacts (manifest → score tables → percentile
//! bands → rules → optional peer averages), check their invariants, and return
//! typed `LoadedData` plus canonical input digests. No network I/O.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use ac_core::{
    FormulaRegistry, PeerAverageTable, PercentileBand, PercentileTable, ProgramKey, ScoreTable, StudentScoreSet,
    SubjectName, SubjectTable, TableCell, TableRow,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::hasher::sha256_canonical_value;
use crate::manifest::{self as man, ResolvedInput};
use crate::IoError;

const MAX_INPUT_BYTES: u64 = 64 * 1024 * 1024;

/// sha256 of each input's canonical JSON, keyed by the manifest spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InputDigests {
    pub score_tables: BTreeMap<String, String>,
    pub percentile_table: String,
    pub rules: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_averages: Option<String>,
}

/// Everything the engine needs, validated and immutable from here on.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub scores: ScoreTable,
    pub percentiles: PercentileTable,
    pub registry: FormulaRegistry,
    pub peer_averages: Option<PeerAverageTable>,
    pub digests: InputDigests,
}

// ----------------------------- Orchestration -----------------------------

/// Load everything named by the manifest at `path`, verifying digests and
/// the expected engine version first.
pub fn load_all_from_manifest(path: &Path, engine_version: &str) -> Result<LoadedData, IoError> {
    let resolved = man::load_verify_manifest(path, engine_version)?;

    let mut scores = ScoreTable::new();
    let mut score_digests = BTreeMap::new();
    for input in &resolved.score_tables {
        let (table, digest) = load_score_table(input)?;
        scores.merge(table)?;
        score_digests.insert(input.label.clone(), digest);
    }

    let (percentiles, percentile_digest) = load_percentile_table(&resolved.percentile_table)?;
    let (registry, rules_digest) = load_registry(&resolved.rules)?;
    let (peer_averages, peer_digest) = match &resolved.peer_averages {
        Some(input) => {
            let (t, d) = load_peer_averages(input)?;
            (Some(t), Some(d))
        }
        None => (None, None),
    };

    Ok(LoadedData {
        scores,
        percentiles,
        registry,
        peer_averages,
        digests: InputDigests {
            score_tables: score_digests,
            percentile_table: percentile_digest,
            rules: rules_digest,
            peer_averages: peer_digest,
        },
    })
}

// ----------------------------- Targeted loaders -----------------------------

fn pointer(parts: &[&str]) -> String {
    parts.iter().fold(String::new(), |mut acc, p| {
        acc.push('/');
        acc.push_str(&p.replace('~', "~0").replace('/', "~1"));
        acc
    })
}

fn from_value<T: serde::de::DeserializeOwned>(v: Value, label: &str) -> Result<T, IoError> {
    serde_json::from_value(v).map_err(|e| IoError::Json { pointer: "/".into(), msg: format!("{label}: {e}") })
}

/// One subject-domain file: `subject → key → program → number | marker`.
pub fn load_score_table(input: &ResolvedInput) -> Result<(ScoreTable, String), IoError> {
    type RawTable = BTreeMap<String, BTreeMap<String, BTreeMap<String, TableCell>>>;

    let v = read_json_value_with_limits(&input.path)?;
    let digest = sha256_canonical_value(&v)?;
    let raw: RawTable = from_value(v, &input.label)?;

    let mut table = ScoreTable::new();
    for (subject, keyed) in raw {
        let name: SubjectName = subject
            .parse()
            .map_err(|e: ac_core::CoreError| IoError::Json { pointer: pointer(&[&subject]), msg: e.to_string() })?;
        let mut rows = Vec::with_capacity(keyed.len());
        for (key, cells) in keyed {
            let k: i32 = key.trim().parse().map_err(|_| IoError::Json {
                pointer: pointer(&[&subject, &key]),
                msg: "score key must be an integer".into(),
            })?;
            let mut row = TableRow::new();
            for (program, cell) in cells {
                let pk: ProgramKey = program.parse().map_err(|e: ac_core::CoreError| IoError::Json {
                    pointer: pointer(&[&subject, &key, &program]),
                    msg: e.to_string(),
                })?;
                row.insert(pk, cell);
            }
            rows.push((k, row));
        }
        if rows.is_empty() {
            return Err(IoError::Invalid(format!("{}: subject {subject} has no rows", input.label)));
        }
        table.insert_subject(name, SubjectTable::from_rows(rows))?;
    }
    Ok((table, digest))
}

/// `program → [{percentile, score}]`, ascending by percentile.
pub fn load_percentile_table(input: &ResolvedInput) -> Result<(PercentileTable, String), IoError> {
    let v = read_json_value_with_limits(&input.path)?;
    let digest = sha256_canonical_value(&v)?;
    let raw: BTreeMap<ProgramKey, Vec<PercentileBand>> = from_value(v, &input.label)?;
    Ok((PercentileTable::from_map(raw)?, digest))
}

/// Rule registry; every rule must pass authoring validation.
pub fn load_registry(input: &ResolvedInput) -> Result<(FormulaRegistry, String), IoError> {
    let v = read_json_value_with_limits(&input.path)?;
    let digest = sha256_canonical_value(&v)?;
    let reg: FormulaRegistry = from_value(v, &input.label)?;
    let bad = reg.validate_all();
    if !bad.is_empty() {
        let msg = bad.iter().map(|(k, e)| format!("{k}: {e}")).collect::<Vec<_>>().join("; ");
        return Err(IoError::Invalid(format!("{}: {msg}", input.label)));
    }
    Ok((reg, digest))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPeerRow {
    standard_sum: i32,
    averages: BTreeMap<ProgramKey, f64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPeerTable {
    rows: Vec<RawPeerRow>,
}

/// `{"rows": [{"standard_sum": n, "averages": {program: avg}}]}`
pub fn load_peer_averages(input: &ResolvedInput) -> Result<(PeerAverageTable, String), IoError> {
    let v = read_json_value_with_limits(&input.path)?;
    let digest = sha256_canonical_value(&v)?;
    let raw: RawPeerTable = from_value(v, &input.label)?;
    let mut rows = BTreeMap::new();
    for (i, r) in raw.rows.into_iter().enumerate() {
        if rows.insert(r.standard_sum, r.averages).is_some() {
            return Err(IoError::Json {
                pointer: format!("/rows/{i}/standard_sum"),
                msg: format!("duplicate standard_sum {}", r.standard_sum),
            });
        }
    }
    Ok((PeerAverageTable::from_rows(rows), digest))
}

/// A student's request: `subject → {standard_score?, grade?, percentile?, area?}`.
pub fn load_student_scores(path: &Path) -> Result<StudentScoreSet, IoError> {
    let v = read_json_value_with_limits(path)?;
    let set: StudentScoreSet = from_value(v, &path.display().to_string())?;
    if set.is_empty() {
        return Err(IoError::Invalid(format!("{}: no subject scores", path.display())));
    }
    Ok(set)
}

pub fn read_json_value_with_limits(path: &Path) -> Result<Value, IoError> {
    let f = File::open(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    let mut buf = Vec::new();
    f.take(MAX_INPUT_BYTES + 1)
        .read_to_end(&mut buf)
        .map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    if buf.len() as u64 > MAX_INPUT_BYTES {
        return Err(IoError::Invalid(format!("{}: exceeds {MAX_INPUT_BYTES} bytes", path.display())));
    }
    Ok(serde_json::from_slice(&buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn input(dir: &Path, name: &str, body: &str) -> ResolvedInput {
        let path: PathBuf = dir.join(name);
        std::fs::write(&path, body).unwrap();
        ResolvedInput { label: name.to_string(), path }
    }

    #[test]
    fn score_table_parses_numeric_keys_and_markers() {
        let dir = tempfile::tempdir().unwrap();
        let i = input(dir.path(), "core.json", r#"{"Korean": {"145": {"P": 145, "Q": "미반영"}, "140": {"P": 139.5}}}"#);
        let (t, digest) = load_score_table(&i).unwrap();
        let korean = t.subject("Korean").unwrap();
        assert_eq!(korean.keys().collect::<Vec<_>>(), vec![140, 145]);
        assert_eq!(korean.row(145).unwrap()["Q"].points(), 0.0);
        assert_eq!(digest.len(), 64);
    }

    #[test]
    fn non_integer_key_points_at_the_node() {
        let dir = tempfile::tempdir().unwrap();
        let i = input(dir.path(), "core.json", r#"{"Korean": {"abc": {"P": 1}}}"#);
        match load_score_table(&i) {
            Err(IoError::Json { pointer, .. }) => assert_eq!(pointer, "/Korean/abc"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invalid_rule_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let i = input(
            dir.path(),
            "programs.json",
            r#"{"programs": {"X": {"pattern": {"aggregation": {"mode": "top_k", "pool": [], "coefficients": [1]}}}}}"#,
        );
        assert!(matches!(load_registry(&i), Err(IoError::Invalid(msg)) if msg.contains("X")));
    }

    #[test]
    fn unsorted_bands_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let i = input(
            dir.path(),
            "percentiles.json",
            r#"{"P": [{"percentile": 2.0, "score": 600}, {"percentile": 1.0, "score": 650}]}"#,
        );
        assert!(matches!(load_percentile_table(&i), Err(IoError::Invalid(_))));
    }

    #[test]
    fn peer_rows_must_be_unique() {
        let dir = tempfile::tempdir().unwrap();
        let i = input(
            dir.path(),
            "peers.json",
            r#"{"rows": [{"standard_sum": 400, "averages": {"P": 600}}, {"standard_sum": 400, "averages": {"P": 601}}]}"#,
        );
        assert!(matches!(load_peer_averages(&i), Err(IoError::Json { .. })));
    }

    #[test]
    fn student_scores_reject_empty_request() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("student.json");
        std::fs::write(&p, "{}").unwrap();
        assert!(matches!(load_student_scores(&p), Err(IoError::Invalid(_))));
        std::fs::write(&p, r#"{"Korean": {"standardScore": 131}}"#).unwrap();
        assert_eq!(load_student_scores(&p).unwrap().len(), 1);
    }
}
