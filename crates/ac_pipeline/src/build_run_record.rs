// crates/ac_pipeline/src/build_run_record.rs
//
// Run record emitted next to every results document:
// - engine meta recorded verbatim (vendor/name/version/build)
// - sha256 of each canonical input (as verified by the loader)
// - sha256 of the canonical student request
// - result id `RES:<hex>` = sha256 of the canonical results payload
// - per-run counts
//
// Hashing goes through ac_io's canonical JSON so every digest here can be
// reproduced from the files on disk.

use ac_core::StudentScoreSet;
use ac_io::hasher::{result_id, sha256_canonical};
use ac_io::loader::InputDigests;
use serde::Serialize;

use crate::result::ConversionResult;
use crate::{EngineMeta, PipelineError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunCounts {
    pub fn of(results: &[ConversionResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self { requested: results.len(), succeeded, failed: results.len() - succeeded }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunRecord {
    pub engine: EngineMeta,
    pub inputs: InputDigests,
    pub scores_sha256: String,
    pub result_id: String,
    pub counts: RunCounts,
}

/// `results` is whatever payload the caller writes (plain results or advantage reports).
pub fn build_run_record<T: Serialize>(
    meta: &EngineMeta,
    inputs: &InputDigests,
    student: &StudentScoreSet,
    results: &T,
    counts: RunCounts,
) -> Result<RunRecord, PipelineError> {
    Ok(RunRecord {
        engine: meta.clone(),
        inputs: inputs.clone(),
        scores_sha256: sha256_canonical(student)?,
        result_id: result_id(results)?,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert_batch;
    use crate::testdata::{engine, student};
    use ac_io::hasher::is_lower_hex_64;

    fn record() -> RunRecord {
        let results = convert_batch(&engine(), &student(), &["P", "NOPE"]);
        let meta = crate::engine_identifiers();
        build_run_record(&meta, &InputDigests::default(), &student(), &results, RunCounts::of(&results)).unwrap()
    }

    #[test]
    fn ids_are_canonical_sha256() {
        let r = record();
        assert!(is_lower_hex_64(&r.scores_sha256));
        let hex = r.result_id.strip_prefix("RES:").unwrap();
        assert!(is_lower_hex_64(hex));
        assert_eq!(r.counts, RunCounts { requested: 2, succeeded: 1, failed: 1 });
    }

    #[test]
    fn record_is_reproducible() {
        assert_eq!(record(), record());
    }
}
