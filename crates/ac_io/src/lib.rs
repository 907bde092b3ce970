//! ac_io: file-facing half of the admission conversion engine.
//!
//! - Manifest parsing with an offline-only path policy and digest checks
//! - Loaders for score tables, percentile bands, peer averages, rules and student scores
//! - Canonical JSON (sorted keys) and SHA-256 digests over it
//!
//! All I/O happens here, before the engine context exists.

#![forbid(unsafe_code)]

use thiserror::Error;

pub use manifest::ManifestError;

/// Unified error for ac_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors.
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON parse or shape errors with a JSON Pointer to the offending node.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    #[error("hash error: {0}")]
    Hash(String),

    /// Loaded data violates a table or rule invariant.
    #[error("invalid: {0}")]
    Invalid(String),

    #[error("manifest: {0}")]
    Manifest(#[from] ManifestError),
}

pub type IoResult<T> = Result<T, IoError>;

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json keeps line/column, not a pointer
        IoError::Json { pointer: "/".to_string(), msg: e.to_string() }
    }
}

impl From<ac_core::CoreError> for IoError {
    fn from(e: ac_core::CoreError) -> Self {
        IoError::Invalid(e.to_string())
    }
}

pub mod canonical_json;
pub mod hasher;
pub mod loader;
pub mod manifest;

pub mod prelude {
    pub use crate::{IoError, IoResult, ManifestError};

    pub use crate::canonical_json::{to_canonical_json_bytes, write_canonical_file};
    pub use crate::hasher::{sha256_canonical, sha256_hex};
    pub use crate::loader::{load_all_from_manifest, load_student_scores, InputDigests, LoadedData};
}
