//! Deterministic hashing over canonical artifacts.
//!
//! - `sha256_canonical(..)` for JSON values/structs (goes through canonical_json)
//! - `sha256_hex(..)` for raw bytes
//! - Hex digests are lowercase.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::canonical_json::{to_canonical_bytes, to_canonical_json_bytes};
use crate::IoError;

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over canonical JSON bytes of any serializable value.
pub fn sha256_canonical<T: Serialize>(value: &T) -> Result<String, IoError> {
    Ok(sha256_hex(&to_canonical_bytes(value)?))
}

pub fn sha256_canonical_value(v: &Value) -> Result<String, IoError> {
    Ok(sha256_hex(&to_canonical_json_bytes(v)?))
}

#[inline]
pub fn is_lower_hex_64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// `RES:<hex>` id for a results document.
pub fn result_id<T: Serialize>(value: &T) -> Result<String, IoError> {
    Ok(format!("RES:{}", sha256_canonical(value)?))
}
