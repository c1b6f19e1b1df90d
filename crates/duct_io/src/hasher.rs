//! crates/duct_io/src/hasher.rs
//!
//! Deterministic hashing and ID builders for canonical artifacts.
//!
//! - Canonical JSON hashing: UTF-8, **sorted object keys**, array order preserved.
//! - IDs derive from canonical bytes: `SCN:` (scenario) and `RUN:` (run record).
//!   No timestamps are mixed in, so identical inputs give identical ids.
//! - Hex digests are **lowercase**.
//!
//! Use `sha256_canonical(..)` for JSON values/structs and `sha256_hex(..)` or
//! `sha256_file(..)` for raw bytes/files.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::canonical_json::to_canonical_json_bytes;

/* ----------------------------------- Errors ----------------------------------- */

#[derive(Error, Debug)]
pub enum HashError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid hex (expected lowercase 64-hex): {0}")]
    InvalidHex(String),
}

/* ---------------------------------- Helpers ---------------------------------- */

/// Lowercase 64-hex check (sha256 digest shape).
#[inline]
pub fn is_lower_hex_64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|c| matches!(c, b'0'..=b'9' | b'a'..=b'f'))
}

/// Validate a lowercase 64-hex string and shorten to `n` chars.
pub fn short_hex(hex64: &str, n: usize) -> Result<String, HashError> {
    if !is_lower_hex_64(hex64) {
        return Err(HashError::InvalidHex(hex64.to_string()));
    }
    Ok(hex64[..n.min(64)].to_string())
}

/* ---------------------------- Canonical hashing ---------------------------- */

/// SHA-256 over **canonical JSON bytes** of any serializable value.
pub fn sha256_canonical<T: Serialize>(value: &T) -> Result<String, HashError> {
    let v = serde_json::to_value(value)?;
    Ok(sha256_canonical_value(&v))
}

/// SHA-256 over an already-parsed JSON value, canonicalized first.
pub fn sha256_canonical_value(v: &Value) -> String {
    sha256_hex(&to_canonical_json_bytes(v))
}

/* ------------------------------- Raw hashing ------------------------------- */

/// SHA-256 over raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// SHA-256 over a reader stream (raw, not canonicalized).
pub fn sha256_stream<R: Read>(reader: &mut R) -> Result<String, HashError> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// SHA-256 over a file's raw bytes.
pub fn sha256_file(path: &Path) -> Result<String, HashError> {
    let f = File::open(path)?;
    let mut r = BufReader::new(f);
    sha256_stream(&mut r)
}

/* ---------------------------- Artifact ID builders ---------------------------- */

/// `SCN:<hex>` over the canonical bytes of a scenario payload (without its id).
pub fn scenario_id_from_canonical<T: Serialize>(value: &T) -> Result<String, HashError> {
    Ok(format!("SCN:{}", sha256_canonical(value)?))
}

/// `RUN:<hex>` over the canonical bytes of a run-record payload (without its id).
pub fn run_id_from_canonical<T: Serialize>(value: &T) -> Result<String, HashError> {
    Ok(format!("RUN:{}", sha256_canonical(value)?))
}

/* ------------------------------------ Tests ------------------------------------ */

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hex_encoding_is_lowercase() {
        let h = sha256_hex(b"abc");
        assert_eq!(h, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert_eq!(short_hex(&h, 12).unwrap(), "ba7816bf8f01");
        assert!(short_hex("ABC", 4).is_err());
    }

    #[test]
    fn canonical_hashing_ignores_key_order() {
        #[derive(Serialize)]
        struct T {
            b: u32,
            a: u32,
        }
        let h1 = sha256_canonical(&T { b: 2, a: 1 }).unwrap();
        let h2 = sha256_canonical_value(&json!({"a": 1, "b": 2}));
        assert_eq!(h1, h2);
    }

    #[test]
    fn ids_carry_prefix_and_are_stable() {
        let v = json!({"variant_no": 1, "rows": []});
        let a = scenario_id_from_canonical(&v).unwrap();
        let b = scenario_id_from_canonical(&v).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("SCN:") && is_lower_hex_64(&a[4..]));
        assert!(run_id_from_canonical(&v).unwrap().starts_with("RUN:"));
    }

    #[test]
    fn stream_and_bytes_agree() {
        let data = vec![7u8; 200_000];
        let mut cur = std::io::Cursor::new(data.clone());
        assert_eq!(sha256_stream(&mut cur).unwrap(), sha256_hex(&data));
    }
}
