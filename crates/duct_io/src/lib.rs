//! crates/duct_io/src/lib.rs
//! Single-source-of-truth I/O crate for the duct engine.
//!
//! - Evidence comes in as one bundle document or as a manifest pointing at
//!   one file per collection; both are schema-checked before typed parsing.
//! - Shared error type (`IoError`) with `From` conversions used across modules.
//! - Artifacts leave as canonical JSON (sorted keys, compact), written atomically.
//!
//! This crate never interprets evidence: raw ids/counts are passed through
//! as signed integers and sanitized by the pipeline.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for duct_io (used by canonical_json/manifest/hasher/schema/loader).
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (open, create_dir_all, rename, fsync, ...).
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON parse or shape errors with a JSON Pointer.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    /// First JSON Schema violation of a document.
    #[error("schema error at {pointer}: {msg}")]
    Schema { pointer: String, msg: String },

    /// Manifest shape / offline policy / resolution errors.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Hashing-related errors.
    #[error("hash error: {0}")]
    Hash(String),

    /// Input exceeds a size limit.
    #[error("limit exceeded: {0}")]
    Limit(String),
}

pub type IoResult<T> = Result<T, IoError>;

/* ---------------- From conversions (used by file modules) ---------------- */

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json keeps line/column, not a pointer; report at root.
        IoError::Json { pointer: "/".to_string(), msg: e.to_string() }
    }
}

impl From<hasher::HashError> for IoError {
    fn from(e: hasher::HashError) -> Self {
        IoError::Hash(e.to_string())
    }
}

pub mod canonical_json;
pub mod hasher;
pub mod manifest;
pub mod schema;
pub mod loader;

/// Returns true if `s` looks like a URL (any `<scheme>://`, plus bare http(s):).
#[inline]
pub fn looks_like_url_strict(s: &str) -> bool {
    let t = s.trim();
    t.contains("://") || t.starts_with("http:") || t.starts_with("https:")
}

/* ---------------- Public prelude ----------------
   Lightweight re-exports so downstream crates can do:
     use duct_io::prelude::*;
------------------------------------------------- */

pub mod prelude {
    pub use crate::{looks_like_url_strict, IoError, IoResult};

    pub use crate::canonical_json;
    pub use crate::hasher;
    pub use crate::loader;
    pub use crate::manifest;
    pub use crate::schema;

    pub use crate::canonical_json::{to_canonical_json_bytes, write_canonical_file};
    pub use crate::hasher::{sha256_canonical, sha256_hex};
    pub use crate::loader::{LoadedInputs, RawCountMap, RawEdge, RawEvidence};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_detection() {
        assert!(looks_like_url_strict("https://host/x.json"));
        assert!(looks_like_url_strict(" file:///tmp/x.json"));
        assert!(looks_like_url_strict("http:x"));
        assert!(!looks_like_url_strict("data/edges.json"));
        assert!(!looks_like_url_strict("/abs/edges.json"));
    }
}
