//! Loader: read local JSON evidence (bundle or manifest → per-collection files)
//! and params, validate against the embedded schemas, and return raw wire
//! values plus input digests. No network I/O.
//!
//! Ids and counts stay signed here so malformed rows (ids ≤ 0, negative
//! counts) survive parsing and can be skipped and reported downstream.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use duct_core::EngineParams;

use crate::schema::{self, SchemaKind};
use crate::{hasher, manifest, IoError};

/// Inputs above this size are rejected before parsing.
pub const MAX_INPUT_BYTES: u64 = 64 * 1024 * 1024;

// ----------------------------- Public wire-facing types -----------------------------

/// One duct direction as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEdge {
    pub direction_id: i64,
    pub well_a_id: i64,
    pub well_b_id: i64,
    pub unaccounted_count: i64,
    #[serde(default)]
    pub max_inventory_cables: i64,
}

/// `"<well or direction id>" → "<owner id>" → count`, unsanitized.
pub type RawCountMap = BTreeMap<String, BTreeMap<String, i64>>;

/// Evidence bundle (mirrors `schemas/evidence_bundle.schema.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawEvidence {
    pub edges: Vec<RawEdge>,
    /// `None` → derive from tags − existing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supply: Option<RawCountMap>,
    #[serde(default)]
    pub tag_counts: RawCountMap,
    #[serde(default)]
    pub existing_well_owner: RawCountMap,
    #[serde(default)]
    pub real_direction_owners: RawCountMap,
}

/// Where the evidence comes from.
#[derive(Debug, Clone, Copy)]
pub enum InputSource<'a> {
    Bundle(&'a Path),
    Manifest(&'a Path),
}

/// Everything the pipeline needs from disk.
#[derive(Debug, Clone)]
pub struct LoadedInputs {
    pub evidence: RawEvidence,
    /// `None` when neither `--params` nor the manifest names a params file.
    pub params: Option<EngineParams>,
    /// sha256 over the canonical bundle shape, identical for a bundle and an
    /// equivalent manifest.
    pub evidence_sha256: String,
}

// ----------------------------- Orchestration -----------------------------

/// Load evidence from `src`; `params_path` (if any) wins over a manifest's `params_path`.
pub fn load_inputs(src: InputSource<'_>, params_path: Option<&Path>) -> Result<LoadedInputs, IoError> {
    let (evidence, manifest_params) = match src {
        InputSource::Bundle(p) => (load_bundle(p)?, None),
        InputSource::Manifest(p) => {
            let r = manifest::load_and_resolve_manifest(p)?;
            let ev = RawEvidence {
                edges: load_part(&r.edges, SchemaKind::Edges)?,
                supply: r.supply.as_deref().map(load_count_map).transpose()?,
                tag_counts: load_optional_count_map(r.tag_counts.as_deref())?,
                existing_well_owner: load_optional_count_map(r.existing_well_owner.as_deref())?,
                real_direction_owners: load_optional_count_map(r.real_direction_owners.as_deref())?,
            };
            (ev, r.params)
        }
    };

    let params = match params_path.or(manifest_params.as_deref()) {
        Some(p) => Some(load_params(p)?),
        None => None,
    };
    let evidence_sha256 = hasher::sha256_canonical(&evidence)?;
    Ok(LoadedInputs { evidence, params, evidence_sha256 })
}

// ----------------------------- Targeted loaders -----------------------------

pub fn load_bundle(path: &Path) -> Result<RawEvidence, IoError> {
    load_part(path, SchemaKind::EvidenceBundle)
}

pub fn load_count_map(path: &Path) -> Result<RawCountMap, IoError> {
    load_part(path, SchemaKind::CountMap)
}

fn load_optional_count_map(path: Option<&Path>) -> Result<RawCountMap, IoError> {
    match path {
        Some(p) => load_count_map(p),
        None => Ok(RawCountMap::new()),
    }
}

pub fn load_params(path: &Path) -> Result<EngineParams, IoError> {
    load_part(path, SchemaKind::Params)
}

/// Parse an in-memory bundle value (used by callers that already hold JSON).
pub fn evidence_from_value(v: Value) -> Result<RawEvidence, IoError> {
    schema::validate_value(SchemaKind::EvidenceBundle, &v)?;
    Ok(serde_json::from_value(v)?)
}

fn load_part<T: DeserializeOwned>(path: &Path, kind: SchemaKind) -> Result<T, IoError> {
    let v = read_json_value_with_limits(path)?;
    schema::validate_value(kind, &v)?;
    serde_json::from_value(v).map_err(|e| IoError::Json {
        pointer: "/".into(),
        msg: format!("{}: {e}", path.display()),
    })
}

// ----------------------------- Raw reads -----------------------------

/// Read a JSON file, refusing anything over [`MAX_INPUT_BYTES`].
pub fn read_json_value_with_limits(path: &Path) -> Result<Value, IoError> {
    let f = File::open(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    let len = f.metadata().map(|m| m.len()).unwrap_or(0);
    if len > MAX_INPUT_BYTES {
        return Err(IoError::Limit(format!("{} is {len} bytes (max {MAX_INPUT_BYTES})", path.display())));
    }
    let mut buf = Vec::with_capacity(len as usize);
    f.take(MAX_INPUT_BYTES + 1)
        .read_to_end(&mut buf)
        .map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    if buf.len() as u64 > MAX_INPUT_BYTES {
        return Err(IoError::Limit(format!("{} exceeds {MAX_INPUT_BYTES} bytes", path.display())));
    }
    serde_json::from_slice(&buf).map_err(|e| IoError::Json {
        pointer: "/".into(),
        msg: format!("{}: {e}", path.display()),
    })
}
