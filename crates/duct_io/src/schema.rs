//! Embedded JSON Schemas (draft 7) and first-violation reporting.
//!
//! Schemas live under `<crate>/schemas/` and are compiled in with
//! `include_str!`, so validation never touches the filesystem or network.

use serde_json::Value;

use crate::IoError;

#[cfg(feature = "schemaval")]
use jsonschema::{Draft, JSONSchema};

const EVIDENCE_BUNDLE_SCHEMA_JSON: &str = include_str!("../schemas/evidence_bundle.schema.json");
const EDGES_SCHEMA_JSON: &str = include_str!("../schemas/edges.schema.json");
const COUNT_MAP_SCHEMA_JSON: &str = include_str!("../schemas/count_map.schema.json");
const MANIFEST_SCHEMA_JSON: &str = include_str!("../schemas/manifest.schema.json");
const PARAMS_SCHEMA_JSON: &str = include_str!("../schemas/params.schema.json");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaKind {
    EvidenceBundle,
    Edges,
    CountMap,
    Manifest,
    Params,
}

impl SchemaKind {
    pub fn source(self) -> &'static str {
        match self {
            SchemaKind::EvidenceBundle => EVIDENCE_BUNDLE_SCHEMA_JSON,
            SchemaKind::Edges => EDGES_SCHEMA_JSON,
            SchemaKind::CountMap => COUNT_MAP_SCHEMA_JSON,
            SchemaKind::Manifest => MANIFEST_SCHEMA_JSON,
            SchemaKind::Params => PARAMS_SCHEMA_JSON,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SchemaKind::EvidenceBundle => "evidence_bundle",
            SchemaKind::Edges => "edges",
            SchemaKind::CountMap => "count_map",
            SchemaKind::Manifest => "manifest",
            SchemaKind::Params => "params",
        }
    }
}

/// Compile the embedded schema for `kind`.
#[cfg(feature = "schemaval")]
pub fn compile(kind: SchemaKind) -> Result<JSONSchema, IoError> {
    let schema_v: Value = serde_json::from_str(kind.source()).map_err(|e| IoError::Schema {
        pointer: "/".into(),
        msg: format!("invalid embedded {}.schema.json: {e}", kind.name()),
    })?;
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema_v)
        .map_err(|e| IoError::Schema {
            pointer: "/".into(),
            msg: format!("{}.schema.json compile error: {e}", kind.name()),
        })
}

/// Validate `instance` against the embedded schema; report the first violation
/// with its JSON Pointer.
#[cfg(feature = "schemaval")]
pub fn validate_value(kind: SchemaKind, instance: &Value) -> Result<(), IoError> {
    let compiled = compile(kind)?;

    let first = match compiled.validate(instance) {
        Ok(()) => None,
        Err(mut errors) => errors.next().map(|err| (err.instance_path.to_string(), err.to_string())),
    };
    match first {
        None => Ok(()),
        Some((ptr, msg)) => Err(IoError::Schema {
            pointer: if ptr.is_empty() { "/".to_string() } else { ptr },
            msg: format!("{}: {msg}", kind.name()),
        }),
    }
}

/// Schema validation compiled out; typed parsing still rejects bad shapes.
#[cfg(not(feature = "schemaval"))]
pub fn validate_value(_kind: SchemaKind, _instance: &Value) -> Result<(), IoError> {
    Ok(())
}
