// crates/duct_io/src/manifest.rs
//
// Evidence manifest: one path per collection, resolved against the manifest's
// own directory.
//
// • `edges_path` is required; every other collection is optional and becomes
//   an empty map when absent.
// • Offline-only: any path with a scheme ("://", "http:", "https:") is rejected.
// • `id` is optional and non-normative (never part of an artifact).
// • Present paths must exist and be files (not dirs).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::loader::read_json_value_with_limits;
use crate::schema::{self, SchemaKind};
use crate::{looks_like_url_strict, IoError};

/// External manifest accepted by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub id: Option<String>,
    pub edges_path: String,
    #[serde(default)]
    pub supply_path: Option<String>,
    #[serde(default)]
    pub tag_counts_path: Option<String>,
    #[serde(default)]
    pub existing_well_owner_path: Option<String>,
    #[serde(default)]
    pub real_direction_owners_path: Option<String>,
    #[serde(default)]
    pub params_path: Option<String>,
}

/// Paths resolved against a base directory (usually the manifest's dir).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedManifest {
    pub edges: PathBuf,
    pub supply: Option<PathBuf>,
    pub tag_counts: Option<PathBuf>,
    pub existing_well_owner: Option<PathBuf>,
    pub real_direction_owners: Option<PathBuf>,
    pub params: Option<PathBuf>,
}

impl Manifest {
    /// `(label, path)` for every present path field, required first.
    fn present_paths(&self) -> Vec<(&'static str, &str)> {
        let mut v = vec![("edges_path", self.edges_path.as_str())];
        let optional = [
            ("supply_path", &self.supply_path),
            ("tag_counts_path", &self.tag_counts_path),
            ("existing_well_owner_path", &self.existing_well_owner_path),
            ("real_direction_owners_path", &self.real_direction_owners_path),
            ("params_path", &self.params_path),
        ];
        for (label, p) in optional {
            if let Some(p) = p {
                v.push((label, p.as_str()));
            }
        }
        v
    }
}

// ---------- validation (shape & offline policy, no I/O) ----------

pub fn validate_manifest(man: &Manifest) -> Result<(), IoError> {
    for (label, p) in man.present_paths() {
        if p.trim().is_empty() {
            return Err(IoError::Manifest(format!("field must not be empty: {label}")));
        }
        if looks_like_url_strict(p) {
            return Err(IoError::Manifest(format!("path must be offline (no scheme) for {label}: {p}")));
        }
    }
    Ok(())
}

// ---------- resolution (join base + existence/type checks) ----------

#[inline]
fn join_under(base: &Path, rel: &str) -> PathBuf {
    let p = Path::new(rel);
    if p.is_absolute() { p.to_path_buf() } else { base.join(p) }
}

fn must_exist_file(label: &str, p: &Path) -> Result<(), IoError> {
    let md = fs::metadata(p).map_err(|e| IoError::Manifest(format!("cannot access {label}: {} ({e})", p.display())))?;
    if !md.is_file() {
        return Err(IoError::Manifest(format!("path is not a file for {label}: {}", p.display())));
    }
    Ok(())
}

pub fn resolve_paths(base_dir: &Path, man: &Manifest) -> Result<ResolvedManifest, IoError> {
    let opt = |label: &'static str, s: &Option<String>| -> Result<Option<PathBuf>, IoError> {
        match s {
            Some(s) => {
                let p = join_under(base_dir, s);
                must_exist_file(label, &p)?;
                Ok(Some(p))
            }
            None => Ok(None),
        }
    };

    let edges = join_under(base_dir, &man.edges_path);
    must_exist_file("edges_path", &edges)?;

    Ok(ResolvedManifest {
        edges,
        supply: opt("supply_path", &man.supply_path)?,
        tag_counts: opt("tag_counts_path", &man.tag_counts_path)?,
        existing_well_owner: opt("existing_well_owner_path", &man.existing_well_owner_path)?,
        real_direction_owners: opt("real_direction_owners_path", &man.real_direction_owners_path)?,
        params: opt("params_path", &man.params_path)?,
    })
}

// ---------- top-level ----------

/// Read, schema-check, parse and validate a manifest file.
pub fn load_manifest(path: &Path) -> Result<Manifest, IoError> {
    let raw = read_json_value_with_limits(path)?;
    schema::validate_value(SchemaKind::Manifest, &raw)?;
    let man: Manifest = serde_json::from_value(raw)?;
    validate_manifest(&man)?;
    Ok(man)
}

/// Load a manifest and resolve its paths under the manifest's directory.
pub fn load_and_resolve_manifest(path: &Path) -> Result<ResolvedManifest, IoError> {
    let man = load_manifest(path)?;
    let base = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    resolve_paths(&base, &man)
}
