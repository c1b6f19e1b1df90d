//! duct_report — Pure offline report model + renderers (JSON / plain text).
//!
//! Determinism rules:
//! - No I/O here. Callers hand in artifacts already in memory.
//! - Percent strings use integer math (tenths, half-up), never floats.
//! - Variants are listed in ascending `variant_no`; owner lines by units ↓, id ↑.
//!
//! Inputs are plain `serde_json::Value`s (the canonical scenario and run-record
//! documents), so this crate does not depend on the pipeline's concrete types.

#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;

use duct_core::rounding::percent_one_decimal_tenths;
use serde_json::Value;

pub mod render_text;
#[cfg(feature = "render_json")]
pub mod render_json;

pub use render_text::render_text;
#[cfg(feature = "render_json")]
pub use render_json::render_json;

pub type ScenarioArtifact = Value;
pub type RunRecordArtifact = Value;

/// Owner lines kept per variant section.
pub const TOP_OWNERS: usize = 5;

// ===== Errors =====
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    MissingField(&'static str),
    Inconsistent(&'static str),
    Serialize(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::MissingField(p) => write!(f, "missing field: {p}"),
            ReportError::Inconsistent(m) => write!(f, "inconsistent artifacts: {m}"),
            ReportError::Serialize(m) => write!(f, "serialize: {m}"),
        }
    }
}

impl std::error::Error for ReportError {}

// ===== Model =====
#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportModel {
    pub cover: SectionCover,
    pub skipped: SectionSkipped,
    pub variants: Vec<SectionVariant>,
    pub integrity: SectionIntegrity,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionCover {
    pub title: String,
    pub engine_name: String,
    pub engine_version: String,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SectionSkipped {
    pub count: u64,
    /// reason token → number of edges
    pub by_reason: BTreeMap<String, u64>,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerLine {
    pub owner_id: u64,
    pub units: u64,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionVariant {
    pub variant_no: u64,
    pub build: String,
    pub total_unaccounted: u64,
    pub assigned_units: u64,
    pub unknown_units: u64,
    /// `assigned / total`, e.g. `"62.5%"`; `"n/a"` when nothing was unaccounted.
    pub coverage_pct_1dp: String,
    pub rows: u64,
    pub directions: u64,
    pub owners_assigned: u64,
    pub greedy_steps: u64,
    pub guard_exhausted: bool,
    pub top_owners: Vec<OwnerLine>,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioIntegrity {
    pub variant_no: u64,
    pub id: String,
    pub sha256: String,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionIntegrity {
    pub run_id: String,
    pub evidence_sha256: String,
    pub params_sha256: String,
    pub scenarios: Vec<ScenarioIntegrity>,
}

// ===== API =====

/// Build the report model from a run record and its scenario documents.
///
/// Every scenario must be listed in the run record under the same
/// `variant_no` and `id`; anything else is `ReportError::Inconsistent`.
pub fn build_model(run: &RunRecordArtifact, scenarios: &[ScenarioArtifact]) -> Result<ReportModel, ReportError> {
    // ---- Integrity ----
    let run_id = json_get_str(run, "/id")?;
    let listed = run
        .pointer("/scenarios")
        .and_then(Value::as_array)
        .ok_or(ReportError::MissingField("/scenarios"))?;
    let mut refs = Vec::with_capacity(listed.len());
    for r in listed {
        refs.push(ScenarioIntegrity {
            variant_no: json_get_u64(r, "/variant_no")?,
            id: json_get_str(r, "/id")?,
            sha256: json_get_str(r, "/sha256")?,
        });
    }
    refs.sort_by_key(|r| r.variant_no);
    let integrity = SectionIntegrity {
        run_id,
        evidence_sha256: json_get_str(run, "/inputs/evidence_sha256")?,
        params_sha256: json_get_str(run, "/inputs/params_sha256")?,
        scenarios: refs,
    };

    // ---- Cover ----
    let cover = SectionCover {
        title: "Assumed-cable scenarios".to_string(),
        engine_name: json_get_str(run, "/engine/name").unwrap_or_else(|_| "duct_engine".into()),
        engine_version: json_get_str(run, "/engine/version").unwrap_or_else(|_| "0.0.0".into()),
    };

    // ---- Skipped edges ----
    let mut skipped = SectionSkipped::default();
    if let Some(arr) = run.pointer("/skipped_edges").and_then(Value::as_array) {
        for s in arr {
            let reason = json_get_str(s, "/reason").unwrap_or_else(|_| "unspecified".into());
            *skipped.by_reason.entry(reason).or_insert(0) += 1;
            skipped.count += 1;
        }
    }

    // ---- Variants ----
    let mut variants = Vec::with_capacity(scenarios.len());
    for sc in scenarios {
        let section = map_variant(sc)?;
        let id = json_get_str(sc, "/id")?;
        let known = integrity
            .scenarios
            .iter()
            .any(|r| r.variant_no == section.variant_no && r.id == id);
        if !known {
            return Err(ReportError::Inconsistent("scenario not listed in run record"));
        }
        variants.push(section);
    }
    variants.sort_by_key(|v| v.variant_no);
    if variants.windows(2).any(|w| w[0].variant_no == w[1].variant_no) {
        return Err(ReportError::Inconsistent("duplicate variant"));
    }

    Ok(ReportModel { cover, skipped, variants, integrity })
}

fn map_variant(sc: &ScenarioArtifact) -> Result<SectionVariant, ReportError> {
    let total = json_get_u64(sc, "/stats/total_unaccounted")?;
    let assigned = json_get_u64(sc, "/stats/assigned_units")?;
    let unknown = json_get_u64(sc, "/stats/unknown_units")?;
    if assigned.checked_add(unknown) != Some(total) {
        return Err(ReportError::Inconsistent("assigned + unknown != total"));
    }

    Ok(SectionVariant {
        variant_no: json_get_u64(sc, "/variant_no")?,
        build: json_get_str(sc, "/params/build").unwrap_or_else(|_| "unspecified".into()),
        total_unaccounted: total,
        assigned_units: assigned,
        unknown_units: unknown,
        coverage_pct_1dp: percent_1dp(assigned, total),
        rows: json_get_u64(sc, "/stats/rows")?,
        directions: json_get_u64(sc, "/stats/directions")?,
        owners_assigned: json_get_u64(sc, "/stats/owners_assigned")?,
        greedy_steps: json_get_u64(sc, "/trace/greedy_steps").unwrap_or(0),
        guard_exhausted: json_get_bool(sc, "/trace/guard_exhausted").unwrap_or(false),
        top_owners: top_owners(sc),
    })
}

/// Known-owner units summed over rows, units ↓ then owner id ↑.
fn top_owners(sc: &ScenarioArtifact) -> Vec<OwnerLine> {
    let mut units: BTreeMap<u64, u64> = BTreeMap::new();
    if let Some(rows) = sc.pointer("/rows").and_then(Value::as_array) {
        for r in rows {
            // UNKNOWN rows carry a null owner id
            let (Some(owner), Some(count)) = (
                r.get("owner_id").and_then(Value::as_u64),
                r.get("count").and_then(Value::as_u64),
            ) else {
                continue;
            };
            *units.entry(owner).or_insert(0) += count;
        }
    }
    let mut lines: Vec<OwnerLine> = units.into_iter().map(|(owner_id, units)| OwnerLine { owner_id, units }).collect();
    lines.sort_by(|a, b| b.units.cmp(&a.units).then_with(|| a.owner_id.cmp(&b.owner_id)));
    lines.truncate(TOP_OWNERS);
    lines
}

// ===== Helpers (pure; no floats) =====

/// `"x.y%"` from an integer ratio; `"n/a"` for an empty denominator.
pub fn percent_1dp(num: u64, den: u64) -> String {
    match percent_one_decimal_tenths(num, den) {
        Some(t) => format!("{}.{}%", t / 10, t % 10),
        None => "n/a".to_string(),
    }
}

fn json_get_str(root: &Value, ptr: &'static str) -> Result<String, ReportError> {
    root.pointer(ptr)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ReportError::MissingField(ptr))
}

fn json_get_u64(root: &Value, ptr: &'static str) -> Result<u64, ReportError> {
    root.pointer(ptr).and_then(Value::as_u64).ok_or(ReportError::MissingField(ptr))
}

fn json_get_bool(root: &Value, ptr: &'static str) -> Result<bool, ReportError> {
    root.pointer(ptr).and_then(Value::as_bool).ok_or(ReportError::MissingField(ptr))
}
