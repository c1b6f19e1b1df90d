//! duct_pipeline — deterministic pipeline surface
//! (load → validate → variants → tag → build scenarios → build run record).
//!
//! This crate does no file writes. It delegates JSON/Schema/Hashing to
//! `duct_io` and allocation math to `duct_algo`; the CLI persists artifacts.

#![forbid(unsafe_code)]

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use duct_core::EngineParams;
use duct_io::hasher;
use duct_io::loader::{self, InputSource, LoadedInputs};

pub mod load;
pub mod validate;
pub mod variants;
pub mod tag;
pub mod build_scenario;
pub mod build_run_record;

pub use build_run_record::{RunInputs, RunRecordDoc, ScenarioRef};
pub use build_scenario::{ScenarioDoc, ScenarioStats, ScenarioTrace};
pub use load::{LoadedEvidence, SkipReason, SkippedEdge};
pub use tag::{EvidenceSnapshot, Row};
pub use validate::{Severity, ValidationIssue, ValidationReport};

/// Engine identifiers recorded in every run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMeta {
    pub name: String,
    pub version: String,
}

pub fn engine_identifiers() -> EngineMeta {
    EngineMeta { name: "duct_engine".to_string(), version: env!("CARGO_PKG_VERSION").to_string() }
}

/// Settings applied on top of the params file (CLI flags).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParamsOverride {
    pub iteration_guard: Option<u32>,
}

impl ParamsOverride {
    pub fn apply(&self, mut p: EngineParams) -> EngineParams {
        if let Some(g) = self.iteration_guard {
            p.iteration_guard = g;
        }
        p
    }
}

/// Pipeline context: raw inputs already read from disk by `duct_io`.
#[derive(Debug, Clone)]
pub struct PipelineCtx {
    pub inputs: LoadedInputs,
    pub overrides: ParamsOverride,
    pub engine_meta: EngineMeta,
}

/// Everything a run produces, scenarios in variant order.
#[derive(Debug, Clone)]
pub struct PipelineOutputs {
    pub scenarios: Vec<ScenarioDoc>,
    pub run_record: RunRecordDoc,
    pub validation: ValidationReport,
}

/// Single error surface for the pipeline orchestration.
#[derive(Debug)]
pub enum PipelineError {
    Io(String),
    Schema(String),
    Validate(String),
    /// A variant broke conservation (or another allocation invariant).
    Invariant(String),
    Build(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use PipelineError::*;
        match self {
            Io(m) => write!(f, "io: {m}"),
            Schema(m) => write!(f, "schema: {m}"),
            Validate(m) => write!(f, "validation: {m}"),
            Invariant(m) => write!(f, "invariant: {m}"),
            Build(m) => write!(f, "build: {m}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<duct_io::IoError> for PipelineError {
    fn from(e: duct_io::IoError) -> Self {
        use duct_io::IoError as E;
        use PipelineError::*;
        match e {
            E::Schema { pointer, msg } => Schema(format!("{pointer}: {msg}")),
            E::Json { pointer, msg } => Schema(format!("json {pointer}: {msg}")),
            E::Manifest(m) => Validate(format!("manifest: {m}")),
            E::Path(m) => Io(format!("path: {m}")),
            E::Limit(m) => Io(format!("limit: {m}")),
            E::Hash(m) => Build(format!("hash: {m}")),
        }
    }
}

// -------------------------------------- Public API --------------------------------------

/// LOAD + VALIDATE only. Returns the sanitized evidence, effective params and report.
pub fn prepare(ctx: &PipelineCtx) -> (LoadedEvidence, EngineParams, ValidationReport) {
    let loaded = load::normalize_evidence(&ctx.inputs.evidence);
    for s in &loaded.skipped {
        warn!(index = s.index, direction_id = s.direction_id, reason = %s.reason, "skipping malformed edge");
    }
    debug!(
        edges = loaded.evidence.edges.len(),
        skipped = loaded.skipped.len(),
        dropped_entries = loaded.dropped_entries,
        supply_derived = loaded.supply_derived,
        "evidence loaded"
    );

    let params = ctx.overrides.apply(ctx.inputs.params.unwrap_or_default());
    let report = validate::validate(&loaded, &params);
    for issue in report.warnings() {
        debug!(code = issue.code, "{}", issue.message);
    }
    (loaded, params, report)
}

/// Orchestrate the pipeline with preloaded inputs.
pub fn run_with_ctx(ctx: PipelineCtx) -> Result<PipelineOutputs, PipelineError> {
    // --- LOAD / VALIDATE ---
    let (loaded, params, validation) = prepare(&ctx);
    if let Some(err) = validation.errors().next() {
        return Err(PipelineError::Validate(format!("{}: {}", err.code, err.message)));
    }
    let ev = &loaded.evidence;

    // --- VARIANTS ---
    let set = variants::run_variants(ev, &params)?;

    // --- TAG + BUILD_SCENARIO ---
    let mut scenarios = Vec::with_capacity(3);
    for run in set.iter() {
        let doc = build_scenario::build_scenario(run, ev, &params)?;
        info!(
            variant = doc.variant_no.as_u8(),
            assigned = doc.stats.assigned_units,
            unknown = doc.stats.unknown_units,
            rows = doc.stats.rows,
            "scenario built"
        );
        scenarios.push(doc);
    }

    // --- BUILD_RUN_RECORD ---
    let params_sha256 = hasher::sha256_canonical(&params).map_err(|e| PipelineError::Build(format!("params digest: {e}")))?;
    let inputs = RunInputs { evidence_sha256: ctx.inputs.evidence_sha256.clone(), params_sha256 };
    let run_record = build_run_record::build_run_record(&ctx.engine_meta, inputs, &loaded.skipped, &scenarios)?;

    Ok(PipelineOutputs { scenarios, run_record, validation })
}

/// Convenience entry: read inputs via `duct_io`, then run the pipeline.
pub fn run_from_paths(
    src: InputSource<'_>,
    params_path: Option<&Path>,
    overrides: ParamsOverride,
) -> Result<PipelineOutputs, PipelineError> {
    let inputs = loader::load_inputs(src, params_path)?;
    run_with_ctx(PipelineCtx { inputs, overrides, engine_meta: engine_identifiers() })
}
