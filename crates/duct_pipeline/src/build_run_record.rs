// crates/duct_pipeline/src/build_run_record.rs
//
// Run record: what was run, on which inputs, and which scenario documents
// came out.
//
// - Run ID = "RUN:" + SHA-256 of the canonical run-record payload without `id`.
// - No wall-clock timestamp: identical inputs give a byte-identical record.
// - Each scenario is referenced by its id and the sha256 of its canonical bytes.

use serde::{Deserialize, Serialize};

use duct_core::VariantNo;
use duct_io::{canonical_json, hasher};

use crate::build_scenario::ScenarioDoc;
use crate::load::SkippedEdge;
use crate::{EngineMeta, PipelineError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInputs {
    pub evidence_sha256: String,
    /// Digest of the effective params (file + CLI overrides).
    pub params_sha256: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRef {
    pub variant_no: VariantNo,
    pub id: String,
    pub sha256: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecordDoc {
    pub id: String,
    pub engine: EngineMeta,
    pub inputs: RunInputs,
    pub skipped_edges: Vec<SkippedEdge>,
    pub scenarios: Vec<ScenarioRef>,
}

/// sha256 over the canonical bytes of a full scenario document (id included).
pub fn scenario_sha256(doc: &ScenarioDoc) -> Result<String, PipelineError> {
    let bytes = canonical_json::canonical_bytes_of(doc).map_err(|e| PipelineError::Build(format!("scenario bytes: {e}")))?;
    Ok(hasher::sha256_hex(&bytes))
}

pub fn build_run_record(
    engine: &EngineMeta,
    inputs: RunInputs,
    skipped_edges: &[SkippedEdge],
    scenarios: &[ScenarioDoc],
) -> Result<RunRecordDoc, PipelineError> {
    let scenarios = scenarios
        .iter()
        .map(|s| {
            Ok(ScenarioRef { variant_no: s.variant_no, id: s.id.clone(), sha256: scenario_sha256(s)? })
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;

    #[derive(Serialize)]
    struct RunNoId<'a> {
        engine: &'a EngineMeta,
        inputs: &'a RunInputs,
        skipped_edges: &'a [SkippedEdge],
        scenarios: &'a [ScenarioRef],
    }
    let id = hasher::run_id_from_canonical(&RunNoId {
        engine,
        inputs: &inputs,
        skipped_edges,
        scenarios: &scenarios,
    })
    .map_err(|e| PipelineError::Build(format!("run id: {e}")))?;

    Ok(RunRecordDoc {
        id,
        engine: engine.clone(),
        inputs,
        skipped_edges: skipped_edges.to_vec(),
        scenarios,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_identifiers;
    use crate::load::SkipReason;

    fn inputs() -> RunInputs {
        RunInputs { evidence_sha256: "a".repeat(64), params_sha256: "b".repeat(64) }
    }

    #[test]
    fn run_id_depends_on_skipped_edges() {
        let e = engine_identifiers();
        let a = build_run_record(&e, inputs(), &[], &[]).unwrap();
        let again = build_run_record(&e, inputs(), &[], &[]).unwrap();
        assert_eq!(a, again);
        let skipped = [SkippedEdge { index: 0, direction_id: -4, reason: SkipReason::InvalidDirectionId }];
        let b = build_run_record(&e, inputs(), &skipped, &[]).unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("RUN:"));
    }
}
