//! BUILD_SCENARIO: typed scenario document per variant, with a content id.
//!
//! `id = "SCN:" + sha256(canonical JSON of the document without `id`)`, so two
//! runs over identical inputs and params produce byte-identical documents.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use duct_algo::VariantRun;
use duct_core::{EngineParams, Evidence, OwnerId, ScoreWeights, VariantNo};
use duct_io::hasher;

use crate::tag::{tag_rows, Row};
use crate::PipelineError;

/// How the variant was produced, echoed in `params.build`.
pub fn build_label(v: VariantNo) -> &'static str {
    match v {
        VariantNo::V1 => "both_only",
        VariantNo::V2 => "one_sided",
        VariantNo::V3 => "real_owner_remainder",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsEcho {
    pub build: String,
    pub iteration_guard: u32,
    pub weights: ScoreWeights,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStats {
    pub total_unaccounted: u64,
    /// Units with a known owner.
    pub assigned_units: u64,
    pub unknown_units: u64,
    pub rows: u64,
    pub directions: u64,
    /// Distinct known owners across all rows.
    pub owners_assigned: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioTrace {
    pub forced_scans: u32,
    pub forced_units: u64,
    pub greedy_steps: u32,
    pub greedy_units: u64,
    pub guard_exhausted: bool,
    pub lr_directions: u32,
}

/// Wire allocation: `"<direction_id>" → "<owner_id>" | "unknown" → units`.
pub type WireAllocation = BTreeMap<String, BTreeMap<String, u32>>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDoc {
    pub id: String,
    pub variant_no: VariantNo,
    pub params: ParamsEcho,
    pub stats: ScenarioStats,
    pub trace: ScenarioTrace,
    pub allocation: WireAllocation,
    pub rows: Vec<Row>,
}

pub fn build_scenario(run: &VariantRun, ev: &Evidence, params: &EngineParams) -> Result<ScenarioDoc, PipelineError> {
    let rows = tag_rows(run, ev);

    let owners: BTreeSet<OwnerId> = rows.iter().filter_map(|r| r.owner_id.known()).collect();
    let stats = ScenarioStats {
        total_unaccounted: ev.total_unaccounted(),
        assigned_units: run.assigned_units(),
        unknown_units: run.unknown_units(),
        rows: rows.len() as u64,
        directions: run.allocation.len() as u64,
        owners_assigned: owners.len() as u64,
    };
    let t = run.trace;
    let trace = ScenarioTrace {
        forced_scans: t.forced.scans,
        forced_units: t.forced.units,
        greedy_steps: t.greedy.steps,
        greedy_units: t.greedy.units,
        guard_exhausted: t.greedy.guard_exhausted,
        lr_directions: t.lr_directions,
    };
    let allocation: WireAllocation = run
        .allocation
        .iter()
        .map(|(d, slots)| (d.to_string(), slots.iter().map(|(o, &n)| (o.wire_key(), n)).collect()))
        .collect();
    let params = ParamsEcho {
        build: build_label(run.variant).to_string(),
        iteration_guard: params.iteration_guard,
        weights: params.weights,
    };

    #[derive(Serialize)]
    struct ScenarioNoId<'a> {
        variant_no: VariantNo,
        params: &'a ParamsEcho,
        stats: &'a ScenarioStats,
        trace: &'a ScenarioTrace,
        allocation: &'a WireAllocation,
        rows: &'a [Row],
    }
    let id = hasher::scenario_id_from_canonical(&ScenarioNoId {
        variant_no: run.variant,
        params: &params,
        stats: &stats,
        trace: &trace,
        allocation: &allocation,
        rows: &rows,
    })
    .map_err(|e| PipelineError::Build(format!("scenario id: {e}")))?;

    Ok(ScenarioDoc { id, variant_no: run.variant, params, stats, trace, allocation, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use duct_algo::build_variant;
    use duct_core::evidence::put_count;
    use duct_core::{DirectionId, Edge, WellId};

    fn ev() -> Evidence {
        let d = DirectionId::new(12).unwrap();
        let (a, b) = (WellId::new(1).unwrap(), WellId::new(2).unwrap());
        let mut ev = Evidence::default();
        ev.edges.push(Edge::new(d, a, b, 3, 0).unwrap());
        put_count(&mut ev.supply0, a, OwnerId::new(1).unwrap(), 5);
        put_count(&mut ev.supply0, b, OwnerId::new(1).unwrap(), 2);
        ev
    }

    #[test]
    fn stats_and_wire_allocation() {
        let ev = ev();
        let p = EngineParams::default();
        let doc = build_scenario(&build_variant(VariantNo::V1, &ev, &p).unwrap(), &ev, &p).unwrap();
        assert_eq!(doc.stats.total_unaccounted, 3);
        assert_eq!(doc.stats.assigned_units, 2);
        assert_eq!(doc.stats.unknown_units, 1);
        assert_eq!(doc.stats.rows, 2);
        assert_eq!(doc.stats.owners_assigned, 1);
        assert_eq!(doc.allocation["12"]["1"], 2);
        assert_eq!(doc.allocation["12"]["unknown"], 1);
        assert_eq!(doc.params.build, "both_only");
        assert!(doc.id.starts_with("SCN:"));
    }

    #[test]
    fn id_is_deterministic_and_content_sensitive() {
        let ev = ev();
        let p = EngineParams::default();
        let run = build_variant(VariantNo::V1, &ev, &p).unwrap();
        let a = build_scenario(&run, &ev, &p).unwrap();
        let b = build_scenario(&run, &ev, &p).unwrap();
        assert_eq!(a.id, b.id);
        let c = build_scenario(&run, &ev, &p.with_iteration_guard(5)).unwrap();
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn row_wire_shape() {
        let ev = ev();
        let p = EngineParams::default();
        let doc = build_scenario(&build_variant(VariantNo::V1, &ev, &p).unwrap(), &ev, &p).unwrap();
        let v = serde_json::to_value(&doc.rows[1]).unwrap();
        assert_eq!(v["owner_id"], serde_json::Value::Null);
        assert_eq!(v["classification"], "unknown");
        assert_eq!(v["confidence"], 0.15);
        assert_eq!(v["direction_id"], 12);
    }
}
