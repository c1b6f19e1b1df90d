//! VARIANTS stage: variant 1, variant 2 (each on its own supply copy), then
//! variant 3 composed from variant 2.

use tracing::{debug, warn};

use duct_algo::{build_variant, compose_variant3, AlgoError, VariantRun};
use duct_core::{EngineParams, Evidence, VariantNo};

use crate::PipelineError;

/// The three variant results of one run, in variant order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariantSet {
    pub v1: VariantRun,
    pub v2: VariantRun,
    pub v3: VariantRun,
}

impl VariantSet {
    pub fn iter(&self) -> impl Iterator<Item = &VariantRun> {
        [&self.v1, &self.v2, &self.v3].into_iter()
    }
}

pub fn run_variants(ev: &Evidence, params: &EngineParams) -> Result<VariantSet, PipelineError> {
    let v1 = run_one(VariantNo::V1, ev, params)?;
    let v2 = run_one(VariantNo::V2, ev, params)?;
    let v3 = compose_variant3(&v2, &ev.edges, &ev.real_direction_owners).map_err(invariant)?;
    debug!(
        lr_directions = v3.trace.lr_directions,
        unknown_units = v3.unknown_units(),
        "variant v3 composed"
    );
    Ok(VariantSet { v1, v2, v3 })
}

fn run_one(variant: VariantNo, ev: &Evidence, params: &EngineParams) -> Result<VariantRun, PipelineError> {
    let run = build_variant(variant, ev, params).map_err(invariant)?;
    let t = run.trace;
    debug!(
        %variant,
        forced_scans = t.forced.scans,
        forced_units = t.forced.units,
        greedy_steps = t.greedy.steps,
        greedy_units = t.greedy.units,
        unknown_units = run.unknown_units(),
        "variant built"
    );
    if t.greedy.guard_exhausted {
        warn!(%variant, guard = params.iteration_guard, "iteration guard reached; residual demand left on UNKNOWN");
    }
    Ok(run)
}

fn invariant(e: AlgoError) -> PipelineError {
    PipelineError::Invariant(e.to_string())
}
