//! Variant orchestration for the supply-driven variants (1 and 2).
//!
//! Each call builds its own `WorkingState` from `supply0`, runs the forced
//! fixed point then the greedy loop, closes the residual onto `UNKNOWN` and
//! checks conservation before returning.

use alloc::collections::BTreeMap;

use duct_core::confidence::Basis;
use duct_core::{Allocation, DirectionId, EngineParams, Evidence, OwnerId, VariantNo};

use crate::forced::{forced_pass, ForcedOutcome};
use crate::greedy::{greedy_pass, GreedyOutcome, ScoreEvidence};
use crate::state::WorkingState;
use crate::{verify_conservation, AlgoError};

/// Counters describing how a variant's allocation was reached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunTrace {
    pub forced: ForcedOutcome,
    pub greedy: GreedyOutcome,
    /// Directions whose residual was distributed over real owners (variant 3).
    pub lr_directions: u32,
}

/// Final result of one variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariantRun {
    pub variant: VariantNo,
    /// Conserving allocation, `UNKNOWN` slots included.
    pub allocation: Allocation,
    /// How each known `(direction, owner)` row was produced.
    pub basis: BTreeMap<(DirectionId, OwnerId), Basis>,
    /// Units left on `UNKNOWN`, per direction (positive entries only).
    pub unknown: BTreeMap<DirectionId, u32>,
    pub trace: RunTrace,
}

impl VariantRun {
    pub fn unknown_units(&self) -> u64 {
        self.unknown.values().map(|&u| u as u64).sum()
    }

    pub fn assigned_units(&self) -> u64 {
        self.allocation
            .values()
            .flat_map(|m| m.iter())
            .filter(|(o, _)| !o.is_unknown())
            .map(|(_, &u)| u as u64)
            .sum()
    }
}

/// Build variant 1 or 2. Variant 3 is composed from variant 2 with
/// [`crate::compose::compose_variant3`].
pub fn build_variant(variant: VariantNo, ev: &Evidence, params: &EngineParams) -> Result<VariantRun, AlgoError> {
    if variant == VariantNo::V3 {
        return Err(AlgoError::NeedsBaseVariant);
    }
    debug_assert!(ev.edges.windows(2).all(|w| w[0].direction_id < w[1].direction_id));

    let mut st = WorkingState::new(variant, &ev.edges, &ev.supply0);
    let forced = forced_pass(&mut st);
    let score_ev = ScoreEvidence {
        tag_counts: &ev.tag_counts,
        existing_well_owner: &ev.existing_well_owner,
    };
    let greedy = greedy_pass(&mut st, &params.weights, &score_ev, params.iteration_guard);
    let unknown = st.close_with_unknown();

    let run = VariantRun {
        variant,
        allocation: st.allocation,
        basis: st.basis,
        unknown,
        trace: RunTrace { forced, greedy, lr_directions: 0 },
    };
    verify_conservation(&ev.edges, &run.allocation)?;
    Ok(run)
}
