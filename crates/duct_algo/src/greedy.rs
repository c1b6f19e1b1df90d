//! Greedy scored allocation.
//!
//! After the forced pass stalls, repeatedly pick the single best
//! `(edge, owner, mode)` over all edges with remaining demand and place
//! `min(remaining, avail)` units in one step.
//!
//! score = uniq·[amb == 1] + both·[mode == both] + support·S + min_supply·M − ambiguity·amb
//!   S   = max(0, (tags_a + tags_b) − (existing_a + existing_b)) for the owner
//!   M   = bottleneck residual supply for (owner, mode), i.e. the candidate's availability
//!   amb = number of competing owners at the edge
//!
//! Tie-break: first maximum in scan order (edges by `direction_id` ↑, owners
//! by `OwnerId` ↑). A later candidate must score strictly higher to win.
//!
//! Termination: no edge has both remaining demand and a positively available
//! owner, or `iteration_guard` placements have been made.

use duct_core::evidence::{count_at, WellOwnerCounts};
use duct_core::{Edge, Mode, OwnerId, ScoreWeights};

use crate::state::WorkingState;
use crate::supply::Candidate;

/// Read-only evidence used for scoring only.
#[derive(Clone, Copy, Debug)]
pub struct ScoreEvidence<'a> {
    pub tag_counts: &'a WellOwnerCounts,
    pub existing_well_owner: &'a WellOwnerCounts,
}

impl<'a> ScoreEvidence<'a> {
    /// `max(0, (tags_a + tags_b) − (existing_a + existing_b))`.
    pub fn support(&self, edge: &Edge, owner: OwnerId) -> u64 {
        let tags = count_at(self.tag_counts, &edge.well_a_id, owner) as u64
            + count_at(self.tag_counts, &edge.well_b_id, owner) as u64;
        let existing = count_at(self.existing_well_owner, &edge.well_a_id, owner) as u64
            + count_at(self.existing_well_owner, &edge.well_b_id, owner) as u64;
        tags.saturating_sub(existing)
    }
}

/// Score a single candidate with ambiguity `amb` at `edge`.
///
/// Saturates at the `i64` bounds, so oversized weights still order candidates.
pub fn score(w: &ScoreWeights, ev: &ScoreEvidence<'_>, edge: &Edge, cand: &Candidate, amb: usize) -> i64 {
    let amb = i64::try_from(amb).unwrap_or(i64::MAX);
    let uniq = if amb == 1 { w.uniq_bonus } else { 0 };
    let mode = if cand.mode == Mode::Both { w.both_mode_bonus } else { 0 };
    let support = i64::try_from(ev.support(edge, cand.owner)).unwrap_or(i64::MAX);
    uniq.saturating_add(mode)
        .saturating_add(support.saturating_mul(w.support))
        .saturating_add(i64::from(cand.avail).saturating_mul(w.min_supply))
        .saturating_sub(amb.saturating_mul(w.ambiguity_penalty))
}

/// Summary of a greedy pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GreedyOutcome {
    pub steps: u32,
    pub units: u64,
    /// True when the guard stopped the loop while a placement was still possible.
    pub guard_exhausted: bool,
}

struct Best<'e> {
    score: i64,
    edge: &'e Edge,
    cand: Candidate,
}

fn find_best<'e>(st: &WorkingState<'e>, w: &ScoreWeights, ev: &ScoreEvidence<'_>) -> Option<Best<'e>> {
    let mut best: Option<Best<'e>> = None;
    let edges: &'e [Edge] = st.edges;
    for edge in edges {
        if st.remaining_for(edge.direction_id) == 0 {
            continue;
        }
        let cands = st.supply.candidates(edge, st.variant);
        let amb = cands.len();
        for cand in cands {
            let s = score(w, ev, edge, &cand, amb);
            match &best {
                Some(b) if s <= b.score => {}
                _ => best = Some(Best { score: s, edge, cand }),
            }
        }
    }
    best
}

pub fn greedy_pass(
    st: &mut WorkingState<'_>,
    weights: &ScoreWeights,
    ev: &ScoreEvidence<'_>,
    iteration_guard: u32,
) -> GreedyOutcome {
    let mut out = GreedyOutcome::default();
    while let Some(best) = find_best(st, weights, ev) {
        if out.steps >= iteration_guard {
            out.guard_exhausted = true;
            break;
        }
        let k = st.assign(best.edge, best.cand);
        out.steps += 1;
        out.units += k as u64;
    }
    out
}
