//! Per-variant working state threaded through the forced and greedy passes.
//!
//! The state owns its supply pool and remaining-demand map; only the edge
//! list is borrowed (read-only). Building one `WorkingState` per variant is
//! what keeps variants from aliasing each other.

use alloc::collections::BTreeMap;

use duct_core::confidence::Basis;
use duct_core::evidence::{add_units, WellOwnerCounts};
use duct_core::{Allocation, DirectionId, Edge, OwnerId, OwnerRef, VariantNo};

use crate::supply::{Candidate, SupplyPool};

#[derive(Clone, Debug)]
pub struct WorkingState<'e> {
    pub variant: VariantNo,
    pub edges: &'e [Edge],
    /// Demand still to be explained, per direction (absent == 0).
    pub remaining: BTreeMap<DirectionId, u32>,
    pub supply: SupplyPool,
    /// Known-owner units placed so far. `UNKNOWN` is added only at the end.
    pub allocation: Allocation,
    pub basis: BTreeMap<(DirectionId, OwnerId), Basis>,
}

impl<'e> WorkingState<'e> {
    pub fn new(variant: VariantNo, edges: &'e [Edge], supply0: &WellOwnerCounts) -> Self {
        let remaining = edges
            .iter()
            .map(|e| (e.direction_id, e.unaccounted_count))
            .collect();
        Self {
            variant,
            edges,
            remaining,
            supply: SupplyPool::from_initial(supply0),
            allocation: Allocation::new(),
            basis: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn remaining_for(&self, dir: DirectionId) -> u32 {
        self.remaining.get(&dir).copied().unwrap_or(0)
    }

    pub fn has_demand(&self) -> bool {
        self.remaining.values().any(|&r| r > 0)
    }

    /// Place `min(remaining, avail)` units of `cand` on `edge`, consuming supply.
    /// Returns the number of units placed.
    pub fn assign(&mut self, edge: &Edge, cand: Candidate) -> u32 {
        let dir = edge.direction_id;
        let k = self.remaining_for(dir).min(cand.avail);
        if k == 0 {
            return 0;
        }
        self.supply.consume(edge, cand.owner, cand.mode, k);
        if let Some(r) = self.remaining.get_mut(&dir) {
            *r -= k;
        }
        add_units(&mut self.allocation, dir, OwnerRef::Known(cand.owner), k);
        self.basis.entry((dir, cand.owner)).or_default().note_mode(cand.mode);
        k
    }

    /// Move every unexplained unit onto `UNKNOWN` and return the residual map
    /// (directions with a positive residual only).
    pub fn close_with_unknown(&mut self) -> BTreeMap<DirectionId, u32> {
        let residual: BTreeMap<DirectionId, u32> = self
            .remaining
            .iter()
            .filter(|(_, &r)| r > 0)
            .map(|(&d, &r)| (d, r))
            .collect();
        for (&d, &r) in &residual {
            add_units(&mut self.allocation, d, OwnerRef::Unknown, r);
        }
        for r in self.remaining.values_mut() {
            *r = 0;
        }
        residual
    }
}
