//! Candidate/Supply model.
//!
//! A `SupplyPool` is the mutable residual of unexplained tag evidence for one
//! variant run. It is built from an owned copy of `supply0`, so two variants
//! never share a pool.
//!
//! Candidate modes for owner `o` at edge `(a, b)`:
//! - `both`  when the residual is positive at both ends,
//! - `one_a` / `one_b` when it is positive at exactly one end (variant ≥ 2).
//!
//! An owner therefore contributes at most one candidate per edge at a time.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use duct_core::evidence::{count_at, put_count, WellOwnerCounts};
use duct_core::rounding::floor_sub;
use duct_core::{Edge, Mode, OwnerId, VariantNo, WellId};

/// One admissible `(owner, mode)` for an edge, with positive availability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub owner: OwnerId,
    pub mode: Mode,
    pub avail: u32,
}

/// Residual per-well, per-owner supply owned by a single variant run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SupplyPool {
    pools: WellOwnerCounts,
}

impl SupplyPool {
    /// Deep copy of `supply0`.
    pub fn from_initial(supply0: &WellOwnerCounts) -> Self {
        Self { pools: supply0.clone() }
    }

    #[inline]
    pub fn at(&self, well: WellId, owner: OwnerId) -> u32 {
        count_at(&self.pools, &well, owner)
    }

    pub fn as_counts(&self) -> &WellOwnerCounts { &self.pools }

    /// `min(A, B)` for `both`, the single end for one-sided modes, and 0 for
    /// one-sided modes under variant 1.
    pub fn avail_for(&self, edge: &Edge, owner: OwnerId, mode: Mode, variant: VariantNo) -> u32 {
        let sa = self.at(edge.well_a_id, owner);
        let sb = self.at(edge.well_b_id, owner);
        match mode {
            Mode::Both => sa.min(sb),
            _ if !variant.allows_one_sided() => 0,
            Mode::OneA => sa,
            Mode::OneB => sb,
        }
    }

    /// Decrement the pool(s) touched by `mode` by `k`, floored at 0.
    /// A self-loop edge has a single pool, decremented once.
    pub fn consume(&mut self, edge: &Edge, owner: OwnerId, mode: Mode, k: u32) {
        match mode {
            Mode::Both => {
                self.take(edge.well_a_id, owner, k);
                if !edge.is_self_loop() {
                    self.take(edge.well_b_id, owner, k);
                }
            }
            Mode::OneA => self.take(edge.well_a_id, owner, k),
            Mode::OneB => self.take(edge.well_b_id, owner, k),
        }
    }

    fn take(&mut self, well: WellId, owner: OwnerId, k: u32) {
        let left = floor_sub(self.at(well, owner), k);
        put_count(&mut self.pools, well, owner, left);
    }

    /// Owners with positive residual at `a` or `b`, ascending.
    fn owners_at(&self, a: WellId, b: WellId) -> BTreeSet<OwnerId> {
        let mut s = BTreeSet::new();
        for w in [a, b] {
            if let Some(m) = self.pools.get(&w) {
                s.extend(m.iter().filter(|(_, &v)| v > 0).map(|(&o, _)| o));
            }
        }
        s
    }

    /// Admissible candidates for `edge`, ascending owner id. Every returned
    /// candidate has `avail > 0`; the length is the edge's ambiguity.
    pub fn candidates(&self, edge: &Edge, variant: VariantNo) -> Vec<Candidate> {
        let mut out = Vec::new();
        for owner in self.owners_at(edge.well_a_id, edge.well_b_id) {
            let sa = self.at(edge.well_a_id, owner);
            let sb = self.at(edge.well_b_id, owner);
            let mode = match (sa > 0, sb > 0) {
                (true, true) => Mode::Both,
                (true, false) => Mode::OneA,
                (false, true) => Mode::OneB,
                (false, false) => continue,
            };
            let avail = self.avail_for(edge, owner, mode, variant);
            if avail > 0 {
                out.push(Candidate { owner, mode, avail });
            }
        }
        out
    }
}

impl From<WellOwnerCounts> for SupplyPool {
    fn from(pools: WellOwnerCounts) -> Self { Self { pools } }
}
