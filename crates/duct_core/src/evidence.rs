//! Evidence collections and the allocation map.
//!
//! Every lookup treats a missing well / direction / owner as zero; nothing in
//! this module fails on absent evidence.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::errors::CoreError;
use crate::ids::{DirectionId, OwnerId, OwnerRef, WellId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// `key → owner → count` with only positive counts stored.
pub type CountMap<K> = BTreeMap<K, BTreeMap<OwnerId, u32>>;

/// Per-well owner counts (supply pools, raw tags, existing cables).
pub type WellOwnerCounts = CountMap<WellId>;

/// Per-direction owner counts (confirmed cables routed along a direction).
pub type DirectionOwnerCounts = CountMap<DirectionId>;

/// `direction → owner slot → units`. Entries are always positive.
pub type Allocation = BTreeMap<DirectionId, BTreeMap<OwnerRef, u32>>;

/// A duct direction between two wells carrying unexplained cables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Edge {
    pub direction_id: DirectionId,
    pub well_a_id: WellId,
    pub well_b_id: WellId,
    /// Always > 0 for a constructed edge.
    pub unaccounted_count: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_inventory_cables: u32,
}

impl Edge {
    pub fn new(
        direction_id: DirectionId,
        well_a_id: WellId,
        well_b_id: WellId,
        unaccounted_count: u32,
        max_inventory_cables: u32,
    ) -> Result<Self, CoreError> {
        if unaccounted_count == 0 {
            return Err(CoreError::InvalidCount);
        }
        Ok(Self { direction_id, well_a_id, well_b_id, unaccounted_count, max_inventory_cables })
    }

    #[inline]
    pub fn is_self_loop(&self) -> bool { self.well_a_id == self.well_b_id }
}

/// Fully materialized engine input. Built by the pipeline LOAD stage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Evidence {
    /// Ascending `direction_id`, no duplicates.
    pub edges: Vec<Edge>,
    pub supply0: WellOwnerCounts,
    pub tag_counts: WellOwnerCounts,
    pub existing_well_owner: WellOwnerCounts,
    pub real_direction_owners: DirectionOwnerCounts,
}

impl Evidence {
    pub fn total_unaccounted(&self) -> u64 {
        self.edges.iter().map(|e| e.unaccounted_count as u64).sum()
    }
}

/// Count for `(key, owner)`; missing → 0.
#[inline]
pub fn count_at<K: Ord>(map: &CountMap<K>, key: &K, owner: OwnerId) -> u32 {
    map.get(key).and_then(|m| m.get(&owner)).copied().unwrap_or(0)
}

/// Insert a count, dropping zeros so the "positive entries only" shape holds.
pub fn put_count<K: Ord>(map: &mut CountMap<K>, key: K, owner: OwnerId, count: u32) {
    if count == 0 {
        if let Some(inner) = map.get_mut(&key) {
            inner.remove(&owner);
            if inner.is_empty() {
                map.remove(&key);
            }
        }
        return;
    }
    map.entry(key).or_default().insert(owner, count);
}

/// Unexplained tag evidence: `max(0, tags − existing)` per well and owner,
/// positive entries only.
pub fn derive_supply(tags: &WellOwnerCounts, existing: &WellOwnerCounts) -> WellOwnerCounts {
    let mut out = WellOwnerCounts::new();
    for (well, by_owner) in tags {
        for (&owner, &t) in by_owner {
            let e = count_at(existing, well, owner);
            put_count(&mut out, *well, owner, t.saturating_sub(e));
        }
    }
    out
}

/// Units placed on a direction across all owner slots.
#[inline]
pub fn allocated_on(alloc: &Allocation, dir: DirectionId) -> u64 {
    alloc.get(&dir).map(|m| m.values().map(|&v| v as u64).sum()).unwrap_or(0)
}

/// Add `units` to `(dir, owner)`; zero is a no-op.
pub fn add_units(alloc: &mut Allocation, dir: DirectionId, owner: OwnerRef, units: u32) {
    if units == 0 {
        return;
    }
    *alloc.entry(dir).or_default().entry(owner).or_insert(0) += units;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(n: u64) -> WellId { WellId::new(n).unwrap() }
    fn o(n: u64) -> OwnerId { OwnerId::new(n).unwrap() }

    #[test]
    fn missing_lookups_are_zero() {
        let m = WellOwnerCounts::new();
        assert_eq!(count_at(&m, &w(1), o(1)), 0);
    }

    #[test]
    fn supply_is_tags_minus_existing_floored() {
        let mut tags = WellOwnerCounts::new();
        put_count(&mut tags, w(1), o(1), 5);
        put_count(&mut tags, w(1), o(2), 1);
        put_count(&mut tags, w(2), o(1), 2);
        let mut existing = WellOwnerCounts::new();
        put_count(&mut existing, w(1), o(1), 2);
        put_count(&mut existing, w(1), o(2), 4);

        let s = derive_supply(&tags, &existing);
        assert_eq!(count_at(&s, &w(1), o(1)), 3);
        assert_eq!(count_at(&s, &w(2), o(1)), 2);
        // floored at zero and not stored
        assert!(s.get(&w(1)).map(|m| !m.contains_key(&o(2))).unwrap_or(true));
    }

    #[test]
    fn put_zero_prunes_empty_wells() {
        let mut m = WellOwnerCounts::new();
        put_count(&mut m, w(3), o(1), 2);
        put_count(&mut m, w(3), o(1), 0);
        assert!(m.is_empty());
    }

    #[test]
    fn edge_requires_positive_demand() {
        let d = DirectionId::new(1).unwrap();
        assert_eq!(Edge::new(d, w(1), w(2), 0, 0), Err(CoreError::InvalidCount));
        assert!(Edge::new(d, w(1), w(1), 1, 0).unwrap().is_self_loop());
    }
}
