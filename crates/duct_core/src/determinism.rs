//! Determinism utilities: stable ordering & canonical map materialization.
//!
//! This module is **I/O-free**. Every scan order the engine depends on for
//! tie-breaking is defined here:
//! - edges: ascending `direction_id`
//! - owners within a pool: ascending `OwnerId`
//! - owners by weight: count ↓, then `OwnerId` ↑

use core::cmp::Ordering;

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::evidence::Edge;
use crate::ids::OwnerId;

/* -------------------------------------------------------------------------- */
/*                               Stable Ordering                              */
/* -------------------------------------------------------------------------- */

/// Provide a **total**, stable order for values that must sort canonically.
pub trait StableOrd {
    fn stable_cmp(&self, other: &Self) -> Ordering;
}

impl StableOrd for Edge {
    /// Canonical edge order is ascending `direction_id`.
    #[inline]
    fn stable_cmp(&self, other: &Self) -> Ordering {
        self.direction_id.cmp(&other.direction_id)
    }
}

/// Sort edges **in place** into canonical order.
#[inline]
pub fn sort_edges_canonical(xs: &mut [Edge]) {
    xs.sort_by(|a, b| a.stable_cmp(b));
}

/// `(owner, count)` pairs ordered count ↓, then owner ↑. Zero counts are dropped.
pub fn owners_by_count_desc(counts: &BTreeMap<OwnerId, u32>) -> Vec<(OwnerId, u32)> {
    let mut v: Vec<(OwnerId, u32)> = counts
        .iter()
        .filter(|(_, &c)| c > 0)
        .map(|(&o, &c)| (o, c))
        .collect();
    v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    v
}

/* -------------------------------------------------------------------------- */
/*                          Canonical map materialization                      */
/* -------------------------------------------------------------------------- */

/// Build a key-ordered `BTreeMap` from an iterator of `(K, V)`.
#[inline]
pub fn btreemap_from_iter_kv<K: Ord, V, I: IntoIterator<Item = (K, V)>>(it: I) -> BTreeMap<K, V> {
    it.into_iter().collect()
}

/* ---------------------------------- Tests --------------------------------- */
