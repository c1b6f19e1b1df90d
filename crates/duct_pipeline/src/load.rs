//! LOAD stage: raw wire evidence (`duct_io::loader::RawEvidence`) → typed,
//! sanitized `duct_core::Evidence`.
//!
//! - Edges with an id ≤ 0 or `unaccounted_count ≤ 0` are skipped, never fatal.
//!   So is an `unaccounted_count` above `u32::MAX`.
//! - A repeated `direction_id` keeps its first occurrence (input order).
//! - Count-map entries with an unparsable/non-positive key or a count ≤ 0 are
//!   dropped; counts above `u32::MAX` saturate.
//! - Absent `supply` is derived as `max(0, tags − existing)`.
//! - Edges are re-ordered ascending by `direction_id`.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use duct_core::determinism::sort_edges_canonical;
use duct_core::evidence::{derive_supply, put_count, CountMap};
use duct_core::{DirectionId, Edge, Evidence, OwnerId, WellId};
use duct_io::loader::{RawCountMap, RawEdge, RawEvidence};

/// Why an input edge did not make it into the evidence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InvalidDirectionId,
    InvalidWellId,
    NonPositiveCount,
    DuplicateDirection,
    CountOverflow,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::InvalidDirectionId => "invalid_direction_id",
            SkipReason::InvalidWellId => "invalid_well_id",
            SkipReason::NonPositiveCount => "non_positive_count",
            SkipReason::DuplicateDirection => "duplicate_direction",
            SkipReason::CountOverflow => "count_overflow",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One malformed input edge; `index` is its position in the input array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEdge {
    pub index: usize,
    pub direction_id: i64,
    pub reason: SkipReason,
}

/// Output of the LOAD stage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadedEvidence {
    pub evidence: Evidence,
    pub skipped: Vec<SkippedEdge>,
    /// Count-map entries dropped during sanitation (bad key or count ≤ 0).
    pub dropped_entries: u32,
    pub supply_derived: bool,
}

pub fn normalize_evidence(raw: &RawEvidence) -> LoadedEvidence {
    let (edges, skipped) = normalize_edges(&raw.edges);
    let mut dropped = 0u32;

    let tag_counts = sanitize_counts::<WellId>(&raw.tag_counts, &mut dropped);
    let existing_well_owner = sanitize_counts::<WellId>(&raw.existing_well_owner, &mut dropped);
    let real_direction_owners = sanitize_counts::<DirectionId>(&raw.real_direction_owners, &mut dropped);
    let (supply0, supply_derived) = match &raw.supply {
        Some(s) => (sanitize_counts::<WellId>(s, &mut dropped), false),
        None => (derive_supply(&tag_counts, &existing_well_owner), true),
    };

    LoadedEvidence {
        evidence: Evidence { edges, supply0, tag_counts, existing_well_owner, real_direction_owners },
        skipped,
        dropped_entries: dropped,
        supply_derived,
    }
}

fn normalize_edges(raw: &[RawEdge]) -> (Vec<Edge>, Vec<SkippedEdge>) {
    let mut seen: BTreeSet<DirectionId> = BTreeSet::new();
    let mut edges = Vec::with_capacity(raw.len());
    let mut skipped = Vec::new();

    for (index, r) in raw.iter().enumerate() {
        match edge_from_raw(r) {
            Ok(e) if !seen.insert(e.direction_id) => skipped.push(SkippedEdge {
                index,
                direction_id: r.direction_id,
                reason: SkipReason::DuplicateDirection,
            }),
            Ok(e) => edges.push(e),
            Err(reason) => skipped.push(SkippedEdge { index, direction_id: r.direction_id, reason }),
        }
    }
    sort_edges_canonical(&mut edges);
    (edges, skipped)
}

fn edge_from_raw(r: &RawEdge) -> Result<Edge, SkipReason> {
    let d = DirectionId::try_from(r.direction_id).map_err(|_| SkipReason::InvalidDirectionId)?;
    let a = WellId::try_from(r.well_a_id).map_err(|_| SkipReason::InvalidWellId)?;
    let b = WellId::try_from(r.well_b_id).map_err(|_| SkipReason::InvalidWellId)?;
    if r.unaccounted_count <= 0 {
        return Err(SkipReason::NonPositiveCount);
    }
    let u = u32::try_from(r.unaccounted_count).map_err(|_| SkipReason::CountOverflow)?;
    let max_inv = saturate_u32(r.max_inventory_cables);
    Edge::new(d, a, b, u, max_inv).map_err(|_| SkipReason::NonPositiveCount)
}

/// Clamp a signed wire count into `0..=u32::MAX`.
#[inline]
fn saturate_u32(v: i64) -> u32 {
    u32::try_from(v.max(0)).unwrap_or(u32::MAX)
}

/// Parse an id key the way the wire spells it: a positive decimal integer.
fn parse_key<K: TryFrom<i64>>(s: &str) -> Option<K> {
    i64::from_str(s.trim()).ok().and_then(|n| K::try_from(n).ok())
}

fn sanitize_counts<K: Ord + Copy + TryFrom<i64>>(raw: &RawCountMap, dropped: &mut u32) -> CountMap<K> {
    let mut out: CountMap<K> = CountMap::new();
    for (k, by_owner) in raw {
        let Some(key) = parse_key::<K>(k) else {
            *dropped += by_owner.len() as u32;
            continue;
        };
        for (o, &c) in by_owner {
            match parse_key::<OwnerId>(o) {
                Some(owner) if c > 0 => {
                    // a later spelling of the same id (e.g. "07" after "7") adds up
                    let prev = out.get(&key).and_then(|m| m.get(&owner)).copied().unwrap_or(0);
                    put_count(&mut out, key, owner, prev.saturating_add(saturate_u32(c)));
                }
                _ => *dropped += 1,
            }
        }
    }
    out
}
