//! TAG stage: one row per non-zero `(direction, owner)` slot of a variant's
//! allocation, with classification, fixed confidence and an evidence snapshot.
//!
//! Everything is read from already-materialized collections; missing entries
//! count as zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use duct_algo::VariantRun;
use duct_core::confidence::{known_confidence, unknown_confidence};
use duct_core::evidence::{count_at, WellOwnerCounts};
use duct_core::{Classification, Confidence, DirectionId, Edge, Evidence, OwnerRef, WellId};

/// Raw evidence at both ends of the edge, as seen by one row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceSnapshot {
    pub well_a_id: WellId,
    pub well_b_id: WellId,
    pub tags_a: u32,
    pub tags_b: u32,
    pub existing_a: u32,
    pub existing_b: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub direction_id: DirectionId,
    /// `null` for the `UNKNOWN` slot.
    pub owner_id: OwnerRef,
    pub count: u32,
    pub confidence: Confidence,
    pub classification: Classification,
    pub evidence: EvidenceSnapshot,
}

/// Rows ordered by `(direction_id, owner)`, `UNKNOWN` last within a direction.
pub fn tag_rows(run: &VariantRun, ev: &Evidence) -> Vec<Row> {
    let edges: BTreeMap<DirectionId, &Edge> = ev.edges.iter().map(|e| (e.direction_id, e)).collect();
    let mut rows = Vec::new();

    for (&dir, slots) in &run.allocation {
        let Some(edge) = edges.get(&dir) else { continue };
        for (&owner, &count) in slots {
            if count == 0 {
                continue;
            }
            let evidence = snapshot(edge, owner, ev);
            let (classification, confidence) = match owner {
                OwnerRef::Known(o) => {
                    let basis = run.basis.get(&(dir, o)).copied().unwrap_or_default();
                    let raw_both = evidence.tags_a > 0 && evidence.tags_b > 0;
                    (basis.classify(), known_confidence(run.variant, raw_both))
                }
                OwnerRef::Unknown => (Classification::Unknown, unknown_confidence(run.variant)),
            };
            rows.push(Row { direction_id: dir, owner_id: owner, count, confidence, classification, evidence });
        }
    }
    rows
}

fn snapshot(edge: &Edge, owner: OwnerRef, ev: &Evidence) -> EvidenceSnapshot {
    let at = |m: &WellOwnerCounts, w: WellId| -> u32 {
        match owner {
            OwnerRef::Known(o) => count_at(m, &w, o),
            OwnerRef::Unknown => total_at(m, w),
        }
    };
    EvidenceSnapshot {
        well_a_id: edge.well_a_id,
        well_b_id: edge.well_b_id,
        tags_a: at(&ev.tag_counts, edge.well_a_id),
        tags_b: at(&ev.tag_counts, edge.well_b_id),
        existing_a: at(&ev.existing_well_owner, edge.well_a_id),
        existing_b: at(&ev.existing_well_owner, edge.well_b_id),
    }
}

/// Sum over all owners at a well, saturating.
fn total_at(m: &WellOwnerCounts, w: WellId) -> u32 {
    m.get(&w).map(|by| by.values().fold(0u32, |acc, &c| acc.saturating_add(c))).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use duct_algo::{build_variant, compose_variant3};
    use duct_core::evidence::put_count;
    use duct_core::{EngineParams, OwnerId, VariantNo};

    fn w(n: u64) -> WellId { WellId::new(n).unwrap() }
    fn o(n: u64) -> OwnerId { OwnerId::new(n).unwrap() }
    fn d(n: u64) -> DirectionId { DirectionId::new(n).unwrap() }

    fn single_owner() -> Evidence {
        let mut ev = Evidence::default();
        ev.edges.push(Edge::new(d(1), w(1), w(2), 3, 0).unwrap());
        put_count(&mut ev.tag_counts, w(1), o(1), 5);
        put_count(&mut ev.tag_counts, w(2), o(1), 2);
        put_count(&mut ev.tag_counts, w(2), o(9), 4);
        put_count(&mut ev.existing_well_owner, w(2), o(9), 1);
        ev.supply0 = duct_core::evidence::derive_supply(&ev.tag_counts, &ev.existing_well_owner);
        ev
    }

    #[test]
    fn variant_one_rows() {
        let ev = single_owner();
        let run = build_variant(VariantNo::V1, &ev, &EngineParams::default()).unwrap();
        let rows = tag_rows(&run, &ev);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].owner_id, OwnerRef::Known(o(1)));
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].classification, Classification::TagsBothEnds);
        assert_eq!(rows[0].confidence, Confidence::V1_KNOWN);
        assert_eq!((rows[0].evidence.tags_a, rows[0].evidence.tags_b), (5, 2));
        assert_eq!(rows[1].owner_id, OwnerRef::Unknown);
        assert_eq!(rows[1].classification, Classification::Unknown);
        assert_eq!(rows[1].confidence, Confidence::V1_UNKNOWN);
        // totals over all owners for the UNKNOWN row
        assert_eq!((rows[1].evidence.tags_b, rows[1].evidence.existing_b), (6, 1));
    }

    #[test]
    fn variant_two_confidence_follows_raw_tags() {
        let ev = single_owner();
        let run = build_variant(VariantNo::V2, &ev, &EngineParams::default()).unwrap();
        let rows = tag_rows(&run, &ev);
        let owner1 = rows.iter().find(|r| r.owner_id == OwnerRef::Known(o(1))).unwrap();
        assert_eq!(owner1.count, 3);
        assert_eq!(owner1.classification, Classification::Mixed);
        assert_eq!(owner1.confidence, Confidence::V2_TAGS_BOTH);
    }

    #[test]
    fn one_end_tags_give_lower_variant_two_confidence() {
        let mut ev = Evidence::default();
        ev.edges.push(Edge::new(d(4), w(1), w(2), 1, 0).unwrap());
        put_count(&mut ev.tag_counts, w(1), o(3), 2);
        ev.supply0 = ev.tag_counts.clone();
        let run = build_variant(VariantNo::V2, &ev, &EngineParams::default()).unwrap();
        let rows = tag_rows(&run, &ev);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].classification, Classification::TagsOneEnd);
        assert_eq!(rows[0].confidence, Confidence::V2_TAGS_OTHER);
    }

    #[test]
    fn unknown_rows_take_the_variant_confidence() {
        let mut ev = Evidence::default();
        ev.edges.push(Edge::new(d(2), w(1), w(2), 2, 0).unwrap());
        let v2 = build_variant(VariantNo::V2, &ev, &EngineParams::default()).unwrap();
        let v3 = compose_variant3(&v2, &ev.edges, &ev.real_direction_owners).unwrap();

        let rows2 = tag_rows(&v2, &ev);
        assert_eq!(rows2.len(), 1);
        assert_eq!(rows2[0].owner_id, OwnerRef::Unknown);
        assert_eq!(rows2[0].classification, Classification::Unknown);
        assert_eq!(rows2[0].confidence, Confidence::V2_UNKNOWN);

        let rows3 = tag_rows(&v3, &ev);
        assert_eq!(rows3.len(), 1);
        assert_eq!(rows3[0].count, 2);
        assert_eq!(rows3[0].classification, Classification::Unknown);
        assert_eq!(rows3[0].confidence, Confidence::V3_UNKNOWN);
    }

    #[test]
    fn variant_three_keeps_variant_two_classification() {
        let mut ev = Evidence::default();
        ev.edges.push(Edge::new(d(1), w(1), w(2), 4, 0).unwrap());
        put_count(&mut ev.tag_counts, w(1), o(7), 2);
        put_count(&mut ev.tag_counts, w(2), o(7), 2);
        ev.supply0 = ev.tag_counts.clone();
        put_count(&mut ev.real_direction_owners, d(1), o(10), 1);
        let v2 = build_variant(VariantNo::V2, &ev, &EngineParams::default()).unwrap();
        let v3 = compose_variant3(&v2, &ev.edges, &ev.real_direction_owners).unwrap();

        let rows2 = tag_rows(&v2, &ev);
        assert_eq!(rows2[0].owner_id, OwnerRef::Known(o(7)));
        assert_eq!(rows2[0].classification, Classification::TagsBothEnds);
        assert_eq!(rows2[0].confidence, Confidence::V2_TAGS_BOTH);

        let rows3 = tag_rows(&v3, &ev);
        assert_eq!(rows3.len(), 2);
        assert_eq!((rows3[0].owner_id, rows3[0].count), (OwnerRef::Known(o(7)), 2));
        assert_eq!(rows3[0].classification, Classification::TagsBothEnds);
        assert_eq!(rows3[0].confidence, Confidence::V3_KNOWN);
        // residual split onto the real owner
        assert_eq!((rows3[1].owner_id, rows3[1].count), (OwnerRef::Known(o(10)), 2));
        assert_eq!(rows3[1].classification, Classification::Mixed);
        assert_eq!(rows3[1].confidence, Confidence::V3_KNOWN);
    }

    #[test]
    fn variant_three_mixed_basis_survives() {
        let ev = single_owner();
        let v2 = build_variant(VariantNo::V2, &ev, &EngineParams::default()).unwrap();
        let v3 = compose_variant3(&v2, &ev.edges, &ev.real_direction_owners).unwrap();
        let rows = tag_rows(&v3, &ev);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 3);
        assert_eq!(rows[0].classification, Classification::Mixed);
        assert_eq!(rows[0].confidence, Confidence::V3_KNOWN);
    }
}
