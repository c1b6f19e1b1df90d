//! Variant 3: variant 2's known placements plus a largest-remainder split of
//! each direction's `UNKNOWN` residual over the direction's real owners.
//!
//! Directions with no real-owner evidence (total 0) keep their residual on
//! `UNKNOWN`. Variant 2's run is only read; the result is a fresh value.

use duct_core::evidence::add_units;
use duct_core::{DirectionOwnerCounts, Edge, OwnerRef, VariantNo};

use crate::allocation::largest_remainder::distribute_largest_remainder;
use crate::variant::{RunTrace, VariantRun};
use crate::{verify_conservation, AlgoError};

pub fn compose_variant3(
    v2: &VariantRun,
    edges: &[Edge],
    real_direction_owners: &DirectionOwnerCounts,
) -> Result<VariantRun, AlgoError> {
    if v2.variant != VariantNo::V2 {
        return Err(AlgoError::NeedsBaseVariant);
    }

    let mut allocation = v2.allocation.clone();
    for slots in allocation.values_mut() {
        slots.remove(&OwnerRef::Unknown);
    }
    allocation.retain(|_, slots| !slots.is_empty());

    let mut basis = v2.basis.clone();
    let mut unknown = v2.unknown.clone();
    let mut lr_directions = 0u32;

    for (&dir, &residual) in &v2.unknown {
        let shares = real_direction_owners
            .get(&dir)
            .and_then(|counts| distribute_largest_remainder(residual, counts));
        match shares {
            Some(shares) => {
                for (owner, units) in shares {
                    add_units(&mut allocation, dir, OwnerRef::Known(owner), units);
                    basis.entry((dir, owner)).or_default().real_owners = true;
                }
                unknown.remove(&dir);
                lr_directions += 1;
            }
            None => add_units(&mut allocation, dir, OwnerRef::Unknown, residual),
        }
    }

    let run = VariantRun {
        variant: VariantNo::V3,
        allocation,
        basis,
        unknown,
        trace: RunTrace { lr_directions, ..v2.trace },
    };
    verify_conservation(edges, &run.allocation)?;
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::build_variant;
    use duct_core::confidence::Basis;
    use duct_core::evidence::put_count;
    use duct_core::{Classification, DirectionId, EngineParams, Evidence, Mode, OwnerId, WellId};

    fn w(n: u64) -> WellId { WellId::new(n).unwrap() }
    fn o(n: u64) -> OwnerId { OwnerId::new(n).unwrap() }
    fn d(n: u64) -> DirectionId { DirectionId::new(n).unwrap() }

    fn five_unexplained() -> Evidence {
        let mut ev = Evidence::default();
        ev.edges.push(Edge::new(d(1), w(1), w(2), 5, 0).unwrap());
        put_count(&mut ev.real_direction_owners, d(1), o(10), 3);
        put_count(&mut ev.real_direction_owners, d(1), o(11), 1);
        ev
    }

    #[test]
    fn residual_split_over_real_owners() {
        let ev = five_unexplained();
        let v2 = build_variant(VariantNo::V2, &ev, &EngineParams::default()).unwrap();
        assert_eq!(v2.unknown_units(), 5);
        let v3 = compose_variant3(&v2, &ev.edges, &ev.real_direction_owners).unwrap();
        let slots = &v3.allocation[&d(1)];
        assert_eq!(slots[&OwnerRef::Known(o(10))], 4);
        assert_eq!(slots[&OwnerRef::Known(o(11))], 1);
        assert!(!slots.contains_key(&OwnerRef::Unknown));
        assert_eq!(v3.trace.lr_directions, 1);
        assert_eq!(v3.basis[&(d(1), o(10))].classify(), Classification::Mixed);
    }

    #[test]
    fn no_real_owners_keeps_unknown() {
        let mut ev = five_unexplained();
        ev.real_direction_owners.clear();
        let v2 = build_variant(VariantNo::V2, &ev, &EngineParams::default()).unwrap();
        let v3 = compose_variant3(&v2, &ev.edges, &ev.real_direction_owners).unwrap();
        assert_eq!(v3.allocation, v2.allocation);
        assert_eq!(v3.unknown_units(), 5);
        assert_eq!(v3.variant, VariantNo::V3);
    }

    #[test]
    fn known_rows_of_variant_two_are_kept() {
        let mut ev = five_unexplained();
        put_count(&mut ev.supply0, w(1), o(7), 2);
        put_count(&mut ev.supply0, w(2), o(7), 2);
        let v2 = build_variant(VariantNo::V2, &ev, &EngineParams::default()).unwrap();
        let v3 = compose_variant3(&v2, &ev.edges, &ev.real_direction_owners).unwrap();
        let slots = &v3.allocation[&d(1)];
        assert_eq!(slots[&OwnerRef::Known(o(7))], 2);
        // residual 3 over {10:3, 11:1}: floors 2 and 0, leftover 1 to owner 10
        assert_eq!(slots[&OwnerRef::Known(o(10))], 3);
        assert!(!slots.contains_key(&OwnerRef::Known(o(11))));
        assert_eq!(v3.basis[&(d(1), o(7))], Basis::from_mode(Mode::Both));
    }

    #[test]
    fn only_variant_two_is_a_valid_base() {
        let ev = five_unexplained();
        let v1 = build_variant(VariantNo::V1, &ev, &EngineParams::default()).unwrap();
        assert_eq!(
            compose_variant3(&v1, &ev.edges, &ev.real_direction_owners),
            Err(AlgoError::NeedsBaseVariant)
        );
    }
}
