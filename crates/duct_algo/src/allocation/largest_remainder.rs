//! Largest Remainder (LR) distribution of a direction's residual over its
//! real owners.
//!
//! Contract:
//! - `total = Σ counts` over owners with a positive count.
//! - If `total == 0` → `None` (caller assigns the residual to `UNKNOWN`).
//! - Ranking: count ↓, then `OwnerId` ↑.
//! - Floors: `floor(residual * count / total)` per owner, in ranking order.
//! - `leftover = residual − Σ floors`, handed out one unit at a time in the
//!   same ranking order (cycling if ever needed).
//!
//! Determinism:
//! - No RNG and no floats; the ranking is the only tie-break.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use duct_core::determinism::owners_by_count_desc;
use duct_core::rounding::floor_share;
use duct_core::OwnerId;

/// Distribute `residual` units over `counts`. Every returned entry is positive
/// and the values sum to `residual`.
pub fn distribute_largest_remainder(
    residual: u32,
    counts: &BTreeMap<OwnerId, u32>,
) -> Option<BTreeMap<OwnerId, u32>> {
    let ranking = owners_by_count_desc(counts);
    let total: u64 = ranking.iter().map(|&(_, c)| c as u64).sum();
    if total == 0 {
        return None;
    }

    let mut shares: Vec<(OwnerId, u32)> = Vec::with_capacity(ranking.len());
    for &(owner, c) in &ranking {
        // total > 0 here, so floor_share is always Some.
        let f = floor_share(residual, c, total).unwrap_or(0);
        shares.push((owner, f));
    }

    let floors: u64 = shares.iter().map(|&(_, f)| f as u64).sum();
    let leftover = (residual as u64).saturating_sub(floors);
    distribute_leftovers(leftover, &mut shares);

    let out: BTreeMap<OwnerId, u32> = shares.into_iter().filter(|&(_, n)| n > 0).collect();
    debug_assert_eq!(out.values().map(|&n| n as u64).sum::<u64>(), residual as u64);
    Some(out)
}

/// One unit each, in ranking order; cycles defensively (leftover < owners).
fn distribute_leftovers(leftover: u64, shares: &mut [(OwnerId, u32)]) {
    if shares.is_empty() {
        return;
    }
    let n = shares.len();
    let mut idx = 0usize;
    let mut given = 0u64;
    while given < leftover {
        shares[idx].1 += 1;
        given += 1;
        idx += 1;
        if idx == n {
            idx = 0;
        }
    }
}
