//! Forced-allocation pass (fixed point).
//!
//! Contract:
//! - Scan edges with remaining demand in canonical order.
//! - An edge whose candidate list has exactly one entry is unambiguous: place
//!   `min(remaining, avail)` units on that owner and consume supply.
//! - Repeat full scans until one scan changes nothing.
//!
//! Every change places at least one unit, so the number of scans is bounded
//! by total demand + 1.

use crate::state::WorkingState;

/// Summary of a forced pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ForcedOutcome {
    pub scans: u32,
    pub units: u64,
}

pub fn forced_pass(st: &mut WorkingState<'_>) -> ForcedOutcome {
    let mut out = ForcedOutcome::default();
    let edges = st.edges;
    loop {
        out.scans += 1;
        let mut changed = false;
        for edge in edges {
            if st.remaining_for(edge.direction_id) == 0 {
                continue;
            }
            let cands = st.supply.candidates(edge, st.variant);
            if let [only] = cands.as_slice() {
                let k = st.assign(edge, *only);
                if k > 0 {
                    out.units += k as u64;
                    changed = true;
                }
            }
        }
        if !changed {
            return out;
        }
    }
}
