// crates/duct_algo/src/lib.rs
#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

//! Allocation layer: supply/candidate model, forced fixed point, greedy
//! scoring, per-variant orchestration and the variant-3 largest-remainder
//! composer. Pure and deterministic; depends only on `duct_core`.

extern crate alloc;

use core::fmt;

use duct_core::evidence::allocated_on;
use duct_core::{Allocation, DirectionId, Edge};

pub mod supply;
pub mod state;
pub mod forced;
pub mod greedy;
pub mod variant;
pub mod compose;

// ----------------------------- Allocation (public surface) ---------------------------

pub mod allocation {
    pub mod largest_remainder;

    pub use largest_remainder::distribute_largest_remainder;
}

pub use compose::compose_variant3;
pub use forced::ForcedOutcome;
pub use greedy::{GreedyOutcome, ScoreEvidence};
pub use supply::{Candidate, SupplyPool};
pub use variant::{build_variant, RunTrace, VariantRun};

// ----------------------------- Errors ------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlgoError {
    /// Variant 3 is composed from a variant-2 run, never built from supply.
    NeedsBaseVariant,
    /// `Σ allocation[d] != unaccounted_count[d]`.
    Conservation { direction_id: DirectionId, expected: u64, got: u64 },
    /// Allocation holds a direction that is not in the edge list.
    StrayDirection(DirectionId),
    /// A stored slot with zero units.
    ZeroEntry(DirectionId),
}

impl fmt::Display for AlgoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgoError::NeedsBaseVariant => write!(f, "variant 3 must be composed from a variant 2 run"),
            AlgoError::Conservation { direction_id, expected, got } => write!(
                f,
                "conservation violated on direction {direction_id}: expected {expected}, allocated {got}"
            ),
            AlgoError::StrayDirection(d) => write!(f, "allocation holds unknown direction {d}"),
            AlgoError::ZeroEntry(d) => write!(f, "zero-unit slot on direction {d}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AlgoError {}

// ----------------------------- Conservation ------------------------------------------

/// Check that every edge's demand is fully explained and nothing else is allocated.
pub fn verify_conservation(edges: &[Edge], alloc: &Allocation) -> Result<(), AlgoError> {
    for e in edges {
        let got = allocated_on(alloc, e.direction_id);
        let expected = e.unaccounted_count as u64;
        if got != expected {
            return Err(AlgoError::Conservation { direction_id: e.direction_id, expected, got });
        }
    }
    for (dir, slots) in alloc {
        if !edges.iter().any(|e| e.direction_id == *dir) {
            return Err(AlgoError::StrayDirection(*dir));
        }
        if slots.values().any(|&u| u == 0) {
            return Err(AlgoError::ZeroEntry(*dir));
        }
    }
    Ok(())
}
