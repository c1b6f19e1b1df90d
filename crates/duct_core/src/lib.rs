//! duct_core — Core types, domains, ordering helpers, and integer share math.
//!
//! This crate is **I/O-free**. It defines stable types/APIs used across the
//! engine (`duct_algo`, `duct_io`, `duct_pipeline`, `duct_report`, `duct_cli`).
//!
//! - Id newtypes: `DirectionId`, `WellId`, `OwnerId` (positive integers)
//! - `OwnerRef`: `Known(OwnerId) | Unknown` (replaces any string sentinel)
//! - Evidence: `Edge`, per-well and per-direction owner count maps, `Allocation`
//! - Domains: `VariantNo`, `Mode`, `EngineParams`, `ScoreWeights`
//! - The fixed per-variant confidence/classification table
//! - Deterministic ordering helpers and integer-first share arithmetic
//!
//! Serialization derives are gated behind the `serde` feature.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod errors {
    use core::fmt;

    /// Minimal error set for core-domain validation & parsing.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum CoreError {
        InvalidId,
        InvalidCount,
        InvalidVariant,
        DomainOutOfRange(&'static str),
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::InvalidId => write!(f, "invalid id (must be a positive integer)"),
                CoreError::InvalidCount => write!(f, "invalid count"),
                CoreError::InvalidVariant => write!(f, "invalid variant (expected 1, 2 or 3)"),
                CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
            }
        }
    }

    #[cfg(feature = "std")]
    impl std::error::Error for CoreError {}
}

pub mod rounding {
    //! Integer-first share helpers (no floats).

    /// `floor(amount * part / whole)` computed in u128.
    ///
    /// Returns `None` when `whole == 0`.
    #[inline]
    pub fn floor_share(amount: u32, part: u32, whole: u64) -> Option<u32> {
        if whole == 0 {
            return None;
        }
        let q = (amount as u128) * (part as u128) / (whole as u128);
        // part <= whole for every caller, so q <= amount.
        Some(if q > u32::MAX as u128 { u32::MAX } else { q as u32 })
    }

    /// Saturating subtraction floored at zero, the only way pools shrink.
    #[inline]
    pub fn floor_sub(have: u32, take: u32) -> u32 {
        have.saturating_sub(take)
    }

    /// `num / den` as a percentage in tenths (`1000` == 100.0%), half-up.
    ///
    /// Returns `None` when `den == 0`.
    #[inline]
    pub fn percent_one_decimal_tenths(num: u64, den: u64) -> Option<u32> {
        if den == 0 {
            return None;
        }
        let scaled = (num as u128) * 1000;
        let q = (scaled + (den as u128) / 2) / (den as u128);
        Some(if q > u32::MAX as u128 { u32::MAX } else { q as u32 })
    }
}

pub mod ids;
pub mod determinism;
pub mod evidence;
pub mod variables;
pub mod confidence;

pub use confidence::{Classification, Confidence};
pub use evidence::{Allocation, DirectionOwnerCounts, Edge, Evidence, WellOwnerCounts};
pub use ids::{DirectionId, OwnerId, OwnerRef, WellId};
pub use variables::{EngineParams, Mode, ScoreWeights, VariantNo};
