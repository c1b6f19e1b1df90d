//! Engine domains and the `EngineParams` configuration struct.
//!
//! Notes:
//! - `iteration_guard` bounds the greedy loop. The default (200 000) is the
//!   historical constant; large graphs may raise it.
//! - `weights` are the tuned scoring constants of the greedy pass. They are
//!   exposed so a re-tuning experiment can be run without touching code; the
//!   defaults are the only values the engine is tested against.

use core::fmt;

use crate::errors::CoreError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Greedy-loop iteration bound used when params do not override it.
pub const DEFAULT_ITERATION_GUARD: u32 = 200_000;

/// Scenario variant: 1 (both-ends only), 2 (one-sided allowed), 3 (real-owner remainder).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub enum VariantNo {
    V1,
    V2,
    V3,
}

impl VariantNo {
    pub const ALL: [VariantNo; 3] = [VariantNo::V1, VariantNo::V2, VariantNo::V3];

    #[inline]
    pub fn as_u8(self) -> u8 {
        match self {
            VariantNo::V1 => 1,
            VariantNo::V2 => 2,
            VariantNo::V3 => 3,
        }
    }

    /// One-sided candidate modes are only admitted from variant 2 upward.
    #[inline]
    pub fn allows_one_sided(self) -> bool { self >= VariantNo::V2 }
}

impl TryFrom<u8> for VariantNo {
    type Error = CoreError;
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(VariantNo::V1),
            2 => Ok(VariantNo::V2),
            3 => Ok(VariantNo::V3),
            _ => Err(CoreError::InvalidVariant),
        }
    }
}

impl From<VariantNo> for u8 {
    fn from(v: VariantNo) -> u8 { v.as_u8() }
}

impl fmt::Display for VariantNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.as_u8())
    }
}

/// How a candidate owner is supported at an edge's endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Mode {
    /// Positive residual supply at both endpoints.
    Both,
    /// Positive residual supply at endpoint A only.
    OneA,
    /// Positive residual supply at endpoint B only.
    OneB,
}

impl Mode {
    #[inline]
    pub fn is_one_sided(self) -> bool { !matches!(self, Mode::Both) }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Both => "both",
            Mode::OneA => "one_a",
            Mode::OneB => "one_b",
        }
    }
}

/// Greedy scoring weights:
/// `uniq_bonus·[amb==1] + both_mode_bonus·[mode==both] + support·S + min_supply·M − ambiguity_penalty·amb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct ScoreWeights {
    pub uniq_bonus: i64,
    pub both_mode_bonus: i64,
    pub support: i64,
    pub min_supply: i64,
    pub ambiguity_penalty: i64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            uniq_bonus: 5000,
            both_mode_bonus: 3000,
            support: 10,
            min_supply: 3,
            ambiguity_penalty: 5,
        }
    }
}

/// Engine configuration. `{}` deserializes to the defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct EngineParams {
    pub iteration_guard: u32,
    pub weights: ScoreWeights,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self { iteration_guard: DEFAULT_ITERATION_GUARD, weights: ScoreWeights::default() }
    }
}

impl EngineParams {
    pub fn with_iteration_guard(mut self, guard: u32) -> Self {
        self.iteration_guard = guard;
        self
    }
}

/// Domain checks that serde cannot express.
pub fn validate_params(p: &EngineParams) -> Result<(), CoreError> {
    if p.iteration_guard == 0 {
        return Err(CoreError::DomainOutOfRange("iteration_guard"));
    }
    let w = &p.weights;
    if w.uniq_bonus < 0 || w.both_mode_bonus < 0 || w.support < 0 || w.min_supply < 0 || w.ambiguity_penalty < 0 {
        return Err(CoreError::DomainOutOfRange("weights"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_the_tuned_constants() {
        let p = EngineParams::default();
        assert_eq!(p.iteration_guard, 200_000);
        assert_eq!(p.weights.uniq_bonus, 5000);
        assert_eq!(p.weights.both_mode_bonus, 3000);
        assert_eq!(p.weights.support, 10);
        assert_eq!(p.weights.min_supply, 3);
        assert_eq!(p.weights.ambiguity_penalty, 5);
        assert!(validate_params(&p).is_ok());
    }

    #[test]
    fn zero_guard_is_rejected() {
        let p = EngineParams::default().with_iteration_guard(0);
        assert_eq!(validate_params(&p), Err(CoreError::DomainOutOfRange("iteration_guard")));
    }

    #[test]
    fn variant_gates_one_sided_modes() {
        assert!(!VariantNo::V1.allows_one_sided());
        assert!(VariantNo::V2.allows_one_sided());
        assert!(VariantNo::V3.allows_one_sided());
        assert_eq!(VariantNo::try_from(4u8), Err(CoreError::InvalidVariant));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn empty_params_document_is_default() {
        let p: EngineParams = serde_json::from_str("{}").unwrap();
        assert_eq!(p, EngineParams::default());
        let p: EngineParams = serde_json::from_str(r#"{"iteration_guard": 10}"#).unwrap();
        assert_eq!(p.iteration_guard, 10);
        assert!(serde_json::from_str::<EngineParams>(r#"{"bogus": 1}"#).is_err());
    }
}
