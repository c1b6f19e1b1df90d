//! Fixed per-variant confidence and classification table.
//!
//! | variant | owner   | classification        | confidence                         |
//! |---------|---------|-----------------------|------------------------------------|
//! | 1       | known   | by basis              | 0.90                               |
//! | 1       | UNKNOWN | `unknown`             | 0.15                               |
//! | 2       | known   | by basis              | 0.70 raw tags at both ends, else 0.50 |
//! | 2       | UNKNOWN | `unknown`             | 0.18                               |
//! | 3       | known   | by basis              | 0.35                               |
//! | 3       | UNKNOWN | `unknown`             | 0.10                               |

use core::fmt;

use crate::variables::{Mode, VariantNo};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Confidence in hundredths (0..=100). Serialized as a JSON number (`0.9`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Confidence(u8);

impl Confidence {
    pub const V1_KNOWN: Confidence = Confidence(90);
    pub const V1_UNKNOWN: Confidence = Confidence(15);
    pub const V2_TAGS_BOTH: Confidence = Confidence(70);
    pub const V2_TAGS_OTHER: Confidence = Confidence(50);
    pub const V2_UNKNOWN: Confidence = Confidence(18);
    pub const V3_KNOWN: Confidence = Confidence(35);
    pub const V3_UNKNOWN: Confidence = Confidence(10);

    /// `None` above 100.
    pub const fn from_hundredths(h: u8) -> Option<Self> {
        if h <= 100 { Some(Self(h)) } else { None }
    }

    #[inline]
    pub fn hundredths(self) -> u8 { self.0 }

    #[inline]
    pub fn as_f64(self) -> f64 { self.0 as f64 / 100.0 }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(feature = "serde")]
impl Serialize for Confidence {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(self.as_f64())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = f64::deserialize(d)?;
        if !(0.0..=1.0).contains(&v) {
            return Err(serde::de::Error::custom("confidence must be within 0..=1"));
        }
        // non-negative, so truncation after +0.5 rounds half up
        Ok(Confidence((v * 100.0 + 0.5) as u8))
    }
}

/// Row classification reported alongside each allocation row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Classification {
    TagsBothEnds,
    TagsOneEnd,
    Mixed,
    Unknown,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::TagsBothEnds => "tags_both_ends",
            Classification::TagsOneEnd => "tags_one_end",
            Classification::Mixed => "mixed",
            Classification::Unknown => "unknown",
        }
    }
}

/// How the units of one `(direction, known owner)` row were produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Basis {
    pub both: bool,
    pub one_sided: bool,
    pub real_owners: bool,
}

impl Basis {
    pub fn from_mode(mode: Mode) -> Self {
        let mut b = Basis::default();
        b.note_mode(mode);
        b
    }

    #[inline]
    pub fn note_mode(&mut self, mode: Mode) {
        if mode.is_one_sided() { self.one_sided = true } else { self.both = true }
    }

    #[inline]
    pub fn union(self, other: Basis) -> Basis {
        Basis {
            both: self.both || other.both,
            one_sided: self.one_sided || other.one_sided,
            real_owners: self.real_owners || other.real_owners,
        }
    }

    /// Exactly `{both}` / exactly `{one-sided}` / anything else.
    pub fn classify(self) -> Classification {
        match (self.both, self.one_sided, self.real_owners) {
            (true, false, false) => Classification::TagsBothEnds,
            (false, true, false) => Classification::TagsOneEnd,
            _ => Classification::Mixed,
        }
    }
}

/// Confidence for a known-owner row. `raw_tags_both_ends` only matters for variant 2.
pub fn known_confidence(variant: VariantNo, raw_tags_both_ends: bool) -> Confidence {
    match variant {
        VariantNo::V1 => Confidence::V1_KNOWN,
        VariantNo::V2 if raw_tags_both_ends => Confidence::V2_TAGS_BOTH,
        VariantNo::V2 => Confidence::V2_TAGS_OTHER,
        VariantNo::V3 => Confidence::V3_KNOWN,
    }
}

/// Confidence for the `UNKNOWN` residual row.
pub fn unknown_confidence(variant: VariantNo) -> Confidence {
    match variant {
        VariantNo::V1 => Confidence::V1_UNKNOWN,
        VariantNo::V2 => Confidence::V2_UNKNOWN,
        VariantNo::V3 => Confidence::V3_UNKNOWN,
    }
}
