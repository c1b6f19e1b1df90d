//! Newtypes and parsers for direction / well / owner identifiers.
//!
//! Every id is a strictly positive integer. The storage layer hands us signed
//! integers, so the fallible constructors accept `i64` as well and reject
//! anything `<= 0`.

use crate::errors::CoreError;
use core::fmt;
use core::num::NonZeroU64;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! def_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "serde", serde(try_from = "u64", into = "u64"))]
        pub struct $name(NonZeroU64);

        impl $name {
            /// `None` for zero.
            #[inline]
            pub const fn new(raw: u64) -> Option<Self> {
                match NonZeroU64::new(raw) {
                    Some(v) => Some(Self(v)),
                    None => None,
                }
            }

            #[inline]
            pub const fn get(self) -> u64 { self.0.get() }
        }

        impl TryFrom<u64> for $name {
            type Error = CoreError;
            fn try_from(raw: u64) -> Result<Self, Self::Error> {
                Self::new(raw).ok_or(CoreError::InvalidId)
            }
        }

        impl TryFrom<i64> for $name {
            type Error = CoreError;
            fn try_from(raw: i64) -> Result<Self, Self::Error> {
                if raw <= 0 { return Err(CoreError::InvalidId); }
                Self::try_from(raw as u64)
            }
        }

        impl From<$name> for u64 {
            #[inline]
            fn from(id: $name) -> u64 { id.get() }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw: u64 = s.trim().parse().map_err(|_| CoreError::InvalidId)?;
                Self::try_from(raw)
            }
        }
    };
}

def_id!(
    /// Duct direction (graph edge) id.
    DirectionId
);
def_id!(
    /// Well (graph node) id.
    WellId
);
def_id!(
    /// Cable owner id.
    OwnerId
);

/// Owner slot of an allocation: a concrete owner, or "no evidence could decide".
///
/// Ordering puts every `Known` owner (ascending id) before `Unknown`, which is
/// also the canonical row order of a scenario.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum OwnerRef {
    Known(OwnerId),
    Unknown,
}

impl OwnerRef {
    #[inline]
    pub fn known(self) -> Option<OwnerId> {
        match self {
            OwnerRef::Known(o) => Some(o),
            OwnerRef::Unknown => None,
        }
    }

    #[inline]
    pub fn is_unknown(self) -> bool { matches!(self, OwnerRef::Unknown) }

    /// Stable map key used in JSON objects (`"<id>"` or `"unknown"`).
    pub fn wire_key(self) -> alloc::string::String {
        use alloc::string::ToString;
        match self {
            OwnerRef::Known(o) => o.to_string(),
            OwnerRef::Unknown => "unknown".to_string(),
        }
    }
}

impl From<OwnerId> for OwnerRef {
    #[inline]
    fn from(o: OwnerId) -> Self { OwnerRef::Known(o) }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerRef::Known(o) => write!(f, "{o}"),
            OwnerRef::Unknown => f.write_str("unknown"),
        }
    }
}

// Known → number, Unknown → null (the row `owner_id` column is nullable).
#[cfg(feature = "serde")]
impl Serialize for OwnerRef {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            OwnerRef::Known(o) => s.serialize_some(&o.get()),
            OwnerRef::Unknown => s.serialize_none(),
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for OwnerRef {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw: Option<u64> = Option::deserialize(d)?;
        match raw {
            None => Ok(OwnerRef::Unknown),
            Some(v) => OwnerId::try_from(v)
                .map(OwnerRef::Known)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive() {
        assert!(WellId::new(0).is_none());
        assert_eq!(OwnerId::try_from(-3i64), Err(CoreError::InvalidId));
        assert_eq!(DirectionId::try_from(0i64), Err(CoreError::InvalidId));
        assert_eq!("7".parse::<WellId>().map(WellId::get), Ok(7));
        assert!("x".parse::<WellId>().is_err());
    }

    #[test]
    fn unknown_sorts_after_every_known_owner() {
        let mut v = vec![
            OwnerRef::Unknown,
            OwnerRef::Known(OwnerId::new(11).unwrap()),
            OwnerRef::Known(OwnerId::new(2).unwrap()),
        ];
        v.sort();
        assert_eq!(v[0], OwnerRef::Known(OwnerId::new(2).unwrap()));
        assert_eq!(v[1], OwnerRef::Known(OwnerId::new(11).unwrap()));
        assert!(v[2].is_unknown());
        assert_eq!(v[2].wire_key(), "unknown");
        assert_eq!(v[1].wire_key(), "11");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn owner_ref_serializes_as_nullable_number() {
        let k = OwnerRef::Known(OwnerId::new(4).unwrap());
        assert_eq!(serde_json::to_string(&k).unwrap(), "4");
        assert_eq!(serde_json::to_string(&OwnerRef::Unknown).unwrap(), "null");
        let back: OwnerRef = serde_json::from_str("null").unwrap();
        assert!(back.is_unknown());
        assert!(serde_json::from_str::<OwnerRef>("0").is_err());
    }
}
