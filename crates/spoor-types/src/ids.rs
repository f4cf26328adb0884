//! Typed ID newtypes for the store's index spaces.
//!
//! Each type is `#[repr(transparent)]` + `Copy`, so wrapping a raw
//! primitive costs nothing at runtime while the compiler keeps the three
//! integer spaces from mixing.

use std::fmt;

// ---------------------------------------------------------------------------
// FieldId
// ---------------------------------------------------------------------------

/// Store-local field id (u32).
///
/// Field 0 is the implicit `time` column; declared data fields are
/// 1-indexed. The id space itself is 0-indexed — both conventions are
/// load-bearing and kept separate on purpose.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct FieldId(pub u32);

impl FieldId {
    /// The implicit leading `time` column.
    pub const TIME: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn from_u32(v: u32) -> Self {
        Self(v)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// TrailId
// ---------------------------------------------------------------------------

/// Dense, store-assigned trail index in `[0, num_trails)`.
///
/// Stable only within one store instance; assigned at finalize/open time,
/// never chosen by the caller.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct TrailId(pub u64);

impl TrailId {
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn from_u64(v: u64) -> Self {
        Self(v)
    }
}

impl fmt::Display for TrailId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrailId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ValueIndex
// ---------------------------------------------------------------------------

/// Index of one distinct string value in a field's lexicon.
///
/// Index 0 is reserved for "empty/absent value"; enumerable values start
/// at 1.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct ValueIndex(pub u64);

impl ValueIndex {
    /// Sentinel for an empty or absent value (0).
    pub const ABSENT: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn from_u64(v: u64) -> Self {
        Self(v)
    }

    /// Returns `true` for the reserved absent-value sentinel.
    #[inline]
    #[must_use]
    pub const fn is_absent(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ValueIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueIndex({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// FieldRef
// ---------------------------------------------------------------------------

/// A field named either by id or by name.
///
/// Lookup APIs accept `impl Into<FieldRef>`, so call sites pass a
/// `FieldId`, a `u32`, or a `&str` directly; ids pass through resolution
/// unchanged.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldRef<'a> {
    Id(FieldId),
    Name(&'a str),
}

impl From<FieldId> for FieldRef<'_> {
    fn from(id: FieldId) -> Self {
        Self::Id(id)
    }
}

impl From<u32> for FieldRef<'_> {
    fn from(id: u32) -> Self {
        Self::Id(FieldId(id))
    }
}

impl<'a> From<&'a str> for FieldRef<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}
