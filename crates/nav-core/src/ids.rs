//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys without
//! ceremony.  `ObjectId` names a world object (creature, door, player);
//! `CellId` is the full 32-bit cell identifier carried by every position and
//! `RegionKey` is the landblock part of it, the unit of surface caching.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Identifier of a world object.  Navigators refer to their tracked
    /// target by this id only and resolve it through the world every tick.
    pub struct ObjectId(u32);
}

// ── CellId / RegionKey ────────────────────────────────────────────────────────

/// Mask selecting the landblock half of a cell identifier.
pub const REGION_MASK: u32 = 0xFFFF_0000;

/// Full cell identifier: landblock in the high 16 bits, cell index in the low.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellId(pub u32);

impl CellId {
    /// The region (landblock) this cell belongs to.
    #[inline]
    pub fn region(self) -> RegionKey {
        RegionKey(self.0 & REGION_MASK)
    }

    /// Low 16 bits.
    #[inline]
    pub fn cell_index(self) -> u16 {
        (self.0 & !REGION_MASK) as u16
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Region cache key, always a masked [`CellId`] (low 16 bits zero).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionKey(u32);

impl RegionKey {
    /// Build a key from any cell or landblock identifier; the low half is
    /// discarded.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        RegionKey(raw & REGION_MASK)
    }

    /// Landblock from its 16-bit `xxyy` id, e.g. `0xA9B4` → `0xA9B40000`.
    #[inline]
    pub const fn from_landblock(landblock: u16) -> Self {
        RegionKey((landblock as u32) << 16)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// File stem used by persisted surfaces: eight upper-case hex digits.
    pub fn file_stem(self) -> String {
        format!("{:08X}", self.0)
    }
}

impl From<CellId> for RegionKey {
    fn from(cell: CellId) -> Self {
        cell.region()
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}
