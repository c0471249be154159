// SPDX-License-Identifier: Apache-2.0
//! Identifier newtypes.
//!
//! Block and item ids are small positive integers scoped to their container;
//! `0` is the wire sentinel for "no target" (program end at the block level,
//! fall-through at the item level). Dedicated wrappers keep the three id
//! spaces from being mixed up; serialization stays a bare integer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a stored program, valid in `[1, 65535)`.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramId(pub u16);

impl ProgramId {
    /// Smallest allocatable id.
    pub const MIN: Self = Self(1);
    /// Largest allocatable id (the range end `65535` is exclusive).
    pub const MAX: Self = Self(u16::MAX - 1);
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a block, unique within its program. `0` is the end
/// sentinel and never names a block.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u32);

impl BlockId {
    /// "Program end" sentinel.
    pub const END: Self = Self(0);

    /// Returns `true` for the end sentinel.
    #[must_use]
    pub fn is_end(self) -> bool {
        self == Self::END
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of an item, unique within its block. `0` is the
/// fall-through sentinel and never names an item.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl ItemId {
    /// "Fall through to the owning block" sentinel.
    pub const END: Self = Self(0);

    /// Returns `true` for the fall-through sentinel.
    #[must_use]
    pub fn is_end(self) -> bool {
        self == Self::END
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
