//! Identity types for the node graph.
//!
//! Handles pack a slot index (low 12 bits) and a generation counter (high 20
//! bits) into a `u32`. Slot indices are reused after destruction; the
//! generation is bumped on every reuse so a stale handle never resolves to
//! the operator that later took its slot.

use std::fmt;

const INDEX_BITS: u32 = 12;
const INDEX_MASK: u32 = (1 << INDEX_BITS) - 1;
const GENERATION_MASK: u32 = (1 << (32 - INDEX_BITS)) - 1;

/// Largest table capacity a handle can address. Index `INDEX_MASK` is never
/// issued so that `u32::MAX` stays free for the invalid sentinel.
pub const MAX_TABLE_CAPACITY: usize = INDEX_MASK as usize;

#[inline]
const fn pack(index: u32, generation: u32) -> u32 {
    ((generation & GENERATION_MASK) << INDEX_BITS) | (index & INDEX_MASK)
}

/// Next generation value, wrapping inside the 20-bit field.
#[inline]
pub(crate) const fn next_generation(generation: u32) -> u32 {
    generation.wrapping_add(1) & GENERATION_MASK
}

/// Handles that can address a [`SlotTable`](super::arena::SlotTable).
pub trait TableHandle: Copy + Eq {
    fn from_parts(index: usize, generation: u32) -> Self;
    fn index(self) -> usize;
    fn generation(self) -> u32;
}

/// Handle to a live operator in a `NodeSystem`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const INVALID: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl TableHandle for NodeId {
    fn from_parts(index: usize, generation: u32) -> Self {
        debug_assert!(index < MAX_TABLE_CAPACITY);
        NodeId(pack(index as u32, generation))
    }

    #[inline]
    fn index(self) -> usize {
        (self.0 & INDEX_MASK) as usize
    }

    #[inline]
    fn generation(self) -> u32 {
        self.0 >> INDEX_BITS
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "NodeId(INVALID)")
        } else {
            write!(f, "NodeId({}v{})", self.index(), self.generation())
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Handle to a live connection in a `NodeSystem`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u32);

impl ConnectionId {
    pub const INVALID: ConnectionId = ConnectionId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl TableHandle for ConnectionId {
    fn from_parts(index: usize, generation: u32) -> Self {
        debug_assert!(index < MAX_TABLE_CAPACITY);
        ConnectionId(pack(index as u32, generation))
    }

    #[inline]
    fn index(self) -> usize {
        (self.0 & INDEX_MASK) as usize
    }

    #[inline]
    fn generation(self) -> u32 {
        self.0 >> INDEX_BITS
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "ConnectionId(INVALID)")
        } else {
            write!(f, "ConnectionId({}v{})", self.index(), self.generation())
        }
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
