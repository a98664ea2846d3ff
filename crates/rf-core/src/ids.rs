use core::fmt;
use core::num::NonZeroU32;

/// Compact identifier for an entity stored in a dense arena.
///
/// Ids are dense: a circuit with `n` nodes uses exactly the ids `0..n`.
/// Removing an entity relabels the holder of the largest id down to the
/// freed slot, so an id is only meaningful until the next removal.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Id(NonZeroU32);

impl Id {
    /// Create an Id from a 0-based index by storing index+1.
    ///
    /// Panics if `index == u32::MAX`; arenas never grow that large.
    pub fn from_index(index: u32) -> Self {
        match NonZeroU32::new(index.wrapping_add(1)) {
            Some(v) => Self(v),
            None => panic!("id index overflow"),
        }
    }

    /// Create an Id from a `usize` slot position.
    ///
    /// Panics if `index` does not fit below `u32::MAX`, like `from_index`.
    pub fn from_usize(index: usize) -> Self {
        match u32::try_from(index) {
            Ok(index) => Self::from_index(index),
            Err(_) => panic!("id index overflow"),
        }
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    /// Recover the 0-based index as a slot position.
    pub fn slot(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Domain-specific ID aliases for clarity (no runtime cost).
pub type NodeId = Id;
pub type ChannelId = Id;
