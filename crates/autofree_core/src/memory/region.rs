//! # Region Handles
//!
//! Non-owning handles to bytes handed out by an arena.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Range;

use bytemuck::Pod;

use super::block::BlockId;

/// A run of bytes allocated from an [`crate::Arena`].
///
/// A region is a handle, not a borrow: read and write it through
/// [`crate::Arena::bytes`] and [`crate::Arena::bytes_mut`]. It stays valid
/// until the arena that issued it is cleared; after that every accessor
/// rejects it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    pub(crate) epoch: u64,
    pub(crate) block: Option<BlockId>,
    pub(crate) offset: usize,
    pub(crate) len: usize,
}

impl Region {
    /// Number of bytes in the region.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the region holds zero bytes.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Block the bytes live in. `None` only for a zero-length region
    /// issued before the arena held any block.
    #[inline]
    #[must_use]
    pub const fn block(&self) -> Option<BlockId> {
        self.block
    }

    /// Offset of the first byte within its block.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Byte range within its block.
    #[inline]
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }

    /// Whether the two regions share at least one byte.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.epoch == other.epoch
            && self.block == other.block
            && self.offset < other.offset + other.len
            && other.offset < self.offset + self.len
    }

    /// The part of this region after its first `skip` bytes.
    pub(crate) const fn tail(self, skip: usize) -> Self {
        Self {
            epoch: self.epoch,
            block: self.block,
            offset: self.offset + skip,
            len: self.len - skip,
        }
    }
}

/// A [`Region`] holding one value of type `T`.
pub struct Typed<T> {
    region: Region,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Pod> Typed<T> {
    pub(crate) const fn new(region: Region) -> Self {
        Self {
            region,
            _marker: PhantomData,
        }
    }

    /// The untyped bytes behind this handle.
    #[inline]
    #[must_use]
    pub const fn region(&self) -> Region {
        self.region
    }
}

impl<T> Clone for Typed<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Typed<T> {}

impl<T> PartialEq for Typed<T> {
    fn eq(&self, other: &Self) -> bool {
        self.region == other.region
    }
}

impl<T> Eq for Typed<T> {}

impl<T> fmt::Debug for Typed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Typed")
            .field("type", &std::any::type_name::<T>())
            .field("region", &self.region)
            .finish()
    }
}
