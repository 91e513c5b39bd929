//! # Bump Cursor
//!
//! The free `[begin, end)` window of the active standard block.
//! Allocation moves `end` down toward `begin`.

use super::block::BlockId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cursor {
    block: Option<BlockId>,
    begin: usize,
    end: usize,
}

impl Cursor {
    /// Window of a fresh or cleared arena.
    pub(crate) const EMPTY: Self = Self {
        block: None,
        begin: 0,
        end: 0,
    };

    #[inline]
    pub(crate) const fn block(&self) -> Option<BlockId> {
        self.block
    }

    #[inline]
    pub(crate) const fn remaining(&self) -> usize {
        self.end - self.begin
    }

    /// Takes `size` bytes off the top of the window.
    ///
    /// Returns the block and offset of the carved bytes, or `None` if the
    /// window is too small.
    #[inline]
    pub(crate) fn carve(&mut self, size: usize) -> Option<(Option<BlockId>, usize)> {
        if self.remaining() < size {
            return None;
        }
        self.end -= size;
        Some((self.block, self.end))
    }

    /// Points the window at a fresh block of `capacity` bytes and carves
    /// `size` bytes from it.
    pub(crate) fn restart(&mut self, block: BlockId, capacity: usize, size: usize) -> usize {
        debug_assert!(size <= capacity);
        self.block = Some(block);
        self.begin = 0;
        self.end = capacity - size;
        self.end
    }
}
