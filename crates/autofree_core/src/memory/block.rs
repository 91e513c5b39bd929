//! # Backing-Block Chain
//!
//! Owned list of buffers obtained from the policy, newest first.

use std::ops::Range;

use crate::policy::AllocationPolicy;

/// Position of a block in its arena's chain.
///
/// Ids count up from the oldest block, so a larger id is a newer block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    /// Returns the raw chain index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// What a block was acquired for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// Configured capacity, carved by the bump cursor.
    Standard,
    /// Sized exactly to one request, never carved.
    Oversized,
}

#[derive(Debug)]
struct Block {
    /// The block that was head before this one was linked.
    prev: Option<BlockId>,
    kind: BlockKind,
    buffer: Box<[u8]>,
}

/// The arena's blocks.
///
/// The last element is the chain head. Only [`BlockChain::link`] adds
/// blocks and only [`BlockChain::release_into`] removes them.
#[derive(Debug, Default)]
pub(crate) struct BlockChain {
    blocks: Vec<Block>,
}

impl BlockChain {
    pub(crate) const fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Newest block, if any.
    #[inline]
    pub(crate) fn head(&self) -> Option<BlockId> {
        self.blocks.len().checked_sub(1).map(BlockId)
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Links `buffer` in as the new head and returns its id.
    pub(crate) fn link(&mut self, kind: BlockKind, buffer: Box<[u8]>) -> BlockId {
        let prev = self.head();
        self.blocks.push(Block { prev, kind, buffer });
        BlockId(self.blocks.len() - 1)
    }

    pub(crate) fn slice(&self, id: BlockId, range: Range<usize>) -> Option<&[u8]> {
        self.blocks.get(id.0)?.buffer.get(range)
    }

    pub(crate) fn slice_mut(&mut self, id: BlockId, range: Range<usize>) -> Option<&mut [u8]> {
        self.blocks.get_mut(id.0)?.buffer.get_mut(range)
    }

    pub(crate) fn kind(&self, id: BlockId) -> Option<BlockKind> {
        self.blocks.get(id.0).map(|b| b.kind)
    }

    /// Counts (standard blocks, oversized blocks, reserved bytes).
    pub(crate) fn census(&self) -> (usize, usize, usize) {
        self.blocks
            .iter()
            .fold((0, 0, 0), |(standard, oversized, bytes), block| match block.kind {
                BlockKind::Standard => (standard + 1, oversized, bytes + block.buffer.len()),
                BlockKind::Oversized => (standard, oversized + 1, bytes + block.buffer.len()),
            })
    }

    /// Walks the chain from the head and hands every buffer back to `policy`.
    ///
    /// Returns the number of blocks released.
    pub(crate) fn release_into<P: AllocationPolicy>(&mut self, policy: &mut P) -> usize {
        let mut released = 0;
        while let Some(block) = self.blocks.pop() {
            debug_assert_eq!(block.prev, self.head(), "block chain link broken");
            policy.deallocate(block.buffer);
            released += 1;
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{CountingPolicy, SystemPolicy};

    #[test]
    fn test_link_moves_head() {
        let mut chain = BlockChain::new();
        assert!(chain.head().is_none());

        let a = chain.link(BlockKind::Standard, vec![0u8; 8].into_boxed_slice());
        let b = chain.link(BlockKind::Oversized, vec![0u8; 32].into_boxed_slice());

        assert_eq!(chain.head(), Some(b));
        assert!(b > a);
        assert_eq!(chain.blocks[b.index()].prev, Some(a));
        assert_eq!(chain.kind(b), Some(BlockKind::Oversized));
        assert_eq!(chain.census(), (1, 1, 40));
    }

    #[test]
    fn test_slice_bounds() {
        let mut chain = BlockChain::new();
        let id = chain.link(BlockKind::Standard, vec![0u8; 8].into_boxed_slice());

        chain.slice_mut(id, 2..4).unwrap().copy_from_slice(&[7, 9]);
        assert_eq!(chain.slice(id, 0..8).unwrap(), &[0, 0, 7, 9, 0, 0, 0, 0]);
        assert!(chain.slice(id, 4..9).is_none());
        assert!(chain.slice(BlockId(3), 0..1).is_none());
    }

    #[test]
    fn test_release_returns_every_block() {
        let mut policy = CountingPolicy::new(SystemPolicy);
        let mut chain = BlockChain::new();
        for size in [16, 16, 100] {
            let buffer = policy.allocate(size).unwrap();
            chain.link(BlockKind::Standard, buffer);
        }

        assert_eq!(chain.release_into(&mut policy), 3);
        assert!(chain.is_empty());
        assert_eq!(policy.stats().releases, 3);
        assert_eq!(policy.stats().outstanding_bytes, 0);
    }
}
