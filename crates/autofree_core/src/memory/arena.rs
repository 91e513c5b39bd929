//! # Arena Allocator
//!
//! A region allocator: many short-lived allocations are carved out of large
//! blocks and everything is freed at once.
//!
//! ```text
//!   head (newest)                                   oldest
//!   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!   │  oversized   │──▶│ standard #1  │──▶│ standard #0  │
//!   └──────────────┘   └──────┬───────┘   └──────────────┘
//!                             │
//!                   cursor: [begin ─── free ─── end)[ used ]
//! ```
//!
//! Standard requests bump `end` down inside the active block. Requests of
//! at least one block's capacity get a dedicated block that becomes the new
//! chain head while the cursor stays where it was.

use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::Pod;
use tracing::{debug, trace, warn};

use super::block::{BlockChain, BlockId, BlockKind};
use super::cursor::Cursor;
use super::destructor::{DestructorChain, EntryHeader, ENTRY_HEADER_SIZE};
use super::region::{Region, Typed};
use crate::config::ArenaConfig;
use crate::error::{ArenaError, ArenaResult};
use crate::policy::{AllocationPolicy, SystemPolicy};
use crate::stats::ArenaStats;

/// Source of arena epochs. Every arena and every clear gets a fresh one,
/// so a [`Region`] can never be mistaken for memory it does not describe.
static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

fn next_epoch() -> u64 {
    NEXT_EPOCH.fetch_add(1, Ordering::Relaxed)
}

/// A bump-pointer region allocator with cleanup support.
///
/// Allocations are fast (just bump a pointer). Memory is freed all at once
/// when the arena is cleared or dropped, after every registered cleanup
/// action has run, newest first.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. Use one arena per thread.
///
/// # Example
///
/// ```rust,ignore
/// let mut arena = Arena::new();
///
/// // Fast allocations
/// let scratch = arena.allocate(256)?;
/// arena.bytes_mut(scratch).unwrap().fill(0xFF);
///
/// // Cleanup runs when the arena is cleared
/// arena.allocate_with_cleanup(64, |bytes| flush(bytes))?;
/// arena.clear();
/// ```
pub struct Arena<P: AllocationPolicy = SystemPolicy> {
    /// Free window of the active standard block.
    cursor: Cursor,
    /// Every block held, newest first.
    blocks: BlockChain,
    /// Pending cleanup actions, newest first.
    destructors: DestructorChain,
    /// Where blocks come from and go back to.
    policy: P,
    config: ArenaConfig,
    /// Regions from other epochs are rejected.
    epoch: u64,
    /// Bytes handed out since the last clear.
    allocated: usize,
}

impl Arena<SystemPolicy> {
    /// Creates an empty arena with the default configuration, backed by the
    /// global allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(SystemPolicy)
    }
}

impl<P: AllocationPolicy + Default> Default for Arena<P> {
    fn default() -> Self {
        Self::with_policy(P::default())
    }
}

impl<P: AllocationPolicy + Default> Arena<P> {
    /// Creates an empty arena with `config` and a default-constructed policy.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] if the config fails validation.
    pub fn with_config(config: ArenaConfig) -> ArenaResult<Self> {
        Self::with_config_and_policy(config, P::default())
    }
}

impl<P: AllocationPolicy> Arena<P> {
    /// Creates an empty arena with the default configuration and `policy`.
    #[must_use]
    pub fn with_policy(policy: P) -> Self {
        Self::build(ArenaConfig::default(), policy)
    }

    /// Creates an empty arena with `config` and `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] if the config fails validation.
    pub fn with_config_and_policy(config: ArenaConfig, policy: P) -> ArenaResult<Self> {
        config.validate()?;
        Ok(Self::build(config, policy))
    }

    fn build(config: ArenaConfig, policy: P) -> Self {
        Self {
            cursor: Cursor::EMPTY,
            blocks: BlockChain::new(),
            destructors: DestructorChain::new(),
            policy,
            config,
            epoch: next_epoch(),
            allocated: 0,
        }
    }

    /// Returns the configuration this arena was built with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Returns the allocation policy.
    #[inline]
    #[must_use]
    pub const fn policy(&self) -> &P {
        &self.policy
    }

    /// Returns the bytes left in the active block's window.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Returns the block the cursor is carving from.
    #[inline]
    #[must_use]
    pub const fn active_block(&self) -> Option<BlockId> {
        self.cursor.block()
    }

    /// Returns the newest block in the chain.
    #[inline]
    #[must_use]
    pub fn head_block(&self) -> Option<BlockId> {
        self.blocks.head()
    }

    /// Returns what `block` was acquired for, if this arena holds it.
    #[must_use]
    pub fn block_kind(&self, block: BlockId) -> Option<BlockKind> {
        self.blocks.kind(block)
    }

    /// Whether the arena holds no blocks and no pending cleanups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.destructors.is_empty()
    }

    /// Whether `region` was issued by this arena since its last clear.
    #[inline]
    #[must_use]
    pub const fn owns(&self, region: Region) -> bool {
        region.epoch == self.epoch
    }

    /// Returns a snapshot of the arena's usage.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        let (standard_blocks, oversized_blocks, reserved_bytes) = self.blocks.census();
        ArenaStats {
            standard_blocks,
            oversized_blocks,
            reserved_bytes,
            allocated_bytes: self.allocated,
            pending_cleanups: self.destructors.len(),
        }
    }

    /// Allocates `size` zeroed bytes that stay valid until the next clear.
    ///
    /// Served from the active block when it has room. Otherwise a new
    /// standard block is acquired, or a dedicated block when `size` is at
    /// least the configured block capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::OutOfMemory`] if the policy cannot supply a
    /// block. The arena is left exactly as it was.
    pub fn allocate(&mut self, size: usize) -> ArenaResult<Region> {
        if let Some((block, offset)) = self.cursor.carve(size) {
            return Ok(self.issue(block, offset, size));
        }

        let capacity = self.config.block_capacity;
        if size >= capacity {
            return self.allocate_oversized(size);
        }

        let buffer = self.acquire(capacity)?;
        let block = self.blocks.link(BlockKind::Standard, buffer);
        let offset = self.cursor.restart(block, capacity, size);
        debug!(
            block = block.index(),
            capacity,
            "acquired standard block"
        );
        Ok(self.issue(Some(block), offset, size))
    }

    /// Gives `size` its own block, linked as the new head. The cursor keeps
    /// carving from whatever standard block was active before.
    fn allocate_oversized(&mut self, size: usize) -> ArenaResult<Region> {
        let buffer = self.acquire(size)?;
        let block = self.blocks.link(BlockKind::Oversized, buffer);
        debug!(block = block.index(), size, "acquired oversized block");
        Ok(self.issue(Some(block), 0, size))
    }

    fn acquire(&mut self, byte_count: usize) -> ArenaResult<Box<[u8]>> {
        let buffer = self.policy.allocate(byte_count).map_err(|err| {
            warn!(requested = byte_count, "policy out of memory");
            err
        })?;
        debug_assert_eq!(buffer.len(), byte_count, "policy returned a short block");
        Ok(buffer)
    }

    fn issue(&mut self, block: Option<BlockId>, offset: usize, len: usize) -> Region {
        self.allocated += len;
        Region {
            epoch: self.epoch,
            block,
            offset,
            len,
        }
    }

    /// Allocates `size` bytes and registers `cleanup` to run on them when
    /// the arena is cleared.
    ///
    /// Cleanups run exactly once, newest first, before any block is
    /// released.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::OutOfMemory`] if the policy cannot supply a
    /// block. Nothing is registered in that case.
    pub fn allocate_with_cleanup<F>(&mut self, size: usize, cleanup: F) -> ArenaResult<Region>
    where
        F: FnOnce(&mut [u8]) + 'static,
    {
        let total = ENTRY_HEADER_SIZE
            .checked_add(size)
            .ok_or(ArenaError::OutOfMemory {
                requested: usize::MAX,
            })?;
        let frame = self.allocate(total)?;

        let header = self.destructors.next_header(size);
        if let Some(bytes) = self.bytes_mut(frame) {
            bytes[..ENTRY_HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(&header));
        }
        self.destructors.push(frame, Box::new(cleanup));
        trace!(size, pending = self.destructors.len(), "registered cleanup");

        Ok(frame.tail(ENTRY_HEADER_SIZE))
    }

    /// Allocates room for `value` and stores it.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::OutOfMemory`] if the policy cannot supply a block.
    pub fn alloc_pod<T: Pod>(&mut self, value: T) -> ArenaResult<Typed<T>> {
        let region = self.allocate(std::mem::size_of::<T>())?;
        let handle = Typed::new(region);
        self.write(handle, value);
        Ok(handle)
    }

    /// Stores `value` and registers `cleanup` to receive its final contents
    /// when the arena is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::OutOfMemory`] if the policy cannot supply a block.
    pub fn alloc_pod_with_cleanup<T, F>(&mut self, value: T, cleanup: F) -> ArenaResult<Typed<T>>
    where
        T: Pod,
        F: FnOnce(T) + 'static,
    {
        let region = self.allocate_with_cleanup(std::mem::size_of::<T>(), move |bytes| {
            cleanup(bytemuck::pod_read_unaligned(bytes));
        })?;
        let handle = Typed::new(region);
        self.write(handle, value);
        Ok(handle)
    }

    /// Copies `data` into a fresh region.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::OutOfMemory`] if the policy cannot supply a block.
    pub fn alloc_bytes(&mut self, data: &[u8]) -> ArenaResult<Region> {
        let region = self.allocate(data.len())?;
        if let Some(bytes) = self.bytes_mut(region) {
            bytes.copy_from_slice(data);
        }
        Ok(region)
    }

    /// Returns the bytes of `region`, or `None` if it was not issued by
    /// this arena since its last clear.
    #[must_use]
    pub fn bytes(&self, region: Region) -> Option<&[u8]> {
        if !self.owns(region) {
            return None;
        }
        match region.block {
            Some(block) => self.blocks.slice(block, region.range()),
            None => Some(<&[u8]>::default()),
        }
    }

    /// Mutable version of [`Arena::bytes`].
    #[must_use]
    pub fn bytes_mut(&mut self, region: Region) -> Option<&mut [u8]> {
        if !self.owns(region) {
            return None;
        }
        match region.block {
            Some(block) => self.blocks.slice_mut(block, region.range()),
            None => Some(<&mut [u8]>::default()),
        }
    }

    /// Reads the value behind `handle`, or `None` if the handle is stale.
    #[must_use]
    pub fn read<T: Pod>(&self, handle: Typed<T>) -> Option<T> {
        self.bytes(handle.region()).map(bytemuck::pod_read_unaligned)
    }

    /// Overwrites the value behind `handle`.
    ///
    /// Returns `false` if the handle is stale.
    pub fn write<T: Pod>(&mut self, handle: Typed<T>, value: T) -> bool {
        match self.bytes_mut(handle.region()) {
            Some(bytes) => {
                bytes.copy_from_slice(bytemuck::bytes_of(&value));
                true
            }
            None => false,
        }
    }

    /// Runs every pending cleanup newest first, returns every block to the
    /// policy and resets the arena to empty.
    ///
    /// All regions issued before the call become invalid.
    pub fn clear(&mut self) {
        let cleanups = self.destructors.len();
        while let Some(entry) = self.destructors.pop() {
            let Some(block) = entry.frame.block else {
                continue;
            };
            let Some(frame) = self.blocks.slice_mut(block, entry.frame.range()) else {
                continue;
            };
            let (header, payload) = frame.split_at_mut(ENTRY_HEADER_SIZE);
            let header: EntryHeader = bytemuck::pod_read_unaligned(header);
            debug_assert_eq!(header.prev, self.destructors.len() as u64);
            debug_assert_eq!(header.len, payload.len() as u64);
            (entry.cleanup)(payload);
        }

        let released = self.blocks.release_into(&mut self.policy);
        self.cursor = Cursor::EMPTY;
        self.allocated = 0;
        self.epoch = next_epoch();

        if cleanups > 0 || released > 0 {
            debug!(cleanups, blocks = released, "arena cleared");
        }
    }

    /// Exchanges the full state of two arenas: blocks, cursor, pending
    /// cleanups, policy and configuration. Regions follow their memory.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }
}

impl<P: AllocationPolicy> Drop for Arena<P> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<P: AllocationPolicy> std::fmt::Debug for Arena<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("config", &self.config)
            .field("cursor", &self.cursor)
            .field("head", &self.blocks.head())
            .field("destructors", &self.destructors)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{CountingPolicy, PoolPolicy};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn small_arena() -> Arena<CountingPolicy<SystemPolicy>> {
        Arena::with_config_and_policy(
            ArenaConfig::with_capacity(64),
            CountingPolicy::new(SystemPolicy),
        )
        .unwrap()
    }

    #[test]
    fn test_arena_allocation() {
        let mut arena = Arena::new();
        let region = arena.allocate(10).unwrap();
        assert_eq!(region.len(), 10);
        assert_eq!(arena.bytes(region).unwrap(), &[0u8; 10]);
        assert_eq!(arena.remaining(), 2048 - 10);
    }

    #[test]
    fn test_zero_size_needs_no_block() {
        let mut arena = small_arena();
        let region = arena.allocate(0).unwrap();
        assert!(region.is_empty());
        assert!(region.block().is_none());
        assert_eq!(arena.bytes(region).unwrap(), &[] as &[u8]);
        assert_eq!(arena.policy().stats().acquisitions, 0);
    }

    #[test]
    fn test_scenario_capacity_64() {
        let mut arena = small_arena();

        let first = arena.allocate(40).unwrap();
        let block_one = first.block().unwrap();
        assert_eq!(arena.remaining(), 24);

        let second = arena.allocate(40).unwrap();
        let block_two = second.block().unwrap();
        assert_ne!(block_one, block_two);
        assert_eq!(arena.policy().stats().acquisitions, 2);

        let big = arena.allocate(200).unwrap();
        assert_eq!(big.len(), 200);
        assert_eq!(arena.block_kind(big.block().unwrap()), Some(BlockKind::Oversized));
        assert_eq!(arena.head_block(), big.block());
        assert_eq!(arena.active_block(), Some(block_two));
        assert_eq!(arena.remaining(), 24);

        let small = arena.allocate(16).unwrap();
        assert_eq!(small.block(), Some(block_two));
        assert_eq!(arena.policy().stats().acquisitions, 3);

        let stats = arena.stats();
        assert_eq!(stats.standard_blocks, 2);
        assert_eq!(stats.oversized_blocks, 1);
        assert_eq!(stats.reserved_bytes, 64 + 64 + 200);
        assert_eq!(stats.allocated_bytes, 40 + 40 + 200 + 16);
    }

    #[test]
    fn test_oversized_first_allocation_keeps_cursor_empty() {
        let mut arena = small_arena();
        let big = arena.allocate(64).unwrap();
        assert_eq!(arena.block_kind(big.block().unwrap()), Some(BlockKind::Oversized));
        assert!(arena.active_block().is_none());

        let small = arena.allocate(8).unwrap();
        assert_eq!(arena.block_kind(small.block().unwrap()), Some(BlockKind::Standard));
        assert_eq!(arena.head_block(), small.block());
    }

    #[test]
    fn test_cleanup_runs_lifo() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut arena = small_arena();

        for name in ["a", "b", "c"] {
            let log = Rc::clone(&log);
            arena
                .allocate_with_cleanup(4, move |_| log.borrow_mut().push(name))
                .unwrap();
        }
        assert_eq!(arena.stats().pending_cleanups, 3);
        assert!(log.borrow().is_empty());

        arena.clear();
        assert_eq!(*log.borrow(), vec!["c", "b", "a"]);

        arena.clear();
        assert_eq!(log.borrow().len(), 3, "cleanups run exactly once");
    }

    #[test]
    fn test_cleanup_sees_payload() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut arena = small_arena();

        let sink = Rc::clone(&seen);
        let region = arena
            .allocate_with_cleanup(3, move |bytes| sink.borrow_mut().extend_from_slice(bytes))
            .unwrap();
        assert_eq!(region.len(), 3);
        arena.bytes_mut(region).unwrap().copy_from_slice(b"xyz");

        arena.clear();
        assert_eq!(&*seen.borrow(), b"xyz");
    }

    #[test]
    fn test_cleanup_framing_counts_against_window() {
        let mut arena = small_arena();
        arena.allocate_with_cleanup(8, |_| {}).unwrap();
        assert_eq!(arena.remaining(), 64 - ENTRY_HEADER_SIZE - 8);
        assert_eq!(arena.stats().allocated_bytes, ENTRY_HEADER_SIZE + 8);
    }

    #[test]
    fn test_pod_roundtrip_and_typed_cleanup() {
        let total = Rc::new(RefCell::new(0u64));
        let mut arena = Arena::new();

        let plain = arena.alloc_pod(7u32).unwrap();
        assert_eq!(arena.read(plain), Some(7));

        let sink = Rc::clone(&total);
        let counter = arena
            .alloc_pod_with_cleanup(1u64, move |v| *sink.borrow_mut() += v)
            .unwrap();
        assert!(arena.write(counter, 41));
        assert_eq!(arena.read(counter), Some(41));

        arena.clear();
        assert_eq!(*total.borrow(), 41);
        assert_eq!(arena.read(plain), None);
        assert!(!arena.write(counter, 1));
    }

    #[test]
    fn test_clear_invalidates_regions() {
        let mut arena = small_arena();
        let region = arena.alloc_bytes(b"hello").unwrap();
        assert!(arena.owns(region));
        assert_eq!(arena.bytes(region).unwrap(), b"hello");

        arena.clear();
        assert!(arena.is_empty());
        assert!(!arena.owns(region));
        assert!(arena.bytes(region).is_none());
        assert_eq!(arena.remaining(), 0);
        assert_eq!(arena.policy().stats().outstanding_blocks(), 0);

        arena.allocate(1).unwrap();
        assert_eq!(arena.policy().stats().acquisitions, 2);
    }

    #[test]
    fn test_out_of_memory_leaves_state_intact() {
        let mut arena =
            Arena::with_config_and_policy(ArenaConfig::with_capacity(64), PoolPolicy::new(100))
                .unwrap();

        let kept = arena.alloc_bytes(&[1; 40]).unwrap();
        let before = arena.stats();

        let err = arena.allocate(50).unwrap_err();
        assert_eq!(err, ArenaError::OutOfMemory { requested: 64 });
        let err = arena.allocate_with_cleanup(200, |_| {}).unwrap_err();
        assert_eq!(err, ArenaError::OutOfMemory { requested: 216 });

        assert_eq!(arena.stats(), before);
        assert_eq!(arena.remaining(), 24);
        assert_eq!(arena.bytes(kept).unwrap(), &[1; 40]);
        assert!(arena.allocate(24).is_ok());
    }

    #[test]
    fn test_swap_moves_everything() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut x = small_arena();
        let mut y = small_arena();

        let region = x.alloc_bytes(b"payload").unwrap();
        let sink = Rc::clone(&log);
        x.allocate_with_cleanup(1, move |_| sink.borrow_mut().push("x"))
            .unwrap();

        x.swap(&mut y);
        assert!(x.is_empty());
        assert!(x.bytes(region).is_none());
        assert_eq!(y.bytes(region).unwrap(), b"payload");
        assert_eq!(y.policy().stats().acquisitions, 1);
        assert_eq!(x.policy().stats().acquisitions, 0);

        drop(x);
        assert!(log.borrow().is_empty());
        drop(y);
        assert_eq!(*log.borrow(), vec!["x"]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = Arena::<SystemPolicy>::with_config(ArenaConfig::with_capacity(0));
        assert!(matches!(result, Err(ArenaError::InvalidConfig(_))));
    }
}
