//! # Pool Policy
//!
//! Fixed-budget block source that recycles buffers returned by arenas.

use tracing::debug;

use super::{zeroed_buffer, AllocationPolicy};
use crate::error::{ArenaError, ArenaResult};

/// A fixed memory pool for arena blocks.
///
/// The pool never holds more than `budget` bytes, counting both buffers
/// lent to an arena and buffers parked on the free list. Returned buffers
/// are kept and handed out again for requests of the same length.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. Use one pool per arena.
///
/// # Example
///
/// ```rust,ignore
/// // Eight standard blocks, pre-allocated.
/// let pool = PoolPolicy::with_blocks(2048, 8)?;
/// let mut arena = Arena::with_policy(pool);
///
/// arena.allocate(128)?; // reuses a pooled block
/// arena.clear();        // block goes back to the free list
/// ```
#[derive(Debug)]
pub struct PoolPolicy {
    /// Buffers returned by the arena, ready for reuse.
    free_list: Vec<Box<[u8]>>,
    /// Maximum bytes the pool may hold.
    budget: usize,
    /// Bytes currently lent out.
    outstanding: usize,
    /// Bytes parked on the free list.
    pooled: usize,
}

impl PoolPolicy {
    /// Creates an empty pool that may hold up to `budget` bytes.
    #[must_use]
    pub const fn new(budget: usize) -> Self {
        Self {
            free_list: Vec::new(),
            budget,
            outstanding: 0,
            pooled: 0,
        }
    }

    /// Creates a pool with `count` buffers of `block_size` bytes allocated upfront.
    ///
    /// The budget is exactly `block_size * count`.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::OutOfMemory`] if the upfront allocation fails.
    pub fn with_blocks(block_size: usize, count: usize) -> ArenaResult<Self> {
        let budget = block_size
            .checked_mul(count)
            .ok_or(ArenaError::OutOfMemory {
                requested: usize::MAX,
            })?;

        let mut free_list = Vec::with_capacity(count);
        for _ in 0..count {
            free_list.push(zeroed_buffer(block_size)?);
        }

        Ok(Self {
            free_list,
            budget,
            outstanding: 0,
            pooled: budget,
        })
    }

    /// Returns the byte budget.
    #[inline]
    #[must_use]
    pub const fn budget(&self) -> usize {
        self.budget
    }

    /// Returns the bytes currently lent out.
    #[inline]
    #[must_use]
    pub const fn outstanding_bytes(&self) -> usize {
        self.outstanding
    }

    /// Returns the bytes parked on the free list.
    #[inline]
    #[must_use]
    pub const fn pooled_bytes(&self) -> usize {
        self.pooled
    }

    /// Returns the number of buffers on the free list.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Returns how many more bytes could be lent out.
    #[inline]
    #[must_use]
    pub const fn available(&self) -> usize {
        self.budget - self.outstanding
    }

    /// Drops parked buffers until `needed` more bytes fit in the budget.
    fn evict_for(&mut self, needed: usize) {
        while self.outstanding + self.pooled + needed > self.budget {
            let Some(buffer) = self.free_list.pop() else {
                break;
            };
            self.pooled -= buffer.len();
        }
    }
}

impl AllocationPolicy for PoolPolicy {
    fn allocate(&mut self, byte_count: usize) -> ArenaResult<Box<[u8]>> {
        if let Some(index) = self.free_list.iter().position(|b| b.len() == byte_count) {
            let mut buffer = self.free_list.swap_remove(index);
            buffer.fill(0);
            self.pooled -= byte_count;
            self.outstanding += byte_count;
            return Ok(buffer);
        }

        if byte_count > self.available() {
            return Err(ArenaError::OutOfMemory {
                requested: byte_count,
            });
        }

        self.evict_for(byte_count);
        let buffer = zeroed_buffer(byte_count)?;
        self.outstanding += byte_count;
        debug!(
            bytes = byte_count,
            outstanding = self.outstanding,
            budget = self.budget,
            "pool grew"
        );
        Ok(buffer)
    }

    fn deallocate(&mut self, memory: Box<[u8]>) {
        self.outstanding -= memory.len();
        self.pooled += memory.len();
        self.free_list.push(memory);
    }
}
