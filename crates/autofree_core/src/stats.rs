//! # Allocation Statistics
//!
//! Point-in-time snapshots for arenas and policies.

/// Snapshot of an arena's block chain and destructor chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Standard-capacity blocks currently held.
    pub standard_blocks: usize,
    /// Dedicated oversized blocks currently held.
    pub oversized_blocks: usize,
    /// Bytes obtained from the policy (sum of block buffers).
    pub reserved_bytes: usize,
    /// Bytes handed out, entry framing included.
    pub allocated_bytes: usize,
    /// Cleanup actions waiting for the next clear.
    pub pending_cleanups: usize,
}

impl ArenaStats {
    /// Total number of blocks in the chain.
    #[inline]
    #[must_use]
    pub const fn total_blocks(&self) -> usize {
        self.standard_blocks + self.oversized_blocks
    }
}

/// Running counters kept by [`crate::CountingPolicy`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PolicyStats {
    /// Successful `allocate` calls.
    pub acquisitions: usize,
    /// `deallocate` calls.
    pub releases: usize,
    /// `allocate` calls that reported out of memory.
    pub failures: usize,
    /// Bytes acquired and not yet released.
    pub outstanding_bytes: usize,
    /// Highest value `outstanding_bytes` has reached.
    pub peak_bytes: usize,
}

impl PolicyStats {
    /// Blocks acquired and not yet released.
    #[inline]
    #[must_use]
    pub const fn outstanding_blocks(&self) -> usize {
        self.acquisitions - self.releases
    }
}
