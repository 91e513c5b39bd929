//! # Allocation Policies
//!
//! The arena never talks to a memory source directly. Every block it holds
//! comes from an [`AllocationPolicy`] and goes back to the same policy on
//! clear.
//!
//! Provided policies:
//! - [`SystemPolicy`]: the global allocator, with fallible reservation
//! - [`PoolPolicy`]: a fixed byte budget that recycles returned blocks
//! - [`CountingPolicy`]: wraps another policy and keeps [`PolicyStats`]

mod pool;

pub use pool::PoolPolicy;

use crate::error::{ArenaError, ArenaResult};
use crate::stats::PolicyStats;

/// Source of raw block memory for an arena.
///
/// Buffers handed out must be exactly `byte_count` long and zeroed.
pub trait AllocationPolicy {
    /// Obtains a buffer of `byte_count` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::OutOfMemory`] if the memory cannot be supplied.
    fn allocate(&mut self, byte_count: usize) -> ArenaResult<Box<[u8]>>;

    /// Takes back a buffer previously returned by [`AllocationPolicy::allocate`].
    fn deallocate(&mut self, memory: Box<[u8]>);
}

/// Policy backed by the global allocator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemPolicy;

impl AllocationPolicy for SystemPolicy {
    fn allocate(&mut self, byte_count: usize) -> ArenaResult<Box<[u8]>> {
        zeroed_buffer(byte_count)
    }

    fn deallocate(&mut self, memory: Box<[u8]>) {
        drop(memory);
    }
}

/// Allocates a zeroed buffer, reporting allocation failure instead of aborting.
pub(crate) fn zeroed_buffer(byte_count: usize) -> ArenaResult<Box<[u8]>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(byte_count)
        .map_err(|_| ArenaError::OutOfMemory {
            requested: byte_count,
        })?;
    buffer.resize(byte_count, 0);
    Ok(buffer.into_boxed_slice())
}

/// Policy wrapper that counts acquisitions and releases.
///
/// # Example
///
/// ```rust,ignore
/// let mut arena = Arena::with_policy(CountingPolicy::new(SystemPolicy));
/// arena.allocate(16)?;
/// assert_eq!(arena.policy().stats().acquisitions, 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CountingPolicy<P> {
    inner: P,
    stats: PolicyStats,
}

impl<P: AllocationPolicy> CountingPolicy<P> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            stats: PolicyStats::default(),
        }
    }

    /// Returns the counters collected so far.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> PolicyStats {
        self.stats
    }

    /// Returns the wrapped policy.
    #[inline]
    #[must_use]
    pub const fn inner(&self) -> &P {
        &self.inner
    }

    /// Unwraps the policy, discarding the counters.
    #[must_use]
    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: AllocationPolicy> AllocationPolicy for CountingPolicy<P> {
    fn allocate(&mut self, byte_count: usize) -> ArenaResult<Box<[u8]>> {
        match self.inner.allocate(byte_count) {
            Ok(memory) => {
                self.stats.acquisitions += 1;
                self.stats.outstanding_bytes += memory.len();
                self.stats.peak_bytes = self.stats.peak_bytes.max(self.stats.outstanding_bytes);
                Ok(memory)
            }
            Err(err) => {
                self.stats.failures += 1;
                Err(err)
            }
        }
    }

    fn deallocate(&mut self, memory: Box<[u8]>) {
        self.stats.releases += 1;
        self.stats.outstanding_bytes -= memory.len();
        self.inner.deallocate(memory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_policy_zeroed() {
        let mut policy = SystemPolicy;
        let memory = policy.allocate(64).unwrap();
        assert_eq!(memory.len(), 64);
        assert!(memory.iter().all(|&b| b == 0));
        policy.deallocate(memory);
    }

    #[test]
    fn test_system_policy_impossible_request() {
        let mut policy = SystemPolicy;
        let err = policy.allocate(usize::MAX).unwrap_err();
        assert_eq!(err, ArenaError::OutOfMemory { requested: usize::MAX });
    }

    #[test]
    fn test_counting_policy() {
        let mut policy = CountingPolicy::new(SystemPolicy);

        let a = policy.allocate(100).unwrap();
        let b = policy.allocate(50).unwrap();
        assert_eq!(policy.stats().acquisitions, 2);
        assert_eq!(policy.stats().outstanding_bytes, 150);
        assert_eq!(policy.stats().outstanding_blocks(), 2);

        policy.deallocate(a);
        assert_eq!(policy.stats().outstanding_bytes, 50);
        assert_eq!(policy.stats().peak_bytes, 150);

        assert!(policy.allocate(usize::MAX).is_err());
        assert_eq!(policy.stats().failures, 1);

        policy.deallocate(b);
        assert_eq!(policy.stats().outstanding_blocks(), 0);
    }
}
