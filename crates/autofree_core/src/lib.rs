//! # AUTOFREE Core
//!
//! Region-based ("arena") allocation for many short-lived objects:
//! - Bump allocation out of large blocks, O(1) per request
//! - One bulk release instead of per-object frees
//! - Cleanup actions for payloads that need finalization, run newest first
//!
//! ## Architecture Rules
//!
//! 1. **Memory comes from a policy** - The arena never picks its own memory source
//! 2. **Single owner** - An arena is move-only and not thread-safe
//! 3. **Handles, not pointers** - Allocations are [`Region`]s checked on every access
//!
//! ## Example
//!
//! ```rust,ignore
//! use autofree_core::{Arena, ArenaConfig, PoolPolicy};
//!
//! let config = ArenaConfig::from_toml_file("arena.toml")?;
//! let mut arena = Arena::with_config_and_policy(config, PoolPolicy::new(1 << 20))?;
//!
//! let name = arena.alloc_bytes(b"scratch")?;
//! let hits = arena.alloc_pod_with_cleanup(0u64, |total| report(total))?;
//! arena.write(hits, 42);
//!
//! arena.clear(); // report(42), then every block goes back to the pool
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod memory;
pub mod policy;
pub mod stats;

pub use config::{ArenaConfig, BLOCK_HEADER_SIZE, DEFAULT_BLOCK_CAPACITY};
pub use error::{ArenaError, ArenaResult};
pub use memory::{Arena, BlockId, BlockKind, Region, Typed, ENTRY_HEADER_SIZE};
pub use policy::{AllocationPolicy, CountingPolicy, PoolPolicy, SystemPolicy};
pub use stats::{ArenaStats, PolicyStats};
