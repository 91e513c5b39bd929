//! # Memory Management
//!
//! Region allocation with bulk teardown.
//!
//! ## Design Philosophy
//!
//! Memory is taken from the policy in large blocks and given back only when
//! the whole arena is cleared:
//! - No per-object frees
//! - No per-object bookkeeping beyond optional cleanup actions
//! - Cleanups run newest first, before any memory is released

mod arena;
mod block;
mod cursor;
mod destructor;
mod region;

pub use arena::Arena;
pub use block::{BlockId, BlockKind};
pub use destructor::ENTRY_HEADER_SIZE;
pub use region::{Region, Typed};
