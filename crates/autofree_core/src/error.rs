//! # Arena Error Types
//!
//! All errors that can occur while building or growing an arena.

use thiserror::Error;

/// Errors that can occur in the arena.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// The allocation policy could not supply a block.
    #[error("out of memory: policy could not supply {requested} bytes")]
    OutOfMemory {
        /// Size of the block that was requested from the policy.
        requested: usize,
    },

    /// Invalid configuration value or file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for arena operations.
pub type ArenaResult<T> = Result<T, ArenaError>;
