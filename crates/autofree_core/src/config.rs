//! # Arena Configuration
//!
//! Construction-time settings for an arena. Loaded once, either from code
//! or from a TOML file:
//!
//! ```toml
//! # usable bytes per standard block
//! block_capacity = 2048
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, ArenaResult};

/// Usable bytes in a standard block when nothing else is configured.
pub const DEFAULT_BLOCK_CAPACITY: usize = 2048;

/// Fixed per-block link overhead (one pointer-sized link to the previous block).
pub const BLOCK_HEADER_SIZE: usize = std::mem::size_of::<usize>();

/// Arena configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArenaConfig {
    /// Usable payload bytes per standard block.
    ///
    /// Requests of this size or larger get a dedicated oversized block.
    pub block_capacity: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            block_capacity: DEFAULT_BLOCK_CAPACITY,
        }
    }
}

impl ArenaConfig {
    /// Creates a configuration with the given standard block capacity.
    #[inline]
    #[must_use]
    pub const fn with_capacity(block_capacity: usize) -> Self {
        Self { block_capacity }
    }

    /// Total footprint of a standard block, link overhead included.
    #[inline]
    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_capacity + BLOCK_HEADER_SIZE
    }

    /// Checks that the configuration can drive an arena.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] if `block_capacity` is zero.
    pub fn validate(&self) -> ArenaResult<()> {
        if self.block_capacity == 0 {
            return Err(ArenaError::InvalidConfig(
                "block_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Parses and validates a configuration from TOML text.
    ///
    /// Missing fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] on malformed TOML, unknown
    /// fields, or a configuration that fails [`ArenaConfig::validate`].
    pub fn from_toml_str(text: &str) -> ArenaResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ArenaError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::InvalidConfig`] if the file cannot be read or
    /// its contents are rejected by [`ArenaConfig::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> ArenaResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ArenaError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
