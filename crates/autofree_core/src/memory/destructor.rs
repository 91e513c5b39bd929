//! # Destructor Chain
//!
//! Cleanup actions registered with an allocation, run newest first when
//! the arena is cleared.
//!
//! Each entry is framed in arena memory as an [`EntryHeader`] followed
//! directly by the payload, so header and payload come out of the cursor
//! as one unit. The cleanup closure itself is owned by the chain.

use bytemuck::{Pod, Zeroable};

use super::region::Region;

/// In-arena framing written in front of every payload that has a cleanup.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub(crate) struct EntryHeader {
    /// Number of entries registered before this one (0 = chain tail).
    pub(crate) prev: u64,
    /// Payload length in bytes.
    pub(crate) len: u64,
}

/// Bytes of framing that precede each payload with a cleanup.
pub const ENTRY_HEADER_SIZE: usize = std::mem::size_of::<EntryHeader>();

/// Cleanup action; receives the payload bytes.
pub(crate) type Cleanup = Box<dyn FnOnce(&mut [u8])>;

pub(crate) struct DestructorEntry {
    /// Header plus payload.
    pub(crate) frame: Region,
    pub(crate) cleanup: Cleanup,
}

#[derive(Default)]
pub(crate) struct DestructorChain {
    entries: Vec<DestructorEntry>,
}

impl DestructorChain {
    pub(crate) const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Header for the entry about to be pushed.
    pub(crate) fn next_header(&self, payload_len: usize) -> EntryHeader {
        EntryHeader {
            prev: self.entries.len() as u64,
            len: payload_len as u64,
        }
    }

    /// Makes `cleanup` the new head.
    pub(crate) fn push(&mut self, frame: Region, cleanup: Cleanup) {
        self.entries.push(DestructorEntry { frame, cleanup });
    }

    /// Detaches the head.
    pub(crate) fn pop(&mut self) -> Option<DestructorEntry> {
        self.entries.pop()
    }
}

impl std::fmt::Debug for DestructorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestructorChain")
            .field("pending", &self.entries.len())
            .finish()
    }
}
