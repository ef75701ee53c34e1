//! Error types for pool configuration and table reservation

use thiserror::Error;

/// Result type for fallible operations in this crate
pub type Result<T> = core::result::Result<T, MemoryError>;

/// Errors reported when configuring a pool or reserving its table
///
/// Pool exhaustion is deliberately *not* represented here: running out
/// of blocks is an expected steady-state outcome and is signalled by
/// `None` from [`ChunkAllocator::allocate`](crate::ChunkAllocator::allocate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Block size rejected at construction
    #[error("invalid block size {size}: {reason}")]
    InvalidBlockSize {
        /// The rejected block size in bytes
        size: usize,
        /// Which invariant the size violates
        reason: &'static str,
    },

    /// Table size rejected at construction
    #[error("invalid table size {size}: {reason}")]
    InvalidTableSize {
        /// The rejected table size in bytes
        size: usize,
        /// Which invariant the size violates
        reason: &'static str,
    },

    /// The system allocator could not reserve the table
    #[error("failed to reserve {requested} bytes for the block table")]
    TableReservation {
        /// Bytes requested from the system allocator
        requested: usize,
    },
}

impl MemoryError {
    /// Create an invalid block size error
    pub fn invalid_block_size(size: usize, reason: &'static str) -> Self {
        Self::InvalidBlockSize { size, reason }
    }

    /// Create an invalid table size error
    pub fn invalid_table_size(size: usize, reason: &'static str) -> Self {
        Self::InvalidTableSize { size, reason }
    }

    /// Create a table reservation error
    pub fn table_reservation(requested: usize) -> Self {
        Self::TableReservation { requested }
    }
}
