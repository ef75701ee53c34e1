//! Memory allocators
//!
//! One implementation today: the fixed-block [`ChunkAllocator`]. It is a
//! leaf component with no dependency beyond the system allocator that
//! reserves its table.

pub mod chunk;

pub use chunk::{ChunkAllocator, ChunkConfig, ChunkStats};
