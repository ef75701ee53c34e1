//! Chunk allocator statistics

/// Point-in-time statistics for a chunk allocator
#[derive(Debug, Clone, Copy)]
pub struct ChunkStats {
    /// Total allocations performed
    pub total_allocs: u64,
    /// Total frees performed
    pub total_frees: u64,
    /// Peak usage in bytes
    pub peak_usage: usize,
    /// Current usage in bytes
    pub current_usage: usize,
    /// Size of each block
    pub block_size: usize,
    /// Total number of blocks
    pub block_count: usize,
    /// Currently free blocks
    pub free_blocks: usize,
}
