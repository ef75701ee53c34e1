//! Integration tests for the fixed-block chunk allocator

use std::ptr;

use proptest::prelude::*;
use quarry_core::{ChunkAllocator, ChunkConfig, MemoryError};

const PTR_WIDTH: usize = size_of::<*mut u8>();

/// The documented scenario: 64-byte blocks in a 1 KiB table (16 blocks).
#[test]
fn sixteen_blocks_exhaust_and_recover() {
    let mut pool = ChunkAllocator::new(64, 1024).unwrap();
    assert_eq!(pool.block_count(), 16);

    let mut blocks = Vec::new();
    for _ in 0..16 {
        blocks.push(pool.allocate().expect("pool has capacity for 16 blocks"));
    }
    // All sixteen are distinct addresses inside the table.
    for i in 0..blocks.len() {
        assert!(pool.contains(blocks[i].as_ptr()));
        for j in (i + 1)..blocks.len() {
            assert_ne!(blocks[i], blocks[j]);
        }
    }

    assert!(pool.allocate().is_none(), "17th allocation must fail");
    assert!(pool.is_exhausted());

    // Freeing the 3rd block opens exactly one slot.
    unsafe { pool.free(blocks[2].as_ptr()) };
    assert!(pool.allocate().is_some());
    assert!(pool.allocate().is_none(), "pool is full again");
}

#[test]
fn freed_capacity_is_reused() {
    let mut pool = ChunkAllocator::new(32, 256).unwrap();
    let count = pool.block_count();

    let mut blocks = Vec::new();
    for _ in 0..count {
        blocks.push(pool.allocate().unwrap());
    }
    assert!(pool.allocate().is_none());

    let freed = blocks.pop().unwrap();
    unsafe { pool.free(freed.as_ptr()) };

    let reused = pool.allocate().expect("freed capacity must be reusable");
    assert_eq!(reused, freed, "LIFO free list returns the freed block");
    assert!(pool.allocate().is_none());
}

#[test]
fn full_churn_keeps_the_free_list_intact() {
    let mut pool = ChunkAllocator::new(16, 512).unwrap();
    let count = pool.block_count();

    for cycle in 0..100u32 {
        let mut blocks = Vec::new();
        while let Some(block) = pool.allocate() {
            blocks.push(block);
        }
        assert_eq!(blocks.len(), count, "cycle {cycle} drained a short pool");
        for block in blocks {
            unsafe { pool.free(block.as_ptr()) };
        }
        assert!(pool.is_empty());
    }
}

#[test]
fn oversized_requests_always_fail() {
    let mut pool = ChunkAllocator::new(64, 256).unwrap();

    // Fresh pool: plenty of free blocks, still refused.
    assert!(pool.allocate_bytes(65).is_none());
    assert!(pool.allocate_bytes(usize::MAX).is_none());

    // Block-sized and smaller requests get a full block each.
    assert!(pool.allocate_bytes(64).is_some());
    assert!(pool.allocate_bytes(1).is_some());

    // Exhausted pool: same answer.
    while pool.allocate().is_some() {}
    assert!(pool.allocate_bytes(65).is_none());
}

#[test]
fn freeing_null_is_a_no_op() {
    let mut pool = ChunkAllocator::new(32, 128).unwrap();
    let free_before = pool.free_blocks();
    unsafe {
        pool.free(ptr::null_mut());
        pool.free_bytes(ptr::null_mut(), 32);
    }
    assert_eq!(pool.free_blocks(), free_before);
}

#[test]
fn free_bytes_matches_allocate_bytes() {
    let mut pool = ChunkAllocator::new(64, 256).unwrap();
    let block = pool.allocate_bytes(48).unwrap();
    unsafe { pool.free_bytes(block.as_ptr(), 48) };
    assert!(pool.is_empty());
}

#[test]
fn construction_rejects_bad_geometry() {
    // Block smaller than a pointer.
    assert!(matches!(
        ChunkAllocator::new(PTR_WIDTH - 1, 1024),
        Err(MemoryError::InvalidBlockSize { .. })
    ));
    // Table smaller than a pointer.
    assert!(matches!(
        ChunkAllocator::new(PTR_WIDTH, PTR_WIDTH - 1),
        Err(MemoryError::InvalidTableSize { .. })
    ));
    // Block not strictly smaller than the table.
    assert!(matches!(
        ChunkAllocator::new(64, 64),
        Err(MemoryError::InvalidBlockSize { .. })
    ));
    // Table not a multiple of the block size.
    assert!(matches!(
        ChunkAllocator::new(64, 1000),
        Err(MemoryError::InvalidTableSize { .. })
    ));
}

#[test]
fn blocks_hold_caller_data_without_overlap() {
    let mut pool = ChunkAllocator::new(64, 512).unwrap();
    let mut blocks = Vec::new();
    for i in 0..pool.block_count() {
        let block = pool.allocate().unwrap();
        // SAFETY: the block is live and 64 bytes long.
        unsafe { ptr::write_bytes(block.as_ptr(), i as u8, 64) };
        blocks.push(block);
    }
    for (i, block) in blocks.iter().enumerate() {
        // SAFETY: still live; first and last byte carry the stamp.
        unsafe {
            assert_eq!(*block.as_ptr(), i as u8);
            assert_eq!(*block.as_ptr().add(63), i as u8);
        }
    }
    for block in blocks {
        unsafe { pool.free(block.as_ptr()) };
    }
}

#[test]
fn reset_restores_full_capacity() {
    let mut pool = ChunkAllocator::new(32, 256).unwrap();
    let count = pool.block_count();
    for _ in 0..count / 2 {
        pool.allocate().unwrap();
    }
    // SAFETY: the half-drained blocks are abandoned, not used again.
    unsafe { pool.reset() };

    let mut drained = 0;
    while pool.allocate().is_some() {
        drained += 1;
    }
    assert_eq!(drained, count);
}

#[test]
fn stats_follow_the_churn() {
    let mut pool = ChunkAllocator::with_config(64, 512, ChunkConfig::debug()).unwrap();

    let first = pool.allocate().unwrap();
    let second = pool.allocate().unwrap();
    unsafe { pool.free(first.as_ptr()) };

    let stats = pool.stats().expect("debug config tracks stats");
    assert_eq!(stats.total_allocs, 2);
    assert_eq!(stats.total_frees, 1);
    assert_eq!(stats.current_usage, 64);
    assert_eq!(stats.peak_usage, 128);
    assert_eq!(stats.free_blocks, pool.block_count() - 1);

    unsafe { pool.free(second.as_ptr()) };

    // Production config reports nothing.
    let silent = ChunkAllocator::with_config(64, 512, ChunkConfig::production()).unwrap();
    assert!(silent.stats().is_none());
}

proptest! {
    /// For any valid geometry, exactly `total / block` allocations
    /// succeed and the next one fails.
    #[test]
    fn exhaustion_matches_geometry(block_size in 8usize..=128, block_count in 2usize..=64) {
        let total_size = block_size * block_count;
        let mut pool = ChunkAllocator::new(block_size, total_size).unwrap();

        let mut blocks = Vec::new();
        for _ in 0..block_count {
            let block = pool.allocate().expect("within capacity");
            prop_assert!(pool.contains(block.as_ptr()));
            blocks.push(block);
        }
        prop_assert!(pool.allocate().is_none());

        for block in blocks {
            unsafe { pool.free(block.as_ptr()) };
        }
        prop_assert_eq!(pool.free_blocks(), block_count);
    }
}
