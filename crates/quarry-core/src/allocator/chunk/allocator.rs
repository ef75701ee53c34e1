//! Main chunk allocator implementation
//!
//! # Safety
//!
//! The table is a single `Box`ed byte buffer behind an `UnsafeCell`, so
//! blocks handed out as raw pointers may be written by the caller while
//! the allocator keeps walking the free list through the same buffer:
//!
//! - every *free* block stores the address of the next free block in its
//!   first pointer-width bytes (intrusive list; unaligned accesses, since
//!   `block_size` need not be a multiple of the pointer width)
//! - an *allocated* block carries no metadata; all `block_size` bytes
//!   belong to the caller until it is freed
//! - mutation goes through `&mut self`, so the borrow checker enforces
//!   the single-thread / externally-serialized access contract; there is
//!   no atomic or lock anywhere on the allocate/free path
//!
//! ## Invariants
//!
//! - `block_size >= size_of::<*mut u8>()` and `block_size < total_size`
//! - `total_size` is a non-zero multiple of `block_size`
//! - `free_head` is null or points at a block inside the table
//! - `free_count` equals the length of the free chain

use core::cell::UnsafeCell;
use core::ptr::{self, NonNull};

use super::{ChunkConfig, ChunkStats};
use crate::error::{MemoryError, Result};

/// Byte buffer with interior mutability.
///
/// Callers hold raw pointers into the buffer while the allocator reads
/// and writes free-list links through it, so every access has to go
/// through an `UnsafeCell`.
#[repr(transparent)]
struct TableCell(UnsafeCell<[u8]>);

// SAFETY: the buffer is plain bytes and is only reachable through the
// owning allocator; sending the allocator to another thread moves that
// exclusive access along with it.
unsafe impl Send for TableCell {}

impl TableCell {
    fn base(&self) -> *mut u8 {
        self.0.get().cast::<u8>()
    }
}

/// Fixed-block memory pool with O(1) allocate and free.
///
/// All blocks are the same size, so there is no external fragmentation
/// and no per-allocation bookkeeping: freed blocks are chained through
/// their own first bytes.
///
/// # Memory layout
/// ```text
/// [block 0][block 1][block 2] ... [block N-1]
///     │        │                       │
///     └──────▶ └──────▶  ...  ────────▶└──▶ (null)
/// ```
///
/// # Access contract
///
/// The allocator performs no internal synchronization — mutating
/// operations take `&mut self`. Share it across threads only behind a
/// lock, or give each thread its own instance.
///
/// # Ownership
///
/// Move-only: moving the allocator transfers the table (block pointers
/// stay valid, since the table itself is heap-allocated and does not
/// move). Dropping the allocator releases the table and invalidates
/// every outstanding pointer.
pub struct ChunkAllocator {
    /// Owned table holding every block
    table: Box<TableCell>,

    /// Head of the intrusive free list; null when the pool is exhausted
    free_head: *mut u8,

    /// Size of each individual block
    block_size: usize,

    /// Total number of blocks in the table
    block_count: usize,

    /// Length of the free chain
    free_count: usize,

    /// Configuration
    config: ChunkConfig,

    /// Statistics (tracked only when enabled)
    total_allocs: u64,
    total_frees: u64,
    peak_usage: usize,
}

// SAFETY: the table is exclusively owned and `free_head` points into it;
// moving the allocator to another thread moves that ownership. There is
// no shared state, which is also why the type is deliberately not Sync.
unsafe impl Send for ChunkAllocator {}

impl ChunkAllocator {
    /// Creates a chunk allocator with the default configuration.
    ///
    /// Reserves `total_size` bytes and links every block into the free
    /// list in one linear pass: block 0 → block 1 → … → block N-1 →
    /// null.
    ///
    /// # Errors
    ///
    /// Returns an error if any size invariant is violated:
    /// - `block_size` smaller than a pointer
    /// - `total_size` smaller than a pointer
    /// - `block_size` not strictly smaller than `total_size`
    /// - `total_size` not a multiple of `block_size`
    ///
    /// or if the system allocator cannot reserve the table.
    pub fn new(block_size: usize, total_size: usize) -> Result<Self> {
        Self::with_config(block_size, total_size, ChunkConfig::default())
    }

    /// Creates a chunk allocator with a custom configuration.
    ///
    /// See [`new`](Self::new) for the validated invariants.
    pub fn with_config(block_size: usize, total_size: usize, config: ChunkConfig) -> Result<Self> {
        let ptr_width = size_of::<*mut u8>();
        if block_size < ptr_width {
            return Err(MemoryError::invalid_block_size(
                block_size,
                "smaller than a pointer",
            ));
        }
        if total_size < ptr_width {
            return Err(MemoryError::invalid_table_size(
                total_size,
                "smaller than a pointer",
            ));
        }
        if block_size >= total_size {
            return Err(MemoryError::invalid_block_size(
                block_size,
                "must be strictly smaller than the table",
            ));
        }
        if total_size % block_size != 0 {
            return Err(MemoryError::invalid_table_size(
                total_size,
                "not a multiple of the block size",
            ));
        }

        let block_count = total_size / block_size;

        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(total_size)
            .map_err(|_| MemoryError::table_reservation(total_size))?;
        bytes.resize(total_size, 0u8);
        if let Some(pattern) = config.alloc_pattern {
            bytes.fill(pattern);
        }

        let boxed = bytes.into_boxed_slice();
        let len = boxed.len();
        let raw = Box::into_raw(boxed).cast::<u8>();
        // SAFETY: TableCell is repr(transparent) over UnsafeCell<[u8]>,
        // which is repr(transparent) over [u8]; the fat pointer keeps the
        // same length, and ownership passes straight from into_raw to
        // from_raw.
        let table: Box<TableCell> = unsafe {
            Box::from_raw(ptr::slice_from_raw_parts_mut(raw, len) as *mut TableCell)
        };

        let mut allocator = Self {
            table,
            free_head: ptr::null_mut(),
            block_size,
            block_count,
            free_count: 0,
            config,
            total_allocs: 0,
            total_frees: 0,
            peak_usage: 0,
        };
        allocator.link_free_list();

        #[cfg(feature = "logging")]
        tracing::debug!(block_size, block_count, total_size, "chunk table reserved");

        Ok(allocator)
    }

    /// Returns the size of each block in bytes
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Returns the total number of blocks in the table
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Returns the total capacity in bytes
    pub fn capacity(&self) -> usize {
        self.block_size * self.block_count
    }

    /// Returns the number of free blocks
    pub fn free_blocks(&self) -> usize {
        self.free_count
    }

    /// Returns the number of allocated blocks
    pub fn allocated_blocks(&self) -> usize {
        self.block_count - self.free_count
    }

    /// True when no block is free
    pub fn is_exhausted(&self) -> bool {
        self.free_head.is_null()
    }

    /// True when every block is free
    pub fn is_empty(&self) -> bool {
        self.free_count == self.block_count
    }

    /// Checks whether a pointer lies inside the managed table
    pub fn contains(&self, ptr: *const u8) -> bool {
        let addr = ptr as usize;
        let base = self.base_addr();
        addr >= base && addr < base + self.capacity()
    }

    /// Pops the next free block.
    ///
    /// Returns `None` when every block is handed out; the caller decides
    /// the fallback. O(1), never blocks, never allocates.
    #[inline(always)]
    pub fn allocate(&mut self) -> Option<NonNull<u8>> {
        let head = self.free_head;
        if head.is_null() {
            return None;
        }
        // SAFETY: head is a free block inside the table; its first
        // pointer-width bytes hold the next link written by `free` or
        // `link_free_list`. Unaligned read, since blocks are not
        // required to sit on pointer-aligned offsets.
        self.free_head = unsafe { head.cast::<*mut u8>().read_unaligned() };
        self.free_count -= 1;
        if self.config.track_stats {
            self.total_allocs += 1;
            self.peak_usage = self.peak_usage.max(self.used_bytes());
        }
        NonNull::new(head)
    }

    /// Pops the next free block for a request of `size` bytes.
    ///
    /// A request never spans blocks: `size > block_size` is answered
    /// with `None` regardless of how many blocks are free. Any smaller
    /// request still receives a full block.
    #[inline(always)]
    pub fn allocate_bytes(&mut self, size: usize) -> Option<NonNull<u8>> {
        if size > self.block_size {
            return None;
        }
        self.allocate()
    }

    /// Pushes a block back onto the front of the free list.
    ///
    /// Passing a null pointer is a no-op.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must come from a prior [`allocate`](Self::allocate)
    /// on this same allocator and must not have been freed since. Nothing
    /// is validated in release builds: a foreign, stale, or doubly freed
    /// pointer corrupts the free list.
    #[inline(always)]
    pub unsafe fn free(&mut self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        debug_assert!(self.contains(ptr), "pointer outside the block table");
        debug_assert!(
            (ptr as usize - self.base_addr()) % self.block_size == 0,
            "pointer not on a block boundary"
        );
        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: per the caller contract ptr is a live block of
            // ours, so all block_size bytes are writable.
            unsafe { ptr::write_bytes(ptr, pattern, self.block_size) };
        }
        // SAFETY: the block is ours again; its first pointer-width bytes
        // become the link to the previous head.
        unsafe { ptr.cast::<*mut u8>().write_unaligned(self.free_head) };
        self.free_head = ptr;
        self.free_count += 1;
        if self.config.track_stats {
            self.total_frees += 1;
        }
    }

    /// Identical to [`free`](Self::free).
    ///
    /// `size` is accepted for symmetry with
    /// [`allocate_bytes`](Self::allocate_bytes) and is not consulted.
    ///
    /// # Safety
    ///
    /// Same contract as [`free`](Self::free).
    #[inline(always)]
    pub unsafe fn free_bytes(&mut self, ptr: *mut u8, size: usize) {
        let _ = size;
        // SAFETY: contract forwarded unchanged.
        unsafe { self.free(ptr) };
    }

    /// Relinks every block into the free list, as at construction.
    ///
    /// # Safety
    ///
    /// No pointer previously returned by [`allocate`](Self::allocate)
    /// may be used again after a reset.
    pub unsafe fn reset(&mut self) {
        self.link_free_list();
        if self.config.track_stats {
            self.total_allocs = 0;
            self.total_frees = 0;
            self.peak_usage = 0;
        }
    }

    /// Returns statistics when tracking is enabled
    pub fn stats(&self) -> Option<ChunkStats> {
        if !self.config.track_stats {
            return None;
        }
        Some(ChunkStats {
            total_allocs: self.total_allocs,
            total_frees: self.total_frees,
            peak_usage: self.peak_usage,
            current_usage: self.used_bytes(),
            block_size: self.block_size,
            block_count: self.block_count,
            free_blocks: self.free_count,
        })
    }

    fn used_bytes(&self) -> usize {
        self.allocated_blocks() * self.block_size
    }

    fn base_addr(&self) -> usize {
        self.table.base() as usize
    }

    /// Threads every block into the free chain: block 0 → 1 → … → null.
    fn link_free_list(&mut self) {
        let base = self.table.base();
        let mut next: *mut u8 = ptr::null_mut();
        let mut index = self.block_count;
        while index > 0 {
            index -= 1;
            // SAFETY: the offset stays inside the owned table, and a
            // block has at least pointer-width bytes (construction
            // invariant).
            unsafe {
                let block = base.add(index * self.block_size);
                block.cast::<*mut u8>().write_unaligned(next);
                next = block;
            }
        }
        self.free_head = next;
        self.free_count = self.block_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_list_is_linked_front_to_back() {
        let mut pool = ChunkAllocator::new(16, 64).unwrap();
        let first = pool.allocate().unwrap();
        let second = pool.allocate().unwrap();
        assert_eq!(first.as_ptr() as usize, pool.base_addr());
        assert_eq!(second.as_ptr() as usize, pool.base_addr() + 16);
        unsafe {
            pool.free(second.as_ptr());
            pool.free(first.as_ptr());
        }
    }

    #[test]
    fn moving_the_allocator_keeps_blocks_valid() {
        let mut pool = ChunkAllocator::new(32, 128).unwrap();
        let block = pool.allocate().unwrap();
        // SAFETY: the block is live and 32 bytes long.
        unsafe { ptr::write_bytes(block.as_ptr(), 0x7F, 32) };

        let mut moved = pool;
        assert!(moved.contains(block.as_ptr()));
        // SAFETY: same live block, now owned through the moved value.
        unsafe {
            assert_eq!(*block.as_ptr(), 0x7F);
            moved.free(block.as_ptr());
        }
        assert!(moved.is_empty());
    }
}
