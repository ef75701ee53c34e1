//! Low-level building blocks for fixed-size object pools and phased
//! worker threads.
//!
//! This crate bundles the two primitives the pool and worker layers are
//! built on:
//!
//! - [`ChunkAllocator`] — a fixed-block memory pool with O(1)
//!   allocate/free through an intrusive free list. No internal locking;
//!   exclusive access is enforced by the borrow checker.
//! - [`Barrier`] — a rendezvous point for a fixed number of threads.
//!   The backing implementation (portable spin/yield, pthread barrier,
//!   or Windows synchronization barrier) is chosen at compile time; the
//!   alias always names whichever backing this build uses.
//!
//! The two components are independent: a typical consumer hands out
//! fixed-size task buffers from a [`ChunkAllocator`] and lines worker
//! threads up on a [`Barrier`] between phases.
//!
//! # Features
//!
//! - `logging` (default): construction-time `tracing` events
//! - `portable-barrier`: force the portable spin backing for [`Barrier`]
//!   regardless of target platform
//!
//! # Example
//!
//! ```
//! use quarry_core::ChunkAllocator;
//!
//! let mut pool = ChunkAllocator::new(64, 1024)?;
//! assert_eq!(pool.block_count(), 16);
//!
//! let block = pool.allocate().expect("fresh pool has free blocks");
//! // ... use all 64 bytes of the block ...
//! unsafe { pool.free(block.as_ptr()) };
//! # Ok::<(), quarry_core::MemoryError>(())
//! ```

#![allow(unsafe_code)] // raw pool memory + native barrier FFI; SAFETY notes at each site
#![warn(missing_docs)]

pub mod allocator;
pub mod error;
pub mod sync;
pub mod utils;

pub use allocator::{ChunkAllocator, ChunkConfig, ChunkStats};
pub use error::{MemoryError, Result};
pub use sync::{Barrier, BarrierWaitResult, OnceBarrier, SpinBarrier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
