//! Thread-library backing: `pthread_barrier_t`
//!
//! Blocking is delegated to the pthread barrier, which handles
//! multi-round reuse natively. Arrivals are additionally mirrored into a
//! monotonic atomic counter so `waiting_threads` can be answered without
//! touching the native object; the mirror is never reset, so across
//! rounds it reports lifetime arrivals and may lag while a round is
//! being released.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

use super::BarrierWaitResult;

/// Rendezvous backed by the operating thread library's own barrier.
///
/// Cyclic: one value serves any number of rounds. `waiting_threads`
/// reports the monotonic lifetime arrival count (see module docs).
pub struct PthreadBarrier {
    /// Boxed so the native object's address survives moves of `self`
    inner: Box<UnsafeCell<libc::pthread_barrier_t>>,
    /// Monotonic arrival mirror, introspection only
    arrived: AtomicUsize,
    required: usize,
}

// SAFETY: the pthread barrier exists to be waited on from many threads
// at once; the thread library performs all synchronization on the
// object behind the UnsafeCell, and the remaining fields are an atomic
// and an immutable count.
unsafe impl Send for PthreadBarrier {}
unsafe impl Sync for PthreadBarrier {}

impl PthreadBarrier {
    /// Creates a barrier for `required` participating threads.
    ///
    /// # Panics
    ///
    /// Panics when `required` is zero, or when the thread library
    /// refuses to initialize the barrier (resource exhaustion).
    pub fn new(required: usize) -> Self {
        assert!(required >= 1, "a barrier needs at least one participant");
        // SAFETY: pthread_barrier_t is a plain C struct; an all-zero
        // value is a valid resting representation that
        // pthread_barrier_init overwrites entirely.
        let inner: Box<UnsafeCell<libc::pthread_barrier_t>> =
            Box::new(UnsafeCell::new(unsafe { core::mem::zeroed() }));
        // SAFETY: inner is a fresh, exclusively owned barrier slot; a
        // null attribute pointer selects the default attributes.
        let rc = unsafe {
            libc::pthread_barrier_init(inner.get(), core::ptr::null(), required as libc::c_uint)
        };
        assert!(
            rc == 0,
            "pthread_barrier_init failed: {}",
            std::io::Error::from_raw_os_error(rc)
        );
        #[cfg(feature = "logging")]
        tracing::trace!(required, "pthread barrier created");
        Self {
            inner,
            arrived: AtomicUsize::new(0),
            required,
        }
    }

    /// Blocks until all participants of this round have arrived.
    pub fn wait(&self) -> BarrierWaitResult {
        self.arrived.fetch_add(1, Ordering::AcqRel);
        loop {
            // SAFETY: the barrier was initialized in `new` and is not
            // destroyed before `self` drops.
            let rc = unsafe { libc::pthread_barrier_wait(self.inner.get()) };
            match rc {
                0 => return BarrierWaitResult::new(false),
                libc::PTHREAD_BARRIER_SERIAL_THREAD => return BarrierWaitResult::new(true),
                // Interrupted waits are restarted.
                libc::EINTR => {}
                other => unreachable!("pthread_barrier_wait returned {other}"),
            }
        }
    }

    /// Lifetime arrivals mirrored outside the native object.
    ///
    /// Monotonic across rounds and possibly stale while a round is
    /// releasing; the native object holds the authoritative count.
    pub fn waiting_threads(&self) -> usize {
        self.arrived.load(Ordering::Relaxed)
    }

    /// The fixed number of participating threads
    pub fn required_threads(&self) -> usize {
        self.required
    }

    /// The underlying `pthread_barrier_t`, for interop with other
    /// pthread APIs.
    ///
    /// The address is stable across moves of the owning value. Waiting
    /// on it concurrently with [`wait`](Self::wait) is the caller's
    /// responsibility.
    pub fn native_handle(&self) -> *mut libc::pthread_barrier_t {
        self.inner.get()
    }
}

impl Drop for PthreadBarrier {
    fn drop(&mut self) {
        // SAFETY: by contract no thread is still blocked in `wait`;
        // destroying an idle, initialized barrier is the normal
        // teardown path.
        let rc = unsafe { libc::pthread_barrier_destroy(self.inner.get()) };
        debug_assert!(rc == 0, "pthread_barrier_destroy failed: {rc}");
    }
}
