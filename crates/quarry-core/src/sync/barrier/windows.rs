//! OS backing: Windows `SYNCHRONIZATION_BARRIER`
//!
//! Blocking is delegated to the dedicated synchronization-barrier
//! object, which handles multi-round reuse natively. Arrivals are
//! mirrored into a monotonic atomic counter for introspection, exactly
//! as in the pthread backing.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

use winapi::um::synchapi::{
    DeleteSynchronizationBarrier, EnterSynchronizationBarrier, InitializeSynchronizationBarrier,
    SYNCHRONIZATION_BARRIER,
};

use super::BarrierWaitResult;

/// Rendezvous backed by the Windows synchronization-barrier object.
///
/// Cyclic: one value serves any number of rounds. `waiting_threads`
/// reports the monotonic lifetime arrival count (see module docs).
pub struct WinBarrier {
    /// Boxed so the native object's address survives moves of `self`
    inner: Box<UnsafeCell<SYNCHRONIZATION_BARRIER>>,
    /// Monotonic arrival mirror, introspection only
    arrived: AtomicUsize,
    required: usize,
}

// SAFETY: the synchronization barrier exists to be entered from many
// threads at once; the OS performs all synchronization on the object
// behind the UnsafeCell, and the remaining fields are an atomic and an
// immutable count.
unsafe impl Send for WinBarrier {}
unsafe impl Sync for WinBarrier {}

impl WinBarrier {
    /// Creates a barrier for `required` participating threads.
    ///
    /// # Panics
    ///
    /// Panics when `required` is zero, or when the OS refuses to
    /// initialize the barrier.
    pub fn new(required: usize) -> Self {
        assert!(required >= 1, "a barrier needs at least one participant");
        // SAFETY: SYNCHRONIZATION_BARRIER is a plain C struct; an
        // all-zero value is a valid resting representation that
        // InitializeSynchronizationBarrier overwrites entirely.
        let inner: Box<UnsafeCell<SYNCHRONIZATION_BARRIER>> =
            Box::new(UnsafeCell::new(unsafe { core::mem::zeroed() }));
        // SAFETY: inner is a fresh, exclusively owned barrier slot; a
        // spin count of -1 selects the OS default before blocking.
        let ok = unsafe { InitializeSynchronizationBarrier(inner.get(), required as i32, -1) };
        assert!(
            ok != 0,
            "InitializeSynchronizationBarrier failed: {}",
            std::io::Error::last_os_error()
        );
        #[cfg(feature = "logging")]
        tracing::trace!(required, "windows synchronization barrier created");
        Self {
            inner,
            arrived: AtomicUsize::new(0),
            required,
        }
    }

    /// Blocks until all participants of this round have arrived.
    pub fn wait(&self) -> BarrierWaitResult {
        self.arrived.fetch_add(1, Ordering::AcqRel);
        // SAFETY: the barrier was initialized in `new` and is not
        // deleted before `self` drops. The call returns TRUE for the
        // last thread to arrive in the round.
        let last = unsafe { EnterSynchronizationBarrier(self.inner.get(), 0) };
        BarrierWaitResult::new(last != 0)
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

    /// The underlying `SYNCHRONIZATION_BARRIER`, for interop with other
    /// Windows wait APIs.
    ///
    /// The address is stable across moves of the owning value. Entering
    /// it concurrently with [`wait`](Self::wait) is the caller's
    /// responsibility.
    pub fn native_handle(&self) -> *mut SYNCHRONIZATION_BARRIER {
        self.inner.get()
    }
}

impl Drop for WinBarrier {
    fn drop(&mut self) {
        // SAFETY: by contract no thread is still blocked in `wait`;
        // deleting an idle, initialized barrier is the normal teardown
        // path.
        unsafe { DeleteSynchronizationBarrier(self.inner.get()) };
    }
}
