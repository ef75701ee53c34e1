//! Reusable thread barriers
//!
//! A barrier blocks each of a fixed number of participating threads at a
//! rendezvous point until all of them have arrived, then releases them
//! together. Every backing exposes the same contract:
//!
//! - `wait()` — called once per thread per round; blocks until the
//!   configured count is reached, then all waiters (including the last
//!   arrival) proceed. Release is total: no thread passes `wait` before
//!   every participant has called it. Exactly one waiter per round
//!   observes [`BarrierWaitResult::is_leader`].
//! - `waiting_threads()` — arrivals observed so far. The exact meaning
//!   differs per backing (current round for [`SpinBarrier`], monotonic
//!   over the barrier's lifetime for the OS-backed variants and
//!   [`OnceBarrier`]); each type documents its own counter.
//! - `required_threads()` — the fixed count set at construction.
//! - `native_handle()` — the backing synchronization object, exposed for
//!   interop with other OS-level wait APIs. Using it concurrently with
//!   `wait` is the caller's responsibility.
//!
//! # Backing selection
//!
//! The [`Barrier`] alias names the backing compiled into this build: the
//! pthread barrier on Linux, Android and FreeBSD, the Windows
//! synchronization barrier on Windows, and the portable spin/yield
//! backing everywhere else. Enabling the `portable-barrier` cargo
//! feature forces the spin backing on every platform. The choice is
//! fixed at compile time; there is no runtime dispatch, and application
//! code never needs to branch on platform.
//!
//! # Caveats
//!
//! `wait` has no timeout and cannot be cancelled: a participant that
//! never arrives stalls all the others indefinitely. Constructing a
//! barrier for zero threads panics. Dropping a barrier while any thread
//! is still blocked in `wait` is undefined behavior — tear a barrier
//! down only after its last round has fully released.

mod spin;

pub use spin::{OnceBarrier, SpinBarrier};

#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
mod pthread;
#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
pub use pthread::PthreadBarrier;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WinBarrier;

/// Returned by `wait`; tells one released thread per round apart from
/// the rest.
///
/// The leader slot is useful for round-completion work that must happen
/// exactly once, e.g. swapping phase buffers before the next round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierWaitResult {
    is_leader: bool,
}

impl BarrierWaitResult {
    pub(crate) fn new(is_leader: bool) -> Self {
        Self { is_leader }
    }

    /// True for exactly one of the threads released in this round
    pub fn is_leader(self) -> bool {
        self.is_leader
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "portable-barrier")] {
        /// The barrier backing selected for this build
        pub type Barrier = SpinBarrier;
    } else if #[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))] {
        /// The barrier backing selected for this build
        pub type Barrier = PthreadBarrier;
    } else if #[cfg(windows)] {
        /// The barrier backing selected for this build
        pub type Barrier = WinBarrier;
    } else {
        /// The barrier backing selected for this build
        pub type Barrier = SpinBarrier;
    }
}
