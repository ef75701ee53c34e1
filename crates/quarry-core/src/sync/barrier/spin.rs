//! Portable spin-wait backings
//!
//! Two variants with deliberately different reuse semantics:
//!
//! - [`SpinBarrier`] is cyclic. Arrivals are counted per round and a
//!   generation counter flips when a round completes, so the same value
//!   can line the same threads up again and again.
//! - [`OnceBarrier`] is one-shot. Its arrival counter is never reset:
//!   the gate opens when the required number of arrivals has ever been
//!   reached and stays open from then on.
//!
//! Both busy-poll with exponential backoff that escalates to yielding
//! the thread, so they work on any target without OS support.

use core::sync::atomic::{AtomicUsize, Ordering};

use super::BarrierWaitResult;
use crate::utils::Backoff;

/// Cyclic rendezvous for a fixed number of threads, portable spin/yield.
///
/// `waiting_threads` reports arrivals in the *current* round; it drops
/// back to zero the instant a round completes.
pub struct SpinBarrier {
    /// Arrivals in the round currently forming
    arrived: AtomicUsize,
    /// Completed rounds; waiters poll this to leave
    generation: AtomicUsize,
    required: usize,
}

impl SpinBarrier {
    /// Creates a barrier for `required` participating threads.
    ///
    /// # Panics
    ///
    /// Panics when `required` is zero.
    pub fn new(required: usize) -> Self {
        assert!(required >= 1, "a barrier needs at least one participant");
        #[cfg(feature = "logging")]
        tracing::trace!(required, "spin barrier created");
        Self {
            arrived: AtomicUsize::new(0),
            generation: AtomicUsize::new(0),
            required,
        }
    }

    /// Blocks until all participants of this round have arrived.
    pub fn wait(&self) -> BarrierWaitResult {
        let generation = self.generation.load(Ordering::Acquire);
        let arrival = self.arrived.fetch_add(1, Ordering::AcqRel) + 1;
        if arrival == self.required {
            // Last arrival: reopen the round counter for the next round,
            // then publish the generation bump that releases everyone.
            self.arrived.store(0, Ordering::Relaxed);
            self.generation.fetch_add(1, Ordering::Release);
            return BarrierWaitResult::new(true);
        }
        let mut backoff = Backoff::new();
        while self.generation.load(Ordering::Acquire) == generation {
            backoff.spin_or_yield();
        }
        BarrierWaitResult::new(false)
    }

    /// Arrivals observed in the current round
    pub fn waiting_threads(&self) -> usize {
        self.arrived.load(Ordering::Relaxed)
    }

    /// The fixed number of participating threads
    pub fn required_threads(&self) -> usize {
        self.required
    }

    /// The generation word waiters poll.
    ///
    /// Exposed for interop with raw word-waiting APIs (futex-style);
    /// it increments once per completed round.
    pub fn native_handle(&self) -> &AtomicUsize {
        &self.generation
    }
}

/// One-shot rendezvous gate, portable spin/yield.
///
/// The first `required` arrivals rendezvous exactly as with a cyclic
/// barrier; because the arrival counter is monotonic and never reset,
/// every later `wait` returns immediately. `waiting_threads` counts
/// arrivals over the gate's whole lifetime.
pub struct OnceBarrier {
    /// Lifetime arrivals; the gate is open once this reaches `required`
    arrived: AtomicUsize,
    required: usize,
}

impl OnceBarrier {
    /// Creates a gate for `required` participating threads.
    ///
    /// # Panics
    ///
    /// Panics when `required` is zero.
    pub fn new(required: usize) -> Self {
        assert!(required >= 1, "a barrier needs at least one participant");
        #[cfg(feature = "logging")]
        tracing::trace!(required, "one-shot barrier created");
        Self {
            arrived: AtomicUsize::new(0),
            required,
        }
    }

    /// Blocks until `required` arrivals have ever been observed.
    ///
    /// The arrival that completes the set is the leader; arrivals after
    /// the gate has opened return immediately as non-leaders.
    pub fn wait(&self) -> BarrierWaitResult {
        let arrival = self.arrived.fetch_add(1, Ordering::AcqRel) + 1;
        if arrival == self.required {
            return BarrierWaitResult::new(true);
        }
        if arrival > self.required {
            // Gate already open.
            return BarrierWaitResult::new(false);
        }
        let mut backoff = Backoff::new();
        while self.arrived.load(Ordering::Acquire) < self.required {
            backoff.spin_or_yield();
        }
        BarrierWaitResult::new(false)
    }

    /// Arrivals observed over the gate's lifetime (monotonic)
    pub fn waiting_threads(&self) -> usize {
        self.arrived.load(Ordering::Relaxed)
    }

    /// The fixed number of participating threads
    pub fn required_threads(&self) -> usize {
        self.required
    }

    /// The arrival counter itself, for raw word-waiting interop
    pub fn native_handle(&self) -> &AtomicUsize {
        &self.arrived
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_participant_never_blocks() {
        let barrier = SpinBarrier::new(1);
        assert!(barrier.wait().is_leader());
        assert!(barrier.wait().is_leader());
        assert_eq!(barrier.waiting_threads(), 0);
    }

    #[test]
    fn generation_advances_per_round() {
        let barrier = SpinBarrier::new(1);
        let before = barrier.native_handle().load(Ordering::Relaxed);
        barrier.wait();
        barrier.wait();
        assert_eq!(barrier.native_handle().load(Ordering::Relaxed), before + 2);
    }

    #[test]
    fn once_gate_stays_open() {
        let gate = OnceBarrier::new(1);
        assert!(gate.wait().is_leader());
        // Open for good: later arrivals pass straight through, and the
        // lifetime counter keeps climbing.
        assert!(!gate.wait().is_leader());
        assert!(!gate.wait().is_leader());
        assert_eq!(gate.waiting_threads(), 3);
    }

    #[test]
    #[should_panic(expected = "at least one participant")]
    fn zero_participants_is_rejected() {
        let _ = SpinBarrier::new(0);
    }
}
