//! Thread synchronization primitives
//!
//! One capability — a fixed-membership thread rendezvous — with several
//! backing implementations; see [`barrier`].

pub mod barrier;

pub use barrier::{Barrier, BarrierWaitResult, OnceBarrier, SpinBarrier};

#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
pub use barrier::PthreadBarrier;

#[cfg(windows)]
pub use barrier::WinBarrier;
