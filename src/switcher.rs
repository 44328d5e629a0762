//! Cooperative wake/suspend primitive.
//!
//! The sequencing engine never parks or unparks threads directly - it depends on a [`Switcher`],
//! the capability that suspends the calling thread and marks suspended threads runnable again by
//! identifier. Production setups hand the engine a [`CondvarSwitcher`]; tests substitute a
//! scripted implementation to drive interleavings deterministically.
//!
//! # Wake Permits
//!
//! Wakes and suspends race by design: the engine wakes a successor *before* the successor has
//! necessarily reached its own suspend point (and the successor may already be parked, or may
//! still be running towards the park). [`CondvarSwitcher`] therefore stores wakes as persistent
//! permits that a later suspend consumes, so a wake is never lost to this race.

use std::{
    collections::HashSet,
    sync::{Condvar, Mutex},
};

use crate::thread::ThreadId;

/// Capability to suspend the calling thread and wake suspended threads by identifier.
///
/// The engine holds the switcher behind `Arc<dyn Switcher>`; implementations must be safe to
/// call from any sequenced thread concurrently.
///
/// A wake targeting [`ThreadId::ANY`] means the scheduling policy left the decision record's
/// target at the wildcard. Implementations decide how to handle that; the in-crate
/// [`CondvarSwitcher`] treats it as a logged no-op, which means a setup without a scheduling
/// policy makes no progress past the first suspend. That is deliberate - resolving the wildcard
/// *is* the policy's job.
pub trait Switcher: Send + Sync {
    /// Marks `target` runnable. Asynchronous: the waker continues immediately, and the wake
    /// must not be lost if `target` has not reached its suspend point yet.
    fn wake(&self, target: ThreadId);

    /// Suspends the calling thread (registered as `thread`) until a wake names it.
    ///
    /// With `block == false` the call only polls: it consumes and reports a pending wake but
    /// never parks. Returns whether a wake was consumed; the blocking variant always returns
    /// `true`.
    fn suspend(&self, thread: ThreadId, block: bool) -> bool;
}

/// OS-thread switcher built from a mutex, a condition variable and a pending-wake set.
///
/// # Examples
///
/// ```rust
/// use lockstep::{CondvarSwitcher, Switcher, ThreadId};
///
/// let switcher = CondvarSwitcher::new();
/// switcher.wake(ThreadId(2));
/// // The wake persists until thread 2 suspends, whenever that happens.
/// assert!(switcher.suspend(ThreadId(2), false));
/// ```
#[derive(Debug, Default)]
pub struct CondvarSwitcher {
    pending: Mutex<HashSet<ThreadId>>,
    wakeups: Condvar,
}

impl CondvarSwitcher {
    /// Creates a switcher with no pending wakes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Switcher for CondvarSwitcher {
    fn wake(&self, target: ThreadId) {
        if target.is_any() {
            log::warn!("wake left unresolved (no scheduling policy picked a target)");
            return;
        }

        let mut pending = lock!(self.pending);
        pending.insert(target);
        self.wakeups.notify_all();
    }

    fn suspend(&self, thread: ThreadId, block: bool) -> bool {
        let mut pending = lock!(self.pending);
        if !block {
            return pending.remove(&thread);
        }

        let mut pending = self
            .wakeups
            .wait_while(pending, |pending| !pending.contains(&thread))
            .expect("Failed to acquire lock");
        pending.remove(&thread);
        true
    }
}
