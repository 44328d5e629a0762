//! The exclusivity token - the binary counter behind the single-runnable-thread guarantee.

use std::sync::atomic::{AtomicU32, Ordering};

const CEDED: u32 = 0;
const OWNED: u32 = 1;

/// Binary atomic counter enforcing that exactly one logical thread is runnable.
///
/// The token reads *owned* whenever some thread is actively executing instrumented code, and
/// *ceded* only inside a handoff: from the moment ownership is given up (immediately before a
/// wake, or before creating a child thread that will claim it at self-init) until the receiving
/// thread claims it.
///
/// [`claim`](Self::claim) is a compare-exchange that panics if the token is already owned: a
/// failed claim means two threads believe they may run simultaneously, which is a defect in the
/// scheduling protocol itself and has no safe continuation. [`cede`](Self::cede) is an
/// unconditional store - the engine force-cedes at handoff points regardless of how the
/// decision was rewritten, so a doubled cede within one decision is legitimate.
///
/// # Examples
///
/// ```rust
/// use lockstep::ExclusivityToken;
///
/// let token = ExclusivityToken::new();
/// assert!(token.is_owned());
/// token.cede();
/// assert!(!token.is_owned());
/// token.claim();
/// assert!(token.is_owned());
/// ```
#[derive(Debug)]
pub struct ExclusivityToken {
    state: AtomicU32,
}

impl ExclusivityToken {
    /// Creates a token in the owned state - the main thread owns it from process start.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AtomicU32::new(OWNED),
        }
    }

    /// Takes ownership, `ceded → owned`.
    ///
    /// # Panics
    ///
    /// Panics if the token is already owned: two threads consider themselves runnable, the
    /// mutual-exclusion guarantee is broken, and every analysis downstream of the schedule
    /// would silently corrupt.
    pub fn claim(&self) {
        let result = self
            .state
            .compare_exchange(CEDED, OWNED, Ordering::AcqRel, Ordering::Acquire);
        assert!(
            result.is_ok(),
            "exclusivity token claimed while owned: two threads are runnable"
        );
    }

    /// Gives up ownership, `owned → ceded`. Unconditional.
    pub fn cede(&self) {
        self.state.store(CEDED, Ordering::Release);
    }

    /// Whether the token currently reads owned.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.state.load(Ordering::Acquire) == OWNED
    }

    /// Checkpoint assertion: the token must read owned here.
    ///
    /// # Panics
    ///
    /// Panics if the token reads ceded at a boundary where some thread must hold it.
    pub fn assert_owned(&self) {
        assert!(
            self.is_owned(),
            "exclusivity token ceded at a decision checkpoint: the schedule lost its owner"
        );
    }
}

impl Default for ExclusivityToken {
    fn default() -> Self {
        Self::new()
    }
}
