//! The logical clock assigning a total order to scheduling turns.

use std::sync::Mutex;

/// Monotonic counter of completed yield→resume cycles.
///
/// Because resumes happen one at a time under the exclusivity token, the values handed out
/// here form a strict total order over all scheduling turns process-wide - the correlation
/// point for diagnostics and downstream replay tooling. Reads and increments both go through
/// a short-held exclusive lock.
#[derive(Debug, Default)]
pub struct LogicalClock {
    turns: Mutex<u64>,
}

impl LogicalClock {
    /// Creates a clock at turn zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the clock and returns the new turn number.
    pub fn advance(&self) -> u64 {
        let mut turns = lock!(self.turns);
        *turns += 1;
        *turns
    }

    /// The most recently assigned turn number.
    #[must_use]
    pub fn current(&self) -> u64 {
        *lock!(self.turns)
    }
}
