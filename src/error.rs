use thiserror::Error;

use crate::thread::ThreadId;

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The error surface of the sequencing core is deliberately small. A violated scheduling
/// invariant (an exclusivity-token checkpoint observing an unexpected state) is *not* an
/// [`Error`] variant: it means the single-runnable-thread guarantee is already broken and no
/// safe continuation exists, so those checkpoints are fatal assertions instead. What remains
/// is recoverable misuse of the thread registry.
///
/// # Examples
///
/// ```rust
/// use lockstep::{Error, ThreadId, ThreadRegistry};
///
/// let registry = ThreadRegistry::new();
/// match registry.retire(ThreadId(77)) {
///     Ok(()) => println!("retired"),
///     Err(Error::UnknownThread(id)) => println!("{id} was never registered"),
///     Err(e) => println!("other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A thread identifier is already present in the registry.
    ///
    /// Registration assigns each OS thread exactly one identifier for its lifetime; attempting
    /// to register the calling thread twice (or to re-register the main thread) returns this
    /// error with the identifier that is already bound.
    #[error("Thread {0} is already registered")]
    ThreadExists(ThreadId),

    /// A thread identifier is not present in the registry.
    ///
    /// Returned when retiring or querying a thread that was never registered. Note that
    /// *sequencing* an unknown thread is not an error: the engine treats unknown and retired
    /// threads alike and performs a silent no-op, since stale in-flight events are an expected
    /// race around thread exit.
    #[error("Thread {0} is not registered")]
    UnknownThread(ThreadId),
}
