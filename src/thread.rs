//! Thread identity and lifecycle tracking.
//!
//! Every OS thread that takes part in the sequencing protocol is bound to exactly one
//! [`ThreadId`] for its lifetime. The [`ThreadRegistry`] owns that binding: threads register
//! themselves on self-init, are looked up by the engine on every decision, and are retired on
//! exit. A retired thread keeps its record as a tombstone - the engine must be able to
//! recognize stale in-flight events from a thread that already exited and drop them silently.
//!
//! # Key Components
//!
//! - [`ThreadId`] - Process-wide thread identifier with the [`MAIN`](ThreadId::MAIN) and
//!   [`ANY`](ThreadId::ANY) (wildcard) sentinels
//! - [`ThreadState`] - Live or retired
//! - [`ThreadRecord`] - Per-thread registry entry
//! - [`ThreadRegistry`] - Concurrent id allocation, current-thread lookup, retirement
//!
//! # Current-Thread Binding
//!
//! The registry records the calling thread's identifier in a thread-local on registration, so
//! [`ThreadRegistry::current`] is a cheap lookup with no shared state. The binding is
//! process-wide: the sequencing core is built around a single registry instance per process.

use std::{
    cell::Cell,
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

use dashmap::{mapref::entry::Entry, DashMap};

use crate::{Error, Result};

thread_local! {
    static CURRENT: Cell<Option<ThreadId>> = const { Cell::new(None) };
}

/// Process-wide identifier of a sequenced thread.
///
/// Identifiers are allocated by the [`ThreadRegistry`]; the two reserved values are
/// [`MAIN`](Self::MAIN) (the main thread, which owns the exclusivity token from process start)
/// and [`ANY`](Self::ANY), the wildcard meaning "no specific target chosen yet". A decision
/// record starts out targeting [`ANY`](Self::ANY) and stays there unless an external scheduling
/// policy picks a concrete successor.
///
/// # Examples
///
/// ```rust
/// use lockstep::ThreadId;
///
/// assert!(ThreadId::MAIN.is_main());
/// assert!(ThreadId::ANY.is_any());
/// assert_eq!(ThreadId(7).to_string(), "T7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadId(pub u32);

impl ThreadId {
    /// The main thread. It never registers via self-init like other threads do; it owns the
    /// exclusivity token from process start.
    pub const MAIN: Self = Self(1);

    /// Wildcard identifier: "unspecified, the scheduling policy must resolve this".
    pub const ANY: Self = Self(u32::MAX);

    /// Whether this is the main thread's identifier.
    #[must_use]
    pub fn is_main(self) -> bool {
        self == Self::MAIN
    }

    /// Whether this is the wildcard identifier.
    #[must_use]
    pub fn is_any(self) -> bool {
        self == Self::ANY
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            write!(f, "T?")
        } else {
            write!(f, "T{}", self.0)
        }
    }
}

/// Lifecycle state of a registered thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// The thread is between its self-init and exit events.
    Live,
    /// The thread is past its exit event; it is excluded from further sequencing.
    Retired,
}

/// Registry entry for one thread.
#[derive(Debug, Clone)]
pub struct ThreadRecord {
    /// The thread's identifier.
    pub id: ThreadId,
    /// Current lifecycle state.
    pub state: ThreadState,
}

/// Concurrent registry binding OS threads to [`ThreadId`]s and tracking retirement.
///
/// The registry is the "self" collaborator of the sequencing engine: the engine consults it on
/// every decision to drop events from retired threads, and the interception layer uses
/// [`current`](Self::current) to attribute events to the acting thread.
///
/// Records are kept after retirement. Dropping them instead would make a stale event from a
/// just-exited thread indistinguishable from a protocol bug; with the tombstone in place both
/// cases resolve to "retired, ignore".
///
/// # Examples
///
/// ```rust
/// use lockstep::{ThreadId, ThreadRegistry};
///
/// let registry = ThreadRegistry::new();
/// let main = registry.register_main()?;
/// assert_eq!(main, ThreadId::MAIN);
/// assert_eq!(ThreadRegistry::current(), Some(ThreadId::MAIN));
/// assert!(!registry.is_retired(main));
///
/// registry.retire(main)?;
/// assert!(registry.is_retired(main));
/// # Ok::<(), lockstep::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct ThreadRegistry {
    threads: DashMap<ThreadId, ThreadRecord>,
    next_id: AtomicU32,
}

impl ThreadRegistry {
    /// Creates an empty registry. Identifier allocation starts after [`ThreadId::MAIN`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            threads: DashMap::new(),
            next_id: AtomicU32::new(ThreadId::MAIN.0 + 1),
        }
    }

    /// Binds the calling thread to [`ThreadId::MAIN`].
    ///
    /// Must be called once, on the main thread, before any other thread registers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ThreadExists`] if the main thread is already registered or the calling
    /// thread already holds an identifier.
    pub fn register_main(&self) -> Result<ThreadId> {
        self.bind(ThreadId::MAIN)
    }

    /// Allocates a fresh identifier and binds it to the calling thread.
    ///
    /// Called by every non-main thread at the start of its self-init, before the thread fires
    /// its first event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ThreadExists`] if the calling thread already holds an identifier.
    pub fn register(&self) -> Result<ThreadId> {
        let id = ThreadId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.bind(id)
    }

    fn bind(&self, id: ThreadId) -> Result<ThreadId> {
        if let Some(existing) = CURRENT.get() {
            return Err(Error::ThreadExists(existing));
        }

        match self.threads.entry(id) {
            Entry::Occupied(_) => return Err(Error::ThreadExists(id)),
            Entry::Vacant(entry) => {
                entry.insert(ThreadRecord {
                    id,
                    state: ThreadState::Live,
                });
            }
        }
        CURRENT.set(Some(id));
        log::trace!("registered {id}");
        Ok(id)
    }

    /// The identifier bound to the calling thread, if it registered.
    #[must_use]
    pub fn current() -> Option<ThreadId> {
        CURRENT.get()
    }

    /// Marks a thread as retired. Its record stays in the registry as a tombstone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownThread`] if the identifier was never registered.
    pub fn retire(&self, id: ThreadId) -> Result<()> {
        match self.threads.get_mut(&id) {
            Some(mut record) => {
                record.state = ThreadState::Retired;
                log::trace!("retired {id}");
                Ok(())
            }
            None => Err(Error::UnknownThread(id)),
        }
    }

    /// Whether a thread is past its exit event.
    ///
    /// Unknown identifiers report retired as well: a thread the registry has never seen must
    /// not be sequenced either.
    #[must_use]
    pub fn is_retired(&self, id: ThreadId) -> bool {
        self.threads
            .get(&id)
            .map_or(true, |record| record.state == ThreadState::Retired)
    }

    /// Snapshot of a thread's registry entry.
    #[must_use]
    pub fn record(&self, id: ThreadId) -> Option<ThreadRecord> {
        self.threads.get(&id).map(|record| record.value().clone())
    }

    /// Number of registered threads, tombstones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    /// Whether no thread has registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}
