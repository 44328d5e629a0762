//! Event vocabulary for the sequencing core.
//!
//! The interception layer classifies everything it observes into an [`EventKind`] and fires one
//! of three interception stages ([`Stage`]) with an [`EventRecord`]. The sequencing core never
//! interprets the semantics of an operation beyond this classification: the only distinction
//! that matters for scheduling is lifecycle event vs. memory access vs. call.
//!
//! # Key Components
//!
//! - [`Stage`] - The three interception points (generic event, before-operation, after-operation)
//! - [`EventKind`] - Classification of intercepted operations, with a contiguous memory-access range
//! - [`AccessKind`] / [`MemoryAccess`] - Typed payload for memory-access events
//! - [`EventRecord`] - What a stage entry point receives: kind, acting thread, opaque detail
//!
//! # Discriminant Layout
//!
//! [`EventKind`] carries explicit discriminants so the memory-access kinds occupy one contiguous
//! numeric range; [`EventKind::is_memory_access`] is a range check over that window, which keeps
//! the classification stable when new call-shaped kinds are appended.

use std::any::Any;

use bitflags::bitflags;
use strum::{EnumCount, EnumIter};

use crate::thread::ThreadId;

/// The three interception points at which a scheduling decision is made.
///
/// Stages partition the event space: one-shot observations (thread lifecycle, annotations) come
/// in through [`Stage::Event`], while operations with a duration (memory accesses and calls)
/// come in as a [`Stage::Before`] / [`Stage::After`] pair bracketing the operation itself.
///
/// # Examples
///
/// ```rust
/// use lockstep::Stage;
///
/// assert_ne!(Stage::Before, Stage::After);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, EnumIter)]
pub enum Stage {
    /// Generic event, fired once per one-shot intercepted event.
    Event,
    /// Fired immediately before an intercepted operation executes.
    Before,
    /// Fired immediately after an intercepted operation returns.
    After,
}

/// Classification of an intercepted operation.
///
/// The numeric values group the kinds into ranges: thread lifecycle events first, then the
/// contiguous memory-access range ([`Read`](Self::Read) through [`Fence`](Self::Fence)), then
/// call-shaped operations, then lock annotation events. Only the memory-access range is
/// meaningful to the scheduling policy defaults - a memory access is treated as instantaneous
/// and yields *before* taking effect, whereas a call may block unboundedly and yields *after*
/// it returns.
///
/// # Examples
///
/// ```rust
/// use lockstep::EventKind;
///
/// assert!(EventKind::Write.is_memory_access());
/// assert!(!EventKind::Call.is_memory_access());
/// assert!(!EventKind::ThreadCreate.is_memory_access());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, EnumIter)]
#[repr(u16)]
pub enum EventKind {
    /// A thread announces itself to the sequencing protocol. Fired exactly once per thread,
    /// by the thread itself, before it takes part in any other event.
    SelfInit = 1,
    /// The acting thread is about to create (or has created) another thread.
    ThreadCreate = 2,
    /// The acting thread is exiting; it will never re-enter the protocol.
    ThreadExit = 3,

    /// A plain or atomic load.
    Read = 16,
    /// A plain or atomic store.
    Write = 17,
    /// A read-modify-write access (e.g. fetch-and-add).
    ReadWrite = 18,
    /// An atomic exchange or compare-and-exchange.
    Exchange = 19,
    /// A memory fence.
    Fence = 20,

    /// A generic, potentially blocking call.
    Call = 32,

    /// Annotation: a reader-writer lock was created.
    LockCreate = 42,
    /// Annotation: a reader-writer lock was destroyed.
    LockDestroy = 43,
    /// Annotation: a lock was acquired.
    LockAcquire = 44,
    /// Annotation: a lock was released.
    LockRelease = 45,
}

impl EventKind {
    /// Whether this kind falls in the contiguous memory-access range.
    ///
    /// True for [`Read`](Self::Read), [`Write`](Self::Write), [`ReadWrite`](Self::ReadWrite),
    /// [`Exchange`](Self::Exchange) and [`Fence`](Self::Fence); false for everything else,
    /// including the lock annotation events (those are one-shot observations, not accesses the
    /// scheduler has to position in the total order).
    #[must_use]
    pub fn is_memory_access(self) -> bool {
        let value = self as u16;
        (EventKind::Read as u16) <= value && value <= (EventKind::Fence as u16)
    }
}

bitflags! {
    /// Direction and atomicity of a memory access.
    ///
    /// Carried inside [`MemoryAccess`]; a read-modify-write operation sets both
    /// [`READ`](Self::READ) and [`WRITE`](Self::WRITE).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AccessKind: u8 {
        /// The access reads from the location.
        const READ = 1;
        /// The access writes to the location.
        const WRITE = 1 << 1;
        /// The access has atomic semantics.
        const ATOMIC = 1 << 2;
    }
}

/// Typed payload describing one memory access.
///
/// The sequencing core itself never inspects this - it travels opaquely through
/// [`EventRecord::detail`] so that a scheduling policy (e.g. one biasing towards conflicting
/// accesses) can read it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAccess {
    /// Address of the accessed location.
    pub addr: usize,
    /// Width of the access in bytes.
    pub width: usize,
    /// Direction and atomicity flags.
    pub access: AccessKind,
}

/// One intercepted event, as delivered to a stage entry point.
///
/// The record is borrowed for the duration of a single sequencing call and never retained: the
/// `detail` payload is policy-opaque (the core only forwards it to decision subscribers), and
/// the acting `thread` is the identifier under which the event is sequenced.
///
/// # Examples
///
/// ```rust
/// use lockstep::{AccessKind, EventKind, EventRecord, MemoryAccess, ThreadId};
///
/// let access = MemoryAccess { addr: 0x7f00_1000, width: 8, access: AccessKind::READ };
/// let record = EventRecord::new(EventKind::Read, ThreadId::MAIN).with_detail(&access);
/// assert!(record.detail.is_some());
/// ```
pub struct EventRecord<'a> {
    /// Classification of the intercepted operation.
    pub kind: EventKind,
    /// The thread this event is attributed to.
    pub thread: ThreadId,
    /// Policy-opaque payload, forwarded untouched to decision subscribers.
    pub detail: Option<&'a dyn Any>,
}

impl<'a> EventRecord<'a> {
    /// Creates a record without a payload.
    #[must_use]
    pub fn new(kind: EventKind, thread: ThreadId) -> Self {
        Self {
            kind,
            thread,
            detail: None,
        }
    }

    /// Attaches an opaque payload to the record.
    #[must_use]
    pub fn with_detail(mut self, detail: &'a dyn Any) -> Self {
        self.detail = Some(detail);
        self
    }
}
