//! Decision records and the per-stage default policy.
//!
//! Every sequenced event gets exactly one [`Plan`]: a stack-allocated record of what the engine
//! intends to do after the decision is published (wake a successor, yield the acting thread,
//! both, or neither). The defaults encoded here are what makes the schedule strictly
//! alternating; an external policy then only has to pick *which* thread the wildcard wake goes
//! to, not *whether* handoffs happen.

use crate::{
    event::{EventKind, Stage},
    thread::ThreadId,
};

/// One scheduling decision, built per intercepted event and discarded after it is applied.
///
/// The `stage` and `kind` a plan was built for are fixed; the three scheduling fields
/// ([`next`](Self::next), [`wake`](Self::wake), [`suspend`](Self::suspend)) are public so a
/// decision hook can rewrite them during the publish window.
///
/// # Default Decisions
///
/// Generic event stage:
///
/// | event kind | wake | suspend |
/// |---|---|---|
/// | thread-exit | true | false |
/// | self-init (main thread) | false | false |
/// | self-init (other threads) | true | true |
/// | anything else | true | true |
///
/// An exiting thread hands execution off and never resumes, so it wakes without yielding. The
/// main thread owns the exclusivity token from process start, so its self-init needs no
/// handoff at all; every other thread's self-init immediately wakes a successor and yields so
/// that exactly one thread keeps running. Everything else is the default handoff.
///
/// Before-operation stage: `wake` unless the operation is thread-create (ownership moves to the
/// yet-to-exist child by ceding the token, not by waking anyone), and `suspend` exactly for
/// memory accesses - an access is instantaneous and must be attributable to a single position
/// in the total order, so the thread yields before it takes effect.
///
/// After-operation stage: never `wake`, and `suspend` exactly for non-memory-accesses - a call
/// ran for unbounded time, so the thread rejoins the schedule now that it returned.
///
/// # Examples
///
/// ```rust
/// use lockstep::{EventKind, Plan, Stage};
///
/// let plan = Plan::build(Stage::Before, EventKind::Write, false);
/// assert!(plan.wake);
/// assert!(plan.suspend);
/// assert!(plan.next.is_any());
/// ```
#[derive(Debug, Clone)]
pub struct Plan {
    stage: Stage,
    kind: EventKind,
    /// The thread to wake; starts at [`ThreadId::ANY`] until a policy picks a successor.
    pub next: ThreadId,
    /// Whether the engine must wake [`next`](Self::next) after the decision.
    pub wake: bool,
    /// Whether the acting thread must yield after the decision, resuming only when woken.
    pub suspend: bool,
}

impl Plan {
    /// Builds the default decision for an event at a given stage.
    ///
    /// `acting_is_main` distinguishes the main thread's self-init, the only event whose
    /// default depends on thread identity.
    #[must_use]
    pub fn build(stage: Stage, kind: EventKind, acting_is_main: bool) -> Self {
        let (wake, suspend) = match stage {
            Stage::Event => match kind {
                EventKind::ThreadExit => (true, false),
                EventKind::SelfInit => (!acting_is_main, !acting_is_main),
                _ => (true, true),
            },
            Stage::Before => (kind != EventKind::ThreadCreate, kind.is_memory_access()),
            Stage::After => (false, !kind.is_memory_access()),
        };

        Self {
            stage,
            kind,
            next: ThreadId::ANY,
            wake,
            suspend,
        }
    }

    /// The interception stage this plan was built for.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The event kind this plan was built for.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}
