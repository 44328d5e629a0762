//! Decision hooks - the pluggable scheduling-policy surface.
//!
//! The sequencing core enforces *that* only one thread runs; deciding *which* thread runs next
//! is delegated through this module. Before the engine applies a decision record it publishes
//! the record to every registered [`SequenceHook`] in priority order, and any hook may rewrite
//! the record's `next`/`wake`/`suspend` fields in place. After a completed yield→resume cycle
//! the engine publishes a resume notification the same way.
//!
//! # Hook Resolution
//!
//! Unlike an interception table where only the best match fires, *all* registered hooks run on
//! every publish - a decision hook is a subscriber, not a handler. [`HookPriority`] only
//! controls the order, which matters when one hook wants to observe (or veto) what an earlier
//! one decided.
//!
//! # Examples
//!
//! ```rust
//! use lockstep::{EventRecord, Plan, SequenceHook, ThreadId};
//!
//! /// Policy that always hands execution to one pinned thread.
//! struct Pinned(ThreadId);
//!
//! impl SequenceHook for Pinned {
//!     fn decide(&self, _event: &EventRecord<'_>, plan: &mut Plan) {
//!         if plan.wake && plan.next.is_any() {
//!             plan.next = self.0;
//!         }
//!     }
//! }
//! ```

use std::cmp::Reverse;

use crate::{event::EventRecord, sequencer::Plan};

/// Priority level for decision hooks, controlling publish order.
///
/// Higher priority hooks run first. Registration order breaks ties.
///
/// # Predefined Priorities
///
/// | Constant | Value | Use Case |
/// |----------|-------|----------|
/// | [`HIGHEST`](Self::HIGHEST) | 1000 | Run before everything |
/// | [`HIGH`](Self::HIGH) | 500 | Targeted overrides |
/// | [`NORMAL`](Self::NORMAL) | 0 | Scheduling policies |
/// | [`LOW`](Self::LOW) | -500 | Observers of the final decision |
/// | [`LOWEST`](Self::LOWEST) | -1000 | Diagnostics / logging |
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HookPriority(pub i32);

impl HookPriority {
    /// Highest priority - published to first (value: 1000).
    pub const HIGHEST: Self = Self(1000);

    /// High priority (value: 500).
    pub const HIGH: Self = Self(500);

    /// Normal priority - default (value: 0).
    pub const NORMAL: Self = Self(0);

    /// Low priority (value: -500).
    pub const LOW: Self = Self(-500);

    /// Lowest priority - published to last (value: -1000).
    pub const LOWEST: Self = Self(-1000);
}

impl Default for HookPriority {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// A subscriber to sequencing decisions.
///
/// [`decide`](Self::decide) fires once per sequenced event, before the engine applies the
/// plan's wake/yield actions; the hook may mutate `plan.next`, `plan.wake` and `plan.suspend`
/// in place. [`resumed`](Self::resumed) fires once per completed yield→resume cycle and is
/// observational only.
///
/// Within one decision, at most one hook should mutate the plan - the protocol gives the engine
/// a single publish-then-read window per event, and two competing policies rewriting the same
/// record would make the applied decision order-dependent. Installing one mutating policy plus
/// any number of observers is the intended shape.
///
/// Closures implement the trait directly, which keeps simple policies and test probes terse:
///
/// ```rust
/// use lockstep::{Sequencer, ThreadId};
///
/// let sequencer = Sequencer::builder()
///     .hook(|_event: &lockstep::EventRecord<'_>, plan: &mut lockstep::Plan| {
///         if plan.next.is_any() {
///             plan.next = ThreadId::MAIN;
///         }
///     })
///     .build();
/// # let _ = sequencer;
/// ```
pub trait SequenceHook: Send + Sync {
    /// Called once per sequenced event, before wake/yield are applied. The hook may rewrite
    /// the plan's mutable fields in place; there is no return value.
    fn decide(&self, event: &EventRecord<'_>, plan: &mut Plan);

    /// Called once per completed yield→resume cycle of the acting thread.
    fn resumed(&self, event: &EventRecord<'_>, plan: &Plan) {
        let _ = (event, plan);
    }
}

impl<F> SequenceHook for F
where
    F: Fn(&EventRecord<'_>, &mut Plan) + Send + Sync,
{
    fn decide(&self, event: &EventRecord<'_>, plan: &mut Plan) {
        self(event, plan);
    }
}

/// Registry of decision hooks, sorted by descending priority.
///
/// Owned by the sequencing engine; hooks are registered through the engine's builder before
/// the engine is shared across threads, so publishing needs no synchronization of its own.
#[derive(Default)]
pub struct DecisionHub {
    hooks: Vec<(HookPriority, Box<dyn SequenceHook>)>,
}

impl DecisionHub {
    /// Creates an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook. Hooks are kept sorted by priority, highest first; registration order
    /// is preserved among equal priorities.
    pub fn register(&mut self, priority: HookPriority, hook: Box<dyn SequenceHook>) {
        self.hooks.push((priority, hook));
        self.hooks.sort_by_key(|(priority, _)| Reverse(*priority));
    }

    /// Number of registered hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no hook is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Delivers a decision record to every hook, highest priority first.
    pub(crate) fn publish_decide(&self, event: &EventRecord<'_>, plan: &mut Plan) {
        for (_, hook) in &self.hooks {
            hook.decide(event, plan);
        }
    }

    /// Delivers a resume notification to every hook, highest priority first.
    pub(crate) fn publish_resume(&self, event: &EventRecord<'_>, plan: &Plan) {
        for (_, hook) in &self.hooks {
            hook.resumed(event, plan);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        event::{EventKind, Stage},
        thread::ThreadId,
    };

    struct Tagger {
        tag: &'static str,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl SequenceHook for Tagger {
        fn decide(&self, _event: &EventRecord<'_>, _plan: &mut Plan) {
            self.order.lock().unwrap().push(self.tag);
        }
    }

    fn record() -> EventRecord<'static> {
        EventRecord::new(EventKind::Call, ThreadId::MAIN)
    }

    #[test]
    fn hooks_run_by_descending_priority() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut hub = DecisionHub::new();
        hub.register(
            HookPriority::LOW,
            Box::new(Tagger {
                tag: "low",
                order: Arc::clone(&order),
            }),
        );
        hub.register(
            HookPriority::HIGHEST,
            Box::new(Tagger {
                tag: "highest",
                order: Arc::clone(&order),
            }),
        );
        hub.register(
            HookPriority::NORMAL,
            Box::new(Tagger {
                tag: "normal",
                order: Arc::clone(&order),
            }),
        );

        let mut plan = Plan::build(Stage::Before, EventKind::Call, true);
        hub.publish_decide(&record(), &mut plan);

        assert_eq!(*order.lock().unwrap(), vec!["highest", "normal", "low"]);
    }

    #[test]
    fn every_hook_sees_the_publish() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut hub = DecisionHub::new();
        for tag in ["a", "b", "c"] {
            hub.register(
                HookPriority::NORMAL,
                Box::new(Tagger {
                    tag,
                    order: Arc::clone(&order),
                }),
            );
        }

        let mut plan = Plan::build(Stage::Before, EventKind::Call, true);
        hub.publish_decide(&record(), &mut plan);

        assert_eq!(order.lock().unwrap().len(), 3);
    }

    #[test]
    fn closure_hooks_can_retarget() {
        let mut hub = DecisionHub::new();
        hub.register(
            HookPriority::NORMAL,
            Box::new(|_event: &EventRecord<'_>, plan: &mut Plan| {
                plan.next = ThreadId(3);
            }),
        );

        let mut plan = Plan::build(Stage::Before, EventKind::Call, true);
        assert!(plan.next.is_any());
        hub.publish_decide(&record(), &mut plan);
        assert_eq!(plan.next, ThreadId(3));
    }

    #[test]
    fn registration_order_breaks_priority_ties() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut hub = DecisionHub::new();
        for tag in ["first", "second"] {
            hub.register(
                HookPriority::NORMAL,
                Box::new(Tagger {
                    tag,
                    order: Arc::clone(&order),
                }),
            );
        }

        let mut plan = Plan::build(Stage::Event, EventKind::LockAcquire, true);
        hub.publish_decide(&record(), &mut plan);

        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }
}
