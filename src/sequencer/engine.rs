//! The sequencing engine - turns decision records into wake/yield actions.
//!
//! [`Sequencer`] is the single place where the protocol happens. Per sequenced event it:
//!
//! 1. Drops the event if the acting thread is retired (stale in-flight events are an expected
//!    race around thread exit, not an error).
//! 2. Checks the exclusivity-token invariant.
//! 3. Publishes the decision record to every hook for override.
//! 4. Re-checks the token invariant.
//! 5. Force-cedes the token for a before-thread-create decision (the child claims it at its
//!    self-init).
//! 6. On `wake`: force-cedes the token, then wakes the plan's target.
//! 7. On `suspend`: parks the acting thread; on resume publishes the resume notification,
//!    advances the logical clock under its lock, and claims the token.
//!
//! Construction goes through [`SequencerBuilder`], which injects the thread registry, the
//! switcher primitive and the decision hooks; the token and clock are owned by the built
//! instance so the engine stays testable against scripted collaborators.

use std::sync::Arc;

use crate::{
    event::{EventKind, EventRecord, Stage},
    hook::{DecisionHub, HookPriority, SequenceHook},
    sequencer::{clock::LogicalClock, plan::Plan, token::ExclusivityToken},
    switcher::{CondvarSwitcher, Switcher},
    thread::ThreadRegistry,
};

/// The sequencing engine: one instance per process, shared by all sequenced threads.
///
/// The engine exposes one entry point per interception stage. The interception layer calls
/// [`on_event`](Self::on_event) for one-shot observations (thread lifecycle, annotations) and
/// brackets operations with [`on_before`](Self::on_before) / [`on_after`](Self::on_after).
/// Each call builds the default decision for its stage, publishes it for policy override, and
/// applies the result.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use lockstep::prelude::*;
///
/// let registry = Arc::new(ThreadRegistry::new());
/// registry.register_main()?;
///
/// let sequencer = Sequencer::builder()
///     .registry(Arc::clone(&registry))
///     .hook(|event: &EventRecord<'_>, plan: &mut Plan| {
///         // Toy policy: hand execution straight back to the acting thread.
///         if plan.wake && plan.next.is_any() {
///             plan.next = event.thread;
///         }
///     })
///     .build();
///
/// sequencer.on_before(&EventRecord::new(EventKind::Write, ThreadId::MAIN));
/// sequencer.on_after(&EventRecord::new(EventKind::Write, ThreadId::MAIN));
/// assert_eq!(sequencer.turns(), 1);
/// # Ok::<(), lockstep::Error>(())
/// ```
pub struct Sequencer {
    hub: DecisionHub,
    registry: Arc<ThreadRegistry>,
    switcher: Arc<dyn Switcher>,
    token: ExclusivityToken,
    clock: LogicalClock,
}

impl Sequencer {
    /// Starts building an engine.
    #[must_use]
    pub fn builder() -> SequencerBuilder {
        SequencerBuilder::default()
    }

    /// The thread registry this engine consults.
    #[must_use]
    pub fn registry(&self) -> &Arc<ThreadRegistry> {
        &self.registry
    }

    /// The most recently completed scheduling turn.
    #[must_use]
    pub fn turns(&self) -> u64 {
        self.clock.current()
    }

    /// Generic event stage: one-shot observations.
    ///
    /// A non-main thread's self-init claims the exclusivity token here, before any checkpoint
    /// runs - its creator ceded the token on its behalf at thread-create.
    pub fn on_event(&self, event: &EventRecord<'_>) {
        if event.kind == EventKind::SelfInit
            && !event.thread.is_main()
            && !self.registry.is_retired(event.thread)
        {
            self.token.claim();
        }

        let mut plan = Plan::build(Stage::Event, event.kind, event.thread.is_main());
        self.sequence(event, &mut plan);
    }

    /// Before-operation stage: fired immediately before an intercepted operation executes.
    pub fn on_before(&self, event: &EventRecord<'_>) {
        let mut plan = Plan::build(Stage::Before, event.kind, event.thread.is_main());
        self.sequence(event, &mut plan);
    }

    /// After-operation stage: fired immediately after an intercepted operation returns.
    pub fn on_after(&self, event: &EventRecord<'_>) {
        let mut plan = Plan::build(Stage::After, event.kind, event.thread.is_main());
        self.sequence(event, &mut plan);
    }

    fn sequence(&self, event: &EventRecord<'_>, plan: &mut Plan) {
        if self.registry.is_retired(event.thread) {
            return;
        }

        self.checkpoint(plan);
        self.hub.publish_decide(event, plan);
        self.checkpoint(plan);

        log::trace!(
            "{:?}/{:?} by {}: wake={} suspend={} next={}",
            plan.stage(),
            plan.kind(),
            event.thread,
            plan.wake,
            plan.suspend,
            plan.next
        );

        if plan.stage() == Stage::Before && plan.kind() == EventKind::ThreadCreate {
            self.token.cede();
        }

        if plan.wake {
            self.token.cede();
            self.switcher.wake(plan.next);
        }

        if plan.suspend {
            self.switcher.suspend(event.thread, true);
            self.hub.publish_resume(event, plan);
            let turn = self.clock.advance();
            log::debug!("turn {turn}: {} resumed", event.thread);
            self.token.claim();
        }
    }

    fn checkpoint(&self, plan: &Plan) {
        // After a call-shaped operation the handoff is still in flight: ownership is with the
        // woken successor, or with a created child that has not claimed yet.
        if plan.stage() == Stage::After && !plan.kind().is_memory_access() {
            return;
        }
        self.token.assert_owned();
    }
}

/// Builder wiring hooks, registry and switcher into a [`Sequencer`].
///
/// Missing collaborators fall back to a fresh [`ThreadRegistry`] and a [`CondvarSwitcher`].
/// Note that without a scheduling-policy hook every wake stays at the wildcard target, which
/// the default switcher treats as a no-op: a multi-threaded setup then stalls at its first
/// yield. Install a policy.
#[derive(Default)]
pub struct SequencerBuilder {
    hub: DecisionHub,
    registry: Option<Arc<ThreadRegistry>>,
    switcher: Option<Arc<dyn Switcher>>,
}

impl SequencerBuilder {
    /// Registers a decision hook at [`HookPriority::NORMAL`].
    #[must_use]
    pub fn hook<H>(self, hook: H) -> Self
    where
        H: SequenceHook + 'static,
    {
        self.hook_with_priority(HookPriority::NORMAL, hook)
    }

    /// Registers a decision hook at an explicit priority.
    #[must_use]
    pub fn hook_with_priority<H>(mut self, priority: HookPriority, hook: H) -> Self
    where
        H: SequenceHook + 'static,
    {
        self.hub.register(priority, Box::new(hook));
        self
    }

    /// Uses the given thread registry instead of a fresh one.
    #[must_use]
    pub fn registry(mut self, registry: Arc<ThreadRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Uses the given switcher primitive instead of a [`CondvarSwitcher`].
    #[must_use]
    pub fn switcher(mut self, switcher: Arc<dyn Switcher>) -> Self {
        self.switcher = Some(switcher);
        self
    }

    /// Builds the engine. The exclusivity token starts owned - the main thread holds it from
    /// process start.
    #[must_use]
    pub fn build(self) -> Sequencer {
        Sequencer {
            hub: self.hub,
            registry: self
                .registry
                .unwrap_or_else(|| Arc::new(ThreadRegistry::new())),
            switcher: self
                .switcher
                .unwrap_or_else(|| Arc::new(CondvarSwitcher::new())),
            token: ExclusivityToken::new(),
            clock: LogicalClock::new(),
        }
    }
}
