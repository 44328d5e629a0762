// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # lockstep
//!
//! [![Crates.io](https://img.shields.io/crates/v/lockstep.svg)](https://crates.io/crates/lockstep)
//! [![Documentation](https://docs.rs/lockstep/badge.svg)](https://docs.rs/lockstep)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/BinFlip/lockstep/blob/main/LICENSE-APACHE)
//!
//! The sequencing core of a dynamic concurrency-instrumentation tool. `lockstep` takes a
//! genuinely multi-threaded, racy execution and serializes it into a strictly alternating,
//! single-active-thread schedule, while exposing hooks at which an external scheduling policy
//! decides which thread runs next. The crate enforces *that* only one logical thread is ever
//! runnable; it deliberately never decides *which*.
//!
//! ## Features
//!
//! - **🔒 Mutual exclusion by construction** - a binary exclusivity token, claimed and ceded at
//!   protocol-defined handoff points, guarantees one runnable thread; violations are fatal
//!   assertions, never silent corruption
//! - **⏱️ Total order over turns** - a logical clock stamps every yield→resume cycle, giving
//!   downstream analyses a process-wide total order to correlate against
//! - **🧩 Pluggable scheduling policy** - decision records are published to prioritized hooks
//!   that may rewrite the wake target before the engine acts
//! - **🧵 Real OS threads, cooperative logic** - suspension and waking go through an injected
//!   [`Switcher`] capability; tests script it, production uses [`CondvarSwitcher`]
//! - **🪦 Tombstone retirement** - events from exited threads short-circuit into no-ops, so
//!   stale in-flight interceptions cannot corrupt the schedule
//!
//! ## Quick Start
//!
//! Add `lockstep` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! lockstep = "0.1"
//! ```
//!
//! ### Using the Prelude
//!
//! ```rust
//! use std::sync::Arc;
//! use lockstep::prelude::*;
//!
//! let registry = Arc::new(ThreadRegistry::new());
//! registry.register_main()?;
//!
//! let sequencer = Sequencer::builder()
//!     .registry(Arc::clone(&registry))
//!     .hook(|event: &EventRecord<'_>, plan: &mut Plan| {
//!         // Single-threaded toy policy: hand execution back to the acting thread.
//!         if plan.wake && plan.next.is_any() {
//!             plan.next = event.thread;
//!         }
//!     })
//!     .build();
//!
//! // A memory access yields before it takes effect, a call yields after it returns.
//! sequencer.on_before(&EventRecord::new(EventKind::Write, ThreadId::MAIN));
//! sequencer.on_after(&EventRecord::new(EventKind::Write, ThreadId::MAIN));
//! assert_eq!(sequencer.turns(), 1);
//! # Ok::<(), lockstep::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `lockstep` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`event`] - The event vocabulary: stages, kinds, memory-access payloads
//! - [`sequencer`] - Decision records, exclusivity token, logical clock, and the engine
//! - [`hook`] - The decision-publish protocol and the scheduling-policy surface
//! - [`thread`] - Thread identity, registration and retirement
//! - [`switcher`] - The cooperative wake/suspend capability
//! - [`Error`] and [`Result`] - Error handling for registry misuse
//!
//! ### The Protocol
//!
//! The interception layer (not part of this crate) observes memory accesses, calls and thread
//! lifecycle events, and drives one of three stage entry points per observation:
//!
//! 1. The engine builds a default decision for the stage - who yields, whether a successor is
//!    woken - from the event kind alone.
//! 2. The decision is published to every registered [`SequenceHook`]; a policy hook typically
//!    replaces the wildcard wake target with a concrete thread.
//! 3. The engine applies the result: cede the exclusivity token, wake the successor, park the
//!    acting thread. On resume the logical clock advances and a resume notification fires.
//!
//! A thread that never reaches a yield point stalls the schedule; that is the accepted cost of
//! a purely cooperative design, not a recoverable condition.
//!
//! ### Thread Safety
//!
//! One [`Sequencer`] instance serves the whole process and is shared behind `Arc`. The
//! exclusivity token and the logical clock are its only cross-thread mutable state; decision
//! records live and die inside a single sequencing call.

#[macro_use]
pub(crate) mod macros;

pub(crate) mod error;

pub mod event;
pub mod hook;
pub mod sequencer;
pub mod switcher;
pub mod thread;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use lockstep::prelude::*;
///
/// let plan = Plan::build(Stage::Before, EventKind::Read, false);
/// assert!(plan.suspend);
/// ```
pub mod prelude;

/// The result type used throughout `lockstep`.
///
/// # Examples
///
/// ```rust
/// use lockstep::{Result, ThreadId, ThreadRegistry};
///
/// fn retire(registry: &ThreadRegistry, id: ThreadId) -> Result<()> {
///     registry.retire(id)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `lockstep` Error type
///
/// Covers recoverable misuse of the thread registry; scheduling-invariant violations are fatal
/// assertions instead, see [`sequencer`].
pub use error::Error;

pub use event::{AccessKind, EventKind, EventRecord, MemoryAccess, Stage};
pub use hook::{DecisionHub, HookPriority, SequenceHook};
pub use sequencer::{ExclusivityToken, LogicalClock, Plan, Sequencer, SequencerBuilder};
pub use switcher::{CondvarSwitcher, Switcher};
pub use thread::{ThreadId, ThreadRecord, ThreadRegistry, ThreadState};
