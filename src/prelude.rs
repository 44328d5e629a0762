//! # lockstep Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the lockstep library. Import this module to get quick access to the essential
//! types for driving and customizing the sequencing protocol.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all lockstep operations
pub use crate::Error;

/// The result type used throughout lockstep
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The sequencing engine and its builder
pub use crate::sequencer::{Sequencer, SequencerBuilder};

// ================================================================================================
// Event Vocabulary
// ================================================================================================

/// Stages, event kinds and payload types
pub use crate::event::{AccessKind, EventKind, EventRecord, MemoryAccess, Stage};

// ================================================================================================
// Scheduling Policy Surface
// ================================================================================================

/// Decision records and the hook protocol
pub use crate::hook::{HookPriority, SequenceHook};

/// The mutable decision record published to hooks
pub use crate::sequencer::Plan;

// ================================================================================================
// Collaborators
// ================================================================================================

/// Thread identity and lifecycle tracking
pub use crate::thread::{ThreadId, ThreadRegistry, ThreadState};

/// The cooperative wake/suspend capability
pub use crate::switcher::{CondvarSwitcher, Switcher};
