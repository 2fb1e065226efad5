//! Deploy Event Port
//!
//! Provides an observable interface for deploy operations.
//! Enables progress reporting, JSON event streams, and debugging.
//!
//! Events from different targets interleave; events of one target arrive in
//! step order.

use crate::domain::entities::{ErrorRecord, Summary, TargetStatus};

/// Event emitted during deploy operations
#[derive(Debug, Clone, PartialEq)]
pub enum DeployEvent {
    /// Deploy started
    Started {
        preset: String,
        target_count: usize,
        step_count: usize,
        workers: usize,
    },

    /// A worker picked up a target
    TargetStarted { target: String },

    /// Session opened
    Connected { target: String },

    /// Step about to run
    StepStarted {
        target: String,
        index: usize,
        description: String,
    },

    /// Step completed
    StepSucceeded {
        target: String,
        index: usize,
        output: Option<String>,
    },

    /// Step failed; the target stops here
    StepFailed {
        target: String,
        index: usize,
        error: ErrorRecord,
    },

    /// Target finished (any status)
    TargetFinished {
        target: String,
        status: TargetStatus,
        error: Option<ErrorRecord>,
    },

    /// Deploy completed
    Completed { summary: Summary, success: bool },
}

/// Receiver for deploy events.
///
/// Called concurrently from every worker thread. Implementations in this
/// crate: `ConsoleEventSink` (progress on stderr), `JsonEventSink` (NDJSON
/// for CI) and [`NoopEventSink`].
pub trait DeployEventSink: Send + Sync {
    /// Handle a deploy event
    fn on_event(&self, event: DeployEvent);

    /// Check if this sink wants per-step events
    ///
    /// Some sinks (like CI) may only want summary events.
    fn wants_detailed_events(&self) -> bool {
        true
    }
}

/// No-op event sink for silent operation
pub struct NoopEventSink;

impl DeployEventSink for NoopEventSink {
    fn on_event(&self, _event: DeployEvent) {}

    fn wants_detailed_events(&self) -> bool {
        false
    }
}
