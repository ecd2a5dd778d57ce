//! # Lifecycle events emitted by a service.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Task events**: spawn, clean exit, failure, panic
//! - **Shutdown events**: signal received, shutdown requested, all stopped
//! - **Hook events**: registration, inline execution, drain progress
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task name,
//! reasons, signal and hook positions.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use groupvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task("db-writer")
//!     .with_reason("connection reset");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("db-writer"));
//! assert_eq!(ev.reason.as_deref(), Some("connection reset"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::signal::Signal;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Task events ===
    /// A task was handed to the group.
    ///
    /// Sets:
    /// - `task`: task name
    TaskSpawned,

    /// A task returned without error, or an internal task observed cancellation.
    ///
    /// Sets:
    /// - `task`: task name
    TaskStopped,

    /// A task returned an error.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `reason`: error message
    TaskFailed,

    /// A task panicked. Treated as a failure of that task.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `reason`: panic message
    TaskPanicked,

    // === Shutdown events ===
    /// A configured OS signal arrived.
    ///
    /// Sets:
    /// - `signal`: the signal
    SignalReceived,

    /// The first termination cause was recorded and the shared token cancelled.
    ///
    /// Sets:
    /// - `reason`: termination cause message
    ShutdownRequested,

    /// Every task of the group has returned.
    ///
    /// Sets:
    /// - `reason`: termination cause message, if any
    AllStopped,

    // === Hook events ===
    /// A shutdown hook was queued.
    HookRegistered,

    /// A shutdown hook arrived after shutdown began and runs on the caller.
    HookRanInline,

    /// The hook queue is being drained.
    ///
    /// Sets:
    /// - `count`: number of queued hooks
    HooksDraining,

    /// A shutdown hook finished.
    ///
    /// Sets:
    /// - `hook`: registration position (1-based) for queued hooks, unset for inline hooks
    HookCompleted,

    /// A shutdown hook panicked; the drain went on with the next hook.
    ///
    /// Sets:
    /// - `hook`: registration position (1-based) for queued hooks, unset for inline hooks
    /// - `reason`: panic message
    HookPanicked,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the task, if applicable.
    pub task: Option<Arc<str>>,
    /// Human-readable reason (errors, panic payloads).
    pub reason: Option<Arc<str>>,
    /// Signal, for [`EventKind::SignalReceived`].
    pub signal: Option<Signal>,
    /// Hook registration position (1-based).
    pub hook: Option<u32>,
    /// Number of hooks about to run.
    pub count: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            reason: None,
            signal: None,
            hook: None,
            count: None,
        }
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the received signal.
    #[inline]
    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Attaches a hook position.
    #[inline]
    pub fn with_hook(mut self, position: usize) -> Self {
        self.hook = Some(position.min(u32::MAX as usize) as u32);
        self
    }

    /// Attaches a hook count.
    #[inline]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count.min(u32::MAX as usize) as u32);
        self
    }

    /// True for events about shutdown hooks.
    #[inline]
    pub fn is_hook_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::HookRegistered
                | EventKind::HookRanInline
                | EventKind::HooksDraining
                | EventKind::HookCompleted
                | EventKind::HookPanicked
        )
    }
}
