//! # LogWriter - event printer
//!
//! A minimal subscriber that renders incoming [`Event`]s through `tracing`.
//! Install a `tracing` subscriber (e.g. `tracing-subscriber`) to see the output.
//!
//! ## Example output
//! ```text
//! INFO [spawned] task="task-0"
//! WARN [failed] task="task-0" err="connection refused"
//! INFO [signal] signal=SIGTERM
//! INFO [shutdown-requested] cause="received terminated"
//! INFO [hooks-draining] count=2
//! INFO [hook-completed] hook=2
//! INFO [all-stopped] cause="received terminated"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::TaskSpawned => tracing::debug!(task, "[spawned]"),
            EventKind::TaskStopped => tracing::info!(task, "[stopped]"),
            EventKind::TaskFailed => tracing::warn!(task, err = reason, "[failed]"),
            EventKind::TaskPanicked => tracing::error!(task, info = reason, "[panicked]"),
            EventKind::SignalReceived => {
                let signal = e.signal.map(|s| s.name()).unwrap_or("-");
                tracing::info!(signal, "[signal]");
            }
            EventKind::ShutdownRequested => tracing::info!(cause = reason, "[shutdown-requested]"),
            EventKind::AllStopped => tracing::info!(cause = reason, "[all-stopped]"),
            EventKind::HookRegistered => tracing::debug!("[hook-registered]"),
            EventKind::HookRanInline => tracing::info!("[hook-inline]"),
            EventKind::HooksDraining => tracing::info!(count = e.count, "[hooks-draining]"),
            EventKind::HookCompleted => tracing::debug!(hook = e.hook, "[hook-completed]"),
            EventKind::HookPanicked => {
                tracing::error!(hook = e.hook, info = reason, "[hook-panicked]")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
