//! # Cancel-on-first-error task group.
//!
//! [`TaskGroup`] runs every task of a service, records the first termination cause
//! and exposes one join point.
//!
//! ## Rules
//! - The first task to finish with an error stores it; later errors are discarded
//! - Storing the cause happens-before the shared token is cancelled
//! - A task returning `Ok(())` changes nothing
//! - A panicking task counts as a failed task ([`ServiceError::Panicked`])
//! - [`TaskGroup::wait`] is a full join: it returns only after every task returned
//!
//! Tasks are never interrupted; a task that ignores cancellation keeps `wait` pending.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::core::panic_message;
use crate::error::ServiceError;
use crate::events::{Bus, Event, EventKind};

/// Group of concurrently running tasks sharing one cancellation token.
#[derive(Clone)]
pub(crate) struct TaskGroup {
    token: CancellationToken,
    tracker: TaskTracker,
    cause: Arc<OnceLock<ServiceError>>,
    bus: Bus,
}

impl TaskGroup {
    pub(crate) fn new(token: CancellationToken, bus: Bus) -> Self {
        Self {
            token,
            tracker: TaskTracker::new(),
            cause: Arc::new(OnceLock::new()),
            bus,
        }
    }

    /// Starts `fut` on the runtime as a member of the group.
    pub(crate) fn spawn<F>(&self, name: Arc<str>, fut: F)
    where
        F: Future<Output = Result<(), ServiceError>> + Send + 'static,
    {
        self.bus
            .publish(Event::new(EventKind::TaskSpawned).with_task(name.clone()));

        let group = self.clone();
        self.tracker.spawn(async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(())) => {
                    group
                        .bus
                        .publish(Event::new(EventKind::TaskStopped).with_task(name));
                }
                Ok(Err(ServiceError::Canceled)) => {
                    group.bus.publish(
                        Event::new(EventKind::TaskStopped)
                            .with_task(name)
                            .with_reason("canceled"),
                    );
                    group.fail(ServiceError::Canceled);
                }
                Ok(Err(err)) => {
                    group.bus.publish(
                        Event::new(EventKind::TaskFailed)
                            .with_task(name)
                            .with_reason(err.to_string()),
                    );
                    group.fail(err);
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    group.bus.publish(
                        Event::new(EventKind::TaskPanicked)
                            .with_task(name.clone())
                            .with_reason(message.clone()),
                    );
                    group.fail(ServiceError::Panicked {
                        task: name.to_string(),
                        message,
                    });
                }
            }
        });
    }

    /// Records `err` if no cause is set yet, then cancels the group.
    fn fail(&self, err: ServiceError) {
        let reason = err.to_string();
        if self.cause.set(err).is_ok() {
            tracing::debug!(cause = %reason, "shutdown requested");
            self.bus
                .publish(Event::new(EventKind::ShutdownRequested).with_reason(reason));
            self.token.cancel();
        }
    }

    /// Waits for every task of the group, then returns the recorded cause.
    ///
    /// May be called repeatedly; each call reports the same cause.
    pub(crate) async fn wait(&self) -> Result<(), ServiceError> {
        self.tracker.close();
        self.tracker.wait().await;

        let cause = self.cause.get().cloned();
        let mut ev = Event::new(EventKind::AllStopped);
        if let Some(err) = &cause {
            ev = ev.with_reason(err.to_string());
        }
        self.bus.publish(ev);

        match cause {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Returns the recorded cause, if any.
    pub(crate) fn cause(&self) -> Option<&ServiceError> {
        self.cause.get()
    }

    /// Number of tasks that have not returned yet.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.tracker.len()
    }
}
