//! # Shutdown hooks: single-owner queue fed by channel handoff.
//!
//! The [`HookManager`] runs as a task of the group and is the only owner of the
//! hook queue. Producers hold a [`HookRegistrar`] and never touch the queue: they
//! either hand a hook over the channel or, once shutdown has begun, run it themselves.
//!
//! ## States
//! ```text
//! Accepting ──(token cancelled)──► Draining ──(last hook returned)──► Closed
//!     │                                │
//!     └─ rx.recv() → queue.push()      ├─ rx.close(), collect hooks already handed over
//!                                      └─ run queue in reverse (LIFO), one at a time
//! ```
//!
//! ## Rules
//! - Hooks run exactly once: queued and drained, or inline on the registering caller
//! - Queued hooks run sequentially in reverse registration order
//! - Registration never deadlocks: it races the handoff against cancellation
//! - A panicking hook is caught and reported; the drain continues with the next one
//! - No timeout: a hook that never returns keeps the service from finishing

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::panic_message;
use crate::error::ServiceError;
use crate::events::{Bus, Event, EventKind};

/// A registered cleanup action.
pub(crate) type ShutdownHook = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send + 'static>;

/// Boxes a hook closure.
pub(crate) fn boxed<F, Fut>(hook: F) -> ShutdownHook
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Box::new(move || hook().boxed())
}

/// Creates the registrar/manager pair for one service.
///
/// The channel holds a single slot, so a handoff completes only while the manager
/// is still accepting.
pub(crate) fn channel(token: CancellationToken, bus: Bus) -> (HookRegistrar, HookManager) {
    let (tx, rx) = mpsc::channel(1);
    (
        HookRegistrar {
            tx,
            token: token.clone(),
            bus: bus.clone(),
        },
        HookManager { rx, token, bus },
    )
}

/// Producer side: hands hooks to the manager or runs them inline.
#[derive(Clone)]
pub(crate) struct HookRegistrar {
    tx: mpsc::Sender<ShutdownHook>,
    token: CancellationToken,
    bus: Bus,
}

impl HookRegistrar {
    /// Queues `hook`, or runs it before returning if shutdown has already begun.
    pub(crate) async fn register(&self, hook: ShutdownHook) {
        let permit = tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            permit = self.tx.reserve() => permit.ok(),
        };

        match permit {
            Some(permit) => {
                permit.send(hook);
                self.bus.publish(Event::new(EventKind::HookRegistered));
            }
            None => {
                self.bus.publish(Event::new(EventKind::HookRanInline));
                run_hook(hook, None, &self.bus).await;
            }
        }
    }
}

/// Consumer side: owns the queue and drains it on cancellation.
pub(crate) struct HookManager {
    rx: mpsc::Receiver<ShutdownHook>,
    token: CancellationToken,
    bus: Bus,
}

impl HookManager {
    /// Accepts hooks until the token is cancelled, then drains them in reverse order.
    ///
    /// Always finishes with [`ServiceError::Canceled`], which never replaces a cause
    /// recorded earlier.
    pub(crate) async fn run(mut self) -> Result<(), ServiceError> {
        let mut queue: Vec<ShutdownHook> = Vec::new();

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                received = self.rx.recv() => match received {
                    Some(hook) => queue.push(hook),
                    None => {
                        // every registrar is gone; nothing more can arrive
                        self.token.cancelled().await;
                        break;
                    }
                },
            }
        }

        // Hooks whose slot was reserved before the close are still delivered.
        self.rx.close();
        while let Some(hook) = self.rx.recv().await {
            queue.push(hook);
        }

        self.bus
            .publish(Event::new(EventKind::HooksDraining).with_count(queue.len()));
        while let Some(hook) = queue.pop() {
            let position = queue.len() + 1;
            run_hook(hook, Some(position), &self.bus).await;
        }

        Err(ServiceError::Canceled)
    }
}

/// Runs one hook to completion, containing a panic.
async fn run_hook(hook: ShutdownHook, position: Option<usize>, bus: &Bus) {
    let outcome = AssertUnwindSafe(async move { hook().await })
        .catch_unwind()
        .await;

    let ev = match outcome {
        Ok(()) => Event::new(EventKind::HookCompleted),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(hook = ?position, info = %message, "shutdown hook panicked");
            Event::new(EventKind::HookPanicked).with_reason(message)
        }
    };
    bus.publish(match position {
        Some(position) => ev.with_hook(position),
        None => ev,
    });
}
