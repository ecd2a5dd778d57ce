//! # Service: one task group, its shutdown hooks and its signal handling.
//!
//! The [`Service`] is the handle applications use for one run of a long-lived process.
//! It spawns tasks, registers shutdown hooks and joins everything at the end.
//!
//! ## Key responsibilities
//! - run tasks concurrently; the first failure cancels the shared token
//! - turn a configured OS signal into a shutdown ([`SignalError`](crate::SignalError))
//! - run shutdown hooks once, newest first, as soon as shutdown begins
//! - report the single cause of the shutdown from [`Service::wait`]
//!
//! ## Lifecycle
//! ```text
//! Service::new(&parent, &[Signal::Terminate])
//!   └─► (token, service)
//!
//! service.spawn(task) ... service.register_shutdown_hook(hook) ...
//!
//! first of:
//!   task returns Err / panics     → cause = that error
//!   SIGTERM delivered             → cause = "received terminated"
//!   parent.cancel()               → cause = Canceled
//!        │
//!        ▼
//!   token cancelled ─► tasks exit (cooperatively)
//!                   ─► hooks drained newest-first
//!        │
//!        ▼
//!   service.wait() returns Err(cause)
//! ```
//!
//! ## Example
//! ```rust
//! use groupvisor::{BoxError, Service};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let (token, svc) = Service::new(&CancellationToken::new(), &[]).unwrap();
//!
//!     svc.register_shutdown_hook(|| async { println!("closing database") }).await;
//!
//!     let ctx = token.clone();
//!     svc.spawn(async move {
//!         ctx.cancelled().await;
//!         Ok::<_, BoxError>(())
//!     });
//!     svc.spawn(async { Err::<(), BoxError>("config missing".into()) });
//!
//!     let err = svc.wait().await.unwrap_err();
//!     assert_eq!(err.to_string(), "config missing");
//! }
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::builder::ServiceBuilder;
use super::group::TaskGroup;
use super::hooks::{self, HookRegistrar};
use crate::{
    config::Config,
    error::{BoxError, RuntimeError, ServiceError},
    events::{Bus, Event},
    signal::Signal,
    tasks::{TaskFn, TaskRef},
};

/// Handle to a running service. Cheap to clone; clones share the same group.
#[derive(Clone)]
pub struct Service {
    group: TaskGroup,
    hooks: HookRegistrar,
    token: CancellationToken,
    bus: Bus,
    next_id: Arc<AtomicU64>,
}

impl Service {
    /// Creates a service shutting down on the first task error, on any of `signals`,
    /// or when `parent` is cancelled.
    ///
    /// Returns the derived token that spawned tasks should watch, and the service.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// [`RuntimeError::SignalRegistration`] if a signal cannot be listened for.
    pub fn new(
        parent: &CancellationToken,
        signals: &[Signal],
    ) -> Result<(CancellationToken, Service), RuntimeError> {
        ServiceBuilder::new(Config::default().with_signals(signals.iter().copied())).build(parent)
    }

    /// Returns a builder for services with subscribers or a custom signal source.
    pub fn builder(cfg: Config) -> ServiceBuilder {
        ServiceBuilder::new(cfg)
    }

    pub(crate) fn from_parts(
        group: TaskGroup,
        hooks: HookRegistrar,
        token: CancellationToken,
        bus: Bus,
    ) -> Self {
        Self {
            group,
            hooks,
            token,
            bus,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Runs `fut` as a task of the service.
    ///
    /// The first task to return an error cancels the service; its error will be
    /// returned by [`wait`](Self::wait). Tasks are named `task-<n>` in events.
    pub fn spawn<F, E>(&self, fut: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let name: Arc<str> = format!("task-{id}").into();
        self.group
            .spawn(name, async move { fut.await.map_err(ServiceError::task) });
    }

    /// Runs a named [`Task`](crate::Task), handing it the service token.
    pub fn spawn_task(&self, task: TaskRef) {
        let name: Arc<str> = task.name().into();
        let fut = task.spawn(self.token.clone());
        self.group
            .spawn(name, async move { fut.await.map_err(ServiceError::task) });
    }

    /// Runs a closure-backed task under `name`; see [`TaskFn`].
    pub fn spawn_fn<F, Fut, E>(&self, name: impl Into<Cow<'static, str>>, f: F)
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        self.spawn_task(TaskFn::arc(name, f));
    }

    /// Waits for every task and every queued shutdown hook to finish.
    ///
    /// Returns the error that caused the shutdown. Without a failing task, a signal
    /// or a cancelled parent this never returns.
    pub async fn wait(&self) -> Result<(), ServiceError> {
        self.group.wait().await
    }

    /// Registers `hook` to run when the service shuts down.
    ///
    /// Hooks registered before shutdown run newest-first, one at a time, and
    /// [`wait`](Self::wait) waits for them. A hook registered once shutdown has begun
    /// runs right here, before this call returns. A panicking hook is logged and skipped.
    pub async fn register_shutdown_hook<F, Fut>(&self, hook: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.hooks.register(hooks::boxed(hook)).await;
    }

    /// The token cancelled when the service shuts down.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// True once shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns the cause recorded so far, without waiting.
    pub fn cause(&self) -> Option<ServiceError> {
        self.group.cause().cloned()
    }

    /// Returns a receiver for the service's lifecycle events.
    ///
    /// Only events published after this call are observed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }
}
