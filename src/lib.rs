//! # groupvisor
//!
//! **Groupvisor** coordinates the lifecycle of a long-running async process.
//!
//! A [`Service`] runs a set of tasks that share one
//! [`CancellationToken`](tokio_util::sync::CancellationToken).
//! The first task to fail, the first configured OS signal, or the cancellation of the
//! parent token shuts the whole service down. Cleanup actions registered as shutdown
//! hooks then run newest-first, and [`Service::wait`] reports the single cause.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  user task   │   │  user task   │   │ shutdown hook│
//!     │  (spawn)     │   │ (spawn_task) │   │  (register)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Service (facade)                                                 │
//! │  - TaskGroup     (TaskTracker + first-error cause + token)        │
//! │  - HookManager   (single-owner hook queue, drained LIFO)          │
//! │  - SignalBridge  (SignalSource → SignalError)                     │
//! │  - Bus           (broadcast lifecycle events)                     │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        │ TaskSpawned      │ HookRegistered   │ SignalReceived│
//!        │ TaskFailed       │ HooksDraining    │               │
//!        │ AllStopped       │ HookCompleted    │               │
//!        ▼                  ▼                  ▼               ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                   (capacity: Config::bus_capacity)                │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                           (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                      worker1   worker2   workerN
//! ```
//!
//! ### Lifecycle
//! ```text
//! Service::new(parent, signals) ──► (token, service)
//!
//! running:
//!   ├─► service.spawn(fut)               task joins the group
//!   └─► service.register_shutdown_hook   hook handed to the manager
//!
//! shutdown (first of):
//!   ├─ task returns Err / panics     ─► cause = task error / Panicked
//!   ├─ configured signal delivered   ─► cause = SignalError ("received terminated")
//!   └─ parent token cancelled        ─► cause = Canceled
//!         │
//!         ├─► token.cancel()
//!         ├─► tasks observe the token and return
//!         ├─► hooks run in reverse registration order, one at a time
//!         └─► late hook registrations run inline on the caller
//!
//! service.wait() ──► Err(cause) once every task and hook has returned
//! ```
//!
//! ## Features
//! | Area              | Description                                                       | Key types / traits                     |
//! |-------------------|-------------------------------------------------------------------|----------------------------------------|
//! | **Service**       | Task group, shutdown hooks, signal handling behind one handle.    | [`Service`], [`ServiceBuilder`]        |
//! | **Signals**       | Portable signal names and a pluggable delivery source.            | [`Signal`], [`SignalSource`], [`OsSignals`] |
//! | **Subscriber API**| Observe lifecycle events (logging, metrics, custom subscribers).  | [`Subscribe`], [`Event`]               |
//! | **Errors**        | Typed termination causes and construction errors.                 | [`ServiceError`], [`RuntimeError`]     |
//! | **Tasks**         | Named tasks as trait objects or closures.                         | [`Task`], [`TaskFn`], [`TaskRef`]      |
//! | **Configuration** | Signals to listen for, event bus capacity.                        | [`Config`]                             |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] subscriber backed by `tracing`.
//!
//! ## Example
//! ```rust,no_run
//! use groupvisor::{BoxError, Service, Signal};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (token, svc) =
//!         Service::new(&CancellationToken::new(), &[Signal::Interrupt, Signal::Terminate])
//!             .expect("register signals");
//!
//!     svc.register_shutdown_hook(|| async { println!("flushing buffers") })
//!         .await;
//!
//!     let ctx = token.clone();
//!     svc.spawn(async move {
//!         ctx.cancelled().await;
//!         println!("server stopped");
//!         Ok::<_, BoxError>(())
//!     });
//!
//!     // Returns after Ctrl-C with "received interrupt".
//!     if let Err(err) = svc.wait().await {
//!         println!("shutdown: {err}");
//!     }
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod signal;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use config::Config;
pub use core::{OsSignals, Service, ServiceBuilder, SignalSource};
pub use error::{BoxError, RuntimeError, ServiceError, SignalError};
pub use events::{Bus, Event, EventKind};
pub use signal::{ParseSignalError, Signal};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{BoxTaskFuture, Task, TaskFn, TaskRef};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
