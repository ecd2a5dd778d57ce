//! Runtime core: task group, shutdown hooks, signal bridge and the service facade.
//!
//! The public API from this module is [`Service`] (with [`ServiceBuilder`]) and the
//! [`SignalSource`] seam with its OS implementation [`OsSignals`].
//!
//! Internal modules:
//! - [`group`]: cancel-on-first-error task group with a single join point;
//! - [`hooks`]: shutdown hook queue owned by one manager task;
//! - [`bridge`]: turns a delivered OS signal into a termination cause;
//! - [`service`]: facade binding the three together;
//! - [`builder`]: assembles a service from [`Config`](crate::Config).
//!
//! ## Wiring
//! ```text
//! ServiceBuilder::build(parent)
//!   ├─► token = parent.child_token()
//!   ├─► TaskGroup { token, TaskTracker, OnceLock<ServiceError> }
//!   ├─► group.spawn("shutdown-hooks", HookManager::run)
//!   ├─► group.spawn("signal-bridge",  bridge::run)        (if signals configured)
//!   └─► Service { group, HookRegistrar, token }
//!
//! Termination:
//!   task Err / panic ─┐
//!   signal          ──┼─► OnceLock::set (first wins) ─► token.cancel()
//!   parent cancel   ──┘                                    │
//!                                HookManager: close rx, drain LIFO, return
//!                                                          │
//!                                Service::wait ◄── TaskTracker::wait
//! ```

mod bridge;
mod builder;
mod group;
mod hooks;
mod service;

pub use bridge::{OsSignals, SignalSource};
pub use builder::ServiceBuilder;
pub use service::Service;

use std::any::Any;

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
