//! # Task abstraction.
//!
//! A [`Task`] is a named unit of work run once by a [`Service`](crate::Service).
//! It receives the service's [`CancellationToken`] and is expected to return
//! promptly once the token is cancelled; the service never interrupts it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::BoxError;

/// Future returned by [`Task::spawn`].
pub type BoxTaskFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'static>>;

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// # Named, cancelable unit of work.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use groupvisor::{BoxTaskFuture, Task};
///
/// struct Heartbeat;
///
/// impl Task for Heartbeat {
///     fn name(&self) -> &str { "heartbeat" }
///
///     fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture {
///         Box::pin(async move {
///             ctx.cancelled().await;
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Creates the future that performs the work.
    ///
    /// Returning `Err` cancels the whole service; the error becomes the value
    /// returned by [`Service::wait`](crate::Service::wait) unless another cause won.
    fn spawn(&self, ctx: CancellationToken) -> BoxTaskFuture;
}
