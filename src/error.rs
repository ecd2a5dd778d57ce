//! Error types used by the groupvisor runtime and its tasks.
//!
//! This module defines:
//!
//! - [`ServiceError`] - the single cause that terminated a service, returned by
//!   [`Service::wait`](crate::Service::wait).
//! - [`SignalError`] - the cause recorded when a configured OS signal arrived.
//! - [`RuntimeError`] - failures while constructing a service.
//!
//! All enums provide `as_label` for logs/metrics, in the same spirit as the
//! event kinds.

use std::sync::Arc;

use thiserror::Error;

use crate::signal::Signal;

/// Boxed error returned by tasks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # A configured OS signal was received.
///
/// Displays as `received <signal description>`, e.g. `received user defined signal 1`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("received {signal}")]
pub struct SignalError {
    /// The signal that was delivered.
    pub signal: Signal,
}

/// # The reason a service stopped.
///
/// Exactly one value is retained per service: the first one produced, in completion
/// order, by any of its tasks. Later causes are discarded.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    /// A task returned an error. Displayed exactly as the task's own error.
    #[error(transparent)]
    Task(Arc<dyn std::error::Error + Send + Sync + 'static>),

    /// A configured OS signal arrived.
    #[error(transparent)]
    Signal(#[from] SignalError),

    /// The service token was cancelled externally (parent or derived token).
    #[error("context canceled")]
    Canceled,

    /// A task panicked.
    #[error("task {task:?} panicked: {message}")]
    Panicked {
        /// Name of the task.
        task: String,
        /// Panic payload, if it was a string.
        message: String,
    },
}

impl ServiceError {
    /// Wraps a task's error without altering it.
    pub fn task(err: impl Into<BoxError>) -> Self {
        ServiceError::Task(Arc::from(err.into()))
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use groupvisor::ServiceError;
    ///
    /// assert_eq!(ServiceError::Canceled.as_label(), "service_canceled");
    /// assert_eq!(ServiceError::task("boom").as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Task(_) => "task_failed",
            ServiceError::Signal(_) => "signal_received",
            ServiceError::Canceled => "service_canceled",
            ServiceError::Panicked { .. } => "task_panicked",
        }
    }

    /// Returns the task's original error, if a task caused the shutdown.
    ///
    /// Use [`downcast_ref`](std::error::Error::downcast_ref) on the result to recover
    /// the concrete type.
    pub fn task_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            ServiceError::Task(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// Returns the signal, if a signal caused the shutdown.
    pub fn signal(&self) -> Option<Signal> {
        match self {
            ServiceError::Signal(err) => Some(err.signal),
            _ => None,
        }
    }

    /// True if the service token was cancelled externally (parent or derived token)
    /// before anything else failed.
    pub fn is_canceled(&self) -> bool {
        matches!(self, ServiceError::Canceled)
    }
}

/// # Errors raised while building a service.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Registering a listener for a signal failed.
    #[error("failed to register listener for {}: {source}", signal.name())]
    SignalRegistration {
        /// The signal that could not be registered.
        signal: Signal,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The signal cannot be listened for on this platform.
    #[error("{} is not supported on this platform", signal.name())]
    UnsupportedSignal {
        /// The rejected signal.
        signal: Signal,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::SignalRegistration { .. } => "runtime_signal_registration",
            RuntimeError::UnsupportedSignal { .. } => "runtime_unsupported_signal",
        }
    }
}
