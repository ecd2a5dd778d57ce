use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use super::bridge::{self, OsSignals, SignalSource};
use super::group::TaskGroup;
use super::hooks;
use super::service::Service;
use crate::{
    config::Config,
    error::RuntimeError,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Name of the internal hook manager task.
pub(crate) const HOOKS_TASK: &str = "shutdown-hooks";
/// Name of the internal signal bridge task.
pub(crate) const SIGNALS_TASK: &str = "signal-bridge";

/// Builder for constructing a [`Service`] with optional features.
pub struct ServiceBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    source: Option<Box<dyn SignalSource>>,
}

impl ServiceBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            source: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Uses `source` instead of registering [`Config::signals`] with the OS.
    pub fn with_signal_source(mut self, source: impl SignalSource) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Builds the service and starts its internal tasks.
    ///
    /// Returns the token every task should watch for graceful exit, and the service.
    /// The token is a child of `parent`: cancelling `parent` shuts the service down,
    /// while the service never cancels `parent`.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// [`RuntimeError::SignalRegistration`] if a configured signal cannot be listened for.
    pub fn build(
        self,
        parent: &CancellationToken,
    ) -> Result<(CancellationToken, Service), RuntimeError> {
        let source: Option<Box<dyn SignalSource>> = match self.source {
            Some(source) => Some(source),
            None if self.cfg.has_signals() => {
                Some(Box::new(OsSignals::register(&self.cfg.unique_signals())?))
            }
            None => None,
        };

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        if !self.subscribers.is_empty() {
            subscriber_listener(&bus, self.subscribers);
        }

        let token = parent.child_token();
        let group = TaskGroup::new(token.clone(), bus.clone());

        let (registrar, manager) = hooks::channel(token.clone(), bus.clone());
        group.spawn(HOOKS_TASK.into(), manager.run());

        if let Some(source) = source {
            group.spawn(
                SIGNALS_TASK.into(),
                bridge::run(source, token.clone(), bus.clone()),
            );
        }

        let service = Service::from_parts(group, registrar, token.clone(), bus);
        Ok((token, service))
    }
}

/// Forwards bus events to the subscriber set until every publisher is gone.
fn subscriber_listener(bus: &Bus, subscribers: Vec<Arc<dyn Subscribe>>) {
    let mut rx = bus.subscribe();
    let set = SubscriberSet::new(subscribers);
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscriber listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        set.shutdown().await;
    });
}
