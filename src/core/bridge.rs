//! # Signal bridge: OS signal → termination cause.
//!
//! Delivery of OS signals is hidden behind [`SignalSource`], so the bridge can be
//! driven by a fake source in tests. [`OsSignals`] is the tokio-backed source used
//! by default.
//!
//! ## Flow
//! ```text
//! bridge::run(source, token)
//!   select!
//!     ├─ token.cancelled()   → Err(Canceled)            (someone else won)
//!     └─ source.recv()
//!          ├─ Some(signal)   → publish SignalReceived → Err(Signal(SignalError))
//!          └─ None           → wait for token → Err(Canceled)
//! ```
//!
//! ## Platforms
//! **Unix:** one tokio listener per configured signal. Undelivered signals of the
//! same kind coalesce, so at most one pending delivery is kept per signal.
//!
//! **Windows:** only [`Signal::Interrupt`] via [`tokio::signal::ctrl_c`].

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{RuntimeError, ServiceError, SignalError};
use crate::events::{Bus, Event, EventKind};
use crate::signal::Signal;

/// Asynchronous source of delivered signals.
///
/// Implementations register their listeners when they are created, so that no
/// signal sent after construction is lost.
#[async_trait]
pub trait SignalSource: Send + 'static {
    /// Waits for the next signal. `None` means no further signals will arrive.
    async fn recv(&mut self) -> Option<Signal>;
}

/// Signal source backed by tokio's process-wide signal handling.
///
/// Registering a signal replaces its default disposition (e.g. termination) for the
/// rest of the process lifetime.
pub struct OsSignals {
    #[cfg(unix)]
    listeners: Vec<(Signal, tokio::signal::unix::Signal)>,
    #[cfg(not(unix))]
    ctrl_c: bool,
}

impl OsSignals {
    /// Registers listeners for `signals`. Must be called within a tokio runtime.
    ///
    /// Duplicates are ignored.
    #[cfg(unix)]
    pub fn register(signals: &[Signal]) -> Result<Self, RuntimeError> {
        let mut listeners: Vec<(Signal, tokio::signal::unix::Signal)> =
            Vec::with_capacity(signals.len());
        for &signal in signals {
            if listeners.iter().any(|(registered, _)| *registered == signal) {
                continue;
            }
            let listener = tokio::signal::unix::signal(signal.kind())
                .map_err(|source| RuntimeError::SignalRegistration { signal, source })?;
            listeners.push((signal, listener));
        }
        tracing::debug!(count = listeners.len(), "registered signal listeners");
        Ok(Self { listeners })
    }

    /// Registers listeners for `signals`. Must be called within a tokio runtime.
    ///
    /// Only [`Signal::Interrupt`] is supported on this platform.
    #[cfg(not(unix))]
    pub fn register(signals: &[Signal]) -> Result<Self, RuntimeError> {
        if let Some(&signal) = signals.iter().find(|s| **s != Signal::Interrupt) {
            return Err(RuntimeError::UnsupportedSignal { signal });
        }
        Ok(Self {
            ctrl_c: !signals.is_empty(),
        })
    }

    /// Signals this source listens for.
    #[cfg(unix)]
    pub fn signals(&self) -> Vec<Signal> {
        self.listeners.iter().map(|(signal, _)| *signal).collect()
    }

    /// Signals this source listens for.
    #[cfg(not(unix))]
    pub fn signals(&self) -> Vec<Signal> {
        if self.ctrl_c {
            vec![Signal::Interrupt]
        } else {
            Vec::new()
        }
    }
}

#[async_trait]
impl SignalSource for OsSignals {
    async fn recv(&mut self) -> Option<Signal> {
        self.next_signal().await
    }
}

impl OsSignals {
    #[cfg(unix)]
    async fn next_signal(&mut self) -> Option<Signal> {
        if self.listeners.is_empty() {
            return None;
        }
        let pending = self.listeners.iter_mut().map(|(signal, listener)| {
            let signal = *signal;
            Box::pin(async move { listener.recv().await.map(|()| signal) })
        });
        let (received, _, _) = futures::future::select_all(pending).await;
        received
    }

    #[cfg(not(unix))]
    async fn next_signal(&mut self) -> Option<Signal> {
        if !self.ctrl_c {
            return None;
        }
        tokio::signal::ctrl_c().await.ok().map(|()| Signal::Interrupt)
    }
}

/// Waits for a signal or for the group to be cancelled, whichever comes first.
pub(crate) async fn run(
    mut source: Box<dyn SignalSource>,
    token: CancellationToken,
    bus: Bus,
) -> Result<(), ServiceError> {
    tokio::select! {
        _ = token.cancelled() => Err(ServiceError::Canceled),
        received = source.recv() => match received {
            Some(signal) => {
                tracing::info!(signal = signal.name(), "received signal");
                bus.publish(Event::new(EventKind::SignalReceived).with_signal(signal));
                Err(SignalError { signal }.into())
            }
            None => {
                token.cancelled().await;
                Err(ServiceError::Canceled)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;

    /// Delivers whatever is sent on the channel.
    struct FakeSignals(mpsc::UnboundedReceiver<Signal>);

    #[async_trait]
    impl SignalSource for FakeSignals {
        async fn recv(&mut self) -> Option<Signal> {
            self.0.recv().await
        }
    }

    fn fake() -> (mpsc::UnboundedSender<Signal>, Box<dyn SignalSource>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Box::new(FakeSignals(rx)))
    }

    #[tokio::test]
    async fn delivered_signal_becomes_signal_error() {
        let (tx, source) = fake();
        let bus = Bus::new(8);
        let mut events = bus.subscribe();

        tx.send(Signal::Terminate).unwrap();
        let err = run(source, CancellationToken::new(), bus).await.unwrap_err();

        assert_eq!(err.to_string(), "received terminated");
        assert_eq!(err.signal(), Some(Signal::Terminate));
        let ev = events.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::SignalReceived);
        assert_eq!(ev.signal, Some(Signal::Terminate));
    }

    #[tokio::test]
    async fn cancellation_wins_without_a_signal() {
        let (_tx, source) = fake();
        let token = CancellationToken::new();
        token.cancel();

        let err = run(source, token, Bus::new(8)).await.unwrap_err();
        assert!(err.is_canceled());
    }

    #[tokio::test]
    async fn exhausted_source_waits_for_cancellation() {
        let (tx, source) = fake();
        drop(tx);
        let token = CancellationToken::new();
        let bridge = tokio::spawn(run(source, token.clone(), Bus::new(8)));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!bridge.is_finished());

        token.cancel();
        assert!(bridge.await.unwrap().unwrap_err().is_canceled());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn os_source_ignores_duplicates() {
        let source = OsSignals::register(&[Signal::WindowChange, Signal::WindowChange]).unwrap();
        assert_eq!(source.signals(), vec![Signal::WindowChange]);
    }

    #[tokio::test]
    async fn empty_os_source_is_exhausted() {
        let mut source = OsSignals::register(&[]).unwrap();
        assert!(source.recv().await.is_none());
    }
}
