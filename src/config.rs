//! # Service configuration.
//!
//! Provides [`Config`] centralized settings for a [`Service`](crate::Service).
//!
//! ## Sentinel values
//! - `signals` empty → no signal bridge is started
//! - `bus_capacity = 0` → clamped to 1

use crate::signal::Signal;

/// Configuration for a service.
///
/// ## Field semantics
/// - `signals`: OS signals that shut the service down (empty = none)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Signals that trigger a shutdown.
    ///
    /// Registering the same signal from several services that are alive at the
    /// same time in one process is unsupported: delivery is process-wide.
    pub signals: Vec<Signal>,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` events skip the oldest ones.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the config with `signals` replaced.
    pub fn with_signals(mut self, signals: impl IntoIterator<Item = Signal>) -> Self {
        self.signals = signals.into_iter().collect();
        self
    }

    /// True if a signal bridge should be started.
    #[inline]
    pub fn has_signals(&self) -> bool {
        !self.signals.is_empty()
    }

    /// Returns the configured signals without duplicates, in first-seen order.
    pub fn unique_signals(&self) -> Vec<Signal> {
        let mut out: Vec<Signal> = Vec::with_capacity(self.signals.len());
        for sig in &self.signals {
            if !out.contains(sig) {
                out.push(*sig);
            }
        }
        out
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `signals = []` (no signal handling)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            signals: Vec::new(),
            bus_capacity: 1024,
        }
    }
}
