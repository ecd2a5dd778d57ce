//! # Operating-system signals understood by the service.
//!
//! [`Signal`] names the signals a [`Service`](crate::Service) can be configured to
//! shut down on. Its [`Display`](std::fmt::Display) output is the conventional
//! lower-case description of the signal (`SIGUSR1` → `user defined signal 1`),
//! which is what [`SignalError`](crate::SignalError) reports.
//!
//! ## Platforms
//! - **Unix**: every variant maps onto a [`tokio::signal::unix::SignalKind`].
//! - **Other**: only [`Signal::Interrupt`] (Ctrl-C) can be listened for.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// An operating-system signal.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// `SIGHUP`: controlling terminal closed, commonly "reload configuration".
    Hangup,
    /// `SIGINT`: Ctrl-C in a terminal.
    Interrupt,
    /// `SIGQUIT`: quit from keyboard.
    Quit,
    /// `SIGTERM`: default kill signal (systemd, Kubernetes).
    Terminate,
    /// `SIGUSR1`.
    User1,
    /// `SIGUSR2`.
    User2,
    /// `SIGALRM`.
    Alarm,
    /// `SIGPIPE`.
    Pipe,
    /// `SIGCHLD`.
    Child,
    /// `SIGWINCH`.
    WindowChange,
    /// `SIGIO`.
    Io,
}

impl Signal {
    /// All known signals, in declaration order.
    pub const ALL: [Signal; 11] = [
        Signal::Hangup,
        Signal::Interrupt,
        Signal::Quit,
        Signal::Terminate,
        Signal::User1,
        Signal::User2,
        Signal::Alarm,
        Signal::Pipe,
        Signal::Child,
        Signal::WindowChange,
        Signal::Io,
    ];

    /// Returns the conventional symbolic name (`"SIGTERM"`).
    pub fn name(&self) -> &'static str {
        match self {
            Signal::Hangup => "SIGHUP",
            Signal::Interrupt => "SIGINT",
            Signal::Quit => "SIGQUIT",
            Signal::Terminate => "SIGTERM",
            Signal::User1 => "SIGUSR1",
            Signal::User2 => "SIGUSR2",
            Signal::Alarm => "SIGALRM",
            Signal::Pipe => "SIGPIPE",
            Signal::Child => "SIGCHLD",
            Signal::WindowChange => "SIGWINCH",
            Signal::Io => "SIGIO",
        }
    }

    /// Returns the human-readable description (`"terminated"`).
    pub fn description(&self) -> &'static str {
        match self {
            Signal::Hangup => "hangup",
            Signal::Interrupt => "interrupt",
            Signal::Quit => "quit",
            Signal::Terminate => "terminated",
            Signal::User1 => "user defined signal 1",
            Signal::User2 => "user defined signal 2",
            Signal::Alarm => "alarm clock",
            Signal::Pipe => "broken pipe",
            Signal::Child => "child exited",
            Signal::WindowChange => "window changed",
            Signal::Io => "I/O possible",
        }
    }

    /// Returns the tokio listener kind for this signal.
    #[cfg(unix)]
    pub fn kind(&self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;

        match self {
            Signal::Hangup => SignalKind::hangup(),
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Quit => SignalKind::quit(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::User1 => SignalKind::user_defined1(),
            Signal::User2 => SignalKind::user_defined2(),
            Signal::Alarm => SignalKind::alarm(),
            Signal::Pipe => SignalKind::pipe(),
            Signal::Child => SignalKind::child(),
            Signal::WindowChange => SignalKind::window_change(),
            Signal::Io => SignalKind::io(),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Returned when a string does not name a known [`Signal`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown signal {0:?}")]
pub struct ParseSignalError(pub String);

impl FromStr for Signal {
    type Err = ParseSignalError;

    /// Accepts `SIGTERM`, `TERM` or `term` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let short = upper.strip_prefix("SIG").unwrap_or(&upper);
        Signal::ALL
            .into_iter()
            .find(|sig| &sig.name()[3..] == short)
            .ok_or_else(|| ParseSignalError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptions_follow_conventional_wording() {
        assert_eq!(Signal::User1.to_string(), "user defined signal 1");
        assert_eq!(Signal::User2.to_string(), "user defined signal 2");
        assert_eq!(Signal::Terminate.to_string(), "terminated");
        assert_eq!(Signal::Interrupt.to_string(), "interrupt");
    }

    #[test]
    fn parses_long_short_and_lowercase_names() {
        assert_eq!("SIGTERM".parse::<Signal>(), Ok(Signal::Terminate));
        assert_eq!("usr1".parse::<Signal>(), Ok(Signal::User1));
        assert_eq!(" sigwinch ".parse::<Signal>(), Ok(Signal::WindowChange));
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "SIGKILL".parse::<Signal>().unwrap_err();
        assert_eq!(err, ParseSignalError("SIGKILL".into()));
        assert_eq!(err.to_string(), "unknown signal \"SIGKILL\"");
    }

    #[test]
    fn every_signal_round_trips_through_its_name() {
        for sig in Signal::ALL {
            assert_eq!(sig.name().parse::<Signal>(), Ok(sig));
        }
    }
}
