//! Connection state machine for a session transport.

use std::fmt;
use std::time::Instant;

/// Lifecycle of one socket connection. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Closing,
    Closed,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closing => "closing",
            ConnectionState::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error condition recorded alongside the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The socket failed before it opened.
    OpenFailure,
    /// The socket went away while connected without being asked to.
    AbnormalClose,
}

/// Inputs that drive the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// `connect()` was called.
    Connect,
    /// The socket finished its handshake.
    Opened,
    /// The socket reported an error.
    Failed,
    /// The socket closed. `clean` is true for a normal close code.
    PeerClosed { clean: bool },
    /// `close()` was called.
    CloseRequested,
}

/// Tracks the current [`ConnectionState`] and any recorded [`Fault`].
#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    state: ConnectionState,
    fault: Option<Fault>,
    changed_at: Instant,
}

impl ConnectionMachine {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Idle,
            fault: None,
            changed_at: Instant::now(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    /// When the current state was entered.
    pub fn changed_at(&self) -> Instant {
        self.changed_at
    }

    /// Apply a signal.
    ///
    /// Returns the new state if the signal caused a transition, None if the
    /// signal does not apply in the current state.
    pub fn apply(&mut self, signal: Signal) -> Option<ConnectionState> {
        use ConnectionState::*;

        let (next, fault) = match (self.state, signal) {
            (Idle, Signal::Connect) => (Connecting, None),
            (Idle, Signal::CloseRequested) => (Closed, None),

            (Connecting, Signal::Opened) => (Connected, None),
            (Connecting, Signal::Failed | Signal::PeerClosed { .. }) => {
                (Closed, Some(Fault::OpenFailure))
            }
            (Connecting, Signal::CloseRequested) => (Closed, None),

            (Connected, Signal::PeerClosed { clean: true }) => (Closed, None),
            (Connected, Signal::PeerClosed { clean: false } | Signal::Failed) => {
                (Closed, Some(Fault::AbnormalClose))
            }
            (Connected, Signal::CloseRequested) => (Closing, None),

            (Closing, Signal::PeerClosed { .. } | Signal::Failed) => (Closed, None),

            _ => return None,
        };

        self.state = next;
        if fault.is_some() {
            self.fault = fault;
        }
        self.changed_at = Instant::now();
        Some(next)
    }
}

impl Default for ConnectionMachine {
    fn default() -> Self {
        Self::new()
    }
}
