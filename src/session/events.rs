//! The ordered event stream consumed by a session.
//!
//! Socket tasks and the terminal surface both post into the same unbounded
//! channel, so the bridge sees open/message/close notifications and user
//! input in the order they happened.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Notifications from a socket implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// The connection handshake completed.
    Opened,
    /// One text payload, in receipt order.
    Message(String),
    /// The socket failed. No further events follow.
    Error(String),
    /// The socket closed. `code` is the close frame code when there was one.
    Closed { code: Option<u16>, reason: String },
}

/// Everything a session reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Socket(SocketEvent),
    /// One chunk of user input (a keystroke or a paste).
    Input(String),
}

/// Cloneable sending half of a session's event stream.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: UnboundedSender<SessionEvent>,
}

impl EventSender {
    /// Post a socket notification. Returns false once the session is gone.
    pub fn socket(&self, event: SocketEvent) -> bool {
        self.tx.send(SessionEvent::Socket(event)).is_ok()
    }

    /// Post an input chunk. Returns false once the session is gone.
    pub fn input(&self, data: String) -> bool {
        self.tx.send(SessionEvent::Input(data)).is_ok()
    }
}

/// Create a new event stream for one session.
pub fn event_stream() -> (EventSender, UnboundedReceiver<SessionEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, rx)
}
