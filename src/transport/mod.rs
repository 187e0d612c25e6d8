//! Session transport: one socket, the connection state machine and the frame codec.

pub mod socket;
pub mod state;
pub mod ws;

use tracing::{debug, info, trace, warn};

use crate::error::SessionError;
use crate::protocol::{ClientFrame, Endpoint, ServerFrame};
use crate::session::{EventSender, SocketEvent};

pub use socket::Socket;
pub use state::{ConnectionMachine, ConnectionState, Fault, Signal};
pub use ws::WsSocket;

/// WebSocket close code for a normal closure.
pub const NORMAL_CLOSE: u16 = 1000;

/// What the session should react to after a socket event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportNotice {
    /// The connection opened.
    Connected,
    /// One decoded output frame.
    Output(String),
    /// The connection reached `Closed`, with the fault if there was one.
    Closed(Option<Fault>),
}

/// Owns one socket and tracks its connection state.
///
/// No backpressure is applied to sends: input arrives at human typing speed
/// and is handed straight to the socket's outgoing queue.
pub struct SessionTransport<S: Socket> {
    socket: S,
    machine: ConnectionMachine,
    close_sent: bool,
    last_error: Option<String>,
}

impl<S: Socket> SessionTransport<S> {
    pub fn new(socket: S) -> Self {
        Self {
            socket,
            machine: ConnectionMachine::new(),
            close_sent: false,
            last_error: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.machine.state()
    }

    pub fn fault(&self) -> Option<Fault> {
        self.machine.fault()
    }

    /// How long the transport has been in its current state.
    pub fn state_age(&self) -> std::time::Duration {
        self.machine.changed_at().elapsed()
    }

    /// The recorded fault as a session error, with the last socket error as detail.
    pub fn error(&self) -> Option<SessionError> {
        let detail = self
            .last_error
            .clone()
            .unwrap_or_else(|| "no detail".to_string());
        self.machine.fault().map(|fault| match fault {
            Fault::OpenFailure => SessionError::TransportOpenFailure(detail),
            Fault::AbnormalClose => SessionError::TransportAbnormalClose(detail),
        })
    }

    /// Open the socket for a session rooted at `working_directory`.
    ///
    /// Failures are reported through `events`, never returned.
    pub fn connect(&mut self, endpoint: &Endpoint, working_directory: &str, events: EventSender) {
        if self.machine.apply(Signal::Connect).is_none() {
            warn!(state = %self.state(), "connect ignored, transport already used");
            return;
        }

        match endpoint.session_url(working_directory) {
            Ok(url) => {
                info!(%url, "connecting to terminal server");
                self.socket.open(url, events);
            }
            Err(e) => {
                events.socket(SocketEvent::Error(format!("invalid session address: {}", e)));
            }
        }
    }

    /// Send a frame. Only `Connected` transports send; otherwise the frame is dropped.
    pub fn send(&mut self, frame: &ClientFrame) -> bool {
        if self.state() != ConnectionState::Connected {
            trace!(state = %self.state(), "dropping frame, not connected");
            return false;
        }

        let text = match frame.encode() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to encode frame");
                return false;
            }
        };

        match self.socket.send_text(text) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to queue frame");
                false
            }
        }
    }

    /// Start closing. Safe to call repeatedly; the socket is told once.
    pub fn close(&mut self) {
        if self.machine.apply(Signal::CloseRequested).is_none() {
            return;
        }
        if !self.close_sent {
            self.close_sent = true;
            debug!("closing socket");
            self.socket.close();
        }
    }

    /// Give up on a pending connect.
    pub fn abort(&mut self, reason: &str) -> Option<TransportNotice> {
        if self.state() != ConnectionState::Connecting {
            return None;
        }
        self.last_error = Some(reason.to_string());
        self.machine.apply(Signal::Failed)?;
        if !self.close_sent {
            self.close_sent = true;
            self.socket.close();
        }
        Some(TransportNotice::Closed(self.fault()))
    }

    /// Apply one socket event.
    pub fn handle(&mut self, event: SocketEvent) -> Option<TransportNotice> {
        match event {
            SocketEvent::Opened => self
                .machine
                .apply(Signal::Opened)
                .map(|_| TransportNotice::Connected),
            SocketEvent::Message(text) => self.decode(&text),
            SocketEvent::Error(message) => {
                warn!(error = %message, state = %self.state(), "socket error");
                self.last_error = Some(message);
                self.transition_to_closed(Signal::Failed)
            }
            SocketEvent::Closed { code, reason } => {
                info!(?code, %reason, state = %self.state(), "socket closed");
                let clean = code == Some(NORMAL_CLOSE);
                if !clean && self.last_error.is_none() {
                    self.last_error = Some(match code {
                        Some(code) => format!("close code {}", code),
                        None => "connection dropped".to_string(),
                    });
                }
                self.transition_to_closed(Signal::PeerClosed { clean })
            }
        }
    }

    fn transition_to_closed(&mut self, signal: Signal) -> Option<TransportNotice> {
        match self.machine.apply(signal) {
            Some(ConnectionState::Closed) => Some(TransportNotice::Closed(self.fault())),
            _ => None,
        }
    }

    fn decode(&self, text: &str) -> Option<TransportNotice> {
        if !matches!(
            self.state(),
            ConnectionState::Connected | ConnectionState::Closing
        ) {
            debug!(state = %self.state(), "message outside an open connection ignored");
            return None;
        }

        match ServerFrame::decode(text) {
            Ok(ServerFrame::Output(output)) => Some(TransportNotice::Output(output)),
            Ok(ServerFrame::Unknown { keys }) => {
                debug!(?keys, "ignoring frame without output");
                None
            }
            Err(e) => {
                warn!(error = %e, "dropping malformed frame");
                None
            }
        }
    }
}
