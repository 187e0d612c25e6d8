//! Wires one terminal surface to one transport for the lifetime of a session.

use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, trace, warn, Span};

use super::events::{event_stream, EventSender, SessionEvent};
use super::Session;
use crate::error::{AttachError, SessionError};
use crate::protocol::{ClientFrame, Endpoint};
use crate::surface::{Geometry, RenderTarget, TerminalSurface};
use crate::transport::{
    ConnectionState, Fault, SessionTransport, Socket, TransportNotice,
};

pub const CONNECTED_BANNER: &str = "Connected to terminal server";
pub const OPEN_FAILURE_BANNER: &str = "Failed to connect to terminal server";
pub const CLOSED_BANNER: &str = "Connection closed";
pub const UNAVAILABLE_MESSAGE: &str = "Terminal view unavailable";

/// How often and how long to wait for the render target to be laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(50),
            max_attempts: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BridgeOptions {
    pub endpoint: Endpoint,
    /// Send a resize frame whenever the local geometry changes.
    pub send_resize: bool,
    /// Give up on a socket that has not opened after this long. None waits forever.
    pub connect_timeout: Option<Duration>,
    pub attach_retry: RetryPolicy,
}

impl BridgeOptions {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            send_resize: false,
            connect_timeout: None,
            attach_retry: RetryPolicy::default(),
        }
    }
}

/// Where the bridge is in its own lifecycle (independent of the socket).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgePhase {
    /// Waiting for the render target to get an area.
    Attaching { attempts: u32 },
    /// Surface attached, transport started.
    Live,
    /// The render target never became available.
    Unavailable,
    /// Torn down.
    Detached,
}

/// Owns a surface and a transport and moves data between them.
///
/// Everything happens on the caller's thread: socket tasks and the surface
/// post into the session's event stream and [`SessionBridge::poll`] drains it.
pub struct SessionBridge<T: TerminalSurface, S: Socket> {
    session: Session,
    surface: T,
    transport: SessionTransport<S>,
    target: RenderTarget,
    options: BridgeOptions,
    events_tx: EventSender,
    events: UnboundedReceiver<SessionEvent>,
    cancel: CancellationToken,
    phase: BridgePhase,
    next_attempt: Instant,
    connect_deadline: Option<Instant>,
    attached: bool,
    attach_error: Option<SessionError>,
    status: String,
    span: Span,
}

impl<T: TerminalSurface, S: Socket> SessionBridge<T, S> {
    /// Create the bridge and make the first attach attempt.
    ///
    /// The transport connects only once the surface is attached.
    pub fn start(
        session: Session,
        surface: T,
        socket: S,
        target: RenderTarget,
        options: BridgeOptions,
    ) -> Self {
        let (events_tx, events) = event_stream();
        let span = info_span!("session", id = %session.short_id());
        let now = Instant::now();
        let mut bridge = Self {
            session,
            surface,
            transport: SessionTransport::new(socket),
            target,
            options,
            events_tx,
            events,
            cancel: CancellationToken::new(),
            phase: BridgePhase::Attaching { attempts: 0 },
            next_attempt: now,
            connect_deadline: None,
            attached: false,
            attach_error: None,
            status: "Waiting for terminal view".to_string(),
            span,
        };
        {
            let span = bridge.span.clone();
            let _enter = span.enter();
            info!(
                working_directory = %bridge.session.working_directory,
                context = ?bridge.target.kind(),
                "session started"
            );
            bridge.try_attach(now);
        }
        bridge
    }

    /// Run timers and dispatch every queued event. Returns the number dispatched.
    pub fn poll(&mut self) -> usize {
        self.poll_at(Instant::now())
    }

    /// [`SessionBridge::poll`] with an explicit clock.
    pub fn poll_at(&mut self, now: Instant) -> usize {
        if self.cancel.is_cancelled() {
            return 0;
        }
        let span = self.span.clone();
        let _enter = span.enter();

        if matches!(self.phase, BridgePhase::Attaching { .. }) && now >= self.next_attempt {
            self.try_attach(now);
        }
        self.check_connect_timeout(now);

        let mut dispatched = 0;
        while self.attached && !self.cancel.is_cancelled() {
            let Ok(event) = self.events.try_recv() else {
                break;
            };
            self.dispatch(event);
            dispatched += 1;
        }
        dispatched
    }

    /// React to a host viewport change. The host updates the target area first.
    ///
    /// Fits the surface exactly once and returns the new geometry if it changed.
    pub fn resized(&mut self) -> Option<Geometry> {
        if !self.surface.watches_resize() {
            return None;
        }
        let geometry = self.surface.fit()?;
        debug!(rows = geometry.rows, cols = geometry.cols, "surface resized");
        if self.options.send_resize {
            self.transport.send(&ClientFrame::Resize(geometry));
        }
        Some(geometry)
    }

    /// Tear the session down. Safe to call any number of times.
    pub fn detach(&mut self) {
        if self.phase == BridgePhase::Detached {
            return;
        }
        let span = self.span.clone();
        let _enter = span.enter();

        self.surface.clear_input();
        self.surface.unwatch_resize();
        if self.transport.state() != ConnectionState::Closed {
            self.transport.close();
        }
        self.surface.dispose();
        self.cancel.cancel();
        self.events.close();

        self.attached = false;
        self.phase = BridgePhase::Detached;
        self.connect_deadline = None;
        self.status = "Session ended".to_string();
        info!(state = %self.transport.state(), "session detached");
    }

    fn try_attach(&mut self, now: Instant) {
        let BridgePhase::Attaching { attempts } = self.phase else {
            return;
        };

        match self.surface.attach(&self.target) {
            Ok(()) => {
                self.surface.fit();
                self.surface.on_input(self.events_tx.clone());
                self.surface.watch_resize();
                self.attached = true;
                self.phase = BridgePhase::Live;
                self.status = "Connecting to terminal server".to_string();
                debug!(attempts = attempts + 1, "surface attached");

                self.transport.connect(
                    &self.options.endpoint,
                    &self.session.working_directory,
                    self.events_tx.clone(),
                );
                self.connect_deadline = self.options.connect_timeout.map(|t| now + t);
            }
            Err(AttachError::TargetUnavailable) => {
                let attempts = attempts + 1;
                if attempts >= self.options.attach_retry.max_attempts {
                    self.give_up_attaching(attempts);
                } else {
                    trace!(attempts, "render target not laid out yet");
                    self.phase = BridgePhase::Attaching { attempts };
                    self.next_attempt = now + self.options.attach_retry.interval;
                }
            }
            Err(e) => {
                warn!(error = %e, "surface cannot attach");
                self.give_up_attaching(attempts + 1);
            }
        }
    }

    fn give_up_attaching(&mut self, attempts: u32) {
        let error = SessionError::AttachmentNotReady { attempts };
        warn!(error = %error, "giving up on terminal view");
        self.attach_error = Some(error);
        self.phase = BridgePhase::Unavailable;
        self.status = UNAVAILABLE_MESSAGE.to_string();
    }

    fn check_connect_timeout(&mut self, now: Instant) {
        let Some(deadline) = self.connect_deadline else {
            return;
        };
        if now < deadline {
            return;
        }
        self.connect_deadline = None;
        let waited = self.options.connect_timeout.unwrap_or_default();
        let reason = format!("no response after {}s", waited.as_secs());
        if let Some(notice) = self.transport.abort(&reason) {
            warn!(%reason, "connect timed out");
            self.apply(notice);
        }
    }

    fn dispatch(&mut self, event: SessionEvent) {
        if self.cancel.is_cancelled() || !self.attached {
            trace!("late event ignored");
            return;
        }

        match event {
            SessionEvent::Input(data) => {
                self.transport.send(&ClientFrame::Input(data));
            }
            SessionEvent::Socket(event) => {
                if let Some(notice) = self.transport.handle(event) {
                    self.apply(notice);
                }
            }
        }
    }

    fn apply(&mut self, notice: TransportNotice) {
        match notice {
            TransportNotice::Connected => {
                self.connect_deadline = None;
                self.status = CONNECTED_BANNER.to_string();
                info!("connected to terminal server");
                let banner = format!(
                    "\x1b[32m{}\x1b[0m\r\nWorking directory: {}\r\n\r\n",
                    CONNECTED_BANNER, self.session.working_directory
                );
                self.surface.write(banner.as_bytes());
                if self.options.send_resize {
                    let geometry = self.surface.geometry();
                    self.transport.send(&ClientFrame::Resize(geometry));
                }
            }
            TransportNotice::Output(output) => {
                self.surface.write(output.as_bytes());
            }
            TransportNotice::Closed(fault) => {
                self.connect_deadline = None;
                let (message, colour) = match fault {
                    Some(Fault::OpenFailure) => (OPEN_FAILURE_BANNER, "31"),
                    Some(Fault::AbnormalClose) => (CLOSED_BANNER, "33"),
                    None => (CLOSED_BANNER, "90"),
                };
                if let Some(error) = self.transport.error() {
                    warn!(error = %error, "session transport failed");
                } else {
                    info!("connection closed");
                }
                self.status = message.to_string();
                let banner = format!("\r\n\x1b[{}m{}\x1b[0m\r\n", colour, message);
                self.surface.write(banner.as_bytes());
            }
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn surface(&self) -> &T {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut T {
        &mut self.surface
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    pub fn state(&self) -> ConnectionState {
        self.transport.state()
    }

    pub fn fault(&self) -> Option<Fault> {
        self.transport.fault()
    }

    pub fn state_age(&self) -> Duration {
        self.transport.state_age()
    }

    /// The error that ended the session, if any.
    pub fn error(&self) -> Option<SessionError> {
        self.attach_error.clone().or_else(|| self.transport.error())
    }

    pub fn phase(&self) -> BridgePhase {
        self.phase
    }

    /// One-line description of where the session stands.
    pub fn status_message(&self) -> &str {
        &self.status
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_detached(&self) -> bool {
        self.phase == BridgePhase::Detached
    }
}

impl<T: TerminalSurface, S: Socket> Drop for SessionBridge<T, S> {
    fn drop(&mut self) {
        self.detach();
    }
}
