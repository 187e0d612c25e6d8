//! Owns the active session and decides where it renders.

use ratatui::layout::Rect;
use tracing::{info, warn};

use super::bridge::{BridgeOptions, BridgePhase, SessionBridge};
use super::Session;
use crate::config::WorkingDirectoryProvider;
use crate::surface::{ContextKind, Geometry, RenderTarget, TerminalSurface};
use crate::transport::{ConnectionState, Fault, Socket};

/// Factory for the places a session can render into.
pub trait RenderContexts {
    /// A target inside the modal dialog.
    fn open_dialog_context(&mut self) -> RenderTarget;

    /// A target in a separate full-screen window, if one can be opened.
    fn open_detached_context(&mut self) -> Option<RenderTarget>;
}

/// Snapshot of the active session for the dialog chrome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: ConnectionState,
    pub fault: Option<Fault>,
    pub message: String,
    pub working_directory: Option<String>,
    pub context: Option<ContextKind>,
    pub geometry: Option<Geometry>,
    pub session_id: Option<String>,
    pub age: Option<String>,
    pub show_instructions: bool,
}

type Factory<X> = Box<dyn FnMut() -> X>;

/// Holds at most one live [`SessionBridge`] and the means to build new ones.
pub struct SessionHost<T: TerminalSurface, S: Socket> {
    options: BridgeOptions,
    provider: Box<dyn WorkingDirectoryProvider>,
    contexts: Box<dyn RenderContexts>,
    new_surface: Factory<T>,
    new_socket: Factory<S>,
    bridge: Option<SessionBridge<T, S>>,
    show_instructions: bool,
}

impl<T: TerminalSurface, S: Socket> SessionHost<T, S> {
    pub fn new(
        options: BridgeOptions,
        provider: Box<dyn WorkingDirectoryProvider>,
        contexts: Box<dyn RenderContexts>,
        new_surface: Factory<T>,
        new_socket: Factory<S>,
    ) -> Self {
        Self {
            options,
            provider,
            contexts,
            new_surface,
            new_socket,
            bridge: None,
            show_instructions: true,
        }
    }

    pub fn with_instructions(mut self, show: bool) -> Self {
        self.show_instructions = show;
        self
    }

    /// Show the dialog and start a session in it. No-op if one is already open.
    pub fn open(&mut self) -> bool {
        if self.bridge.is_some() {
            return false;
        }
        let target = self.contexts.open_dialog_context();
        self.start_session(target);
        true
    }

    /// Tear down the active session, if any.
    pub fn close(&mut self) {
        if let Some(mut bridge) = self.bridge.take() {
            bridge.detach();
            info!(id = %bridge.session().short_id(), "session closed");
        }
    }

    /// Move the session to a detached window.
    ///
    /// The current session ends before the new one starts, so the first
    /// socket is closed before the second opens.
    pub fn pop_out(&mut self) -> bool {
        if self.bridge.is_none() {
            return false;
        }
        let Some(target) = self.contexts.open_detached_context() else {
            warn!("no detached window available, keeping the dialog session");
            return false;
        };
        self.close();
        self.start_session(target);
        true
    }

    /// Replace a finished session with a fresh one in the same place.
    pub fn reconnect(&mut self) -> bool {
        let Some(bridge) = &self.bridge else {
            return false;
        };
        let finished = bridge.state() == ConnectionState::Closed
            || bridge.phase() == BridgePhase::Unavailable;
        if !finished {
            return false;
        }
        let target = bridge.target().clone();
        self.close();
        self.start_session(target);
        true
    }

    /// Lay the active target out at `area` and let the session react.
    pub fn resized(&mut self, area: Rect) -> Option<Geometry> {
        let bridge = self.bridge.as_mut()?;
        bridge.target().set_area(area);
        bridge.resized()
    }

    /// Flip the instructions panel. Returns the new visibility.
    pub fn toggle_instructions(&mut self) -> bool {
        self.show_instructions = !self.show_instructions;
        self.show_instructions
    }

    pub fn show_instructions(&self) -> bool {
        self.show_instructions
    }

    /// Drive the active session. Returns the number of events dispatched.
    pub fn poll(&mut self) -> usize {
        self.bridge.as_mut().map_or(0, SessionBridge::poll)
    }

    pub fn status(&self) -> SessionStatus {
        match &self.bridge {
            Some(bridge) => SessionStatus {
                state: bridge.state(),
                fault: bridge.fault(),
                message: bridge.status_message().to_string(),
                working_directory: Some(bridge.session().working_directory.clone()),
                context: Some(bridge.target().kind()),
                geometry: bridge
                    .is_attached()
                    .then(|| bridge.surface().geometry()),
                session_id: Some(bridge.session().short_id()),
                age: Some(bridge.session().age()),
                show_instructions: self.show_instructions,
            },
            None => SessionStatus {
                state: ConnectionState::Idle,
                fault: None,
                message: "No session".to_string(),
                working_directory: None,
                context: None,
                geometry: None,
                session_id: None,
                age: None,
                show_instructions: self.show_instructions,
            },
        }
    }

    pub fn is_open(&self) -> bool {
        self.bridge.is_some()
    }

    pub fn context(&self) -> Option<ContextKind> {
        self.bridge.as_ref().map(|b| b.target().kind())
    }

    pub fn target(&self) -> Option<&RenderTarget> {
        self.bridge.as_ref().map(SessionBridge::target)
    }

    pub fn bridge(&self) -> Option<&SessionBridge<T, S>> {
        self.bridge.as_ref()
    }

    pub fn bridge_mut(&mut self) -> Option<&mut SessionBridge<T, S>> {
        self.bridge.as_mut()
    }

    fn start_session(&mut self, target: RenderTarget) {
        let session = Session::new(self.provider.working_directory());
        info!(
            id = %session.short_id(),
            working_directory = %session.working_directory,
            context = ?target.kind(),
            "opening session"
        );
        let surface = (self.new_surface)();
        let socket = (self.new_socket)();
        self.bridge = Some(SessionBridge::start(
            session,
            surface,
            socket,
            target,
            self.options.clone(),
        ));
    }
}

impl<T: TerminalSurface, S: Socket> Drop for SessionHost<T, S> {
    fn drop(&mut self) {
        self.close();
    }
}
