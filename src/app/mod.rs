//! Application state for shellbridge.

mod actions;

use ratatui::layout::Rect;

use crate::config::Config;
use crate::input::InputMode;
use crate::session::{BridgePhase, RenderContexts, SessionHost};
use crate::surface::{ContextKind, RenderTarget, VtSurface};
use crate::transport::{ConnectionState, Fault, Socket, WsSocket};
use crate::ui::layout::{session_layout, SessionLayout};
use crate::ui::toast::{ToastManager, ToastType};

/// Render contexts on a single terminal screen.
///
/// The dialog is drawn over the launcher; the detached window takes the
/// whole screen. Both are always available.
pub struct ScreenContexts;

impl RenderContexts for ScreenContexts {
    fn open_dialog_context(&mut self) -> RenderTarget {
        RenderTarget::new(ContextKind::Dialog)
    }

    fn open_detached_context(&mut self) -> Option<RenderTarget> {
        Some(RenderTarget::new(ContextKind::Window))
    }
}

/// Main application state
pub struct App<S: Socket = WsSocket> {
    pub config: Config,
    pub host: SessionHost<VtSurface, S>,
    pub input_mode: InputMode,
    pub toast_manager: ToastManager,
    pub should_quit: bool,
    /// Terminal size (width, height)
    pub term_size: (u16, u16),
    /// How the previous session ended, for the launcher
    pub last_session_status: Option<String>,
    /// Session id and status message last turned into a toast
    notified: Option<(String, String)>,
}

impl<S: Socket> App<S> {
    pub fn new(config: Config, host: SessionHost<VtSurface, S>) -> Self {
        Self {
            config,
            host,
            input_mode: InputMode::default(),
            toast_manager: ToastManager::new(),
            should_quit: false,
            term_size: (80, 24),
            last_session_status: None,
            notified: None,
        }
    }

    pub fn screen_area(&self) -> Rect {
        Rect::new(0, 0, self.term_size.0, self.term_size.1)
    }

    /// Layout of the open session view, if any
    pub fn session_layout(&self) -> Option<SessionLayout> {
        let kind = self.host.context()?;
        Some(session_layout(
            kind,
            self.screen_area(),
            &self.config.dialog,
            self.host.show_instructions(),
        ))
    }

    /// Push the current terminal area to the session when it moved or changed size.
    pub fn sync_layout(&mut self) {
        let Some(layout) = self.session_layout() else {
            return;
        };
        let current = self.host.target().and_then(RenderTarget::area);
        if current != Some(layout.terminal) {
            self.host.resized(layout.terminal);
        }
    }

    /// Handle a terminal resize event
    pub fn resize(&mut self, width: u16, height: u16) {
        self.term_size = (width, height);
        self.sync_layout();
    }

    /// Drive the session and expire toasts. Called once per loop iteration.
    pub fn tick(&mut self) {
        self.host.poll();
        self.notify_status_change();
        self.toast_manager.update();
    }

    fn notify_status_change(&mut self) {
        let status = self.host.status();
        let Some(id) = status.session_id.clone() else {
            return;
        };
        let key = (id, status.message.clone());
        if self.notified.as_ref() == Some(&key) {
            return;
        }
        self.notified = Some(key);

        let unavailable = self
            .host
            .bridge()
            .is_some_and(|b| b.phase() == BridgePhase::Unavailable);
        let toast_type = match (status.state, status.fault) {
            (_, Some(Fault::OpenFailure)) => ToastType::Error,
            (_, Some(Fault::AbnormalClose)) => ToastType::Warning,
            _ if unavailable => ToastType::Error,
            (ConnectionState::Connected, None) => ToastType::Success,
            (ConnectionState::Closed, None) => ToastType::Info,
            _ => return,
        };
        self.toast_manager.push(status.message, toast_type);
    }
}
