//! User-triggered actions on the session view.

use tracing::{debug, warn};

use super::App;
use crate::input::InputMode;
use crate::transport::Socket;
use crate::ui::toast::ToastType;

impl<S: Socket> App<S> {
    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Open the terminal dialog and start a session in it
    pub fn open_terminal(&mut self) {
        if self.host.open() {
            self.input_mode = InputMode::Terminal;
        }
    }

    /// Close the dialog or window and end the session
    pub fn close_terminal(&mut self) {
        if !self.host.is_open() {
            return;
        }
        self.last_session_status = Some(self.host.status().message);
        self.host.close();
        self.input_mode = InputMode::Terminal;
    }

    /// Move the session into a full-screen window
    pub fn pop_out(&mut self) {
        if self.host.pop_out() {
            self.input_mode = InputMode::Terminal;
            self.sync_layout();
            self.toast_info("Opened in a new window");
        } else {
            self.toast_warning("Cannot open a new window");
        }
    }

    /// Start over after the connection ended
    pub fn reconnect(&mut self) {
        if self.host.reconnect() {
            self.input_mode = InputMode::Terminal;
            self.sync_layout();
        } else {
            self.toast_info("Session is still active");
        }
    }

    pub fn toggle_instructions(&mut self) {
        self.host.toggle_instructions();
        self.sync_layout();
    }

    // =========================================================================
    // Input mode
    // =========================================================================

    pub fn enter_command_mode(&mut self) {
        self.input_mode = InputMode::Command;
    }

    pub fn enter_terminal_mode(&mut self) {
        self.input_mode = InputMode::Terminal;
    }

    // =========================================================================
    // Scrollback
    // =========================================================================

    pub fn scroll_up(&mut self, lines: usize) {
        if let Some(bridge) = self.host.bridge_mut() {
            bridge.surface_mut().scroll_up(lines);
        }
    }

    pub fn scroll_down(&mut self, lines: usize) {
        if let Some(bridge) = self.host.bridge_mut() {
            bridge.surface_mut().scroll_down(lines);
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        if let Some(bridge) = self.host.bridge_mut() {
            bridge.surface_mut().scroll_to_bottom();
        }
    }

    /// Half the visible terminal height, at least one line
    pub fn page_lines(&self) -> usize {
        self.session_layout()
            .map_or(1, |layout| (layout.terminal.height as usize / 2).max(1))
    }

    // =========================================================================
    // Clipboard
    // =========================================================================

    /// Copy the visible terminal screen to the clipboard
    pub fn copy_screen(&mut self) {
        let text = match self.host.bridge() {
            Some(bridge) => trim_screen_text(&bridge.surface().visible_text()),
            None => return,
        };
        if text.is_empty() {
            self.toast_info("Nothing to copy");
            return;
        }

        // Copy to clipboard using arboard
        match arboard::Clipboard::new() {
            Ok(mut clipboard) => match clipboard.set_text(&text) {
                Ok(()) => {
                    let lines = text.lines().count();
                    debug!(lines, "copied screen");
                    self.toast_success(format!("Copied screen ({lines} lines)"));
                }
                Err(e) => {
                    warn!(error = %e, "clipboard write failed");
                    self.toast_error("Failed to copy");
                }
            },
            Err(e) => {
                warn!(error = %e, "clipboard unavailable");
                self.toast_error("Clipboard unavailable");
            }
        }
    }

    // =========================================================================
    // Toasts
    // =========================================================================

    pub fn toast_info(&mut self, message: impl Into<String>) {
        self.toast_manager.push(message, ToastType::Info);
    }

    pub fn toast_success(&mut self, message: impl Into<String>) {
        self.toast_manager.push(message, ToastType::Success);
    }

    pub fn toast_warning(&mut self, message: impl Into<String>) {
        self.toast_manager.push(message, ToastType::Warning);
    }

    pub fn toast_error(&mut self, message: impl Into<String>) {
        self.toast_manager.push(message, ToastType::Error);
    }
}

/// Drop trailing blank lines and trailing spaces on each line
fn trim_screen_text(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let end = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}
