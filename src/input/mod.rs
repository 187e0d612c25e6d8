//! Input modes for the session view.
//!
//! - **Terminal**: every key goes to the remote shell
//! - **Command**: single keys drive the dialog (pop out, reconnect, copy, close)

/// Who receives key presses while a session is open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Terminal,
    Command,
}

impl InputMode {
    /// Returns the display name for the status line
    pub fn display_name(&self) -> &'static str {
        match self {
            InputMode::Terminal => "TERMINAL",
            InputMode::Command => "COMMAND",
        }
    }

    pub fn is_command(&self) -> bool {
        matches!(self, InputMode::Command)
    }
}
