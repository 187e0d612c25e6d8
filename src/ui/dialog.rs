//! Chrome around a terminal session: status header, instructions, footer.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use super::layout::SessionLayout;
use super::terminal_pane::TerminalPane;
use crate::input::InputMode;
use crate::session::SessionStatus;
use crate::surface::{ContextKind, ScreenState};
use crate::transport::{ConnectionState, Fault};

const INSTRUCTIONS: [&str; 4] = [
    "Keystrokes go straight to the remote shell; output streams back live.",
    "Ctrl+\\ (or Ctrl+4) enters command mode: p pop out, r reconnect, y copy screen, q close.",
    "PageUp/PageDown in command mode or the mouse wheel scroll back through history.",
    "? hides this panel.",
];

/// Renders one session view into the regions of a [`SessionLayout`].
pub struct TerminalDialog<'a> {
    status: &'a SessionStatus,
    screen: Option<&'a ScreenState>,
    layout: &'a SessionLayout,
    command_mode: bool,
}

impl<'a> TerminalDialog<'a> {
    pub fn new(
        status: &'a SessionStatus,
        screen: Option<&'a ScreenState>,
        layout: &'a SessionLayout,
    ) -> Self {
        Self {
            status,
            screen,
            layout,
            command_mode: false,
        }
    }

    pub fn command_mode(mut self, on: bool) -> Self {
        self.command_mode = on;
        self
    }

    fn render_header(&self, buf: &mut Buffer) {
        let colour = state_colour(self.status.state, self.status.fault);
        let indicator = Line::from(vec![
            Span::styled("● ", Style::default().fg(colour)),
            Span::styled(
                self.status.message.as_str(),
                Style::default().fg(colour).add_modifier(Modifier::BOLD),
            ),
        ]);
        Paragraph::new(indicator).render(self.layout.header, buf);

        let hints = if self.command_mode {
            Line::from(vec![
                Span::styled(
                    format!(" {} ", InputMode::Command.display_name()),
                    Style::default().bg(Color::Yellow).fg(Color::Black),
                ),
                Span::raw(" p pop out  r reconnect  y copy  ? help  q close  i back "),
            ])
        } else {
            Line::from(Span::styled(
                " C-\\ commands ",
                Style::default().fg(Color::DarkGray),
            ))
        };
        Paragraph::new(hints)
            .alignment(Alignment::Right)
            .render(self.layout.header, buf);
    }

    fn render_footer(&self, buf: &mut Buffer) {
        let scroll = self.screen.map_or(0, |s| s.scroll_offset);
        Paragraph::new(footer_text(self.status, scroll))
            .style(Style::default().fg(Color::DarkGray))
            .render(self.layout.footer, buf);
    }
}

impl Widget for TerminalDialog<'_> {
    fn render(self, _area: Rect, buf: &mut Buffer) {
        let frame = self.layout.frame;
        Clear.render(frame, buf);

        if self.status.context == Some(ContextKind::Dialog) {
            let title = match &self.status.working_directory {
                Some(dir) => format!(" Terminal: {} ", dir),
                None => " Terminal ".to_string(),
            };
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .render(frame, buf);
        }

        self.render_header(buf);

        if let Some(area) = self.layout.instructions {
            let lines: Vec<Line> = INSTRUCTIONS.iter().map(|l| Line::raw(*l)).collect();
            Paragraph::new(lines)
                .style(Style::default().fg(Color::Gray))
                .render(area, buf);
        }

        TerminalPane::new(self.screen)
            .placeholder(&self.status.message)
            .render(self.layout.terminal, buf);

        self.render_footer(buf);
    }
}

/// Indicator colour for a connection state
pub fn state_colour(state: ConnectionState, fault: Option<Fault>) -> Color {
    match (state, fault) {
        (_, Some(_)) => Color::Red,
        (ConnectionState::Connected, None) => Color::Green,
        (ConnectionState::Connecting, None) => Color::Yellow,
        _ => Color::DarkGray,
    }
}

/// `session 1a2b3c4d · 3m · 24x80 · /srv` plus a scroll marker
pub fn footer_text(status: &SessionStatus, scroll_offset: usize) -> String {
    let mut parts = Vec::new();
    if let Some(id) = &status.session_id {
        parts.push(format!("session {}", id));
    }
    if let Some(age) = &status.age {
        parts.push(age.clone());
    }
    if let Some(geometry) = status.geometry {
        parts.push(format!("{}x{}", geometry.rows, geometry.cols));
    }
    parts.push(status.state.label().to_string());
    if scroll_offset > 0 {
        parts.push(format!("[SCROLLED: -{}]", scroll_offset));
    }
    format!(" {}", parts.join(" · "))
}
