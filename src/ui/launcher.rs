//! The screen shown behind the dialog and when no session is open.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use super::layout::launcher_layout;

pub struct Launcher<'a> {
    server: &'a str,
    last_status: Option<&'a str>,
}

impl<'a> Launcher<'a> {
    pub fn new(server: &'a str) -> Self {
        Self {
            server,
            last_status: None,
        }
    }

    /// Outcome of the most recent session, shown under the prompt.
    pub fn last_status(mut self, status: Option<&'a str>) -> Self {
        self.last_status = status;
        self
    }
}

impl Widget for Launcher<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (body, help) = launcher_layout(area);

        let block = Block::default()
            .title(" shellbridge ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        let mut lines = vec![
            Line::raw(""),
            Line::from(vec![
                Span::raw("Remote shell on "),
                Span::styled(
                    self.server,
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::raw(""),
            Line::raw("Press Enter to open a terminal session."),
        ];
        if let Some(status) = self.last_status {
            lines.push(Line::raw(""));
            lines.push(Line::styled(
                format!("Last session: {}", status),
                Style::default().fg(Color::DarkGray),
            ));
        }

        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(body, buf);

        Paragraph::new(Line::from(vec![
            Span::styled(" Enter ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw("open terminal "),
            Span::styled(" q ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw("quit"),
        ]))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .render(help, buf);
    }
}
