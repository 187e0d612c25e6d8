use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::surface::ScreenState;

/// Draws a terminal surface snapshot cell by cell.
pub struct TerminalPane<'a> {
    screen: Option<&'a ScreenState>,
    placeholder: &'a str,
}

impl<'a> TerminalPane<'a> {
    pub fn new(screen: Option<&'a ScreenState>) -> Self {
        Self {
            screen,
            placeholder: "Waiting for terminal view",
        }
    }

    /// Text shown centered when there is no screen to draw.
    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }
}

impl Widget for TerminalPane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.screen {
            Some(screen) => render_screen_state(screen, area, buf),
            None => {
                let width = self.placeholder.chars().count() as u16;
                let x = area.x + area.width.saturating_sub(width) / 2;
                let y = area.y + area.height / 2;
                if y < area.bottom() && x < area.right() {
                    buf.set_stringn(
                        x,
                        y,
                        self.placeholder,
                        area.width as usize,
                        Style::default().fg(Color::DarkGray),
                    );
                }
            }
        }
    }
}

fn render_screen_state(screen: &ScreenState, area: Rect, buf: &mut Buffer) {
    for (y, row) in (area.top()..area.bottom()).zip(&screen.rows) {
        for (x, cell) in (area.left()..area.right()).zip(&row.cells) {
            if !cell.contents.is_empty() {
                buf.set_string(x, y, &cell.contents, cell.style());
            }
        }
    }

    // No cursor while scrolled back
    if screen.scroll_offset > 0 || !screen.cursor_visible {
        return;
    }
    let (row, col) = screen.cursor;
    let position = (area.x + col, area.y + row);
    if position.0 < area.right() && position.1 < area.bottom() {
        if let Some(cell) = buf.cell_mut(position) {
            cell.set_style(Style::default().bg(Color::White).fg(Color::Black));
        }
    }
}
