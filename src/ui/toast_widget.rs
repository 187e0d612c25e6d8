use crate::ui::toast::{Toast, ToastType};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const TOAST_WIDTH: u16 = 40;
const TOAST_HEIGHT: u16 = 3;

/// Stacks toasts in the top right corner, newest lowest.
pub struct ToastWidget<'a> {
    toasts: &'a [&'a Toast],
}

impl<'a> ToastWidget<'a> {
    pub fn new(toasts: &'a [&'a Toast]) -> Self {
        Self { toasts }
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        for (idx, toast) in self.toasts.iter().enumerate() {
            let Some(toast_area) = toast_area(area, idx as u16) else {
                break;
            };
            frame.render_widget(Clear, toast_area);

            let colour = colour(toast.toast_type);
            let border_style = Style::default().fg(colour);
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .style(Style::default().bg(Color::Black));

            let text = Paragraph::new(Line::from(vec![
                Span::styled(icon(toast.toast_type), border_style.add_modifier(Modifier::BOLD)),
                Span::raw(" "),
                Span::raw(toast.message.as_str()),
            ]))
            .block(block)
            .alignment(Alignment::Left);

            frame.render_widget(text, toast_area);
        }
    }
}

/// Area of the `index`th toast, or None once the stack runs off the screen
fn toast_area(area: Rect, index: u16) -> Option<Rect> {
    let y = area.top() + 1 + index * TOAST_HEIGHT;
    if y + TOAST_HEIGHT > area.bottom() {
        return None;
    }
    let width = TOAST_WIDTH.min(area.width);
    let x = area.right().saturating_sub(width + 1).max(area.left());
    Some(Rect::new(x, y, width, TOAST_HEIGHT))
}

fn icon(toast_type: ToastType) -> &'static str {
    match toast_type {
        ToastType::Info => "ℹ",
        ToastType::Success => "✓",
        ToastType::Warning => "⚠",
        ToastType::Error => "✗",
    }
}

fn colour(toast_type: ToastType) -> Color {
    match toast_type {
        ToastType::Info => Color::Cyan,
        ToastType::Success => Color::Green,
        ToastType::Warning => Color::Yellow,
        ToastType::Error => Color::Red,
    }
}
