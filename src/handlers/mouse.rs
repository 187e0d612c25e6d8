use crossterm::event::{MouseEvent, MouseEventKind};

use crate::app::App;
use crate::transport::Socket;

const SCROLL_LINES: usize = 3;

/// Whether a screen position falls inside the session's terminal area.
fn over_terminal<S: Socket>(app: &App<S>, col: u16, row: u16) -> bool {
    app.session_layout().is_some_and(|layout| {
        let area = layout.terminal;
        col >= area.x && col < area.right() && row >= area.y && row < area.bottom()
    })
}

pub fn handle_mouse_event<S: Socket>(app: &mut App<S>, mouse: MouseEvent) {
    if !over_terminal(app, mouse.column, mouse.row) {
        return;
    }
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_up(SCROLL_LINES),
        MouseEventKind::ScrollDown => app.scroll_down(SCROLL_LINES),
        _ => {}
    }
}
