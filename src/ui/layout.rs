use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::widgets::Block;

use crate::config::DialogConfig;
use crate::surface::ContextKind;

/// Rows taken by the expanded instructions panel
pub const INSTRUCTIONS_HEIGHT: u16 = 4;

/// Screen regions of a session view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLayout {
    /// Whole view, including the dialog border
    pub frame: Rect,
    /// Status indicator and action hints
    pub header: Rect,
    pub instructions: Option<Rect>,
    /// Where the terminal surface renders
    pub terminal: Rect,
    pub footer: Rect,
}

/// Centered dialog rectangle sized as a percentage of the screen
pub fn dialog_area(screen: Rect, width_pct: u8, height_pct: u8) -> Rect {
    let width = (screen.width as u32 * width_pct as u32 / 100) as u16;
    let height = (screen.height as u32 * height_pct as u32 / 100) as u16;
    let width = width.max(20).min(screen.width);
    let height = height.max(8).min(screen.height);

    let x = screen.x + (screen.width - width) / 2;
    let y = screen.y + (screen.height - height) / 2;
    Rect::new(x, y, width, height)
}

/// Lay out a session view. Dialogs are bordered and centered; windows fill the screen.
pub fn session_layout(
    kind: ContextKind,
    screen: Rect,
    dialog: &DialogConfig,
    show_instructions: bool,
) -> SessionLayout {
    let (frame, inner) = match kind {
        ContextKind::Dialog => {
            let frame = dialog_area(screen, dialog.width_pct, dialog.height_pct);
            (frame, Block::bordered().inner(frame))
        }
        ContextKind::Window => (screen, screen),
    };

    let instructions_height = if show_instructions {
        INSTRUCTIONS_HEIGHT
    } else {
        0
    };
    let [header, instructions, terminal, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(instructions_height),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(inner);

    SessionLayout {
        frame,
        header,
        instructions: show_instructions.then_some(instructions),
        terminal,
        footer,
    }
}

/// Launcher body with the help bar at the bottom
pub fn launcher_layout(screen: Rect) -> (Rect, Rect) {
    let [body, help] = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(screen);
    (body, help)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Rect {
        Rect::new(0, 0, 100, 40)
    }

    #[test]
    fn dialog_is_centered_at_configured_size() {
        let area = dialog_area(screen(), 80, 50);
        assert_eq!(area, Rect::new(10, 10, 80, 20));
    }

    #[test]
    fn dialog_never_exceeds_the_screen() {
        let tiny = Rect::new(0, 0, 10, 5);
        let area = dialog_area(tiny, 10, 10);
        assert_eq!(area, tiny);
    }

    #[test]
    fn dialog_terminal_sits_inside_the_border() {
        let dialog = DialogConfig {
            width_pct: 80,
            height_pct: 50,
            show_instructions: false,
        };
        let layout = session_layout(ContextKind::Dialog, screen(), &dialog, false);
        assert_eq!(layout.frame, Rect::new(10, 10, 80, 20));
        assert_eq!(layout.header, Rect::new(11, 11, 78, 1));
        assert_eq!(layout.terminal, Rect::new(11, 12, 78, 16));
        assert_eq!(layout.footer, Rect::new(11, 28, 78, 1));
        assert_eq!(layout.instructions, None);
    }

    #[test]
    fn instructions_take_rows_from_the_terminal() {
        let dialog = DialogConfig::default();
        let hidden = session_layout(ContextKind::Window, screen(), &dialog, false);
        let shown = session_layout(ContextKind::Window, screen(), &dialog, true);

        assert_eq!(hidden.terminal.height, 38);
        assert_eq!(shown.terminal.height, 38 - INSTRUCTIONS_HEIGHT);
        assert_eq!(shown.instructions.map(|r| r.height), Some(INSTRUCTIONS_HEIGHT));
    }

    #[test]
    fn window_fills_the_screen() {
        let layout = session_layout(ContextKind::Window, screen(), &DialogConfig::default(), false);
        assert_eq!(layout.frame, screen());
        assert_eq!(layout.terminal.width, 100);
        assert_eq!(layout.header.y, 0);
        assert_eq!(layout.footer.y, 39);
    }
}
