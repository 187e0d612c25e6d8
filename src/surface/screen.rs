//! Immutable snapshots of the emulator grid, decoupled from vt100 so the
//! widgets never touch the parser.

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct ScreenState {
    /// Grid rows as currently viewed, scrollback applied.
    pub rows: Vec<ScreenRow>,
    /// (row, col) within the grid.
    pub cursor: (u16, u16),
    pub cursor_visible: bool,
    /// 0 while following live output.
    pub scroll_offset: usize,
}

#[derive(Debug, Clone)]
pub struct ScreenRow {
    pub cells: Vec<ScreenCell>,
}

#[derive(Debug, Clone)]
pub struct ScreenCell {
    /// Empty for the trailing half of a wide character.
    pub contents: String,
    pub fg: TermColor,
    pub bg: TermColor,
    pub attrs: CellAttrs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TermColor {
    #[default]
    Default,
    Indexed(u8),
    Rgb(u8, u8, u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellAttrs {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub inverse: bool,
}

impl From<vt100::Color> for TermColor {
    fn from(color: vt100::Color) -> Self {
        match color {
            vt100::Color::Default => Self::Default,
            vt100::Color::Idx(idx) => Self::Indexed(idx),
            vt100::Color::Rgb(r, g, b) => Self::Rgb(r, g, b),
        }
    }
}

impl From<TermColor> for Color {
    fn from(color: TermColor) -> Self {
        match color {
            TermColor::Default => Color::Reset,
            TermColor::Indexed(idx) => Color::Indexed(idx),
            TermColor::Rgb(r, g, b) => Color::Rgb(r, g, b),
        }
    }
}

impl CellAttrs {
    pub fn modifier(self) -> Modifier {
        [
            (self.bold, Modifier::BOLD),
            (self.italic, Modifier::ITALIC),
            (self.underline, Modifier::UNDERLINED),
            (self.inverse, Modifier::REVERSED),
        ]
        .into_iter()
        .filter(|(on, _)| *on)
        .fold(Modifier::empty(), |acc, (_, m)| acc | m)
    }
}

impl ScreenCell {
    pub fn style(&self) -> Style {
        Style::default()
            .fg(self.fg.into())
            .bg(self.bg.into())
            .add_modifier(self.attrs.modifier())
    }
}

impl From<&vt100::Cell> for ScreenCell {
    fn from(cell: &vt100::Cell) -> Self {
        Self {
            contents: cell.contents(),
            fg: cell.fgcolor().into(),
            bg: cell.bgcolor().into(),
            attrs: CellAttrs {
                bold: cell.bold(),
                italic: cell.italic(),
                underline: cell.underline(),
                inverse: cell.inverse(),
            },
        }
    }
}

impl ScreenState {
    /// Copy the viewed grid out of a vt100 screen.
    pub fn capture(screen: &vt100::Screen) -> Self {
        let (rows, cols) = screen.size();
        let rows = (0..rows)
            .map(|row| ScreenRow {
                cells: (0..cols)
                    .filter_map(|col| screen.cell(row, col))
                    .map(ScreenCell::from)
                    .collect(),
            })
            .collect();

        Self {
            rows,
            cursor: screen.cursor_position(),
            cursor_visible: !screen.hide_cursor(),
            scroll_offset: screen.scrollback(),
        }
    }
}
