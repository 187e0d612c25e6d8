//! vt100-backed terminal surface.

use crossterm::event::KeyEvent;
use tracing::warn;

use super::keys::key_to_input;
use super::screen::ScreenState;
use super::{Geometry, InputSink, RenderTarget, TerminalSurface};
use crate::error::AttachError;

/// Default number of scrollback lines retained per surface.
pub const SCROLLBACK_LINES: usize = 10000;

/// Terminal surface that emulates a VT100-compatible terminal in memory.
///
/// Holds the emulator state and scroll position. Rendering reads a
/// [`ScreenState`] snapshot; input is encoded from crossterm key events and
/// handed to the registered [`InputSink`].
pub struct VtSurface {
    parser: vt100::Parser,
    target: Option<RenderTarget>,
    geometry: Geometry,
    input: Option<InputSink>,
    /// Current scroll offset (0 = live/bottom, positive = lines scrolled up)
    scroll_offset: usize,
    /// Whether scroll is locked (user has scrolled up)
    scroll_locked: bool,
    resize_watched: bool,
    disposed: bool,
}

impl VtSurface {
    pub fn new(scrollback_lines: usize) -> Self {
        let geometry = Geometry::default();
        Self {
            parser: vt100::Parser::new(geometry.rows, geometry.cols, scrollback_lines),
            target: None,
            geometry,
            input: None,
            scroll_offset: 0,
            scroll_locked: false,
            resize_watched: false,
            disposed: false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.target.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn target(&self) -> Option<&RenderTarget> {
        self.target.as_ref()
    }

    /// Encode a key press and hand it to the input consumer.
    ///
    /// Returns true if a chunk was emitted.
    pub fn key(&mut self, key: KeyEvent) -> bool {
        match key_to_input(key) {
            Some(data) => self.emit(data),
            None => false,
        }
    }

    /// Hand a pasted block to the input consumer as one chunk.
    pub fn paste(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.emit(text.to_string())
    }

    fn emit(&mut self, data: String) -> bool {
        if self.input.is_none() {
            return false;
        }
        // Typing jumps back to the live view
        self.scroll_to_bottom();
        self.input.as_ref().is_some_and(|sink| sink.input(data))
    }

    /// Snapshot of the visible screen.
    pub fn screen_state(&self) -> ScreenState {
        ScreenState::capture(self.parser.screen())
    }

    /// Plain text of the visible screen, one line per row.
    pub fn visible_text(&self) -> String {
        self.parser.screen().contents()
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Scroll up by the specified number of lines.
    pub fn scroll_up(&mut self, lines: usize) {
        let desired_offset = self.scroll_offset.saturating_add(lines);
        self.parser.set_scrollback(desired_offset);
        // Read back actual offset (clamped by parser)
        self.scroll_offset = self.parser.screen().scrollback();
        if self.scroll_offset > 0 {
            self.scroll_locked = true;
        }
    }

    /// Scroll down by the specified number of lines.
    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
        self.parser.set_scrollback(self.scroll_offset);
        if self.scroll_offset == 0 {
            self.scroll_locked = false;
        }
    }

    /// Jump to the bottom (live view).
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
        self.scroll_locked = false;
        self.parser.set_scrollback(0);
    }
}

impl TerminalSurface for VtSurface {
    fn attach(&mut self, target: &RenderTarget) -> Result<(), AttachError> {
        if self.disposed {
            return Err(AttachError::Disposed);
        }
        if self.target.is_some() {
            return Err(AttachError::AlreadyAttached);
        }
        if target.area().is_none() {
            return Err(AttachError::TargetUnavailable);
        }
        self.target = Some(target.clone());
        Ok(())
    }

    fn fit(&mut self) -> Option<Geometry> {
        let area = self.target.as_ref()?.area()?;
        let geometry = Geometry::from_area(area)?;
        if geometry == self.geometry {
            return None;
        }
        self.parser.set_size(geometry.rows, geometry.cols);
        self.geometry = geometry;
        Some(geometry)
    }

    fn write(&mut self, bytes: &[u8]) {
        if self.disposed {
            warn!(len = bytes.len(), "write to disposed surface ignored");
            return;
        }
        self.parser.process(bytes);

        // Auto-scroll to bottom when new output arrives, unless scroll is locked
        if !self.scroll_locked {
            self.scroll_offset = 0;
        }
        // vt100 resets scrollback while processing, re-apply the tracked position
        self.parser.set_scrollback(self.scroll_offset);
    }

    fn on_input(&mut self, sink: InputSink) {
        self.input = Some(sink);
    }

    fn clear_input(&mut self) {
        self.input = None;
    }

    fn watch_resize(&mut self) {
        self.resize_watched = !self.disposed;
    }

    fn unwatch_resize(&mut self) {
        self.resize_watched = false;
    }

    fn watches_resize(&self) -> bool {
        self.resize_watched
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.input = None;
        self.resize_watched = false;
        self.target = None;
        // Drop the scrollback buffer
        self.parser = vt100::Parser::new(1, 1, 0);
        self.scroll_offset = 0;
        self.scroll_locked = false;
    }

    fn geometry(&self) -> Geometry {
        self.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{event_stream, SessionEvent};
    use crate::surface::ContextKind;
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::layout::Rect;

    fn laid_out_target(width: u16, height: u16) -> RenderTarget {
        let target = RenderTarget::new(ContextKind::Dialog);
        target.set_area(Rect::new(0, 0, width, height));
        target
    }

    #[test]
    fn attach_requires_a_laid_out_target() {
        let mut surface = VtSurface::new(100);
        let target = RenderTarget::new(ContextKind::Dialog);
        assert_eq!(
            surface.attach(&target),
            Err(AttachError::TargetUnavailable)
        );

        target.set_area(Rect::new(0, 0, 40, 10));
        assert_eq!(surface.attach(&target), Ok(()));
        assert_eq!(surface.attach(&target), Err(AttachError::AlreadyAttached));
    }

    #[test]
    fn fit_follows_target_area() {
        let mut surface = VtSurface::new(100);
        let target = laid_out_target(40, 10);
        surface.attach(&target).unwrap();

        assert_eq!(surface.fit(), Geometry::new(10, 40));
        assert_eq!(surface.fit(), None, "unchanged area is not a change");

        target.set_area(Rect::new(0, 0, 100, 30));
        assert_eq!(surface.fit(), Geometry::new(30, 100));
        assert_eq!(surface.screen_state().rows.len(), 30);
    }

    #[test]
    fn utf8_split_across_writes_renders_one_char() {
        let mut surface = VtSurface::new(100);
        let euro = "€".as_bytes();
        surface.write(&euro[..2]);
        surface.write(&euro[2..]);

        let state = surface.screen_state();
        assert_eq!(state.rows[0].cells[0].contents, "€");
    }

    #[test]
    fn escape_sequence_split_across_writes_is_applied() {
        let mut surface = VtSurface::new(100);
        surface.write(b"\x1b[3");
        surface.write(b"1mred");

        let state = surface.screen_state();
        assert_eq!(state.rows[0].cells[0].contents, "r");
        assert_eq!(state.rows[0].cells[0].fg, crate::surface::TermColor::Indexed(1));
        assert!(!surface.visible_text().contains('['));
    }

    #[test]
    fn keys_reach_the_registered_sink_only() {
        let mut surface = VtSurface::new(100);
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert!(!surface.key(enter), "no sink registered yet");

        let (tx, mut rx) = event_stream();
        surface.on_input(tx);
        assert!(surface.key(enter));
        assert!(surface.paste("echo hi"));
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Input("\r".to_string()));
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::Input("echo hi".to_string())
        );

        surface.clear_input();
        assert!(!surface.key(enter));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn typing_while_scrolled_back_returns_to_live_view() {
        let mut surface = VtSurface::new(100);
        for i in 0..60 {
            surface.write(format!("line {}\r\n", i).as_bytes());
        }
        let (tx, mut rx) = event_stream();
        surface.on_input(tx);
        surface.scroll_up(10);
        assert_eq!(surface.scroll_offset(), 10);

        assert!(surface.key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert_eq!(surface.scroll_offset(), 0);
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Input("q".to_string()));
    }

    #[test]
    fn scroll_lock_survives_new_output() {
        let mut surface = VtSurface::new(100);
        for i in 0..60 {
            surface.write(format!("line {}\r\n", i).as_bytes());
        }
        surface.scroll_up(5);
        assert_eq!(surface.scroll_offset(), 5);

        surface.write(b"more\r\n");
        assert_eq!(surface.scroll_offset(), 5);

        surface.scroll_down(5);
        assert_eq!(surface.scroll_offset(), 0);
        surface.write(b"live\r\n");
        assert_eq!(surface.scroll_offset(), 0);
    }

    #[test]
    fn dispose_releases_target_and_blocks_reattach() {
        let mut surface = VtSurface::new(100);
        let target = laid_out_target(40, 10);
        surface.attach(&target).unwrap();
        surface.dispose();

        assert!(surface.is_disposed());
        assert!(!surface.is_attached());
        assert_eq!(surface.attach(&target), Err(AttachError::Disposed));
    }
}
