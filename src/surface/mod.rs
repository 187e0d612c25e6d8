//! Terminal surfaces: the character grid a session renders into.
//!
//! A surface is bound to a [`RenderTarget`], the screen region the host lays
//! out for it. The host updates the target's area on every layout pass; the
//! surface reads it back in [`TerminalSurface::fit`].

pub mod keys;
pub mod screen;
pub mod vt;

use std::cell::Cell;
use std::rc::Rc;

use ratatui::layout::Rect;
use serde::Serialize;

use crate::error::AttachError;
use crate::session::EventSender;

pub use screen::{CellAttrs, ScreenState, TermColor};
pub use vt::VtSurface;

/// Receiver of user input chunks.
pub type InputSink = EventSender;

/// Row/column size of a terminal grid. Both dimensions are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub rows: u16,
    pub cols: u16,
}

impl Geometry {
    /// Returns None when either dimension is zero.
    pub fn new(rows: u16, cols: u16) -> Option<Self> {
        (rows > 0 && cols > 0).then_some(Self { rows, cols })
    }

    /// Geometry covering a screen rectangle.
    pub fn from_area(area: Rect) -> Option<Self> {
        Self::new(area.height, area.width)
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

/// The kind of rendering context a target lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// Modal dialog over the launcher screen.
    Dialog,
    /// Detached full-screen window.
    Window,
}

/// A screen region a surface can render into.
///
/// Clones share the same area cell. A fresh target has no area until the
/// host lays it out for the first time.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    kind: ContextKind,
    area: Rc<Cell<Option<Rect>>>,
}

impl RenderTarget {
    pub fn new(kind: ContextKind) -> Self {
        Self {
            kind,
            area: Rc::new(Cell::new(None)),
        }
    }

    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    /// Current laid-out area, if any. Zero-sized areas count as unavailable.
    pub fn area(&self) -> Option<Rect> {
        self.area.get().filter(|a| a.width > 0 && a.height > 0)
    }

    pub fn set_area(&self, area: Rect) {
        self.area.set(Some(area));
    }

    /// Whether two handles refer to the same target.
    pub fn same_as(&self, other: &RenderTarget) -> bool {
        Rc::ptr_eq(&self.area, &other.area)
    }
}

/// Rendering and input-capture capability for one session.
pub trait TerminalSurface {
    /// Bind to a render target. Succeeds at most once per instance.
    fn attach(&mut self, target: &RenderTarget) -> Result<(), AttachError>;

    /// Recompute geometry from the target area. Returns the new geometry when it changed.
    fn fit(&mut self) -> Option<Geometry>;

    /// Append raw output bytes.
    fn write(&mut self, bytes: &[u8]);

    /// Register the single input consumer.
    fn on_input(&mut self, sink: InputSink);

    /// Unregister the input consumer.
    fn clear_input(&mut self);

    /// Subscribe to viewport changes of the attached target.
    fn watch_resize(&mut self);

    fn unwatch_resize(&mut self);

    fn watches_resize(&self) -> bool;

    /// Release the target and all buffers.
    fn dispose(&mut self);

    fn geometry(&self) -> Geometry;
}
