//! Scripted fakes for exercising sessions without a network or a screen.

use std::cell::RefCell;
use std::rc::Rc;

use url::Url;

use crate::error::{AttachError, TransportError};
use crate::session::{EventSender, SocketEvent};
use crate::surface::{Geometry, InputSink, RenderTarget, TerminalSurface};

/// Shared, ordered record of operations across several fakes.
pub type Journal = Rc<RefCell<Vec<String>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

fn note(journal: &Option<Journal>, entry: String) {
    if let Some(journal) = journal {
        journal.borrow_mut().push(entry);
    }
}

#[derive(Default)]
struct SocketState {
    opened: Vec<String>,
    sent: Vec<String>,
    close_calls: usize,
    events: Option<EventSender>,
}

/// A socket that records what it is asked to do.
///
/// Clones share state, so a test keeps one handle while the transport owns
/// another. Events are injected with [`FakeSocket::deliver`].
#[derive(Clone, Default)]
pub struct FakeSocket {
    name: String,
    state: Rc<RefCell<SocketState>>,
    journal: Option<Journal>,
}

impl FakeSocket {
    pub fn new() -> Self {
        Self {
            name: "socket".to_string(),
            ..Self::default()
        }
    }

    /// A socket that also logs `"<name> open"` / `"<name> close"` to `journal`.
    pub fn journaled(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            state: Rc::default(),
            journal: Some(journal.clone()),
        }
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.state.borrow().opened.clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.state.borrow().sent.clone()
    }

    pub fn close_calls(&self) -> usize {
        self.state.borrow().close_calls
    }

    /// Post an event as if the network produced it.
    pub fn deliver(&self, event: SocketEvent) -> bool {
        let events = self.state.borrow().events.clone();
        match events {
            Some(events) => events.socket(event),
            None => false,
        }
    }

    pub fn deliver_output(&self, output: &str) -> bool {
        let text = serde_json::json!({ "output": output }).to_string();
        self.deliver(SocketEvent::Message(text))
    }
}

impl crate::transport::Socket for FakeSocket {
    fn open(&mut self, url: Url, events: EventSender) {
        note(&self.journal, format!("{} open", self.name));
        let mut state = self.state.borrow_mut();
        state.opened.push(url.to_string());
        state.events = Some(events);
    }

    fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        if state.events.is_none() {
            return Err(TransportError::NotOpen);
        }
        state.sent.push(text);
        Ok(())
    }

    fn close(&mut self) {
        note(&self.journal, format!("{} close", self.name));
        self.state.borrow_mut().close_calls += 1;
    }
}

#[derive(Default)]
struct SurfaceState {
    target: Option<RenderTarget>,
    geometry: Option<Geometry>,
    input: Option<InputSink>,
    resize_watched: bool,
    writes: Vec<String>,
    attach_calls: usize,
    fit_calls: usize,
    dispose_calls: usize,
    disposed: bool,
}

/// A surface that records every call instead of emulating a terminal.
#[derive(Clone, Default)]
pub struct RecordingSurface {
    state: Rc<RefCell<SurfaceState>>,
    journal: Option<Journal>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journaled(journal: &Journal) -> Self {
        Self {
            state: Rc::default(),
            journal: Some(journal.clone()),
        }
    }

    /// Everything written, one entry per `write` call.
    pub fn writes(&self) -> Vec<String> {
        self.state.borrow().writes.clone()
    }

    /// All written text concatenated.
    pub fn text(&self) -> String {
        self.state.borrow().writes.concat()
    }

    pub fn attach_calls(&self) -> usize {
        self.state.borrow().attach_calls
    }

    pub fn fit_calls(&self) -> usize {
        self.state.borrow().fit_calls
    }

    pub fn dispose_calls(&self) -> usize {
        self.state.borrow().dispose_calls
    }

    pub fn is_attached(&self) -> bool {
        self.state.borrow().target.is_some()
    }

    pub fn has_input_sink(&self) -> bool {
        self.state.borrow().input.is_some()
    }

    /// Emit a chunk through the registered input sink, as a keystroke would.
    pub fn type_input(&self, data: &str) -> bool {
        let sink = self.state.borrow().input.clone();
        match sink {
            Some(sink) => sink.input(data.to_string()),
            None => false,
        }
    }
}

impl TerminalSurface for RecordingSurface {
    fn attach(&mut self, target: &RenderTarget) -> Result<(), AttachError> {
        let mut state = self.state.borrow_mut();
        state.attach_calls += 1;
        if state.disposed {
            return Err(AttachError::Disposed);
        }
        if state.target.is_some() {
            return Err(AttachError::AlreadyAttached);
        }
        if target.area().is_none() {
            return Err(AttachError::TargetUnavailable);
        }
        state.target = Some(target.clone());
        drop(state);
        note(&self.journal, "surface attach".to_string());
        Ok(())
    }

    fn fit(&mut self) -> Option<Geometry> {
        let mut state = self.state.borrow_mut();
        state.fit_calls += 1;
        let area = state.target.as_ref()?.area()?;
        let geometry = Geometry::from_area(area)?;
        if state.geometry == Some(geometry) {
            return None;
        }
        state.geometry = Some(geometry);
        Some(geometry)
    }

    fn write(&mut self, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        if state.disposed {
            return;
        }
        state.writes.push(String::from_utf8_lossy(bytes).into_owned());
    }

    fn on_input(&mut self, sink: InputSink) {
        self.state.borrow_mut().input = Some(sink);
    }

    fn clear_input(&mut self) {
        note(&self.journal, "surface clear_input".to_string());
        self.state.borrow_mut().input = None;
    }

    fn watch_resize(&mut self) {
        note(&self.journal, "surface watch_resize".to_string());
        self.state.borrow_mut().resize_watched = true;
    }

    fn unwatch_resize(&mut self) {
        note(&self.journal, "surface unwatch_resize".to_string());
        self.state.borrow_mut().resize_watched = false;
    }

    fn watches_resize(&self) -> bool {
        self.state.borrow().resize_watched
    }

    fn dispose(&mut self) {
        note(&self.journal, "surface dispose".to_string());
        let mut state = self.state.borrow_mut();
        state.dispose_calls += 1;
        state.disposed = true;
        state.target = None;
        state.input = None;
        state.resize_watched = false;
    }

    fn geometry(&self) -> Geometry {
        self.state.borrow().geometry.unwrap_or_default()
    }
}
