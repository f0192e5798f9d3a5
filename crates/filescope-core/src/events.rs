//! Engine event model
//!
//! Indexing and search runs report through an [`EventSink`] rather than a
//! UI toolkit. A run emits any number of [`EngineEvent::Progress`] messages
//! followed by exactly one terminal event: [`EngineEvent::Finished`] or
//! [`EngineEvent::Error`].

use std::sync::mpsc;

/// Event emitted by an indexing or search run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Free-text status message
    Progress(String),
    /// Run completed; carries the number of current files (indexing) or hits (search)
    Finished(usize),
    /// Run aborted
    Error(String),
}

impl EngineEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EngineEvent::Progress(_))
    }
}

/// Receiver of engine events
pub trait EventSink {
    fn emit(&mut self, event: EngineEvent);

    fn progress(&mut self, message: &str) {
        self.emit(EngineEvent::Progress(message.to_string()));
    }
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: EngineEvent) {}
}

/// Forwards events to another thread; a disconnected receiver is ignored
impl EventSink for mpsc::Sender<EngineEvent> {
    fn emit(&mut self, event: EngineEvent) {
        let _ = self.send(event);
    }
}

/// Adapts a closure into a sink
pub struct FnSink<F>(pub F);

impl<F> EventSink for FnSink<F>
where
    F: FnMut(EngineEvent),
{
    fn emit(&mut self, event: EngineEvent) {
        (self.0)(event)
    }
}

/// Sink that records every event, useful for tests and batch callers
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub events: Vec<EngineEvent>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress messages in emission order
    pub fn progress_messages(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Progress(m) => Some(m.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn terminal_events(&self) -> Vec<&EngineEvent> {
        self.events.iter().filter(|e| e.is_terminal()).collect()
    }
}

impl EventSink for CollectingSink {
    fn emit(&mut self, event: EngineEvent) {
        self.events.push(event);
    }
}
