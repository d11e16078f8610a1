//! Operator-facing event reporting.
//!
//! The control loop reports status, warnings and errors through the
//! [`EventSink`] trait and never formats or renders them itself. Concrete
//! destinations (console, display, file) implement the trait and are
//! composed with [`FanOutSink`].
//!
//! # Contract
//!
//! `emit()` is called from the control loop and must return within a
//! small bounded time. Slow destinations must buffer or drop.

use parking_lot::Mutex;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Severity of an emitted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventLevel {
    /// Per-cycle detail.
    Debug,
    /// Lifecycle information.
    Info,
    /// Recoverable anomaly (timeout, implausible reading, obstacle stop).
    Warning,
    /// Failure (escalation, link failure).
    Error,
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EventLevel::Debug => "DEBUG",
            EventLevel::Info => "INFO",
            EventLevel::Warning => "WARNING",
            EventLevel::Error => "ERROR",
        };
        f.write_str(text)
    }
}

/// Destination for events produced by the control loop.
pub trait EventSink: Send + Sync {
    /// Deliver one event. Must not block for more than a bounded time.
    fn emit(&self, level: EventLevel, message: &str);
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&self, level: EventLevel, message: &str) {
        (**self).emit(level, message);
    }
}

impl<S: EventSink + ?Sized> EventSink for std::sync::Arc<S> {
    fn emit(&self, level: EventLevel, message: &str) {
        (**self).emit(level, message);
    }
}

/// Forwards events to the `tracing` subscriber at the matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, level: EventLevel, message: &str) {
        match level {
            EventLevel::Debug => debug!(target: "rover::event", "{message}"),
            EventLevel::Info => info!(target: "rover::event", "{message}"),
            EventLevel::Warning => warn!(target: "rover::event", "{message}"),
            EventLevel::Error => error!(target: "rover::event", "{message}"),
        }
    }
}

/// Delivers every event to each wrapped sink, in insertion order.
#[derive(Default)]
pub struct FanOutSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl FanOutSink {
    /// Create an empty fan-out.
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Add a destination.
    pub fn with(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Add a destination in place.
    pub fn push(&mut self, sink: impl EventSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    /// Number of wrapped sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether no sink is attached.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for FanOutSink {
    fn emit(&self, level: EventLevel, message: &str) {
        for sink in &self.sinks {
            sink.emit(level, message);
        }
    }
}

/// An event captured by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    /// Event severity.
    pub level: EventLevel,
    /// Event text.
    pub message: String,
}

/// In-memory sink, used by tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events at `level`.
    pub fn count(&self, level: EventLevel) -> usize {
        self.events.lock().iter().filter(|e| e.level == level).count()
    }

    /// Most recent event, if any.
    pub fn last(&self) -> Option<RecordedEvent> {
        self.events.lock().last().cloned()
    }

    /// Drop all recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, level: EventLevel, message: &str) {
        self.events.lock().push(RecordedEvent {
            level,
            message: message.to_string(),
        });
    }
}
