//! Diagnostics and progress events emitted during extraction.
//!
//! The extractor never talks to a UI directly. It writes [`ExtractionEvent`]s
//! into an [`EventSink`], which may be a channel, a vector, or the `log` facade.

use std::fmt;
use std::sync::mpsc;

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "INFO",
            Severity::Success => "PASS",
            Severity::Warning => "WARN",
            Severity::Error => "ERROR",
        };
        f.write_str(label)
    }
}

/// A human-readable diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// An event emitted by a running extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionEvent {
    /// A diagnostic message.
    Diagnostic(Diagnostic),
    /// Percentage of slides processed (0..=100, never decreasing).
    Progress(u8),
}

/// Receiver of extraction events.
pub trait EventSink {
    fn emit(&mut self, event: ExtractionEvent);

    fn info(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.emit(ExtractionEvent::Diagnostic(Diagnostic::new(Severity::Info, message)));
    }

    fn success(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.emit(ExtractionEvent::Diagnostic(Diagnostic::new(Severity::Success, message)));
    }

    fn warning(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.emit(ExtractionEvent::Diagnostic(Diagnostic::new(Severity::Warning, message)));
    }

    fn error(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.emit(ExtractionEvent::Diagnostic(Diagnostic::new(Severity::Error, message)));
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: ExtractionEvent) {
        (**self).emit(event);
    }
}

impl EventSink for Vec<ExtractionEvent> {
    fn emit(&mut self, event: ExtractionEvent) {
        self.push(event);
    }
}

// A dropped receiver only means nobody is listening any more.
impl EventSink for mpsc::Sender<ExtractionEvent> {
    fn emit(&mut self, event: ExtractionEvent) {
        let _ = self.send(event);
    }
}

impl EventSink for mpsc::SyncSender<ExtractionEvent> {
    fn emit(&mut self, event: ExtractionEvent) {
        let _ = self.send(event);
    }
}

/// Sink that forwards diagnostics to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: ExtractionEvent) {
        match event {
            ExtractionEvent::Diagnostic(d) => match d.severity {
                Severity::Info | Severity::Success => log::info!("{}", d.message),
                Severity::Warning => log::warn!("{}", d.message),
                Severity::Error => log::error!("{}", d.message),
            },
            ExtractionEvent::Progress(p) => log::debug!("progress {}%", p),
        }
    }
}
