/*!
 * Progress reporting for document jobs.
 */

use std::fmt;

/// How important a progress event is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl Severity {
    /// Matching log level
    pub fn level(self) -> log::Level {
        match self {
            Severity::Info => log::Level::Info,
            Severity::Warn => log::Level::Warn,
            Severity::Error => log::Level::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warn => write!(f, "warn"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Receiver of progress events from a document job
pub trait ProgressSink {
    /// Handle one event
    fn emit(&self, message: &str, severity: Severity);

    /// Called after each chapter with the number of chapters finished so far
    fn advance(&self, _completed: usize, _total: usize) {}
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn emit(&self, _message: &str, _severity: Severity) {}
}

impl<F> ProgressSink for F
where
    F: Fn(&str, Severity),
{
    fn emit(&self, message: &str, severity: Severity) {
        self(message, severity)
    }
}
