/*!
 * Mock translator implementations for testing
 *
 * These stand in for the model so tests never make network calls. Every mock
 * shares a call tracker so a test can inspect the calls after handing the
 * translator to a session.
 */

use std::cell::RefCell;
use std::sync::{Arc, Mutex};

use booktrans::errors::TranslationError;
use booktrans::translation::core::Translator;
use booktrans::translation::pipeline::{ProgressSink, Severity};

/// Tracks calls made to a mock translator
#[derive(Debug, Default)]
pub struct CallTracker {
    /// Every batch received, in call order
    pub calls: Vec<Vec<String>>,
}

impl CallTracker {
    /// Number of calls
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    /// Number of texts received over all calls
    pub fn text_count(&self) -> usize {
        self.calls.iter().map(Vec::len).sum()
    }
}

/// What the mock does with a batch
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Upper-case every text
    Uppercase,
    /// Prepend a fixed prefix
    Prefix(String),
    /// Replace each text from a lookup table, falling back to upper case
    Table(Vec<(String, String)>),
    /// Fail the whole batch
    Fail,
    /// Return one translation fewer than asked for
    DropLast,
}

/// Configurable translator
#[derive(Debug, Clone)]
pub struct MockTranslator {
    behavior: MockBehavior,
    tracker: Arc<Mutex<CallTracker>>,
}

impl MockTranslator {
    /// Create a mock with the given behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            tracker: Arc::new(Mutex::new(CallTracker::default())),
        }
    }

    /// Mock that upper-cases
    pub fn uppercase() -> Self {
        Self::new(MockBehavior::Uppercase)
    }

    /// Mock that always fails
    pub fn failing() -> Self {
        Self::new(MockBehavior::Fail)
    }

    /// Shared call tracker
    pub fn tracker(&self) -> Arc<Mutex<CallTracker>> {
        self.tracker.clone()
    }

    /// Number of calls so far
    pub fn call_count(&self) -> usize {
        self.tracker.lock().unwrap().call_count()
    }
}

impl Translator for MockTranslator {
    fn translate(&self, texts: &[String]) -> Result<Vec<String>, TranslationError> {
        self.tracker.lock().unwrap().calls.push(texts.to_vec());

        match &self.behavior {
            MockBehavior::Uppercase => Ok(texts.iter().map(|t| t.to_uppercase()).collect()),
            MockBehavior::Prefix(prefix) => {
                Ok(texts.iter().map(|t| format!("{}{}", prefix, t)).collect())
            }
            MockBehavior::Table(table) => Ok(texts
                .iter()
                .map(|t| {
                    table
                        .iter()
                        .find(|(source, _)| source == t)
                        .map(|(_, target)| target.clone())
                        .unwrap_or_else(|| t.to_uppercase())
                })
                .collect()),
            MockBehavior::Fail => Err(TranslationError::Failed("model unavailable".to_string())),
            MockBehavior::DropLast => {
                let mut out: Vec<String> = texts.iter().map(|t| t.to_uppercase()).collect();
                out.pop();
                Ok(out)
            }
        }
    }
}

/// Progress sink that records every event
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: RefCell<Vec<(String, Severity)>>,
    advances: RefCell<Vec<(usize, usize)>>,
}

impl CollectingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far
    pub fn events(&self) -> Vec<(String, Severity)> {
        self.events.borrow().clone()
    }

    /// Events of one severity
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter(|(_, s)| *s == severity)
            .map(|(m, _)| m.clone())
            .collect()
    }

    /// Progress updates received so far
    pub fn advances(&self) -> Vec<(usize, usize)> {
        self.advances.borrow().clone()
    }
}

impl ProgressSink for CollectingSink {
    fn emit(&self, message: &str, severity: Severity) {
        self.events.borrow_mut().push((message.to_string(), severity));
    }

    fn advance(&self, completed: usize, total: usize) {
        self.advances.borrow_mut().push((completed, total));
    }
}
