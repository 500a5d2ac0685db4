//! Trace sink abstraction.
//!
//! Every piece of algorithm-facing text the handler produces (logs, debug
//! lines, errors, status, order events, statistics) goes through a single
//! `trace` call. Sinks swallow their own failures.

use std::sync::{Arc, Mutex, PoisonError};

/// Destination for algorithm-facing text.
pub trait TraceSink: Send + Sync {
    /// Writes one line of text.
    fn trace(&self, text: &str);
}

/// Sink that emits each line as a `tracing` event on the `algorithm` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn trace(&self, text: &str) {
        tracing::info!(target: "algorithm", "{text}");
    }
}

/// Sink that records every line in memory.
///
/// # Example
///
/// ```
/// use reporting::sink::{InMemorySink, TraceSink};
///
/// let sink = InMemorySink::new();
/// sink.trace("hello");
/// assert_eq!(sink.lines(), vec!["hello".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct InMemorySink {
    lines: Mutex<Vec<String>>,
}

impl InMemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty sink wrapped in an Arc.
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns a copy of every recorded line.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of recorded lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if any recorded line contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|line| line.contains(needle))
    }
}

impl TraceSink for InMemorySink {
    fn trace(&self, text: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());
    }
}
