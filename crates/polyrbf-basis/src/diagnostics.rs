//! Diagnostic sinks for basis construction.
//!
//! Construction reports progress (trace) and numerical-quality problems
//! (warn/error) through a [`DiagnosticSink`]. The default [`LogSink`]
//! forwards everything to the `log` facade; [`MemorySink`] keeps the
//! messages so that callers can attach them to per-element reports.

use log::Level;
use std::sync::Mutex;

/// Log target used by [`LogSink`].
pub const LOG_TARGET: &str = "polyrbf";

/// Receiver for construction diagnostics.
pub trait DiagnosticSink: Send + Sync {
    /// Record one message at the given level.
    fn log(&self, level: Level, message: &str);

    fn trace(&self, message: &str) {
        self.log(Level::Trace, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }
}

/// Forwards diagnostics to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn log(&self, level: Level, message: &str) {
        log::log!(target: LOG_TARGET, level, "{}", message);
    }
}

/// Collects diagnostics in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded messages, oldest first.
    pub fn records(&self) -> Vec<(Level, String)> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of messages at `level` or more severe.
    pub fn count_at_least(&self, level: Level) -> usize {
        self.records().iter().filter(|(l, _)| *l <= level).count()
    }
}

impl DiagnosticSink for MemorySink {
    fn log(&self, level: Level, message: &str) {
        let mut records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.push((level, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_order_and_levels() {
        let sink = MemorySink::new();
        sink.trace("first");
        sink.warn("second");
        sink.error("third");

        let records = sink.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], (Level::Trace, "first".to_string()));
        assert_eq!(records[2].0, Level::Error);

        // Error and Warn are both at least as severe as Warn
        assert_eq!(sink.count_at_least(Level::Warn), 2);
        assert_eq!(sink.count_at_least(Level::Trace), 3);
    }

    #[test]
    fn log_sink_accepts_all_levels() {
        let sink = LogSink;
        sink.trace("trace message");
        sink.warn("warn message");
        sink.error("error message");
    }
}
