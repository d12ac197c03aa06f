//! Log sinks: where formatted record lines go.
//!
//! The collector emits exactly one line per registration event. Sinks are
//! line-oriented and must be callable from any task thread.

use std::sync::{Arc, Mutex};
use tracing::Level;

/// Accepts a pre-formatted record line and a severity level.
pub trait RecordSink: Send + Sync {
    fn emit(&self, level: Level, line: &str);
}

/// Default sink: forwards lines to the `tracing` facade under the
/// `perftrace` target.
#[derive(Debug, Default)]
pub struct TracingSink;

impl RecordSink for TracingSink {
    fn emit(&self, level: Level, line: &str) {
        // `tracing` macros need a const level, so dispatch here.
        if level == Level::ERROR {
            tracing::error!(target: "perftrace", "{line}");
        } else if level == Level::WARN {
            tracing::warn!(target: "perftrace", "{line}");
        } else if level == Level::INFO {
            tracing::info!(target: "perftrace", "{line}");
        } else if level == Level::DEBUG {
            tracing::debug!(target: "perftrace", "{line}");
        } else {
            tracing::trace!(target: "perftrace", "{line}");
        }
    }
}

/// Discards every line. Used by benchmarks and overhead-sensitive callers.
#[derive(Debug, Default)]
pub struct NullSink;

impl RecordSink for NullSink {
    fn emit(&self, _level: Level, _line: &str) {}
}

/// A [`RecordSink`] that accumulates all lines into a shared `Vec`.
///
/// Construct with [`MemorySink::new`] and keep the returned
/// `Arc<Mutex<Vec<String>>>` to inspect emissions after the run.
pub struct MemorySink(Arc<Mutex<Vec<String>>>);

impl MemorySink {
    /// Create a new sink and return a handle to the shared line buffer.
    pub fn new() -> (Self, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        (Self(lines.clone()), lines)
    }
}

impl RecordSink for MemorySink {
    fn emit(&self, _level: Level, line: &str) {
        self.0.lock().unwrap().push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_captures_lines() {
        let (sink, lines) = MemorySink::new();
        sink.emit(Level::INFO, "a,b,c");
        sink.emit(Level::INFO, "d,e,f");
        let captured = lines.lock().unwrap();
        assert_eq!(*captured, vec!["a,b,c".to_string(), "d,e,f".to_string()]);
    }

    #[test]
    fn test_null_sink_is_silent() {
        // Nothing observable; just exercise the path.
        NullSink.emit(Level::INFO, "dropped");
    }
}
