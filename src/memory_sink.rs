use crate::level::Level;
use crate::record::LogRecord;
use crate::sink::Sink;
use std::sync::{Arc, Mutex};

/// A sink that captures records in memory instead of writing anywhere.
///
/// Useful for asserting on the exact records a pipeline emits, and for
/// measuring pipeline overhead without any I/O. Clones share the same
/// buffer, so tests keep one handle and hand another to the pipeline.
#[derive(Clone)]
pub struct MemorySink {
    min_level: Level,
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    pub fn new(min_level: Level) -> Self {
        MemorySink {
            min_level,
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of everything captured so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Sink for MemorySink {
    fn emit(&self, record: &LogRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.without_internal_fields());
        }
    }

    fn min_level(&self) -> Level {
        self.min_level
    }
}
