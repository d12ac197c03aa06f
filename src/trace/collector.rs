//! The run-scoped collector.
//!
//! One `PerfTrace` exists per job run, created before any task starts and
//! dropped after the final report snapshot. Task threads share it through an
//! `Arc`; the record set is the only mutable shared state and is guarded by
//! a single mutex on the (infrequent) registration path.

use crate::trace::record::{Measurement, Record};
use crate::trace::sink::{RecordSink, TracingSink};
use crate::trace::Phase;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::Level;

pub struct PerfTrace {
    enabled: AtomicBool,
    instance_id: i64,
    records: Mutex<Vec<Record>>,
    sink: Box<dyn RecordSink>,
}

impl PerfTrace {
    /// Create the collector for one job run, emitting record lines through
    /// the default [`TracingSink`].
    pub fn new(instance_id: i64, enabled: bool) -> Self {
        Self::with_sink(instance_id, enabled, Box::new(TracingSink))
    }

    /// Create the collector with an explicit log sink.
    pub fn with_sink(instance_id: i64, enabled: bool, sink: Box<dyn RecordSink>) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            instance_id,
            records: Mutex::new(Vec::new()),
            sink,
        }
    }

    /// Cheap enabled check; every measurement operation consults this before
    /// doing any work.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Flip the enabled flag. Expected to be set once before the run starts;
    /// turning it off mid-run stops all further capture.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// The identifier shared by all records of this run.
    pub fn instance_id(&self) -> i64 {
        self.instance_id
    }

    /// Append a record snapshot and emit its log line. Registration does not
    /// deduplicate: the START and END snapshots of one logical measurement
    /// both land in the set, reconciled later by the reporting consumer.
    pub fn register(&self, record: Record) {
        if !self.is_enabled() {
            return;
        }
        let line = record.to_string();
        self.records.lock().unwrap().push(record);
        self.sink.emit(Level::INFO, &line);
    }

    /// A convenience handle for one task phase, bound to this run.
    pub fn measurement(
        self: &Arc<Self>,
        task_group_id: i32,
        task_id: i32,
        phase: Phase,
    ) -> Measurement {
        Measurement::new(Arc::clone(self), task_group_id, task_id, phase)
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }

    /// Copy of the record set in registration order. Snapshot semantics:
    /// appends from still-running tasks after the clone are not reflected.
    pub fn snapshot(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    /// Snapshot sorted ascending by elapsed duration, so the worst offenders
    /// sit at the tail.
    pub fn snapshot_sorted(&self) -> Vec<Record> {
        let mut records = self.snapshot();
        records.sort_by(|a, b| a.compare_elapsed(Some(b)));
        records
    }

    /// Records not yet flushed to a report, marked as reported and returned
    /// sorted ascending by elapsed duration. A second call only yields
    /// records registered in between.
    pub fn drain_report(&self) -> Vec<Record> {
        let mut out: Vec<Record> = {
            let mut records = self.records.lock().unwrap();
            records
                .iter_mut()
                .filter(|r| !r.reported)
                .map(|r| {
                    r.reported = true;
                    r.clone()
                })
                .collect()
        };
        out.sort_by(|a, b| a.compare_elapsed(Some(b)));
        out
    }
}

impl fmt::Debug for PerfTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerfTrace")
            .field("instance_id", &self.instance_id)
            .field("enabled", &self.is_enabled())
            .field("records", &self.len())
            .finish()
    }
}
