//! Post-run reporting helpers.
//!
//! The registry is duplication-tolerant: one logical measurement usually
//! appears twice (its START and END snapshots). Reconciliation happens here,
//! on the consumer side, never inside the collector.

use crate::trace::phase::{Action, Phase};
use crate::trace::record::Record;
use std::collections::HashMap;
use std::fmt::Write;

/// Collapse START/END snapshot pairs into one row per logical measurement,
/// preferring the END-state entry, sorted ascending by elapsed duration.
pub fn reconcile(records: &[Record]) -> Vec<Record> {
    // Record's Eq/Hash is exactly the identity key, so the record doubles as
    // its own map key.
    let mut merged: HashMap<Record, Record> = HashMap::new();
    for record in records {
        match merged.get(record) {
            Some(existing) if existing.action == Action::End && record.action == Action::Start => {}
            _ => {
                merged.insert(record.clone(), record.clone());
            }
        }
    }
    let mut rows: Vec<Record> = merged.into_values().collect();
    rows.sort_by(|a, b| a.compare_elapsed(Some(b)));
    rows
}

/// The `n` slowest completed measurements, worst first. Records still open
/// (elapsed −1) never qualify.
pub fn slowest(records: &[Record], n: usize) -> Vec<Record> {
    let mut ended: Vec<Record> = reconcile(records)
        .into_iter()
        .filter(|r| r.action == Action::End && r.elapsed_nanos >= 0)
        .collect();
    ended.reverse();
    ended.truncate(n);
    ended
}

/// Per-phase aggregate over completed measurements.
#[derive(Debug, Default, Clone)]
pub struct PhaseSummary {
    pub records: usize,
    pub total_count: u64,
    pub total_size: u64,
    pub max_elapsed_nanos: i64,
    pub total_elapsed_nanos: i64,
}

/// Aggregate END-state records by phase, ordered by phase code.
pub fn summarize(records: &[Record]) -> Vec<(Phase, PhaseSummary)> {
    let mut by_phase: HashMap<Phase, PhaseSummary> = HashMap::new();
    for record in reconcile(records) {
        if record.action != Action::End {
            continue;
        }
        let summary = by_phase.entry(record.phase).or_default();
        summary.records += 1;
        summary.total_count += record.count;
        summary.total_size += record.size;
        summary.max_elapsed_nanos = summary.max_elapsed_nanos.max(record.elapsed_nanos);
        summary.total_elapsed_nanos += record.elapsed_nanos.max(0);
    }
    let mut phases: Vec<(Phase, PhaseSummary)> = by_phase.into_iter().collect();
    phases.sort_by_key(|(phase, _)| phase.code());
    phases
}

/// Render the per-phase summary as a fixed-width table for job-end logs.
pub fn format_summary(records: &[Record]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<20} {:>8} {:>12} {:>14} {:>14} {:>14}",
        "PHASE", "RECORDS", "COUNT", "BYTES", "MAX ELAPSED", "TOTAL ELAPSED"
    );
    for (phase, s) in summarize(records) {
        let _ = writeln!(
            out,
            "{:<20} {:>8} {:>12} {:>14} {:>12}us {:>12}us",
            phase.name(),
            s.records,
            s.total_count,
            s.total_size,
            s.max_elapsed_nanos / 1_000,
            s.total_elapsed_nanos / 1_000,
        );
    }
    out
}
