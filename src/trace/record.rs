//! Measurement handles and their finalized record snapshots.
//!
//! A [`Measurement`] is exclusively owned by the task thread driving one
//! phase span: mutation needs no synchronization. Each registration point
//! (`begin`, `end`) snapshots the handle into an immutable [`Record`] value
//! handed to the collector by copy, so the collector never shares mutable
//! state with producers.

use crate::trace::collector::PerfTrace;
use crate::trace::host;
use crate::trace::phase::{Action, Phase};
use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Instant;

/// Wall-clock rendering of record start times.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sentinel rendered when a record is formatted before its span began.
pub const NULL_TIME: &str = "null time";

/// Elapsed value of a record whose span has not ended.
pub const ELAPSED_UNSET: i64 = -1;

fn format_start_time(start_time: Option<DateTime<Local>>) -> String {
    match start_time {
        Some(t) => t.format(DATETIME_FORMAT).to_string(),
        None => NULL_TIME.to_string(),
    }
}

fn ser_start_time<S: serde::Serializer>(
    start_time: &Option<DateTime<Local>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_start_time(*start_time))
}

/// One phase-scoped performance sample for one task.
///
/// Created unstarted, driven through `begin` → (`add_count` / `add_size`)* →
/// `end` by its owning thread. Every operation short-circuits before any
/// timestamp capture when the collector is disabled.
#[derive(Debug)]
pub struct Measurement {
    trace: Arc<PerfTrace>,
    task_group_id: i32,
    task_id: i32,
    phase: Phase,
    action: Option<Action>,
    start_time: Option<DateTime<Local>>,
    /// Monotonic start instant, used only for duration math, never displayed.
    start_instant: Option<Instant>,
    elapsed_nanos: i64,
    count: u64,
    size: u64,
}

impl Measurement {
    pub fn new(trace: Arc<PerfTrace>, task_group_id: i32, task_id: i32, phase: Phase) -> Self {
        Self {
            trace,
            task_group_id,
            task_id,
            phase,
            action: None,
            start_time: None,
            start_instant: None,
            elapsed_nanos: ELAPSED_UNSET,
            count: 0,
            size: 0,
        }
    }

    /// Open the span: capture wall-clock and monotonic start, transition to
    /// `Start`, and register one snapshot with the collector.
    pub fn begin(&mut self) {
        if !self.trace.is_enabled() {
            return;
        }
        self.start_time = Some(Local::now());
        self.start_instant = Some(Instant::now());
        self.action = Some(Action::Start);
        self.trace.register(self.snapshot());
    }

    /// Add processed units. Strictly additive.
    pub fn add_count(&mut self, count: u64) {
        self.count += count;
    }

    /// Add processed bytes. Strictly additive.
    pub fn add_size(&mut self, size: u64) {
        self.size += size;
    }

    /// Close the span: compute the elapsed duration against the monotonic
    /// start, transition to `End`, and register one snapshot.
    ///
    /// Calling `end` without a prior `begin` leaves `elapsed_nanos` at −1;
    /// the record still registers but is excluded from duration reporting.
    pub fn end(&mut self) {
        if !self.trace.is_enabled() {
            return;
        }
        self.elapsed_nanos = self
            .start_instant
            .map_or(ELAPSED_UNSET, |s| s.elapsed().as_nanos() as i64);
        self.finish();
    }

    /// Close the span with an externally measured duration, bypassing the
    /// internal monotonic clock (e.g. a duration passed up from a sub-span).
    pub fn end_with_elapsed(&mut self, elapsed_nanos: i64) {
        if !self.trace.is_enabled() {
            return;
        }
        self.elapsed_nanos = elapsed_nanos;
        self.finish();
    }

    fn finish(&mut self) {
        self.action = Some(Action::End);
        self.trace.register(self.snapshot());
    }

    /// Register a summary-only record already in the `End` state, for callers
    /// that tracked the span themselves. A complete no-op when disabled —
    /// nothing is constructed.
    pub fn record(
        trace: &Arc<PerfTrace>,
        task_group_id: i32,
        task_id: i32,
        phase: Phase,
        start_time_millis: i64,
        elapsed_nanos: i64,
    ) {
        if !trace.is_enabled() {
            return;
        }
        trace.register(Record {
            instance_id: trace.instance_id(),
            task_group_id,
            task_id,
            phase,
            action: Action::End,
            start_time: Local.timestamp_millis_opt(start_time_millis).single(),
            elapsed_nanos,
            count: 0,
            size: 0,
            reported: false,
        });
    }

    /// Snapshot the current state into an immutable record value.
    ///
    /// Only meaningful after `begin` or `end` set the action; callers inside
    /// this module guarantee that.
    fn snapshot(&self) -> Record {
        Record {
            instance_id: self.trace.instance_id(),
            task_group_id: self.task_group_id,
            task_id: self.task_id,
            phase: self.phase,
            // begin/end always set the action before snapshotting.
            action: self.action.unwrap_or(Action::Start),
            start_time: self.start_time,
            elapsed_nanos: self.elapsed_nanos,
            count: self.count,
            size: self.size,
            reported: false,
        }
    }

    pub fn task_group_id(&self) -> i32 {
        self.task_group_id
    }

    pub fn task_id(&self) -> i32 {
        self.task_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn action(&self) -> Option<Action> {
        self.action
    }

    pub fn start_time(&self) -> Option<DateTime<Local>> {
        self.start_time
    }

    /// The formatted start time, or the `null time` sentinel before `begin`.
    pub fn datetime(&self) -> String {
        format_start_time(self.start_time)
    }

    pub fn elapsed_nanos(&self) -> i64 {
        self.elapsed_nanos
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// The run instance id, delegated to the collector.
    pub fn instance_id(&self) -> i64 {
        self.trace.instance_id()
    }

    pub fn host_ip(&self) -> &'static str {
        host::identity().ip.as_str()
    }

    pub fn hostname(&self) -> &'static str {
        host::identity().hostname.as_str()
    }
}

/// An immutable snapshot of a measurement at one registration point.
///
/// Identity (equality and hashing) covers exactly
/// `(instance_id, task_group_id, task_id, phase, start_time)`; the START and
/// END snapshots of one logical measurement compare equal even though their
/// `action`, `elapsed_nanos`, `count` and `size` differ.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub instance_id: i64,
    pub task_group_id: i32,
    pub task_id: i32,
    pub phase: Phase,
    pub action: Action,
    #[serde(serialize_with = "ser_start_time")]
    pub start_time: Option<DateTime<Local>>,
    pub elapsed_nanos: i64,
    pub count: u64,
    pub size: u64,
    #[serde(skip)]
    pub(crate) reported: bool,
}

impl Record {
    /// Whether this record has already been flushed to a report.
    pub fn is_reported(&self) -> bool {
        self.reported
    }

    /// The formatted start time, or the `null time` sentinel when unset.
    pub fn datetime(&self) -> String {
        format_start_time(self.start_time)
    }

    /// Total order by elapsed duration, ascending. An absent counterpart
    /// sorts as less — this record appears after it.
    ///
    /// Not exposed as `Ord`: that would have to be consistent with the
    /// identity-only `Eq`, and duration ordering is not.
    pub fn compare_elapsed(&self, other: Option<&Record>) -> Ordering {
        match other {
            None => Ordering::Greater,
            Some(o) => self.elapsed_nanos.cmp(&o.elapsed_nanos),
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.instance_id == other.instance_id
            && self.task_group_id == other.task_group_id
            && self.task_id == other.task_id
            && self.phase == other.phase
            && self.start_time == other.start_time
    }
}

impl Eq for Record {}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.instance_id.hash(state);
        self.task_group_id.hash(state);
        self.task_id.hash(state);
        self.phase.code().hash(state);
        self.start_time.hash(state);
    }
}

impl fmt::Display for Record {
    /// The canonical log line:
    /// `instanceId,taskGroupId,taskId,phase,action,startTime,elapsedNanos,count,size,hostIP`.
    /// Fields carry no escaping; embedded commas in future fields would break
    /// line-oriented consumers (documented limitation).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{},{},{},{}",
            self.instance_id,
            self.task_group_id,
            self.task_id,
            self.phase,
            self.action,
            self.datetime(),
            self.elapsed_nanos,
            self.count,
            self.size,
            host::identity().ip,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::hash_map::DefaultHasher;

    fn test_record(
        task_id: i32,
        action: Action,
        elapsed_nanos: i64,
        start_time: Option<DateTime<Local>>,
    ) -> Record {
        Record {
            instance_id: 42,
            task_group_id: 1,
            task_id,
            phase: Phase::ReadTaskData,
            action,
            start_time,
            elapsed_nanos,
            count: 0,
            size: 0,
            reported: false,
        }
    }

    fn hash_of(record: &Record) -> u64 {
        let mut hasher = DefaultHasher::new();
        record.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_identity_excludes_mutable_fields() {
        let t = Some(Local::now());
        let start = test_record(5, Action::Start, ELAPSED_UNSET, t);
        let mut end = test_record(5, Action::End, 1_000_000, t);
        end.count = 100;
        end.size = 2048;
        assert_eq!(start, end);
        assert_eq!(hash_of(&start), hash_of(&end));
    }

    #[test]
    fn test_identity_covers_key_fields() {
        let t = Some(Local::now());
        let a = test_record(5, Action::End, 10, t);
        assert_ne!(a, test_record(6, Action::End, 10, t));
        let mut other_phase = test_record(5, Action::End, 10, t);
        other_phase.phase = Phase::WriteTaskData;
        assert_ne!(a, other_phase);
        let mut other_inst = test_record(5, Action::End, 10, t);
        other_inst.instance_id = 43;
        assert_ne!(a, other_inst);
        assert_ne!(a, test_record(5, Action::End, 10, None));
    }

    #[test]
    fn test_compare_against_absent_sorts_after() {
        let r = test_record(1, Action::End, 5, None);
        assert_eq!(r.compare_elapsed(None), Ordering::Greater);
    }

    #[test]
    fn test_display_field_order() {
        let start_time = Local.with_ymd_and_hms(2025, 3, 9, 12, 30, 45).unwrap();
        let mut r = test_record(5, Action::End, 123, Some(start_time));
        r.count = 100;
        r.size = 2048;
        let line = r.to_string();
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 10);
        assert_eq!(fields[0], "42");
        assert_eq!(fields[1], "1");
        assert_eq!(fields[2], "5");
        assert_eq!(fields[3], "READ_TASK_DATA");
        assert_eq!(fields[4], "END");
        assert_eq!(fields[5], "2025-03-09 12:30:45");
        assert_eq!(fields[6], "123");
        assert_eq!(fields[7], "100");
        assert_eq!(fields[8], "2048");
        assert_eq!(fields[9], host::identity().ip);
    }

    #[test]
    fn test_unset_start_time_renders_sentinel() {
        let r = test_record(1, Action::Start, ELAPSED_UNSET, None);
        assert_eq!(r.datetime(), NULL_TIME);
        assert!(r.to_string().contains(NULL_TIME));
    }

    #[test]
    fn test_serialize_to_json() {
        let start_time = Local.with_ymd_and_hms(2025, 3, 9, 12, 30, 45).unwrap();
        let r = test_record(5, Action::End, 123, Some(start_time));
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["phase"], "READ_TASK_DATA");
        assert_eq!(json["action"], "END");
        assert_eq!(json["start_time"], "2025-03-09 12:30:45");
        assert_eq!(json["elapsed_nanos"], 123);
        assert!(json.get("reported").is_none());
    }

    proptest! {
        #[test]
        fn sort_by_comparator_is_non_decreasing(
            elapsed in prop::collection::vec(-1i64..1_000_000_000, 0..64)
        ) {
            let mut records: Vec<Record> = elapsed
                .iter()
                .enumerate()
                .map(|(i, &e)| test_record(i as i32, Action::End, e, None))
                .collect();
            records.sort_by(|a, b| a.compare_elapsed(Some(b)));
            for pair in records.windows(2) {
                prop_assert!(pair[0].elapsed_nanos <= pair[1].elapsed_nanos);
            }
        }

        #[test]
        fn equal_records_hash_identically(
            task_id in 0i32..100,
            count in 0u64..10_000,
            elapsed in -1i64..1_000_000,
        ) {
            let t = Some(Local.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
            let a = test_record(task_id, Action::Start, ELAPSED_UNSET, t);
            let mut b = test_record(task_id, Action::End, elapsed, t);
            b.count = count;
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(hash_of(&a), hash_of(&b));
        }
    }
}
