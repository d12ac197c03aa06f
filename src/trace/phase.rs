//! Phase and action enumerations.
//!
//! Phase codes are split into two bands: 0–10 are framework-defined and
//! always present, codes ≥ 100 belong to plugin-contributed phases. The
//! numeric codes are part of the log-line contract — downstream consumers
//! parse them — so they must never be renumbered.

use serde::Serialize;
use std::fmt;

/// Lowest code a plugin-contributed phase may use.
pub const PLUGIN_PHASE_MIN: u32 = 100;

/// A named stage of task execution being timed.
///
/// The framework variants form a closed set with fixed codes. Plugins extend
/// the set through [`Phase::plugin`], which enforces the ≥ 100 band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Whole-task wall time, code 0.
    TaskTotal,
    ReadTaskInit,
    ReadTaskPrepare,
    ReadTaskData,
    ReadTaskPost,
    ReadTaskDestroy,
    WriteTaskInit,
    WriteTaskPrepare,
    WriteTaskData,
    WriteTaskPost,
    WriteTaskDestroy,
    /// A plugin-contributed phase, code ≥ 100.
    Plugin(PluginPhase),
}

/// A registered `(code, name)` pair for a plugin-contributed phase.
///
/// Equality and hashing use the code only; the name is a display label.
#[derive(Debug, Clone, Copy)]
pub struct PluginPhase {
    code: u32,
    name: &'static str,
}

impl PluginPhase {
    pub const fn code(self) -> u32 {
        self.code
    }

    pub const fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for PluginPhase {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for PluginPhase {}

impl std::hash::Hash for PluginPhase {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl Phase {
    /// SQL query execution inside a reader plugin.
    pub const SQL_QUERY: Phase = Phase::plugin(100, "SQL_QUERY");
    /// Fetching the full result set out of a query.
    pub const RESULT_FETCH_ALL: Phase = Phase::plugin(101, "RESULT_FETCH_ALL");
    /// Closing a storage block on the write side.
    pub const BLOCK_CLOSE: Phase = Phase::plugin(102, "BLOCK_CLOSE");
    pub const WAIT_READ_TIME: Phase = Phase::plugin(103, "WAIT_READ_TIME");
    pub const WAIT_WRITE_TIME: Phase = Phase::plugin(104, "WAIT_WRITE_TIME");
    pub const TRANSFORMER_TIME: Phase = Phase::plugin(201, "TRANSFORMER_TIME");

    /// Register a plugin phase. Panics at compile time (for `const` uses) or
    /// at registration if `code` falls inside the framework band.
    pub const fn plugin(code: u32, name: &'static str) -> Phase {
        assert!(code >= PLUGIN_PHASE_MIN, "plugin phase codes start at 100");
        Phase::Plugin(PluginPhase { code, name })
    }

    /// The stable numeric code of this phase.
    pub const fn code(self) -> u32 {
        match self {
            Phase::TaskTotal => 0,
            Phase::ReadTaskInit => 1,
            Phase::ReadTaskPrepare => 2,
            Phase::ReadTaskData => 3,
            Phase::ReadTaskPost => 4,
            Phase::ReadTaskDestroy => 5,
            Phase::WriteTaskInit => 6,
            Phase::WriteTaskPrepare => 7,
            Phase::WriteTaskData => 8,
            Phase::WriteTaskPost => 9,
            Phase::WriteTaskDestroy => 10,
            Phase::Plugin(p) => p.code,
        }
    }

    /// The name rendered in log lines.
    pub const fn name(self) -> &'static str {
        match self {
            Phase::TaskTotal => "TASK_TOTAL",
            Phase::ReadTaskInit => "READ_TASK_INIT",
            Phase::ReadTaskPrepare => "READ_TASK_PREPARE",
            Phase::ReadTaskData => "READ_TASK_DATA",
            Phase::ReadTaskPost => "READ_TASK_POST",
            Phase::ReadTaskDestroy => "READ_TASK_DESTROY",
            Phase::WriteTaskInit => "WRITE_TASK_INIT",
            Phase::WriteTaskPrepare => "WRITE_TASK_PREPARE",
            Phase::WriteTaskData => "WRITE_TASK_DATA",
            Phase::WriteTaskPost => "WRITE_TASK_POST",
            Phase::WriteTaskDestroy => "WRITE_TASK_DESTROY",
            Phase::Plugin(p) => p.name,
        }
    }

    /// Resolve a raw code back to a phase, for consumers that parse codes.
    /// Only framework phases and the built-in plugin phases are known.
    pub fn from_code(code: u32) -> Option<Phase> {
        match code {
            0 => Some(Phase::TaskTotal),
            1 => Some(Phase::ReadTaskInit),
            2 => Some(Phase::ReadTaskPrepare),
            3 => Some(Phase::ReadTaskData),
            4 => Some(Phase::ReadTaskPost),
            5 => Some(Phase::ReadTaskDestroy),
            6 => Some(Phase::WriteTaskInit),
            7 => Some(Phase::WriteTaskPrepare),
            8 => Some(Phase::WriteTaskData),
            9 => Some(Phase::WriteTaskPost),
            10 => Some(Phase::WriteTaskDestroy),
            100 => Some(Phase::SQL_QUERY),
            101 => Some(Phase::RESULT_FETCH_ALL),
            102 => Some(Phase::BLOCK_CLOSE),
            103 => Some(Phase::WAIT_READ_TIME),
            104 => Some(Phase::WAIT_WRITE_TIME),
            201 => Some(Phase::TRANSFORMER_TIME),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Phase {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Whether a record marks the start or the end of a phase span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Start,
    End,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Start => "START",
            Action::End => "END",
        })
    }
}
