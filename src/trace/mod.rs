pub mod collector;
pub mod host;
pub mod phase;
pub mod record;
pub mod report;
pub mod sink;

pub use collector::PerfTrace;
pub use host::{identity, HostIdentity};
pub use phase::{Action, Phase, PluginPhase, PLUGIN_PHASE_MIN};
pub use record::{Measurement, Record, DATETIME_FORMAT, ELAPSED_UNSET, NULL_TIME};
pub use report::{reconcile, slowest, summarize, PhaseSummary};
pub use sink::{MemorySink, NullSink, RecordSink, TracingSink};
