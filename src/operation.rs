//! Operation and outcome types shared by the scheduler, engine and policy.

use core::fmt;

/// The three physical procedures the appliance can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// User-triggered membrane flush (usually ahead of a filter).
    Flush,
    /// Timed water production.
    Filter,
    /// Flush triggered purely by idle time.
    AutoFlush,
}

impl OperationKind {
    /// Short uppercase tag used in log lines.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Flush => "FLUSH",
            Self::Filter => "FILTER",
            Self::AutoFlush => "AUTOFLUSH",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Scheduler-assigned identity, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationId(pub u32);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A scheduled unit of work.  Consumed exactly once by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub id: OperationId,
    pub kind: OperationKind,
    /// Filter duration override in seconds; `None` uses the configured one.
    pub duration_secs: Option<u32>,
}

/// How an operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every hold ran to its natural end.
    Completed,
    /// A cancellation was observed at a hold boundary.
    Cancelled,
}

/// Immutable log entry for one terminated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: OperationId,
    pub kind: OperationKind,
    /// Monotonic start time (ms since boot).
    pub start_ms: u64,
    /// Monotonic end time (ms since boot).
    pub end_ms: u64,
    /// `false` if the operation was cancelled before its natural end.
    pub completed: bool,
}

impl TaskRecord {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}
