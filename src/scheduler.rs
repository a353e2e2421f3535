//! Task scheduler: FIFO queue with a single execution slot.
//!
//! Producers (button watcher, idle watcher) append operations; only the
//! drain loop in [`AppService`](crate::app::service::AppService) pops
//! them.  The scheduler itself is plain synchronous state: it never
//! sleeps and never touches hardware, which keeps every transition
//! testable without an executor.
//!
//! ```text
//!   enqueue ──▶ ┌─────────┐ begin_next ┌─────────┐  finish  ┌──────────┐
//!               │ pending │──────────▶│ current │────────▶│ history  │
//!               │  FIFO   │            │ (0 / 1) │          │ ring (10)│
//!               └─────────┘            └─────────┘          └──────────┘
//!                                         ▲
//!                          cancel_current ┘
//! ```

use heapless::{Deque, HistoryBuffer};
use log::{debug, info, warn};

use crate::error::SchedulerError;
use crate::operation::{Operation, OperationId, OperationKind, Outcome, TaskRecord};

/// Number of terminated operations retained for the maintenance policy.
pub const MAX_HISTORY: usize = 10;

/// Maximum number of operations waiting behind the running one.
pub const QUEUE_CAPACITY: usize = 8;

/// The operation occupying the execution slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Running {
    pub op: Operation,
    pub started_ms: u64,
}

impl Running {
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_ms)
    }
}

pub struct TaskScheduler {
    pending: Deque<Operation, QUEUE_CAPACITY>,
    current: Option<Running>,
    history: HistoryBuffer<TaskRecord, MAX_HISTORY>,
    next_id: u32,
    /// Idle-time baseline until the first record exists.
    booted_ms: u64,
}

impl TaskScheduler {
    pub fn new(booted_ms: u64) -> Self {
        Self {
            pending: Deque::new(),
            current: None,
            history: HistoryBuffer::new(),
            next_id: 1,
            booted_ms,
        }
    }

    /// Append an operation to the queue and return it with its new id.
    pub fn enqueue(
        &mut self,
        kind: OperationKind,
        duration_secs: Option<u32>,
    ) -> Result<Operation, SchedulerError> {
        let op = Operation {
            id: OperationId(self.next_id),
            kind,
            duration_secs,
        };
        self.pending
            .push_back(op)
            .map_err(|_| SchedulerError::QueueFull)?;
        self.next_id = self.next_id.wrapping_add(1);
        info!("Scheduler: queued {} {} ({} pending)", kind, op.id, self.pending.len());
        Ok(op)
    }

    /// Move the queue head into the execution slot.
    ///
    /// No-op (returns `None`) while an operation is running or when the
    /// queue is empty.
    pub fn begin_next(&mut self, now_ms: u64) -> Option<Operation> {
        if self.current.is_some() {
            return None;
        }
        let op = self.pending.pop_front()?;
        self.current = Some(Running {
            op,
            started_ms: now_ms,
        });
        info!("Scheduler: starting {} {} at {}ms", op.kind, op.id, now_ms);
        Some(op)
    }

    /// Close the execution slot and append the outcome to the history.
    ///
    /// Returns `None` if nothing was running.
    pub fn finish(&mut self, outcome: Outcome, now_ms: u64) -> Option<TaskRecord> {
        let running = self.current.take()?;
        let record = TaskRecord {
            id: running.op.id,
            kind: running.op.kind,
            start_ms: running.started_ms,
            end_ms: now_ms,
            completed: outcome == Outcome::Completed,
        };
        self.history.write(record);
        match outcome {
            Outcome::Completed => info!(
                "Scheduler: {} {} completed after {}ms",
                record.kind,
                record.id,
                record.duration_ms()
            ),
            Outcome::Cancelled => info!(
                "Scheduler: {} {} cancelled after {}ms",
                record.kind,
                record.id,
                record.duration_ms()
            ),
        }
        Some(record)
    }

    /// Close the execution slot without a record.
    ///
    /// For an operation that never reached the valves: it moved no water,
    /// so it must not reset the idle or flush timers.
    pub fn abandon(&mut self) -> Option<Operation> {
        let running = self.current.take()?;
        warn!("Scheduler: {} {} abandoned, not recorded", running.op.kind, running.op.id);
        Some(running.op)
    }

    /// Mark the running operation for cancellation.
    ///
    /// Returns the operation the caller must signal, or `None` when idle.
    pub fn cancel_current(&self) -> Option<Operation> {
        let running = self.current.as_ref()?;
        debug!("Scheduler: cancel requested for {} {}", running.op.kind, running.op.id);
        Some(running.op)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn current(&self) -> Option<&Running> {
        self.current.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pending operations, head first.
    pub fn pending(&self) -> impl Iterator<Item = &Operation> {
        self.pending.iter()
    }

    /// Nothing running and nothing queued.
    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.pending.is_empty()
    }

    /// Most recent record, completed or cancelled.
    pub fn last_record(&self) -> Option<&TaskRecord> {
        self.history.recent()
    }

    /// Retained records, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &TaskRecord> {
        self.history.oldest_ordered()
    }

    /// End of the last operation, or boot time if none has run yet.
    pub fn idle_since_ms(&self) -> u64 {
        self.last_record().map_or(self.booted_ms, |r| r.end_ms)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
