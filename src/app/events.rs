//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, append to the debug
//! log file, record them in a test.

use crate::drivers::button::ButtonEvent;
use crate::operation::{Operation, TaskRecord};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service finished its boot sequence.
    Started,

    /// A debounced, classified button press.
    ButtonPressed(ButtonEvent),

    /// An operation entered the pending queue.
    OperationQueued(Operation),

    /// The drain loop handed an operation to the engine.
    OperationStarted(Operation),

    /// Cancellation was requested for the running operation.
    CancelRequested(Operation),

    /// An operation terminated (completed or cancelled).
    OperationFinished(TaskRecord),

    /// A long press stored a new default filter duration.
    FilterRecalibrated { filter_secs: u32 },
}
