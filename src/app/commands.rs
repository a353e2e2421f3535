//! Intents produced by the maintenance policy.
//!
//! The [`policy`](crate::policy) never touches the scheduler or the
//! hardware; it returns these commands and the
//! [`AppService`](super::service::AppService) applies them in order.

use crate::operation::OperationKind;

/// Commands the maintenance policy hands to the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Append an operation to the scheduler queue.
    Enqueue {
        kind: OperationKind,
        /// Filter duration override in seconds.
        duration_secs: Option<u32>,
    },

    /// Cancel whatever operation is running.
    CancelCurrent,

    /// Store a new default filter duration (long-press recalibration).
    SaveFilterDuration(u32),
}

/// Upper bound on commands produced by a single policy decision.
pub const MAX_COMMANDS: usize = 4;

/// Fixed-capacity command list returned by the policy.
pub type Commands = heapless::Vec<AppCommand, MAX_COMMANDS>;
