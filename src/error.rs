//! Unified error types for the osmoflow firmware.
//!
//! A single `Error` enum that every subsystem converts into.  Cancellation
//! is deliberately absent: a cancelled operation ends with
//! [`Outcome::Cancelled`](crate::operation::Outcome), not an error.

use core::fmt;

use crate::app::ports::ConfigError;
use crate::operation::OperationId;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug)]
pub enum Error {
    /// The task scheduler refused a request.
    Scheduler(SchedulerError),
    /// The operation engine could not run an operation.
    Engine(EngineError),
    /// Configuration is invalid or could not be loaded/saved.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduler(e) => write!(f, "scheduler: {e}"),
            Self::Engine(e) => write!(f, "engine: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Scheduler errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// The pending queue is at capacity; the request was dropped.
    QueueFull,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "pending queue full"),
        }
    }
}

impl From<SchedulerError> for Error {
    fn from(e: SchedulerError) -> Self {
        Self::Scheduler(e)
    }
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// Another operation still holds the valve lease.
    ValvesBusy { holder: OperationId },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValvesBusy { holder } => write!(f, "valves held by operation {holder}"),
        }
    }
}

impl From<EngineError> for Error {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
