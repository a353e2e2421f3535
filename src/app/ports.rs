//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (valves, button, buzzer, clock, config store, event
//! sinks) implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches GPIO
//! directly.
//!
//! All ports are single-threaded: the service keeps them in `RefCell`s and
//! never holds a borrow across an await point.

use core::future::Future;
use core::time::Duration;

use crate::config::SystemConfig;

// ───────────────────────────────────────────────────────────────
// Valve port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// The four named valve programs.  Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValveMode {
    /// Every valve closed, the safe resting state.
    Closed,
    /// Rinse the membrane.
    Flush,
    /// Discard the first filtered water.
    Disposal,
    /// Produce treated water.
    Filter,
}

impl ValveMode {
    /// Logical open/closed state of valves 1–4 for this mode
    /// (`true` = open).
    pub const fn lines(self) -> [bool; 4] {
        match self {
            Self::Closed => [false, false, false, false],
            Self::Flush => [true, true, false, false],
            Self::Disposal => [true, false, true, false],
            Self::Filter => [true, false, false, true],
        }
    }
}

/// Write-side port: the engine calls this to switch valve programs.
pub trait ValvePort {
    /// Drive all four valve lines to the pattern for `mode`.
    /// Writes are fire-and-forget; there is no acknowledgement channel.
    fn set_mode(&mut self, mode: ValveMode);
}

// ───────────────────────────────────────────────────────────────
// Button port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the single momentary push-button.
pub trait ButtonPort {
    /// Raw sample: `true` while the button is held down.  Polled, not
    /// interrupt-driven.
    fn is_pressed(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Buzzer port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Audible feedback line.  Melodies are sequenced by
/// [`drivers::buzzer`](crate::drivers::buzzer) on top of this.
pub trait BuzzerPort {
    fn set_buzzer(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Clock port (time source + cooperative sleep)
// ───────────────────────────────────────────────────────────────

/// Monotonic time and cooperative suspension.
///
/// Every suspension point in the firmware goes through [`Clock::sleep`],
/// which lets host tests substitute a virtual clock.
pub trait Clock {
    /// Milliseconds since boot (monotonic).
    fn now_ms(&self) -> u64;

    /// Suspend the calling task for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting: a rejected value is
/// reported as [`ConfigError::ValidationFailed`], never silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
