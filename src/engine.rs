//! Operation engine: runs one flush or filter procedure end to end.
//!
//! ```text
//!  flush / auto-flush:  Flush ──(flush_secs)──▶ Disposal ──(disposal_secs)──▶ Closed ─▶ short beep
//!  filter:              Filter ──(duration)─────────────────────────────────▶ Closed ─▶ 3 beeps*
//!
//!                                                  * only if the filter ran to its end
//! ```
//!
//! Every hold races its timer against the [`CancelToken`].  A cancel ends
//! the current hold immediately and skips the remaining phases, but the
//! cleanup still runs: valves are always closed before the operation is
//! reported finished.
//!
//! Valve access goes through a [`ValveLease`].  Only one lease can exist
//! at a time; dropping it closes every valve, so a procedure that is
//! abandoned mid-flight cannot leave water running.

use core::cell::{Cell, RefCell};
use core::time::Duration;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::signal::Signal;
use log::{debug, error, info};

use crate::app::ports::{BuzzerPort, Clock, ValveMode, ValvePort};
use crate::config::SystemConfig;
use crate::drivers::buzzer::{self, Melody};
use crate::error::EngineError;
use crate::operation::{Operation, OperationId, OperationKind, Outcome};

// ───────────────────────────────────────────────────────────────
// Cancellation
// ───────────────────────────────────────────────────────────────

/// Single-shot cancellation flag shared by the button task and the engine.
///
/// Observed only at hold boundaries.  The drain loop resets it before each
/// operation so a request aimed at a finished operation cannot leak into
/// the next one.
pub struct CancelToken {
    signal: Signal<NoopRawMutex, ()>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
        }
    }

    /// Request cancellation of the running operation.
    pub fn cancel(&self) {
        self.signal.signal(());
    }

    pub fn reset(&self) {
        self.signal.reset();
    }

    pub fn is_requested(&self) -> bool {
        self.signal.signaled()
    }

    /// Resolves once cancellation is requested, consuming the request.
    pub async fn requested(&self) {
        self.signal.wait().await;
    }
}

// ───────────────────────────────────────────────────────────────
// Valve lease
// ───────────────────────────────────────────────────────────────

/// Exclusive right to drive the valves for one operation.
pub struct ValveLease<'a, V: ValvePort> {
    valves: &'a RefCell<V>,
    owner: &'a Cell<Option<OperationId>>,
    id: OperationId,
}

impl<'a, V: ValvePort> ValveLease<'a, V> {
    /// Take the valves for `id`, or report who already holds them.
    pub fn acquire(
        valves: &'a RefCell<V>,
        owner: &'a Cell<Option<OperationId>>,
        id: OperationId,
    ) -> Result<Self, EngineError> {
        if let Some(holder) = owner.get() {
            return Err(EngineError::ValvesBusy { holder });
        }
        owner.set(Some(id));
        debug!("Engine: valve lease taken by {}", id);
        Ok(Self { valves, owner, id })
    }

    pub fn set(&self, mode: ValveMode) {
        self.valves.borrow_mut().set_mode(mode);
    }
}

impl<V: ValvePort> Drop for ValveLease<'_, V> {
    fn drop(&mut self) {
        match self.valves.try_borrow_mut() {
            Ok(mut valves) => valves.set_mode(ValveMode::Closed),
            Err(_) => error!("Engine: valves busy on release of {}, could not close", self.id),
        }
        self.owner.set(None);
        debug!("Engine: valve lease released by {}", self.id);
    }
}

// ───────────────────────────────────────────────────────────────
// Engine
// ───────────────────────────────────────────────────────────────

/// Executes operations against the shared hardware.
///
/// Borrowed views only: the service owns the hardware, the clock, the
/// cancel token and the lease slot, and builds an engine per operation.
pub struct OperationEngine<'a, H, C> {
    hw: &'a RefCell<H>,
    clock: &'a C,
    cancel: &'a CancelToken,
    owner: &'a Cell<Option<OperationId>>,
}

impl<'a, H, C> OperationEngine<'a, H, C>
where
    H: ValvePort + BuzzerPort,
    C: Clock,
{
    pub fn new(
        hw: &'a RefCell<H>,
        clock: &'a C,
        cancel: &'a CancelToken,
        owner: &'a Cell<Option<OperationId>>,
    ) -> Self {
        Self {
            hw,
            clock,
            cancel,
            owner,
        }
    }

    /// Run `op` with the durations from `cfg`.
    pub async fn run(&self, op: &Operation, cfg: &SystemConfig) -> Result<Outcome, EngineError> {
        match op.kind {
            OperationKind::Flush | OperationKind::AutoFlush => {
                self.flush(op.id, cfg.flush_secs, cfg.disposal_secs).await
            }
            OperationKind::Filter => {
                self.filter(op.id, op.duration_secs.unwrap_or(cfg.filter_secs))
                    .await
            }
        }
    }

    /// Rinse the membrane, then discard the first permeate.
    ///
    /// The acknowledgement beep plays whether or not the flush completed.
    pub async fn flush(
        &self,
        id: OperationId,
        flush_secs: u32,
        disposal_secs: u32,
    ) -> Result<Outcome, EngineError> {
        let lease = ValveLease::acquire(self.hw, self.owner, id)?;

        info!("Engine: {} flushing membrane for {}s", id, flush_secs);
        lease.set(ValveMode::Flush);
        let mut outcome = self.hold(flush_secs).await;

        if outcome == Outcome::Completed {
            info!("Engine: {} discarding first water for {}s", id, disposal_secs);
            lease.set(ValveMode::Disposal);
            outcome = self.hold(disposal_secs).await;
        }

        drop(lease);
        buzzer::play(self.hw, self.clock, Melody::Short).await;
        Ok(outcome)
    }

    /// Produce water for `duration_secs`.
    ///
    /// Valves close before the completion melody starts.
    pub async fn filter(&self, id: OperationId, duration_secs: u32) -> Result<Outcome, EngineError> {
        let lease = ValveLease::acquire(self.hw, self.owner, id)?;

        info!("Engine: {} filtering for {}s", id, duration_secs);
        lease.set(ValveMode::Filter);
        let outcome = self.hold(duration_secs).await;
        drop(lease);

        if outcome == Outcome::Completed {
            info!("Engine: {} filtration finished", id);
            buzzer::play(self.hw, self.clock, Melody::Finished).await;
        }
        Ok(outcome)
    }

    /// Keep the current valve program for `secs`, or until cancelled.
    async fn hold(&self, secs: u32) -> Outcome {
        if self.cancel.is_requested() {
            self.cancel.reset();
            return Outcome::Cancelled;
        }
        futures_lite::future::or(
            async {
                self.cancel.requested().await;
                Outcome::Cancelled
            },
            async {
                self.clock.sleep(Duration::from_secs(u64::from(secs))).await;
                Outcome::Completed
            },
        )
        .await
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
