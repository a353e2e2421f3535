//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the task scheduler, the live configuration and the
//! hardware behind port traits.  Three cooperative loops share it:
//!
//! ```text
//!   ButtonPort ──▶ button_loop ──┐                ┌──▶ drain_loop ──▶ OperationEngine ──▶ ValvePort
//!                                ├─▶ policy ──▶ apply ─┤                                     BuzzerPort
//!   Clock ──────▶ idle_loop ─────┘    (commands)   └──▶ EventSink / ConfigPort
//! ```
//!
//! All loops run on one thread.  Shared state lives in `RefCell`s and no
//! borrow is held across an await point, so the loops interleave only at
//! their sleeps and signal waits.

use core::cell::{Cell, Ref, RefCell};
use core::time::Duration;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::signal::Signal;
use log::{error, info, warn};

use crate::config::SystemConfig;
use crate::drivers::button::{ButtonEvent, PressClassifier};
use crate::drivers::buzzer::{self, Melody};
use crate::engine::{CancelToken, OperationEngine};
use crate::error::Result;
use crate::operation::{OperationId, OperationKind};
use crate::policy;
use crate::scheduler::TaskScheduler;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{ButtonPort, BuzzerPort, Clock, ConfigPort, EventSink, ValveMode, ValvePort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService<H, S, E, C> {
    hw: RefCell<H>,
    store: S,
    sink: RefCell<E>,
    clock: C,
    config: RefCell<SystemConfig>,
    scheduler: RefCell<TaskScheduler>,
    /// Raised whenever something is queued; wakes the drain loop.
    work: Signal<NoopRawMutex, ()>,
    cancel: CancelToken,
    valve_owner: Cell<Option<OperationId>>,
}

impl<H, S, E, C> AppService<H, S, E, C>
where
    H: ValvePort + ButtonPort + BuzzerPort,
    S: ConfigPort,
    E: EventSink,
    C: Clock,
{
    /// Construct the service.  Idle time is measured from now.
    ///
    /// Does **not** touch the hardware; call [`start`](Self::start) or
    /// [`run`](Self::run) next.
    pub fn new(config: SystemConfig, hw: H, store: S, sink: E, clock: C) -> Self {
        let scheduler = TaskScheduler::new(clock.now_ms());
        Self {
            hw: RefCell::new(hw),
            store,
            sink: RefCell::new(sink),
            clock,
            config: RefCell::new(config),
            scheduler: RefCell::new(scheduler),
            work: Signal::new(),
            cancel: CancelToken::new(),
            valve_owner: Cell::new(None),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Boot sequence: close every valve, then play the greeting.
    pub async fn start(&self) {
        self.hw.borrow_mut().set_mode(ValveMode::Closed);
        buzzer::play(&self.hw, &self.clock, Melody::Greeting).await;
        self.emit(AppEvent::Started);
        info!("AppService started");
    }

    /// Boot, then run all loops forever.
    pub async fn run(&self) {
        self.start().await;
        futures_lite::future::or(
            self.drain_loop(),
            futures_lite::future::or(self.button_loop(), self.idle_loop()),
        )
        .await;
    }

    // ── Loops ─────────────────────────────────────────────────

    /// Executes queued operations one at a time, in FIFO order.
    pub async fn drain_loop(&self) {
        loop {
            let next = self.scheduler.borrow_mut().begin_next(self.clock.now_ms());
            let Some(op) = next else {
                self.work.wait().await;
                continue;
            };

            // A request aimed at the previous operation must not stop this one.
            self.cancel.reset();
            self.emit(AppEvent::OperationStarted(op));

            let cfg = self.config.borrow().clone();
            let engine = OperationEngine::new(&self.hw, &self.clock, &self.cancel, &self.valve_owner);
            match engine.run(&op, &cfg).await {
                Ok(outcome) => {
                    let record = self.scheduler.borrow_mut().finish(outcome, self.clock.now_ms());
                    if let Some(record) = record {
                        self.emit(AppEvent::OperationFinished(record));
                    }
                }
                Err(e) => {
                    // The valves were never touched: free the slot, keep the timers.
                    error!("AppService: {} {} not run: {}", op.kind, op.id, e);
                    self.scheduler.borrow_mut().abandon();
                }
            }
        }
    }

    /// Samples the button and turns completed presses into commands.
    pub async fn button_loop(&self) {
        let (poll_ms, debounce_ms, long_press_ms) = {
            let cfg = self.config.borrow();
            (cfg.button_poll_ms, cfg.debounce_ms, cfg.long_press_ms)
        };
        let mut classifier = PressClassifier::new(debounce_ms, long_press_ms);
        loop {
            self.clock.sleep(Duration::from_millis(u64::from(poll_ms))).await;
            let pressed = self.hw.borrow_mut().is_pressed();
            if let Some(event) = classifier.sample(pressed, self.clock.now_ms()) {
                self.handle_button(event).await;
            }
        }
    }

    /// Queues an auto-flush once the appliance has been idle long enough.
    pub async fn idle_loop(&self) {
        loop {
            let period_ms = self.config.borrow().idle_check_ms;
            self.clock.sleep(Duration::from_millis(u64::from(period_ms))).await;
            let due = policy::auto_flush_due(
                &self.scheduler.borrow(),
                self.clock.now_ms(),
                &self.config.borrow(),
            );
            if due {
                info!("AppService: appliance idle, scheduling auto-flush");
                self.apply(&[AppCommand::Enqueue {
                    kind: OperationKind::AutoFlush,
                    duration_secs: None,
                }]);
            }
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Acknowledge a classified press, then act on it.
    pub async fn handle_button(&self, event: ButtonEvent) {
        self.emit(AppEvent::ButtonPressed(event));
        let melody = match event {
            ButtonEvent::ShortPress => Melody::Short,
            ButtonEvent::LongPress => Melody::Long,
        };
        buzzer::play(&self.hw, &self.clock, melody).await;

        let cmds = policy::on_button(
            event,
            &self.scheduler.borrow(),
            self.clock.now_ms(),
            &self.config.borrow(),
        );
        self.apply(&cmds);
    }

    /// Apply commands in order.  A failing command is logged and skipped.
    pub fn apply(&self, cmds: &[AppCommand]) {
        for &cmd in cmds {
            if let Err(e) = self.apply_one(cmd) {
                warn!("AppService: {:?} failed: {}", cmd, e);
            }
        }
    }

    fn apply_one(&self, cmd: AppCommand) -> Result<()> {
        match cmd {
            AppCommand::Enqueue {
                kind,
                duration_secs,
            } => {
                let op = self.scheduler.borrow_mut().enqueue(kind, duration_secs)?;
                self.emit(AppEvent::OperationQueued(op));
                self.work.signal(());
            }
            AppCommand::CancelCurrent => {
                let running = self.scheduler.borrow().cancel_current();
                if let Some(op) = running {
                    self.cancel.cancel();
                    self.emit(AppEvent::CancelRequested(op));
                }
            }
            AppCommand::SaveFilterDuration(filter_secs) => {
                let updated = {
                    let mut cfg = self.config.borrow_mut();
                    cfg.filter_secs = filter_secs;
                    cfg.clone()
                };
                self.emit(AppEvent::FilterRecalibrated { filter_secs });
                self.store.save(&updated)?;
                info!("AppService: filter duration saved ({}s)", filter_secs);
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Read-only view of the scheduler.  Do not hold across an await.
    pub fn scheduler(&self) -> Ref<'_, TaskScheduler> {
        self.scheduler.borrow()
    }

    /// Clone of the live configuration.
    pub fn config(&self) -> SystemConfig {
        self.config.borrow().clone()
    }

    /// Operation currently holding the valves, if any.
    pub fn valve_owner(&self) -> Option<OperationId> {
        self.valve_owner.get()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ── Internal ──────────────────────────────────────────────

    fn emit(&self, event: AppEvent) {
        self.sink.borrow_mut().emit(&event);
    }
}
