//! Mock hardware adapter for integration tests.
//!
//! Records every valve program and buzzer edge against the shared
//! [`SimClock`], and plays back scripted button presses, so tests can
//! assert on the full timeline without touching real GPIO.

use std::cell::RefCell;
use std::rc::Rc;

use osmoflow::adapters::config_store::MemoryConfigStore;
use osmoflow::adapters::time::SimClock;
use osmoflow::app::events::AppEvent;
use osmoflow::app::ports::{
    ButtonPort, BuzzerPort, Clock, ConfigError, ConfigPort, EventSink, ValveMode, ValvePort,
};
use osmoflow::config::SystemConfig;

// ── Timeline ──────────────────────────────────────────────────

#[derive(Default)]
struct Timeline {
    valves: Vec<(u64, ValveMode)>,
    beeps: Vec<u64>,
    /// Scripted presses as `[down_ms, up_ms)` windows.
    presses: Vec<(u64, u64)>,
}

// ── MockHardware ──────────────────────────────────────────────

/// Clones share one timeline: the service owns one, the test keeps another.
#[derive(Clone)]
pub struct MockHardware {
    clock: SimClock,
    timeline: Rc<RefCell<Timeline>>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new(clock: &SimClock) -> Self {
        Self {
            clock: clock.clone(),
            timeline: Rc::default(),
        }
    }

    /// Hold the button down from `at_ms` for `hold_ms`.
    pub fn press(&self, at_ms: u64, hold_ms: u64) {
        self.timeline.borrow_mut().presses.push((at_ms, at_ms + hold_ms));
    }

    /// Current valve program (`Closed` before anything was written).
    pub fn valve_mode(&self) -> ValveMode {
        self.timeline
            .borrow()
            .valves
            .last()
            .map_or(ValveMode::Closed, |(_, m)| *m)
    }

    /// Every valve write with its timestamp.
    pub fn valve_log(&self) -> Vec<(u64, ValveMode)> {
        self.timeline.borrow().valves.clone()
    }

    /// Valve programs in write order.
    pub fn valve_modes(&self) -> Vec<ValveMode> {
        self.timeline.borrow().valves.iter().map(|(_, m)| *m).collect()
    }

    /// Timestamps at which the buzzer switched on.
    pub fn beep_starts(&self) -> Vec<u64> {
        self.timeline.borrow().beeps.clone()
    }
}

impl ValvePort for MockHardware {
    fn set_mode(&mut self, mode: ValveMode) {
        let now = self.clock.now_ms();
        self.timeline.borrow_mut().valves.push((now, mode));
    }
}

impl ButtonPort for MockHardware {
    fn is_pressed(&mut self) -> bool {
        let now = self.clock.now_ms();
        self.timeline
            .borrow()
            .presses
            .iter()
            .any(|&(down, up)| (down..up).contains(&now))
    }
}

impl BuzzerPort for MockHardware {
    fn set_buzzer(&mut self, on: bool) {
        if on {
            let now = self.clock.now_ms();
            self.timeline.borrow_mut().beeps.push(now);
        }
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Event sink that keeps every event together with the valve program
/// active when it was emitted.
#[derive(Clone)]
pub struct RecordingSink {
    hw: MockHardware,
    events: Rc<RefCell<Vec<(AppEvent, ValveMode)>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new(hw: &MockHardware) -> Self {
        Self {
            hw: hw.clone(),
            events: Rc::default(),
        }
    }

    pub fn events(&self) -> Vec<AppEvent> {
        self.events.borrow().iter().map(|(e, _)| e.clone()).collect()
    }

    /// Events paired with the valve program at emission time.
    pub fn with_valves(&self) -> Vec<(AppEvent, ValveMode)> {
        self.events.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|(e, _)| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        let mode = self.hw.valve_mode();
        self.events.borrow_mut().push((event.clone(), mode));
    }
}

// ── SharedStore ───────────────────────────────────────────────

/// Config store the test can inspect after handing it to the service.
#[derive(Clone, Default)]
pub struct SharedStore(pub Rc<MemoryConfigStore>);

impl ConfigPort for SharedStore {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        self.0.load()
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        self.0.save(config)
    }
}
