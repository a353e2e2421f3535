//! Piezo buzzer driver and melody sequencer.
//!
//! Melodies are fixed on/off step tables played with cooperative sleeps,
//! so the other tasks keep running while a melody plays.  Playback is
//! fire-and-wait: [`play`] returns once the buzzer is silent again.
//!
//! | Melody   | Steps (ms)                         | Used for              |
//! |----------|------------------------------------|-----------------------|
//! | Short    | ON 200                             | short press, flush ack|
//! | Long     | ON 500                             | long press            |
//! | Greeting | ON 100, OFF 100, ON 500            | boot                  |
//! | Finished | 3 × ON 400 separated by OFF 200    | filter completed      |

use core::cell::RefCell;
use core::time::Duration;

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::{BuzzerPort, Clock};

/// One segment of a melody: buzzer level and how long to hold it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub on: bool,
    pub ms: u16,
}

const fn on(ms: u16) -> Step {
    Step { on: true, ms }
}

const fn off(ms: u16) -> Step {
    Step { on: false, ms }
}

const SHORT: &[Step] = &[on(200)];
const LONG: &[Step] = &[on(500)];
const GREETING: &[Step] = &[on(100), off(100), on(500)];
const FINISHED: &[Step] = &[on(400), off(200), on(400), off(200), on(400)];

/// Melody identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Melody {
    Short,
    Long,
    Greeting,
    Finished,
}

impl Melody {
    pub const fn steps(self) -> &'static [Step] {
        match self {
            Self::Short => SHORT,
            Self::Long => LONG,
            Self::Greeting => GREETING,
            Self::Finished => FINISHED,
        }
    }

    /// Total playback time in milliseconds.
    pub fn duration_ms(self) -> u64 {
        self.steps().iter().map(|s| u64::from(s.ms)).sum()
    }
}

/// Play `melody` on the buzzer behind `hw`, leaving it silent afterwards.
pub async fn play<H: BuzzerPort, C: Clock>(hw: &RefCell<H>, clock: &C, melody: Melody) {
    for step in melody.steps() {
        hw.borrow_mut().set_buzzer(step.on);
        clock.sleep(Duration::from_millis(u64::from(step.ms))).await;
    }
    hw.borrow_mut().set_buzzer(false);
}

/// Active-high piezo buzzer on any `embedded-hal` output pin.
pub struct Buzzer<P> {
    pin: P,
}

impl<P: OutputPin> Buzzer<P> {
    pub fn new(mut pin: P) -> Self {
        if let Err(e) = pin.set_low() {
            warn!("Buzzer: GPIO init failed ({:?})", e);
        }
        Self { pin }
    }
}

impl<P: OutputPin> BuzzerPort for Buzzer<P> {
    fn set_buzzer(&mut self, on: bool) {
        let res = if on { self.pin.set_high() } else { self.pin.set_low() };
        if let Err(e) = res {
            warn!("Buzzer: GPIO write failed ({:?})", e);
        }
    }
}
