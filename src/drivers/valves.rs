//! Four-valve solenoid bank driver.
//!
//! ## Wiring
//!
//! Each valve sits behind an active-low relay: driving the GPIO LOW opens
//! the valve, HIGH closes it.  With all four GPIOs HIGH the water path is
//! shut.
//!
//! | Mode     | V1 | V2 | V3 | V4 |
//! |----------|----|----|----|----|
//! | Closed   | –  | –  | –  | –  |
//! | Flush    | ●  | ●  | –  | –  |
//! | Disposal | ●  | –  | ●  | –  |
//! | Filter   | ●  | –  | –  | ●  |
//!
//! ## Safety contract
//!
//! The bank must end every operation in `Closed`.  That is enforced by
//! the engine's valve lease; this driver is a dumb actuator.

use embedded_hal::digital::{OutputPin, PinState};
use log::warn;

use crate::app::ports::{ValveMode, ValvePort};

pub struct ValveDriver<P> {
    pins: [P; 4],
    mode: ValveMode,
}

impl<P: OutputPin> ValveDriver<P> {
    /// Take ownership of the four valve pins and close every valve.
    pub fn new(pins: [P; 4]) -> Self {
        let mut driver = Self {
            pins,
            mode: ValveMode::Closed,
        };
        driver.apply(ValveMode::Closed);
        driver
    }

    /// Last mode written to the bank.
    pub fn mode(&self) -> ValveMode {
        self.mode
    }

    fn apply(&mut self, mode: ValveMode) {
        for (idx, (pin, open)) in self.pins.iter_mut().zip(mode.lines()).enumerate() {
            // Active-low relay: open valve = LOW.
            let level = PinState::from(!open);
            if let Err(e) = pin.set_state(level) {
                warn!("Valve {}: GPIO write failed ({:?})", idx + 1, e);
            }
        }
        self.mode = mode;
    }
}

impl<P: OutputPin> ValvePort for ValveDriver<P> {
    fn set_mode(&mut self, mode: ValveMode) {
        self.apply(mode);
    }
}
