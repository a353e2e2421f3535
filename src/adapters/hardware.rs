//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the valve bank, the button and the buzzer, exposing them through
//! [`ValvePort`], [`ButtonPort`] and [`BuzzerPort`].  This is the only
//! module in the system that owns GPIO.  Generic over the pin types so
//! the same adapter runs on `esp-idf-hal` pins and on host
//! [`SimPin`](crate::drivers::sim_pin::SimPin)s.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{ButtonPort, BuzzerPort, ValveMode, ValvePort};
use crate::drivers::button::ButtonInput;
use crate::drivers::buzzer::Buzzer;
use crate::drivers::valves::ValveDriver;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<V, B, Z> {
    valves: ValveDriver<V>,
    button: ButtonInput<B>,
    buzzer: Buzzer<Z>,
}

impl<V, B, Z> HardwareAdapter<V, B, Z>
where
    V: OutputPin,
    B: InputPin,
    Z: OutputPin,
{
    pub fn new(valves: ValveDriver<V>, button: ButtonInput<B>, buzzer: Buzzer<Z>) -> Self {
        Self {
            valves,
            button,
            buzzer,
        }
    }

    /// Last valve program written.
    pub fn valve_mode(&self) -> ValveMode {
        self.valves.mode()
    }
}

// ── ValvePort implementation ──────────────────────────────────

impl<V: OutputPin, B, Z> ValvePort for HardwareAdapter<V, B, Z> {
    fn set_mode(&mut self, mode: ValveMode) {
        self.valves.set_mode(mode);
    }
}

// ── ButtonPort implementation ─────────────────────────────────

impl<V, B: InputPin, Z> ButtonPort for HardwareAdapter<V, B, Z> {
    fn is_pressed(&mut self) -> bool {
        self.button.is_pressed()
    }
}

// ── BuzzerPort implementation ─────────────────────────────────

impl<V, B, Z: OutputPin> BuzzerPort for HardwareAdapter<V, B, Z> {
    fn set_buzzer(&mut self, on: bool) {
        self.buzzer.set_buzzer(on);
    }
}
