//! GPIO drivers for the valve bank, the button and the buzzer.

pub mod button;
pub mod buzzer;
pub mod sim_pin;
pub mod valves;
