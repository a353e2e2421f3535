//! Polled push-button driver with debounce and short/long classification.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The button watcher samples
//! the line every `button_poll_ms` (20 ms) and feeds each sample into a
//! [`PressClassifier`]; the sampling tick bounds both input latency and
//! debounce accuracy.
//!
//! ## Gesture detection
//!
//! | Gesture     | Condition (press → release)   | Event        |
//! |-------------|-------------------------------|--------------|
//! | Noise       | duration ≤ 50 ms              | —            |
//! | Short press | 50 ms < duration ≤ 1500 ms    | `ShortPress` |
//! | Long press  | duration > 1500 ms            | `LongPress`  |
//!
//! Events fire on release, never while the button is still held.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::app::ports::ButtonPort;

/// Button events emitted after gesture classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    ShortPress,
    LongPress,
}

/// Classify a completed press by its duration.
///
/// Both comparisons are strict at the upper edge of their band:
/// `debounce_ms` itself is noise and `long_press_ms` itself is short.
pub fn classify(duration_ms: u64, debounce_ms: u32, long_press_ms: u32) -> Option<ButtonEvent> {
    if duration_ms <= u64::from(debounce_ms) {
        None
    } else if duration_ms > u64::from(long_press_ms) {
        Some(ButtonEvent::LongPress)
    } else {
        Some(ButtonEvent::ShortPress)
    }
}

/// Internal state machine for gesture detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PressState {
    Idle,
    Pressed { since_ms: u64 },
}

/// `Idle → Pressed → (release) classify → Idle`.
pub struct PressClassifier {
    state: PressState,
    debounce_ms: u32,
    long_press_ms: u32,
}

impl PressClassifier {
    pub fn new(debounce_ms: u32, long_press_ms: u32) -> Self {
        Self {
            state: PressState::Idle,
            debounce_ms,
            long_press_ms,
        }
    }

    /// Feed one raw sample taken at `now_ms`.
    /// Returns a classified gesture on release, if any.
    pub fn sample(&mut self, pressed: bool, now_ms: u64) -> Option<ButtonEvent> {
        match self.state {
            PressState::Idle => {
                if pressed {
                    self.state = PressState::Pressed { since_ms: now_ms };
                }
                None
            }

            PressState::Pressed { since_ms } => {
                if pressed {
                    return None;
                }
                self.state = PressState::Idle;
                classify(
                    now_ms.saturating_sub(since_ms),
                    self.debounce_ms,
                    self.long_press_ms,
                )
            }
        }
    }

    /// Whether a press is currently being timed.
    pub fn is_pressed(&self) -> bool {
        matches!(self.state, PressState::Pressed { .. })
    }
}

/// Active-low button on any `embedded-hal` input pin.
pub struct ButtonInput<P> {
    pin: P,
}

impl<P: InputPin> ButtonInput<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: InputPin> ButtonPort for ButtonInput<P> {
    fn is_pressed(&mut self) -> bool {
        match self.pin.is_low() {
            Ok(low) => low,
            Err(e) => {
                warn!("Button: GPIO read failed ({:?}), treating as released", e);
                false
            }
        }
    }
}
