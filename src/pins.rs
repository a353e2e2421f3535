//! GPIO assignments for the controller board.
//!
//! Single source of truth: every driver is constructed from these numbers
//! in `main`, never from literals.

// ---------------------------------------------------------------------------
// Valve relays (active-low: LOW = valve open)
// ---------------------------------------------------------------------------

/// Valve 1: membrane inlet.  Open in every working mode.
pub const VALVE1_GPIO: i32 = 0;
/// Valve 2: flush drain.
pub const VALVE2_GPIO: i32 = 1;
/// Valve 3: disposal drain.
pub const VALVE3_GPIO: i32 = 2;
/// Valve 4: product water outlet.
pub const VALVE4_GPIO: i32 = 3;

/// Valve relays in driver order (V1..V4).
pub const VALVE_GPIOS: [i32; 4] = [VALVE1_GPIO, VALVE2_GPIO, VALVE3_GPIO, VALVE4_GPIO];

// ---------------------------------------------------------------------------
// Operator interface
// ---------------------------------------------------------------------------

/// Piezo buzzer (active HIGH).
pub const BUZZER_GPIO: i32 = 15;

/// Momentary push-button, active-low with internal pull-up.
pub const BUTTON_GPIO: i32 = 16;
