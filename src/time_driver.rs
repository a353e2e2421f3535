//! `embassy-time` driver symbols.
//!
//! `async_io_mini::Timer` (behind [`SystemClock`](crate::adapters::time::SystemClock))
//! sits on `embassy-time`, which expects the final binary to export a
//! time driver.  One tick is one microsecond, the `embassy-time` default.
//!
//! ```text
//!   SystemClock::sleep ──▶ async_io_mini::Timer ──▶ embassy_time::Timer
//!                                                      │
//!                         _embassy_time_now ◀──────────┤
//!                         _embassy_time_schedule_wake ◀┘
//! ```
//!
//! - ESP-IDF: ticks come from `esp_timer_get_time()`.
//! - Host: ticks are measured from the first call with `Instant`.
//!
//! Wakes are served by a short-lived sleeper thread per registration.
//! The executor only ever has a handful of timers in flight, so no queue
//! is kept.

use core::task::Waker;
use core::time::Duration;

/// Current tick count.
#[cfg(feature = "espidf")]
pub fn now_ticks() -> u64 {
    // SAFETY: esp_timer_get_time has no preconditions once the IDF is up.
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
}

/// Current tick count.
#[cfg(not(feature = "espidf"))]
pub fn now_ticks() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_micros() as u64
}

/// Wake `waker` once the tick count reaches `at`.
pub fn schedule_wake(at: u64, waker: &Waker) {
    let sleeper = waker.clone();
    let spawned = std::thread::Builder::new()
        .name("time-wake".into())
        .spawn(move || {
            let now = now_ticks();
            if at > now {
                std::thread::sleep(Duration::from_micros(at - now));
            }
            sleeper.wake();
        });
    if let Err(e) = spawned {
        // The timer re-registers when polled again.
        log::error!("TimeDriver: wake thread spawn failed ({}), waking early", e);
        waker.wake_by_ref();
    }
}

// ── Exported symbols ──────────────────────────────────────────

#[unsafe(no_mangle)]
fn _embassy_time_now() -> u64 {
    now_ticks()
}

#[unsafe(no_mangle)]
fn _embassy_time_schedule_wake(at: u64, waker: &Waker) {
    schedule_wake(at, waker);
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
