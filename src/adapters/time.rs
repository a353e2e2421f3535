//! Clock adapters.
//!
//! - [`SystemClock`]: production clock.  Monotonic time comes from
//!   `esp_timer_get_time()` on ESP-IDF and `std::time::Instant` on the
//!   host; sleeps are `async-io-mini` timers driven by
//!   [`time_driver`](crate::time_driver).
//! - [`SimClock`]: virtual clock for host simulation and tests.  Time
//!   only moves when [`SimClock::run_until`] advances it, which makes
//!   multi-hour appliance scenarios run deterministically in milliseconds.

use core::cell::Cell;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use core::time::Duration;
use std::rc::Rc;

use crate::app::ports::Clock;
use crate::time_driver;

// ───────────────────────────────────────────────────────────────
// SystemClock
// ───────────────────────────────────────────────────────────────

/// Time adapter backed by the platform's monotonic timer.
///
/// Reads the same tick source as the `embassy-time` driver in
/// [`time_driver`](crate::time_driver), so `now_ms` and timer deadlines
/// agree.
#[derive(Debug, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        // Pins the host epoch to boot.
        let _ = time_driver::now_ticks();
        Self
    }
}

impl Clock for SystemClock {
    /// Milliseconds since boot (monotonic).
    fn now_ms(&self) -> u64 {
        time_driver::now_ticks() / 1000
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        async move {
            async_io_mini::Timer::after(duration).await;
        }
    }
}

// ───────────────────────────────────────────────────────────────
// SimClock
// ───────────────────────────────────────────────────────────────

/// Poll rounds granted to the tasks between two time jumps, so that
/// chains of signal hand-offs settle before the clock moves on.
const SETTLE_POLLS: usize = 4;

#[derive(Debug, Default)]
struct SimState {
    now_ms: Cell<u64>,
    /// Earliest deadline of any sleep polled since the last jump.
    next_deadline: Cell<Option<u64>>,
}

impl SimState {
    fn note_deadline(&self, deadline: u64) {
        let next = match self.next_deadline.get() {
            Some(d) => d.min(deadline),
            None => deadline,
        };
        self.next_deadline.set(Some(next));
    }
}

/// Deterministic virtual clock.  Clones share the same time.
///
/// Sleeps created by this clock do not register wakers: they must be
/// driven by [`SimClock::run_until`], which re-polls every task after
/// each time jump.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    state: Rc<SimState>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump the clock forward without polling anything.
    pub fn advance(&self, duration: Duration) {
        let now = self.state.now_ms.get();
        self.state.now_ms.set(now + duration.as_millis() as u64);
    }

    /// Poll `app` while advancing virtual time up to `until_ms`.
    ///
    /// Time jumps straight to the earliest pending sleep deadline, so idle
    /// stretches cost nothing.  Returns `Some(output)` if `app` finished
    /// first.  `app` stays valid afterwards and can be resumed by a later
    /// call.
    pub fn run_until<F: Future>(&self, app: Pin<&mut F>, until_ms: u64) -> Option<F::Output> {
        futures_lite::future::block_on(futures_lite::future::or(
            async { Some(app.await) },
            async {
                self.advance_until(until_ms).await;
                None
            },
        ))
    }

    async fn advance_until(&self, until_ms: u64) {
        loop {
            for _ in 0..SETTLE_POLLS {
                futures_lite::future::yield_now().await;
            }
            let now = self.state.now_ms.get();
            if now >= until_ms {
                return;
            }
            let next = self
                .state
                .next_deadline
                .take()
                .map_or(until_ms, |d| d.min(until_ms));
            self.state.now_ms.set(next.max(now));
        }
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.state.now_ms.get()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        SimSleep {
            state: &self.state,
            deadline: self.state.now_ms.get() + duration.as_millis() as u64,
        }
    }
}

struct SimSleep<'a> {
    state: &'a SimState,
    deadline: u64,
}

impl Future for SimSleep<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.state.now_ms.get() >= self.deadline {
            Poll::Ready(())
        } else {
            self.state.note_deadline(self.deadline);
            Poll::Pending
        }
    }
}
