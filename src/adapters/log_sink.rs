//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one structured line per
//! application event to the `log` facade, which ends up on the serial
//! console (ESP-IDF) or in the rotating debug log file (host).

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::drivers::button::ButtonEvent;

/// Adapter that logs every [`AppEvent`].
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => {
                info!("START | valves closed, ready");
            }
            AppEvent::ButtonPressed(press) => {
                let gesture = match press {
                    ButtonEvent::ShortPress => "short",
                    ButtonEvent::LongPress => "long",
                };
                info!("BUTTON | {} press", gesture);
            }
            AppEvent::OperationQueued(op) => match op.duration_secs {
                Some(secs) => info!("QUEUE | {} {} ({}s)", op.kind, op.id, secs),
                None => info!("QUEUE | {} {}", op.kind, op.id),
            },
            AppEvent::OperationStarted(op) => {
                info!("START | {} {}", op.kind, op.id);
            }
            AppEvent::CancelRequested(op) => {
                info!("CANCEL | {} {}", op.kind, op.id);
            }
            AppEvent::OperationFinished(rec) => {
                info!(
                    "DONE | {} {} | {} | {}ms",
                    rec.kind,
                    rec.id,
                    if rec.completed { "completed" } else { "cancelled" },
                    rec.duration_ms(),
                );
            }
            AppEvent::FilterRecalibrated { filter_secs } => {
                info!("CALIB | filter_secs={}", filter_secs);
            }
        }
    }
}
