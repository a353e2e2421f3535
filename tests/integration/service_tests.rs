//! End-to-end scenarios for the AppService loops.
//!
//! The full service (button watcher, idle watcher, drain loop, engine)
//! runs against [`MockHardware`] on a [`SimClock`], so multi-minute
//! appliance sessions execute instantly and every timestamp is exact.
//!
//! Reference timeline with default timings:
//!
//! ```text
//!   0      greeting (valves closed)             700   loops start
//!   1000   press ──300ms── 1300 release, short beep ─▶ 1500 flush+filter queued
//!   1500   Flush ─10s─▶ 11500 Disposal ─60s─▶ 71500 Closed, ack beep ─▶ 71700
//!   71700  Filter ─120s─▶ 191700 Closed, 3 beeps ─▶ 193300
//! ```

use core::pin::pin;

use crate::mock_hw::{MockHardware, RecordingSink, SharedStore};

use osmoflow::adapters::time::SimClock;
use osmoflow::app::commands::AppCommand;
use osmoflow::app::events::AppEvent;
use osmoflow::app::ports::{ConfigPort, ValveMode};
use osmoflow::app::service::AppService;
use osmoflow::config::SystemConfig;
use osmoflow::drivers::button::ButtonEvent;
use osmoflow::operation::{OperationKind, TaskRecord};
use osmoflow::scheduler::QUEUE_CAPACITY;

type App = AppService<MockHardware, SharedStore, RecordingSink, SimClock>;

struct Rig {
    clock: SimClock,
    hw: MockHardware,
    sink: RecordingSink,
    store: SharedStore,
}

fn build(config: SystemConfig) -> (App, Rig) {
    let clock = SimClock::new();
    let hw = MockHardware::new(&clock);
    let sink = RecordingSink::new(&hw);
    let store = SharedStore::default();
    let app = AppService::new(config, hw.clone(), store.clone(), sink.clone(), clock.clone());
    (
        app,
        Rig {
            clock,
            hw,
            sink,
            store,
        },
    )
}

fn history(app: &App) -> Vec<TaskRecord> {
    app.scheduler().history().copied().collect()
}

fn summary(app: &App) -> Vec<(OperationKind, bool)> {
    history(app).iter().map(|r| (r.kind, r.completed)).collect()
}

fn enqueue(kind: OperationKind, duration_secs: Option<u32>) -> AppCommand {
    AppCommand::Enqueue {
        kind,
        duration_secs,
    }
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_closes_valves_and_greets() {
    let (app, rig) = build(SystemConfig::default());
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 5_000);

    assert_eq!(rig.hw.valve_log(), vec![(0, ValveMode::Closed)]);
    assert_eq!(rig.hw.beep_starts(), vec![0, 200]);
    assert_eq!(rig.sink.events(), vec![AppEvent::Started]);
    assert!(app.scheduler().is_idle());
}

// ── Button gestures ───────────────────────────────────────────

#[test]
fn first_short_press_flushes_then_filters() {
    let (app, rig) = build(SystemConfig::default());
    rig.hw.press(1_000, 300);
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 200_000);

    assert_eq!(
        rig.hw.valve_log(),
        vec![
            (0, ValveMode::Closed),
            (1_500, ValveMode::Flush),
            (11_500, ValveMode::Disposal),
            (71_500, ValveMode::Closed),
            (71_700, ValveMode::Filter),
            (191_700, ValveMode::Closed),
        ]
    );
    // Greeting, press ack, flush ack, then the three completion beeps.
    assert_eq!(
        rig.hw.beep_starts(),
        vec![0, 200, 1_300, 71_500, 191_700, 192_300, 192_900]
    );

    let records = history(&app);
    assert_eq!(
        summary(&app),
        vec![(OperationKind::Flush, true), (OperationKind::Filter, true)]
    );
    assert_eq!((records[0].start_ms, records[0].end_ms), (1_500, 71_700));
    assert_eq!((records[1].start_ms, records[1].end_ms), (71_700, 193_300));
    assert!(app.scheduler().is_idle());
}

#[test]
fn press_on_fresh_water_skips_flush() {
    let (app, rig) = build(SystemConfig::default());
    rig.hw.press(1_000, 300);
    rig.hw.press(200_000, 300);
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 210_000);

    // Last operation ended at 193.3s, well inside the 300s window.
    let running = app.scheduler().current().copied().expect("filter should be running");
    assert_eq!(running.op.kind, OperationKind::Filter);
    assert_eq!(running.started_ms, 200_500);
    assert_eq!(app.scheduler().pending_len(), 0);
    assert_eq!(rig.hw.valve_mode(), ValveMode::Filter);
}

#[test]
fn presses_within_debounce_are_ignored() {
    let (app, rig) = build(SystemConfig::default());
    rig.hw.press(1_000, 40);
    rig.hw.press(3_000, 20);
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 10_000);

    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::ButtonPressed(_))), 0);
    assert_eq!(rig.hw.valve_modes(), vec![ValveMode::Closed]);
    assert_eq!(rig.hw.beep_starts(), vec![0, 200]);
    assert!(app.scheduler().is_idle());
}

#[test]
fn long_press_when_idle_runs_long_filter() {
    let (app, rig) = build(SystemConfig::default());
    rig.hw.press(1_000, 1_600);
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 3_700_000);

    assert!(rig.sink.events().contains(&AppEvent::ButtonPressed(ButtonEvent::LongPress)));
    let queued: Vec<_> = rig
        .sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            AppEvent::OperationQueued(op) => Some((op.kind, op.duration_secs)),
            _ => None,
        })
        .collect();
    assert_eq!(
        queued,
        vec![(OperationKind::Flush, None), (OperationKind::Filter, Some(3_600))]
    );

    // Long beep 2600..3100, flush 3100..73300, filter for one hour.
    assert_eq!(rig.hw.valve_log().last(), Some(&(3_673_300, ValveMode::Closed)));
    assert_eq!(
        summary(&app),
        vec![(OperationKind::Flush, true), (OperationKind::Filter, true)]
    );
}

// ── Cancellation ──────────────────────────────────────────────

#[test]
fn press_during_flush_skips_to_filter() {
    let (app, rig) = build(SystemConfig::default());
    rig.hw.press(1_000, 300);
    rig.hw.press(5_000, 300);
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 10_000);

    assert_eq!(
        rig.hw.valve_log(),
        vec![
            (0, ValveMode::Closed),
            (1_500, ValveMode::Flush),
            (5_500, ValveMode::Closed),
            (5_700, ValveMode::Filter),
        ]
    );
    let records = history(&app);
    assert_eq!(summary(&app), vec![(OperationKind::Flush, false)]);
    assert_eq!(records[0].end_ms, 5_700);
    assert_eq!(
        app.scheduler().current().map(|r| r.op.kind),
        Some(OperationKind::Filter)
    );
}

#[test]
fn short_press_stops_filter_silently() {
    let (app, rig) = build(SystemConfig::default());
    rig.hw.press(1_000, 300);
    rig.hw.press(100_000, 300);
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 200_000);

    assert_eq!(rig.hw.valve_log().last(), Some(&(100_500, ValveMode::Closed)));
    // No completion melody after the stop: the last beep is the press ack.
    assert_eq!(rig.hw.beep_starts().last(), Some(&100_300));
    assert_eq!(
        summary(&app),
        vec![(OperationKind::Flush, true), (OperationKind::Filter, false)]
    );
    assert_eq!(app.config().filter_secs, 120, "short press must not recalibrate");
}

#[test]
fn cancel_during_finish_melody_keeps_completion() {
    let (app, rig) = build(SystemConfig::default());
    rig.hw.press(1_000, 300);
    // Filter closes at 191.7s; melody plays until 193.3s.
    rig.hw.press(192_000, 300);
    // Next filter must run its full length despite the earlier request.
    rig.hw.press(200_000, 300);
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 330_000);

    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::CancelRequested(_))), 1);
    assert_eq!(
        summary(&app),
        vec![
            (OperationKind::Flush, true),
            (OperationKind::Filter, true),
            (OperationKind::Filter, true),
        ]
    );
    assert_eq!(rig.hw.valve_log().last(), Some(&(320_500, ValveMode::Closed)));
}

// ── Recalibration ─────────────────────────────────────────────

#[test]
fn long_press_during_filter_stores_elapsed_time() {
    let (app, rig) = build(SystemConfig::default());
    rig.hw.press(1_000, 300);
    // Filter started at 71.7s; release at 117.3s, long beep until 117.8s.
    rig.hw.press(115_700, 1_600);
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 130_000);

    assert_eq!(app.config().filter_secs, 46);
    assert_eq!(rig.store.0.saves(), 1);
    assert_eq!(rig.store.load().map(|c| c.filter_secs).ok(), Some(46));
    assert!(rig.sink.events().contains(&AppEvent::FilterRecalibrated { filter_secs: 46 }));
    assert_eq!(rig.hw.valve_log().last(), Some(&(117_800, ValveMode::Closed)));
    assert_eq!(
        summary(&app),
        vec![(OperationKind::Flush, true), (OperationKind::Filter, false)]
    );

    // The next short-press filter uses the stored duration.
    rig.hw.press(130_000, 300);
    rig.clock.run_until(run.as_mut(), 180_000);
    assert_eq!(rig.hw.valve_log().last(), Some(&(176_500, ValveMode::Closed)));
}

#[test]
fn early_long_press_only_stops_filter() {
    let (app, rig) = build(SystemConfig::default());
    rig.hw.press(1_000, 300);
    rig.hw.press(75_000, 1_600);
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 90_000);

    assert_eq!(app.config().filter_secs, 120);
    assert_eq!(rig.store.0.saves(), 0);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::FilterRecalibrated { .. })), 0);
    assert_eq!(
        summary(&app),
        vec![(OperationKind::Flush, true), (OperationKind::Filter, false)]
    );
}

#[test]
fn recalibration_survives_store_failure() {
    let (app, rig) = build(SystemConfig::default());
    rig.store.0.fail_writes(true);
    rig.hw.press(1_000, 300);
    rig.hw.press(115_700, 1_600);
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 120_000);

    assert_eq!(app.config().filter_secs, 46, "runtime value still updated");
    assert_eq!(rig.store.0.saves(), 0);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::FilterRecalibrated { .. })), 1);
}

// ── Auto-flush ────────────────────────────────────────────────

fn quick_auto_flush() -> SystemConfig {
    SystemConfig {
        auto_flush_secs: 120,
        ..SystemConfig::default()
    }
}

#[test]
fn idle_appliance_flushes_itself() {
    let (app, rig) = build(quick_auto_flush());
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 300_000);

    assert_eq!(
        rig.hw.valve_log(),
        vec![
            (0, ValveMode::Closed),
            (120_700, ValveMode::Flush),
            (130_700, ValveMode::Disposal),
            (190_700, ValveMode::Closed),
        ]
    );
    let records = history(&app);
    assert_eq!(summary(&app), vec![(OperationKind::AutoFlush, true)]);
    assert_eq!(records[0].end_ms, 190_900);

    // Next one is measured from the end of the first.
    rig.clock.run_until(run.as_mut(), 320_000);
    assert_eq!(
        app.scheduler().current().map(|r| (r.op.kind, r.started_ms)),
        Some((OperationKind::AutoFlush, 311_700))
    );
}

#[test]
fn eight_hours_idle_triggers_auto_flush() {
    // Default maintenance timings; a slow button poll keeps the run short.
    let (app, rig) = build(SystemConfig {
        button_poll_ms: 1_000,
        ..SystemConfig::default()
    });
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 28_800_000);
    assert!(app.scheduler().is_idle());

    rig.clock.run_until(run.as_mut(), 28_900_000);
    let records = history(&app);
    assert_eq!(summary(&app), vec![(OperationKind::AutoFlush, true)]);
    assert_eq!((records[0].start_ms, records[0].end_ms), (28_800_700, 28_870_900));
    assert_eq!(rig.hw.valve_mode(), ValveMode::Closed);
}

#[test]
fn press_during_auto_flush_starts_filter() {
    let (app, rig) = build(quick_auto_flush());
    rig.hw.press(125_000, 300);
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 130_000);

    assert_eq!(
        rig.hw.valve_log(),
        vec![
            (0, ValveMode::Closed),
            (120_700, ValveMode::Flush),
            (125_500, ValveMode::Closed),
            (125_700, ValveMode::Filter),
        ]
    );
    assert_eq!(summary(&app), vec![(OperationKind::AutoFlush, false)]);
    let running = app.scheduler().current().copied().expect("filter should be running");
    assert_eq!(running.op.kind, OperationKind::Filter);
    assert_eq!(running.op.duration_secs, None);
    assert_eq!(app.scheduler().pending_len(), 0);
}

#[test]
fn interrupted_auto_flush_can_require_fresh_flush() {
    let (app, rig) = build(SystemConfig {
        flush_check_after_auto_flush: true,
        ..quick_auto_flush()
    });
    rig.hw.press(125_000, 300);
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 130_000);

    // No record existed when the press was decided, so a flush goes first.
    assert_eq!(
        app.scheduler().current().map(|r| r.op.kind),
        Some(OperationKind::Flush)
    );
    let pending: Vec<_> = app.scheduler().pending().map(|op| op.kind).collect();
    assert_eq!(pending, vec![OperationKind::Filter]);
}

#[test]
fn auto_flush_waits_while_busy() {
    let (app, rig) = build(quick_auto_flush());
    app.apply(&[enqueue(OperationKind::Filter, Some(600))]);
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 700_000);

    // Filter 700..600700, melody until 602300; no auto-flush meanwhile.
    assert_eq!(summary(&app), vec![(OperationKind::Filter, true)]);
    assert!(app.scheduler().is_idle());
}

// ── Scheduling ────────────────────────────────────────────────

#[test]
fn queued_operations_run_in_order_without_overlap() {
    let (app, rig) = build(SystemConfig::default());
    app.apply(&[
        enqueue(OperationKind::Flush, None),
        enqueue(OperationKind::Filter, Some(60)),
        enqueue(OperationKind::Flush, None),
    ]);
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 400_000);

    assert_eq!(
        summary(&app),
        vec![
            (OperationKind::Flush, true),
            (OperationKind::Filter, true),
            (OperationKind::Flush, true),
        ]
    );
    let records = history(&app);
    for pair in records.windows(2) {
        assert!(pair[1].start_ms >= pair[0].end_ms, "{:?} overlaps {:?}", pair[1], pair[0]);
    }
    assert_eq!(records[0].start_ms, 700);
    assert_eq!(records[2].end_ms, 202_700);
    assert_eq!(app.valve_owner(), None);
}

#[test]
fn full_queue_drops_extra_requests() {
    let (app, rig) = build(SystemConfig::default());
    let cmds = [enqueue(OperationKind::Flush, None); QUEUE_CAPACITY + 1];
    app.apply(&cmds);

    assert_eq!(app.scheduler().pending_len(), QUEUE_CAPACITY);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::OperationQueued(_))),
        QUEUE_CAPACITY
    );
}

#[test]
fn cancel_when_idle_is_harmless() {
    let (app, rig) = build(SystemConfig::default());
    app.apply(&[AppCommand::CancelCurrent]);
    app.apply(&[enqueue(OperationKind::Filter, Some(60))]);
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 70_000);

    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::CancelRequested(_))), 0);
    assert_eq!(summary(&app), vec![(OperationKind::Filter, true)]);
}

// ── Safety ────────────────────────────────────────────────────

#[test]
fn valves_closed_whenever_an_operation_ends() {
    let (app, rig) = build(quick_auto_flush());
    rig.hw.press(1_000, 300);
    rig.hw.press(5_000, 300);
    rig.hw.press(40_000, 1_600);
    rig.hw.press(100_000, 300);
    let mut run = pin!(app.run());
    rig.clock.run_until(run.as_mut(), 600_000);

    let finished: Vec<_> = rig
        .sink
        .with_valves()
        .into_iter()
        .filter(|(e, _)| matches!(e, AppEvent::OperationFinished(_) | AppEvent::OperationStarted(_)))
        .collect();
    assert!(finished.len() >= 6, "scenario should run several operations");
    for (event, mode) in finished {
        assert_eq!(mode, ValveMode::Closed, "valves open at {event:?}");
    }

    // Every working program is entered from Closed or from Flush (→ Disposal).
    let modes = rig.hw.valve_modes();
    for pair in modes.windows(2) {
        match pair[1] {
            ValveMode::Disposal => assert_eq!(pair[0], ValveMode::Flush),
            ValveMode::Flush | ValveMode::Filter => assert_eq!(pair[0], ValveMode::Closed),
            ValveMode::Closed => {}
        }
    }
    assert_eq!(app.valve_owner(), None);
}
