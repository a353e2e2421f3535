//! Maintenance policy: when to flush, and what a button press means.
//!
//! Pure decision logic over the scheduler state, the current time and the
//! configuration.  Nothing here sleeps, touches hardware or mutates the
//! scheduler: every decision is returned as a list of
//! [`AppCommand`]s for the service to apply.
//!
//! ## Button gestures
//!
//! | Running      | Gesture | Result                                           |
//! |--------------|---------|--------------------------------------------------|
//! | nothing      | short   | [flush if due] → filter (`filter_secs`)          |
//! | nothing      | long    | [flush if due] → filter (`long_filter_secs`)     |
//! | Filter       | long    | save elapsed as `filter_secs` if > minimum; stop |
//! | AutoFlush    | any     | queue the matching filter; stop the auto-flush   |
//! | anything     | any     | stop                                             |
//!
//! The same long press either starts a long filtration or finishes the
//! running one and remembers its length, depending on what is running.

use log::error;

use crate::app::commands::{AppCommand, Commands};
use crate::config::SystemConfig;
use crate::drivers::button::ButtonEvent;
use crate::operation::{OperationKind, TaskRecord};
use crate::scheduler::TaskScheduler;

fn secs_to_ms(secs: u32) -> u64 {
    u64::from(secs) * 1000
}

fn push(cmds: &mut Commands, cmd: AppCommand) {
    if cmds.push(cmd).is_err() {
        error!("Policy: command list full, dropping {:?}", cmd);
    }
}

/// A filter needs a flush first if nothing has run yet, or if the last
/// operation ended more than `water_clean_secs` ago.
pub fn prefilter_flush_due(last: Option<&TaskRecord>, now_ms: u64, cfg: &SystemConfig) -> bool {
    match last {
        None => true,
        Some(rec) => now_ms.saturating_sub(rec.end_ms) > secs_to_ms(cfg.water_clean_secs),
    }
}

/// An auto-flush is due only while the scheduler is fully idle and the
/// appliance has been unused for more than `auto_flush_secs`.
pub fn auto_flush_due(sched: &TaskScheduler, now_ms: u64, cfg: &SystemConfig) -> bool {
    if !sched.is_idle() {
        return false;
    }
    now_ms.saturating_sub(sched.idle_since_ms()) > secs_to_ms(cfg.auto_flush_secs)
}

/// The filter a gesture asks for.
fn filter_for(event: ButtonEvent, cfg: &SystemConfig) -> AppCommand {
    let duration_secs = match event {
        ButtonEvent::LongPress => Some(cfg.long_filter_secs),
        ButtonEvent::ShortPress => None,
    };
    AppCommand::Enqueue {
        kind: OperationKind::Filter,
        duration_secs,
    }
}

fn enqueue_flush() -> AppCommand {
    AppCommand::Enqueue {
        kind: OperationKind::Flush,
        duration_secs: None,
    }
}

/// Decide what a classified button press does.
pub fn on_button(
    event: ButtonEvent,
    sched: &TaskScheduler,
    now_ms: u64,
    cfg: &SystemConfig,
) -> Commands {
    let mut cmds = Commands::new();

    let Some(running) = sched.current() else {
        if prefilter_flush_due(sched.last_record(), now_ms, cfg) {
            push(&mut cmds, enqueue_flush());
        }
        push(&mut cmds, filter_for(event, cfg));
        return cmds;
    };

    match running.op.kind {
        OperationKind::Filter if event == ButtonEvent::LongPress => {
            let elapsed_ms = running.elapsed_ms(now_ms);
            if elapsed_ms > secs_to_ms(cfg.min_filter_secs) {
                let elapsed_secs = u32::try_from(elapsed_ms / 1000).unwrap_or(u32::MAX);
                push(
                    &mut cmds,
                    AppCommand::SaveFilterDuration(elapsed_secs.max(cfg.min_filter_secs)),
                );
            }
        }
        OperationKind::AutoFlush => {
            if cfg.flush_check_after_auto_flush
                && prefilter_flush_due(sched.last_record(), now_ms, cfg)
            {
                push(&mut cmds, enqueue_flush());
            }
            push(&mut cmds, filter_for(event, cfg));
        }
        _ => {}
    }
    push(&mut cmds, AppCommand::CancelCurrent);
    cmds
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
