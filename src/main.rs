//! Osmoflow firmware: main entry point
//!
//! Hexagonal architecture on a single-threaded cooperative executor.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink   FileConfigStore         │
//! │  (Valve+Button+Buzzer)  (EventSink)    NvsConfigStore (Config) │
//! │  SystemClock (Clock)                                           │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │                 AppService (domain core)               │    │
//! │  │  TaskScheduler · policy · OperationEngine              │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  edge-executor: drain_loop · button_loop · idle_loop           │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::info;

use osmoflow::adapters::hardware::HardwareAdapter;
use osmoflow::adapters::log_sink::LogEventSink;
use osmoflow::adapters::time::SystemClock;
use osmoflow::app::ports::{ButtonPort, BuzzerPort, ConfigPort, ValvePort};
use osmoflow::app::service::AppService;
use osmoflow::config;
use osmoflow::pins;

// ── Main ──────────────────────────────────────────────────────

#[cfg(feature = "espidf")]
fn main() -> Result<()> {
    use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, Output, PinDriver, Pull};
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use osmoflow::adapters::config_store::NvsConfigStore;
    use osmoflow::drivers::{button::ButtonInput, buzzer::Buzzer, valves::ValveDriver};

    fn output(gpio: i32) -> Result<PinDriver<'static, AnyOutputPin, Output>> {
        // SAFETY: every GPIO in `pins` is claimed exactly once, here.
        let pin = unsafe { AnyOutputPin::new(gpio) };
        Ok(PinDriver::output(pin)?)
    }

    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    banner();

    // ── 2. Hardware ───────────────────────────────────────────
    let [v1, v2, v3, v4] = pins::VALVE_GPIOS;
    let valves = ValveDriver::new([output(v1)?, output(v2)?, output(v3)?, output(v4)?]);
    // SAFETY: see `output`.
    let mut button = PinDriver::input(unsafe { AnyInputPin::new(pins::BUTTON_GPIO) })?;
    button.set_pull(Pull::Up)?;
    let buzzer = Buzzer::new(output(pins::BUZZER_GPIO)?);
    let hw = HardwareAdapter::new(valves, ButtonInput::new(button), buzzer);

    // ── 3. Config store ───────────────────────────────────────
    let store = NvsConfigStore::new(EspDefaultNvsPartition::take()?)?;

    run(hw, store)
}

#[cfg(not(feature = "espidf"))]
fn main() -> Result<()> {
    use anyhow::Context;
    use osmoflow::adapters::config_store::FileConfigStore;
    use osmoflow::adapters::log_file::RotatingFileLogger;
    use osmoflow::drivers::{button::ButtonInput, buzzer::Buzzer, sim_pin::SimPin, valves::ValveDriver};

    // ── 1. Host bootstrap ─────────────────────────────────────
    let data_dir = std::env::var_os("OSMOFLOW_DATA_DIR").map_or_else(|| ".".into(), std::path::PathBuf::from);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    RotatingFileLogger::new(data_dir.join("log.txt"), log::LevelFilter::Debug)
        .with_echo(true)
        .install()
        .context("installing logger")?;
    banner();
    info!("Host simulation: GPIO {:?} simulated in memory", pins::VALVE_GPIOS);

    // ── 2. Simulated hardware (button released = HIGH) ────────
    let valves = ValveDriver::new(core::array::from_fn(|_| SimPin::new(true)));
    let hw = HardwareAdapter::new(valves, ButtonInput::new(SimPin::new(true)), Buzzer::new(SimPin::new(false)));

    // ── 3. Config store ───────────────────────────────────────
    let store = FileConfigStore::new(data_dir.join("config.json"));

    run(hw, store)
}

fn banner() {
    info!("╔══════════════════════════════════════╗");
    info!("║  Osmoflow v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
}

/// Load config, build the service and run its loops forever.
fn run<H, S>(hw: H, store: S) -> Result<()>
where
    H: ValvePort + ButtonPort + BuzzerPort,
    S: ConfigPort,
{
    let config = config::load_or_default(&store);
    let app = AppService::new(config, hw, store, LogEventSink::new(), SystemClock::new());

    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();

    // Greeting first, so no operation can start before the valves are closed.
    futures_lite::future::block_on(executor.run(app.start()));

    executor.spawn(app.drain_loop()).detach();
    executor.spawn(app.button_loop()).detach();
    executor.spawn(app.idle_loop()).detach();
    info!("Main: drain, button and idle loops running");

    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
    Ok(())
}
