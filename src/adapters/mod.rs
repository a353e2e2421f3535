//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                  |
//! |----------------|--------------------|------------------------------|
//! | `config_store` | ConfigPort         | JSON file / NVS / memory     |
//! | `hardware`     | ValvePort          | valve relay GPIOs            |
//! |                | ButtonPort         | button GPIO                  |
//! |                | BuzzerPort         | buzzer GPIO                  |
//! | `log_file`     | `log::Log`         | rotating debug log (host)    |
//! | `log_sink`     | EventSink          | `log` facade                 |
//! | `time`         | Clock              | system timer / virtual clock |

pub mod config_store;
pub mod hardware;
pub mod log_file;
pub mod log_sink;
pub mod time;
