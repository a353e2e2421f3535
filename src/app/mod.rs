//! Application layer: hexagonal core with port traits.
//!
//! ```text
//!  ┌──────────────────────────────────────────────┐
//!  │                  AppService                  │
//!  │  scheduler · policy · engine · config        │
//!  └──────┬──────────────┬──────────────┬─────────┘
//!         │              │              │
//!    ValvePort      ButtonPort     EventSink
//!    BuzzerPort     Clock          ConfigPort
//! ```

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
