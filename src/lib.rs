//! Osmoflow firmware library.
//!
//! Single-button controller for a four-valve reverse-osmosis filter.
//! Exposes the pure-logic modules for integration testing; ESP-IDF code
//! is guarded by the `espidf` feature inside each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod operation;
pub mod pins;
pub mod policy;
pub mod scheduler;
pub mod time_driver;

pub mod adapters;
pub mod drivers;
