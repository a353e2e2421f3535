//! Fuzz target: config loading
//!
//! Feeds arbitrary bytes as the stored config file.  Loading must never
//! panic, and whatever comes back must pass validation: a corrupted or
//! out-of-range file falls back to defaults.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use osmoflow::adapters::config_store::MemoryConfigStore;
use osmoflow::config::load_or_default;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let store = MemoryConfigStore::with_json(text);
    let cfg = load_or_default(&store);
    assert!(cfg.validate().is_ok(), "loaded config must be valid: {cfg:?}");
});
