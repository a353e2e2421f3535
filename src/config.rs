//! System configuration parameters
//!
//! All tunable timings for the filtration appliance.
//! Values are loaded from the config store at boot; a partial file only
//! overrides the keys it contains.  At runtime the only writer is the
//! long-press recalibration of `filter_secs`.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{ConfigError, ConfigPort};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Operations ---
    /// Membrane flush phase of a flush operation (seconds)
    pub flush_secs: u32,
    /// Disposal phase that discards the first filtered water (seconds)
    pub disposal_secs: u32,
    /// Default filtration duration (seconds)
    pub filter_secs: u32,
    /// Filtration duration started by a long press (seconds)
    pub long_filter_secs: u32,

    // --- Maintenance ---
    /// Idle time after which an auto-flush runs (seconds)
    pub auto_flush_secs: u32,
    /// Idle time after which a filter needs a flush first (seconds)
    pub water_clean_secs: u32,
    /// Shortest filter duration a long press may store (seconds)
    pub min_filter_secs: u32,
    /// Run the pre-filter flush check for the filter that replaces an
    /// interrupted auto-flush.
    pub flush_check_after_auto_flush: bool,

    // --- Input ---
    /// Button sampling interval (milliseconds)
    pub button_poll_ms: u32,
    /// Presses at or below this length are noise (milliseconds)
    pub debounce_ms: u32,
    /// Presses longer than this are long presses (milliseconds)
    pub long_press_ms: u32,

    // --- Timing ---
    /// Auto-flush check interval (milliseconds)
    pub idle_check_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Operations
            flush_secs: 10,
            disposal_secs: 60,
            filter_secs: 120,
            long_filter_secs: 60 * 60,

            // Maintenance
            auto_flush_secs: 8 * 60 * 60,
            water_clean_secs: 5 * 60,
            min_filter_secs: 30,
            flush_check_after_auto_flush: false,

            // Input
            button_poll_ms: 20,
            debounce_ms: 50,
            long_press_ms: 1500,

            // Timing
            idle_check_ms: 1000,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Called before persisting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=600).contains(&self.flush_secs) {
            return Err(ConfigError::ValidationFailed("flush_secs must be 1–600"));
        }
        if self.disposal_secs > 3600 {
            return Err(ConfigError::ValidationFailed("disposal_secs must be 0–3600"));
        }
        if self.min_filter_secs == 0 {
            return Err(ConfigError::ValidationFailed("min_filter_secs must be > 0"));
        }
        if self.filter_secs < self.min_filter_secs || self.filter_secs > 24 * 3600 {
            return Err(ConfigError::ValidationFailed(
                "filter_secs must be min_filter_secs–86400",
            ));
        }
        if self.long_filter_secs < self.min_filter_secs {
            return Err(ConfigError::ValidationFailed(
                "long_filter_secs must be >= min_filter_secs",
            ));
        }
        if self.auto_flush_secs < 60 {
            return Err(ConfigError::ValidationFailed("auto_flush_secs must be >= 60"));
        }
        if !(5..=1000).contains(&self.button_poll_ms) {
            return Err(ConfigError::ValidationFailed("button_poll_ms must be 5–1000"));
        }
        if self.debounce_ms >= self.long_press_ms {
            return Err(ConfigError::ValidationFailed(
                "debounce_ms must be < long_press_ms",
            ));
        }
        if !(100..=60_000).contains(&self.idle_check_ms) {
            return Err(ConfigError::ValidationFailed("idle_check_ms must be 100–60000"));
        }
        Ok(())
    }
}

/// Load the config from `store`, falling back to defaults on any failure.
///
/// A read failure is never surfaced beyond a warning: the appliance must
/// stay usable with a missing or corrupted config file.  A stored config
/// that fails validation keeps every value that is valid on its own and
/// drops the rest.
pub fn load_or_default(store: &impl ConfigPort) -> SystemConfig {
    match store.load() {
        Ok(cfg) => match cfg.validate() {
            Ok(()) => {
                info!("Config loaded: {:?}", cfg);
                cfg
            }
            Err(e) => {
                warn!("Stored config rejected ({}), keeping valid fields", e);
                let merged = merge_valid_fields(&cfg);
                info!("Config loaded: {:?}", merged);
                merged
            }
        },
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    }
}

/// Apply the fields of `stored` over the defaults one at a time, keeping
/// each only if the result still validates.
///
/// Fields are retried until a pass accepts nothing new, so a value that
/// depends on another (`filter_secs` on `min_filter_secs`) is not lost to
/// key order.
fn merge_valid_fields(stored: &SystemConfig) -> SystemConfig {
    use serde_json::{Map, Value};

    let mut merged = SystemConfig::default();
    let Ok(Value::Object(mut rest)) = serde_json::to_value(stored) else {
        return merged;
    };

    loop {
        let mut rejected = Map::new();
        let before = rest.len();
        for (key, value) in rest {
            let Ok(Value::Object(mut candidate)) = serde_json::to_value(&merged) else {
                return merged;
            };
            candidate.insert(key.clone(), value.clone());
            match serde_json::from_value::<SystemConfig>(Value::Object(candidate)) {
                Ok(cfg) if cfg.validate().is_ok() => merged = cfg,
                _ => {
                    rejected.insert(key, value);
                }
            }
        }
        if rejected.is_empty() || rejected.len() == before {
            for (key, value) in &rejected {
                warn!("Config: stored {} = {} out of range, using default", key, value);
            }
            return merged;
        }
        rest = rejected;
    }
}
