//! Configuration store adapters.
//!
//! Implement [`ConfigPort`] over three backends.  All of them persist the
//! config as JSON so the same file can be edited by hand, and all of them
//! validate before writing.
//!
//! | Adapter             | Backend                          | Used by            |
//! |---------------------|----------------------------------|--------------------|
//! | `FileConfigStore`   | JSON file, temp file + rename    | host binary        |
//! | `NvsConfigStore`    | ESP-IDF NVS string entry         | firmware (espidf)  |
//! | `MemoryConfigStore` | in-memory, optional write fault  | tests, simulation  |
//!
//! A missing entry is reported as [`ConfigError::NotFound`]; the caller
//! ([`load_or_default`](crate::config::load_or_default)) falls back to
//! defaults.

use core::cell::{Cell, RefCell};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;

fn to_json(config: &SystemConfig) -> Result<String, ConfigError> {
    serde_json::to_string_pretty(config).map_err(|_| ConfigError::IoError)
}

fn from_json(text: &str) -> Result<SystemConfig, ConfigError> {
    serde_json::from_str(text).map_err(|_| ConfigError::Corrupted)
}

// ───────────────────────────────────────────────────────────────
// File store
// ───────────────────────────────────────────────────────────────

/// JSON config file on a regular filesystem.
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl ConfigPort for FileConfigStore {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(ConfigError::NotFound),
            Err(e) => {
                warn!("FileConfigStore: read {} failed: {}", self.path.display(), e);
                return Err(ConfigError::IoError);
            }
        };
        let cfg = from_json(&text)?;
        info!("FileConfigStore: loaded {}", self.path.display());
        Ok(cfg)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let json = to_json(config)?;

        // Readers see either the old file or the new one, never a torn write.
        let tmp = self.tmp_path();
        fs::write(&tmp, json.as_bytes()).map_err(|e| {
            warn!("FileConfigStore: write {} failed: {}", tmp.display(), e);
            ConfigError::IoError
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            warn!("FileConfigStore: rename to {} failed: {}", self.path.display(), e);
            ConfigError::IoError
        })?;
        info!("FileConfigStore: saved {} ({} bytes)", self.path.display(), json.len());
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// NVS store (ESP-IDF)
// ───────────────────────────────────────────────────────────────

#[cfg(feature = "espidf")]
pub use nvs::NvsConfigStore;

#[cfg(feature = "espidf")]
mod nvs {
    use core::cell::RefCell;

    use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
    use log::{info, warn};

    use super::{from_json, to_json};
    use crate::app::ports::{ConfigError, ConfigPort};
    use crate::config::SystemConfig;

    const NAMESPACE: &str = "osmoflow";
    const KEY: &str = "config";
    const MAX_JSON_LEN: usize = 1024;

    /// Config stored as one JSON string in the default NVS partition.
    /// NVS commits are atomic per write.
    pub struct NvsConfigStore {
        nvs: RefCell<EspNvs<NvsDefault>>,
    }

    impl NvsConfigStore {
        pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, ConfigError> {
            let nvs = EspNvs::new(partition, NAMESPACE, true).map_err(|e| {
                warn!("NvsConfigStore: open namespace failed: {}", e);
                ConfigError::IoError
            })?;
            info!("NvsConfigStore: namespace '{}' ready", NAMESPACE);
            Ok(Self {
                nvs: RefCell::new(nvs),
            })
        }
    }

    impl ConfigPort for NvsConfigStore {
        fn load(&self) -> Result<SystemConfig, ConfigError> {
            let mut buf = [0u8; MAX_JSON_LEN];
            let nvs = self.nvs.borrow();
            match nvs.get_str(KEY, &mut buf) {
                Ok(Some(text)) => from_json(text),
                Ok(None) => Err(ConfigError::NotFound),
                Err(e) => {
                    warn!("NvsConfigStore: read failed: {}", e);
                    Err(ConfigError::IoError)
                }
            }
        }

        fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
            config.validate()?;
            let json = to_json(config)?;
            self.nvs.borrow_mut().set_str(KEY, &json).map_err(|e| {
                warn!("NvsConfigStore: write failed: {}", e);
                ConfigError::IoError
            })?;
            info!("NvsConfigStore: config saved ({} bytes)", json.len());
            Ok(())
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Memory store
// ───────────────────────────────────────────────────────────────

/// In-memory store.  Keeps the serialized JSON so loads exercise the same
/// decoding path as the persistent backends.
#[derive(Default)]
pub struct MemoryConfigStore {
    json: RefCell<Option<String>>,
    fail_writes: Cell<bool>,
    saves: Cell<u32>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with raw JSON (may be partial or malformed).
    pub fn with_json(json: &str) -> Self {
        let store = Self::new();
        store.json.replace(Some(json.to_owned()));
        store
    }

    /// Make every subsequent save fail with [`ConfigError::IoError`].
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Number of successful saves.
    pub fn saves(&self) -> u32 {
        self.saves.get()
    }
}

impl ConfigPort for MemoryConfigStore {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        match self.json.borrow().as_deref() {
            Some(text) => from_json(text),
            None => Err(ConfigError::NotFound),
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if self.fail_writes.get() {
            return Err(ConfigError::IoError);
        }
        self.json.replace(Some(to_json(config)?));
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
