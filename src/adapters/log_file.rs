//! Rotating debug log file: the `log` backend for host builds.
//!
//! Every record is appended as one line:
//!
//! ```text
//! <uptime> -- [<target>] -- <message>
//! ```
//!
//! When the file grows past [`MAX_FILE_BYTES`], the oldest
//! [`TRIM_LINES`] lines are dropped by copying the remainder to a temp
//! file and renaming it over the log.  The file therefore stays bounded
//! without ever losing the most recent lines.
//!
//! On ESP-IDF targets `esp_idf_logger` is installed instead and this
//! module is unused.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Size limit that triggers a trim.
pub const MAX_FILE_BYTES: u64 = 250 * 1024;

/// Lines dropped from the head of the file per trim.
pub const TRIM_LINES: usize = 250;

/// Width of the right-aligned target column.
const TARGET_WIDTH: usize = 16;

pub struct RotatingFileLogger {
    path: PathBuf,
    level: LevelFilter,
    echo: bool,
    started: Instant,
    /// Serializes appends and trims.
    lock: Mutex<()>,
}

impl RotatingFileLogger {
    pub fn new(path: impl Into<PathBuf>, level: LevelFilter) -> Self {
        Self {
            path: path.into(),
            level,
            echo: false,
            started: Instant::now(),
            lock: Mutex::new(()),
        }
    }

    /// Also print every line to stderr.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Install as the global `log` backend.
    pub fn install(self) -> Result<(), SetLoggerError> {
        let level = self.level;
        log::set_logger(Box::leak(Box::new(self)))?;
        log::set_max_level(level);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn format_line(&self, record: &Record<'_>) -> String {
        let uptime = self.started.elapsed();
        let target = record.target();
        // Keep the tail of long module paths; that is the informative part.
        let target = if target.len() > TARGET_WIDTH {
            let cut = target.len() - TARGET_WIDTH;
            target.get(cut..).unwrap_or(target)
        } else {
            target
        };
        format!(
            "{:>7}.{:03} -- [{:>width$}] -- {}\n",
            uptime.as_secs(),
            uptime.subsec_millis(),
            target,
            record.args(),
            width = TARGET_WIDTH,
        )
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        let size = file.metadata()?.len();
        drop(file);
        if size > MAX_FILE_BYTES {
            trim_head(&self.path, TRIM_LINES)?;
        }
        Ok(())
    }
}

impl Log for RotatingFileLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = self.format_line(record);
        if self.echo {
            eprint!("{line}");
        }
        let Ok(_guard) = self.lock.lock() else {
            return;
        };
        if let Err(e) = self.append(&line) {
            // The logger cannot log its own failure.
            eprintln!("log file {}: {}", self.path.display(), e);
        }
    }

    fn flush(&self) {}
}

/// Drop the first `lines` lines of `path` via a temp file and rename.
pub fn trim_head(path: &Path, lines: usize) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let reader = BufReader::new(File::open(path)?);
        let mut writer = BufWriter::new(File::create(&tmp)?);
        for line in reader.lines().skip(lines) {
            writeln!(writer, "{}", line?)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)
}
