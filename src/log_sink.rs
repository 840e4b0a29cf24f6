use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Local;

const LOG_TARGET: &str = "pdf2txt";

/// Severity of a record written to a [`LogSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl Level {
    fn as_log_level(self) -> log::Level {
        match self {
            Level::Info => log::Level::Info,
            Level::Warning => log::Level::Warn,
            Level::Error => log::Level::Error,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        })
    }
}

// ── LogSink ──────────────────────────────────────────────────────────────────

/// Append-only text buffer behind the debug panel.
///
/// Each record becomes one `HH:MM:SS | LEVEL | message` line and is also
/// forwarded to the [`log`] facade, so whatever logger the binary installs sees
/// the same stream. Clones share the same buffer; hand one to every component
/// that should write into it.
///
/// ```
/// use pdf2txt::LogSink;
///
/// let sink = LogSink::new();
/// sink.info("3 pages detected");
/// assert!(sink.contents().ends_with("| INFO | 3 pages detected\n"));
///
/// sink.clear();
/// assert!(sink.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    buffer: Arc<Mutex<String>>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.record(Level::Info, message.as_ref());
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        self.record(Level::Warning, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.record(Level::Error, message.as_ref());
    }

    /// Append one record at `level`.
    pub fn record(&self, level: Level, message: &str) {
        log::log!(target: LOG_TARGET, level.as_log_level(), "{message}");

        let line = format!("{} | {} | {}\n", Local::now().format("%H:%M:%S"), level, message);
        self.lock().push_str(&line);
    }

    /// Snapshot of everything recorded since start-up or the last [`clear`].
    ///
    /// [`clear`]: LogSink::clear
    pub fn contents(&self) -> String {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Reset the buffer to empty.
    pub fn clear(&self) {
        self.lock().clear();
    }

    // A panic while holding the lock leaves a complete string behind, so a
    // poisoned buffer is still usable.
    fn lock(&self) -> MutexGuard<'_, String> {
        self.buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
