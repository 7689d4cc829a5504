//! Pipeline log channel.
//!
//! Every entry is printed to stdout, broadcast to SSE subscribers and,
//! once [`init_file_log`] has been called, appended to a timestamped file
//! under the log directory.

use chrono::Local;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Directory for run log files (relative to current dir)
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Log level for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn label(self) -> &'static str {
        match self {
            LogLevel::Info | LogLevel::Success => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting level for sub-items
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Fans log entries out to stdout, SSE clients and an optional file
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
    file: Mutex<Option<File>>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self {
            sender,
            file: Mutex::new(None),
        }
    }

    /// Start appending entries to `<dir>/pipeline_<YYYYmmdd_HHMMSS>.log`.
    /// Replaces any previous log file.
    pub fn mirror_to_file(&self, dir: impl AsRef<Path>) -> io::Result<PathBuf> {
        fs::create_dir_all(dir.as_ref())?;
        let path = dir
            .as_ref()
            .join(format!("pipeline_{}.log", Local::now().format("%Y%m%d_%H%M%S")));
        let file = File::options().create(true).append(true).open(&path)?;

        if let Ok(mut slot) = self.file.lock() {
            *slot = Some(file);
        }
        Ok(path)
    }

    /// Send a log entry to every sink
    pub fn log(&self, entry: LogEntry) {
        let prefix = match entry.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        let indent = "   ".repeat(entry.indent as usize);
        println!("{}{} {}", indent, prefix, entry.message);

        if let Ok(mut slot) = self.file.lock() {
            if let Some(file) = slot.as_mut() {
                let _ = writeln!(
                    file,
                    "{} - {} - {}{}",
                    Local::now().format("%Y-%m-%d %H:%M:%S"),
                    entry.level.label(),
                    indent,
                    entry.message
                );
            }
        }

        // No receivers is fine
        let _ = self.sender.send(entry);
    }

    /// Get a receiver for SSE streaming
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Mirror the global log channel to a file in `dir`.
pub fn init_file_log(dir: impl AsRef<Path>) -> io::Result<PathBuf> {
    LOG_BROADCASTER.mirror_to_file(dir)
}

pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::error(msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::info(msg).with_indent(indent));
}
