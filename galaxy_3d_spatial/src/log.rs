//! Internal logging system for the Galaxy3D spatial subsystem
//!
//! - Pluggable sink through the Logger trait (see `Engine::set_logger`)
//! - Five severities, Trace being per-frame rebuild chatter
//! - Colored console output by default, filtered by a minimum severity
//! - Every entry records the emitting thread, ERROR entries add file:line
//!
//! Scene BVH rebuilds run on pool workers every frame, so the thread name
//! is what tells a rebuild message from a query-side one.

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_spatial::galaxy3d::log::{Logger, LogEntry};
///
/// struct FileLogger {
///     file: std::fs::File,
/// }
///
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Called from whichever thread emitted the entry
    fn log(&self, entry: &LogEntry);
}

/// One log record
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,

    pub timestamp: SystemTime,

    /// Source module (e.g., "galaxy3d::SceneBvh", "galaxy3d::MeshBvh")
    pub source: String,

    pub message: String,

    /// Name of the emitting thread (`None` for unnamed threads)
    pub thread: Option<String>,

    /// Source file (ERROR entries only)
    pub file: Option<&'static str>,

    /// Source line (ERROR entries only)
    pub line: Option<u32>,
}

impl LogEntry {
    /// Entry stamped with the current time and thread.
    pub fn now(severity: LogSeverity, source: &str, message: String) -> Self {
        Self {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            thread: std::thread::current().name().map(str::to_string),
            file: None,
            line: None,
        }
    }

    /// Attach a file:line location.
    pub fn at(mut self, file: &'static str, line: u32) -> Self {
        self.file = Some(file);
        self.line = Some(line);
        self
    }
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-frame chatter (rebuild timings, swap generations)
    Trace,

    /// Build statistics, skipped entities
    Debug,

    Info,

    /// Malformed input that was tolerated
    Warn,

    /// Construction or worker failures (with file:line)
    Error,
}

impl LogSeverity {
    /// Fixed-width label used by the console logger
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    fn colored_label(self) -> ColoredString {
        let label = self.label();
        match self {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        }
    }
}

/// Console logger
///
/// Entries below `min_severity` are discarded. Format:
/// `[timestamp] [SEVERITY] [source] (thread) message (file:line)`, the
/// thread and location parts only when present.
#[derive(Debug, Clone, Copy)]
pub struct DefaultLogger {
    pub min_severity: LogSeverity,
}

impl DefaultLogger {
    pub fn with_min_severity(min_severity: LogSeverity) -> Self {
        Self { min_severity }
    }

    /// Whether an entry of this severity would be printed
    pub fn accepts(&self, severity: LogSeverity) -> bool {
        severity >= self.min_severity
    }

    /// Uncolored rendering of an entry, without the timestamp.
    pub fn format_body(entry: &LogEntry) -> String {
        let mut body = format!("[{}] [{}]", entry.severity.label(), entry.source);
        if let Some(thread) = &entry.thread {
            body.push_str(&format!(" ({})", thread));
        }
        body.push(' ');
        body.push_str(&entry.message);
        if let (Some(file), Some(line)) = (entry.file, entry.line) {
            body.push_str(&format!(" ({}:{})", file, line));
        }
        body
    }
}

impl Default for DefaultLogger {
    fn default() -> Self {
        Self { min_severity: LogSeverity::Info }
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        if !self.accepts(entry.severity) {
            return;
        }

        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f");
        let thread = entry
            .thread
            .as_deref()
            .map(|t| format!(" ({})", t).bright_black().to_string())
            .unwrap_or_default();
        let location = match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!(" ({}:{})", file, line),
            _ => String::new(),
        };

        println!(
            "[{}] [{}] [{}]{} {}{}",
            timestamp,
            entry.severity.colored_label(),
            entry.source.bright_blue(),
            thread,
            entry.message,
            location
        );
    }
}

// ===== LOGGING MACROS =====

/// Log at an explicit severity (no file:line)
///
/// ```ignore
/// engine_log!(Trace, "galaxy3d::SceneBvh", "Swapped to generation {}", generation);
/// ```
#[macro_export]
macro_rules! engine_log {
    ($severity:ident, $source:expr, $($arg:tt)*) => {
        $crate::galaxy3d::Engine::log(
            $crate::galaxy3d::log::LogSeverity::$severity,
            $source,
            format!($($arg)*)
        )
    };
}

/// Per-frame message, filtered out by the default logger
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Trace, $source, $($arg)*) };
}

#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Debug, $source, $($arg)*) };
}

#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Info, $source, $($arg)*) };
}

/// ```ignore
/// engine_warn!("galaxy3d::MeshBvh", "Index count {} is not a multiple of 3", count);
/// ```
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Warn, $source, $($arg)*) };
}

/// Log an ERROR with file:line information
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::galaxy3d::Engine::log_detailed(
            $crate::galaxy3d::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an ERROR and build the matching `Error` variant
///
/// ```ignore
/// return Err(engine_err!("galaxy3d::WorkerPool", WorkerUnavailable, "pool is shut down"));
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $variant:ident, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::galaxy3d::Engine::log_detailed(
            $crate::galaxy3d::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::galaxy3d::Error::$variant(message)
    }};
}

/// Log an ERROR and return early with the matching `Error` variant
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $variant:ident, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $variant, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
