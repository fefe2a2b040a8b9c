/// Galaxy3D Engine - global logging facade for the spatial subsystem
///
/// The spatial structures are owned by the caller and receive their
/// collaborators explicitly (scene store, worker pool). The only process-wide
/// state is the logger, stored behind a `OnceLock<RwLock<..>>` so that the
/// `engine_*` macros can reach it from any thread.

use std::sync::{OnceLock, RwLock};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn logger_lock() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::default())))
}

// ===== PUBLIC API =====

/// Engine facade
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_spatial::galaxy3d::{Engine, log::{Logger, LogEntry}};
///
/// struct FileLogger;
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
///
/// Engine::set_logger(FileLogger);
/// ```
pub struct Engine;

impl Engine {
    /// Replace the global logger
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = logger_lock().write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset the global logger to `DefaultLogger::default()`
    pub fn reset_logger() {
        if let Ok(mut lock) = logger_lock().write() {
            *lock = Box::new(DefaultLogger::default());
        }
    }

    /// Dispatch an entry to the installed logger
    ///
    /// A poisoned lock drops the entry rather than panicking in the caller.
    pub fn dispatch(entry: &LogEntry) {
        if let Ok(lock) = logger_lock().read() {
            lock.log(entry);
        }
    }

    /// Log without location, stamped with the calling thread's name
    ///
    /// Backs engine_trace! through engine_warn!.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(&LogEntry::now(severity, source, message));
    }

    /// Log with file:line (engine_error!, engine_err!, engine_bail!)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(&LogEntry::now(severity, source, message).at(file, line));
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
