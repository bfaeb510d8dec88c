use chrono::Local;
use once_cell::sync::Lazy;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

/// Global log file path protected by Mutex
///
/// Thread-safe storage for optional log file path.
/// When None, logs go to stdout.
pub static LOG_FILE: Lazy<Mutex<Option<String>>> = Lazy::new(|| Mutex::new(None));

/// Severity of a log record
///
/// Each level is rendered as a two-letter code in the log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Detail messages (`DE`)
    Debug,
    /// Informational messages (`IN`)
    Info,
    /// Errors (`ER`)
    Error,
    /// Critical conditions (`CR`)
    Critical,
}

impl Level {
    /// Two-letter code used in log lines
    pub fn code(&self) -> &'static str {
        match self {
            Level::Debug => "DE",
            Level::Info => "IN",
            Level::Error => "ER",
            Level::Critical => "CR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Destination for lifecycle log records
///
/// Shared with background threads, so implementations must be `Send + Sync`.
/// `facility` may be empty.
pub trait Logger: Send + Sync {
    fn log(&self, facility: &str, level: Level, message: &str);
}

/// Logger that writes through the process-wide sink (`log`)
#[derive(Debug, Default, Clone, Copy)]
pub struct StdLogger;

impl Logger for StdLogger {
    fn log(&self, facility: &str, level: Level, message: &str) {
        let _ = log(facility, level, message);
    }
}

/// Formats a single log line (without trailing newline)
fn format_line(facility: &str, level: Level, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    if facility.is_empty() {
        format!("{} {} {}", timestamp, level, message)
    } else {
        format!("{} {} [{}] {}", timestamp, level, facility, message)
    }
}

/// Logs a message with timestamp and level to configured output
///
/// If a log file has been set (using `set_log_file`), the line is appended to
/// that file. Otherwise it is printed to stdout.
///
/// # Arguments
/// * `facility` - Subsystem name, may be empty
/// * `level` - Severity
/// * `message` - The message to log
///
/// # Returns
/// * `io::Result<()>` - Ok on success, Err if writing fails
pub fn log(facility: &str, level: Level, message: &str) -> io::Result<()> {
    let line = format_line(facility, level, message);

    let guard = LOG_FILE.lock().unwrap_or_else(|e| e.into_inner());
    match &*guard {
        Some(log_file) => {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)?;
            writeln!(file, "{}", line)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", line)?;
        }
    }

    Ok(())
}

/// Sets the path for the log file
///
/// Subsequent calls to `log` append to this file.
///
/// # Errors
/// Returns `InvalidInput` if the path is not valid UTF-8
pub fn set_log_file<P: AsRef<Path>>(path: P) -> io::Result<()> {
    let path_str = path.as_ref().to_str().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "log file path is not valid UTF-8")
    })?;
    *LOG_FILE.lock().unwrap_or_else(|e| e.into_inner()) = Some(path_str.to_string());
    Ok(())
}

/// Switches logging back to stdout
pub fn clear_log_file() {
    *LOG_FILE.lock().unwrap_or_else(|e| e.into_inner()) = None;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{Level, Logger};
    use std::sync::Mutex;

    /// Logger that keeps records in memory
    #[derive(Default)]
    pub struct RecordingLogger {
        records: Mutex<Vec<(String, Level, String)>>,
    }

    impl RecordingLogger {
        pub fn records(&self) -> Vec<(String, Level, String)> {
            self.records.lock().unwrap().clone()
        }

        pub fn count(&self, level: Level) -> usize {
            self.records
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, l, _)| *l == level)
                .count()
        }

        pub fn messages(&self) -> Vec<String> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .map(|(_, _, m)| m.clone())
                .collect()
        }
    }

    impl Logger for RecordingLogger {
        fn log(&self, facility: &str, level: Level, message: &str) {
            self.records
                .lock()
                .unwrap()
                .push((facility.to_string(), level, message.to_string()));
        }
    }
}
