//! Application lifecycle library
//!
//! Coordinates graceful shutdown of a multi-threaded process: a stop request
//! releases every waiter and interrupts sleeping workers, `exit` runs the
//! registered finalizers once in reverse order, and an escalation timer
//! forces completion (then kills the process) when shutdown stalls.
//! Also provides the logging sink, timing configuration, OS signal wiring,
//! exit codes and process identity used around it.

pub mod app_info;
pub mod cli;
pub mod config;
pub mod exit_codes;
pub mod finalizer;
pub mod logging;
pub mod shutdown;
#[cfg(unix)]
pub mod signals;
pub mod stop_signal;

// Re-export key items for easy use by the binary (main.rs)
pub use app_info::{app_info, AppInfo};
pub use config::LifecycleConfig;
pub use logging::{log, set_log_file, Level, Logger, StdLogger};
pub use shutdown::{Lifecycle, LifecycleBuilder, ProcessTerminator, Terminator};
#[cfg(unix)]
pub use signals::{install_signal_handler, SignalHandler};

/// Name of the program used in usage and version output
pub const PROGRAM_NAME: &str = "proclife";

/// Current version of the program (from Cargo.toml)
pub const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");
