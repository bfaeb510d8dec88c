//! OS signal source for the lifecycle coordinator
//!
//! SIGINT and SIGTERM request a stop with exit code 0. Other registered
//! signals (SIGCHLD) are only logged.

use crate::logging::Level;
use crate::shutdown::Lifecycle;
use nix::sys::signal::Signal;
use signal_hook::consts::{SIGCHLD, SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use std::io;
use std::thread::{self, JoinHandle};

/// Signals the handler subscribes to
pub const HANDLED_SIGNALS: [i32; 3] = [SIGINT, SIGTERM, SIGCHLD];

/// Running signal listener thread
#[derive(Debug)]
pub struct SignalHandler {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl SignalHandler {
    /// Stops listening and joins the listener thread
    pub fn close(mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Human readable signal name, e.g. `SIGTERM`
pub fn signal_name(sig: i32) -> String {
    match Signal::try_from(sig) {
        Ok(signal) => signal.as_str().to_string(),
        Err(_) => format!("signal {}", sig),
    }
}

/// Reacts to one delivered signal
fn dispatch(lifecycle: &Lifecycle, sig: i32) {
    match sig {
        SIGINT | SIGTERM => {
            lifecycle.log(Level::Info, &format!("Signal \"{}\" received", signal_name(sig)));
            lifecycle.request_stop(0);
        }
        _ => {
            lifecycle.log(Level::Debug, &format!("Signal \"{}\" received", signal_name(sig)));
        }
    }
}

/// Installs handlers for `HANDLED_SIGNALS` and starts the listener thread
///
/// The listener keeps running after a stop request, so repeated SIGTERMs
/// are logged and ignored rather than killing the process.
///
/// # Errors
/// If signal registration fails or the thread cannot be spawned
pub fn install_signal_handler(lifecycle: &Lifecycle) -> io::Result<SignalHandler> {
    let mut signals = Signals::new(HANDLED_SIGNALS)?;
    let handle = signals.handle();

    let lifecycle = lifecycle.clone();
    let thread = thread::Builder::new()
        .name("proclife-signals".to_string())
        .spawn(move || {
            for sig in signals.forever() {
                dispatch(&lifecycle, sig);
            }
        })?;

    Ok(SignalHandler {
        handle,
        thread: Some(thread),
    })
}
