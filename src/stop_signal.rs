//! One-shot wake-all signal
//!
//! The signal is a crossbeam channel on which nothing is ever sent. Firing it
//! drops the only sender, which disconnects every receiver at once: threads
//! already blocked wake up, and later waiters return immediately, so a waiter
//! can never miss the signal.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug)]
pub struct StopSignal {
    sender: Mutex<Option<Sender<()>>>,
    receiver: Receiver<()>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    pub fn new() -> Self {
        let (sender, receiver) = bounded(0);
        StopSignal {
            sender: Mutex::new(Some(sender)),
            receiver,
        }
    }

    /// Fires the signal. Returns `false` if it had already fired.
    pub fn fire(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .is_some()
    }

    /// Blocks until the signal fires
    pub fn wait(&self) {
        let _ = self.receiver.recv();
    }

    /// Blocks for at most `timeout`.
    ///
    /// Returns `true` if the signal fired, `false` if the timeout elapsed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => false,
            // nothing is ever sent, so Ok is unreachable in practice
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }

    /// Receiver that becomes disconnected once the signal fires.
    ///
    /// Usable in `crossbeam_channel::select!` next to other channels.
    pub fn receiver(&self) -> Receiver<()> {
        self.receiver.clone()
    }
}
