//! Application lifecycle coordinator
//!
//! A `Lifecycle` tracks whether the application is running, releases every
//! waiter when a stop is requested, and runs the finalizer chain exactly once
//! on `exit`. A stop request also arms a two-stage escalation so a shutdown
//! that stalls still ends the process:
//!
//! 1. after the termination timeout, if nobody called `exit` yet, `exit` is
//!    forced from a background thread;
//! 2. after the killing timeout, if the process is still alive, it is
//!    terminated with the stored exit code without running finalizers.

use crate::config::LifecycleConfig;
use crate::finalizer::FinalizerChain;
use crate::logging::{Level, Logger, StdLogger};
use crate::stop_signal::StopSignal;
use crossbeam_channel::Receiver;
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

/// Process-wide coordinator returned by `Lifecycle::global`
static GLOBAL: Lazy<Lifecycle> = Lazy::new(Lifecycle::new);

/// Ends the process
///
/// Called at most once per coordinator.
pub trait Terminator: Send + Sync {
    fn terminate(&self, code: i32);
}

/// Terminates via `std::process::exit`
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&self, code: i32) {
        std::process::exit(code);
    }
}

struct Inner {
    /// 1 while running; the 1 -> 0 transition is the stop
    run_state: AtomicI32,
    exit_launched: AtomicBool,
    terminated: AtomicBool,
    exit_code: AtomicI32,
    stop: StopSignal,
    sleep_interrupt: StopSignal,
    finalizers: Mutex<FinalizerChain>,
    config: Mutex<LifecycleConfig>,
    logger: Arc<dyn Logger>,
    terminator: Arc<dyn Terminator>,
}

/// Handle to a lifecycle coordinator
///
/// Cloning is cheap; all clones share the same state.
#[derive(Clone)]
pub struct Lifecycle {
    inner: Arc<Inner>,
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("running", &self.is_running())
            .field("exit_code", &self.exit_code())
            .field("exit_launched", &self.is_exit_launched())
            .finish()
    }
}

/// Builder for `Lifecycle`
pub struct LifecycleBuilder {
    config: LifecycleConfig,
    logger: Arc<dyn Logger>,
    terminator: Arc<dyn Terminator>,
}

impl Default for LifecycleBuilder {
    fn default() -> Self {
        LifecycleBuilder {
            config: LifecycleConfig::default(),
            logger: Arc::new(StdLogger),
            terminator: Arc::new(ProcessTerminator),
        }
    }
}

impl LifecycleBuilder {
    pub fn config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn terminator(mut self, terminator: Arc<dyn Terminator>) -> Self {
        self.terminator = terminator;
        self
    }

    pub fn build(self) -> Lifecycle {
        Lifecycle {
            inner: Arc::new(Inner {
                run_state: AtomicI32::new(1),
                exit_launched: AtomicBool::new(false),
                terminated: AtomicBool::new(false),
                exit_code: AtomicI32::new(0),
                stop: StopSignal::new(),
                sleep_interrupt: StopSignal::new(),
                finalizers: Mutex::new(FinalizerChain::new()),
                config: Mutex::new(self.config),
                logger: self.logger,
                terminator: self.terminator,
            }),
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// Running coordinator with default timings, `StdLogger` and `ProcessTerminator`
    pub fn new() -> Self {
        LifecycleBuilder::default().build()
    }

    pub fn builder() -> LifecycleBuilder {
        LifecycleBuilder::default()
    }

    /// Process-wide coordinator, created on first use
    pub fn global() -> &'static Lifecycle {
        &GLOBAL
    }

    /// `true` until the first stop request
    pub fn is_running(&self) -> bool {
        self.inner.run_state.load(Ordering::SeqCst) > 0
    }

    /// Exit code stored by the winning stop request (0 before that)
    pub fn exit_code(&self) -> i32 {
        self.inner.exit_code.load(Ordering::SeqCst)
    }

    /// `true` once some caller has entered `exit`
    pub fn is_exit_launched(&self) -> bool {
        self.inner.exit_launched.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> LifecycleConfig {
        *self.lock_config()
    }

    /// Replaces the escalation timeouts, returning the previous pair
    ///
    /// A zero duration keeps the current value for that stage.
    pub fn set_timeouts(&self, termination: Duration, killing: Duration) -> (Duration, Duration) {
        let mut config = self.lock_config();
        let previous = (config.termination_timeout, config.killing_timeout);
        if !termination.is_zero() {
            config.termination_timeout = termination;
        }
        if !killing.is_zero() {
            config.killing_timeout = killing;
        }
        previous
    }

    /// Requests application stop with the given exit code
    ///
    /// Only the first call has an effect: it stores `code`, releases every
    /// `wait_for_stop` caller, interrupts every `interruptible_sleep` and arms
    /// the escalation timer. Later calls return immediately.
    pub fn request_stop(&self, code: i32) {
        if self.inner.run_state.fetch_sub(1, Ordering::SeqCst) != 1 {
            return;
        }

        self.inner.exit_code.store(code, Ordering::SeqCst);
        self.log(Level::Debug, &format!("Set application exit code {}", code));

        self.inner.stop.fire();

        let config = self.config();
        thread::sleep(config.settle_delay);
        self.inner.sleep_interrupt.fire();
        thread::sleep(config.settle_delay);

        self.arm_escalation(config.termination_timeout, config.killing_timeout);
    }

    /// Blocks until a stop is requested
    ///
    /// Returns immediately if the stop already happened.
    pub fn wait_for_stop(&self) {
        self.inner.stop.wait();
    }

    /// Receiver that disconnects when a stop is requested
    ///
    /// For event loops built on `crossbeam_channel::select!`; `recv` on it
    /// returns `Err` once the application is stopping.
    pub fn stop_receiver(&self) -> Receiver<()> {
        self.inner.stop.receiver()
    }

    /// Sleeps for `duration` unless the application stops first
    ///
    /// # Returns
    /// `true` if the full duration elapsed, `false` if the coordinator is not
    /// running or the sleep was interrupted by a stop request
    pub fn interruptible_sleep(&self, duration: Duration) -> bool {
        if !self.is_running() {
            return false;
        }
        !self.inner.sleep_interrupt.wait_timeout(duration)
    }

    /// Registers a finalizer, replacing any previous one with the same name
    ///
    /// Finalizers run in reverse registration order during `exit`, each
    /// receiving the final exit code and its `param`. Register them during
    /// startup; a finalizer added after `exit` began draining is never called.
    pub fn add_finalizer<P, F>(&self, name: &str, param: P, f: F)
    where
        P: Send + 'static,
        F: FnOnce(i32, P) + Send + 'static,
    {
        self.lock_finalizers().add(name, param, f);
    }

    /// Unregisters the named finalizer; no-op if absent
    pub fn remove_finalizer(&self, name: &str) {
        self.lock_finalizers().remove(name);
    }

    /// Names of registered finalizers in registration order
    pub fn finalizer_names(&self) -> Vec<String> {
        self.lock_finalizers()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Finishes the application
    ///
    /// Only the first caller proceeds; everybody else returns at once. The
    /// winner stops the application if still running, waits the exit grace
    /// period, runs the finalizer chain newest-first and terminates the
    /// process with the stored exit code. A panicking finalizer aborts the
    /// chain; the escalation timer then kills the process.
    pub fn exit(&self) {
        if self.inner.exit_launched.swap(true, Ordering::SeqCst) {
            return;
        }

        if self.is_running() {
            self.request_stop(0);
        }
        // a concurrent winning request_stop may still be storing its code
        self.inner.stop.wait();

        let code = self.exit_code();
        self.log(Level::Info, &format!("Try to finish application with code {}", code));

        thread::sleep(self.config().exit_grace);

        // the lock is released before any callback runs
        let chain: Vec<_> = self.lock_finalizers().drain_lifo().collect();
        for finalizer in chain {
            self.log(Level::Debug, &format!("Call finalizer \"{}\"", finalizer.name()));
            finalizer.call(code);
        }

        self.log(Level::Info, &format!("Application finished with code {}", code));
        self.terminate();
    }

    fn arm_escalation(&self, termination: Duration, killing: Duration) {
        let lifecycle = self.clone();
        let spawned = thread::Builder::new()
            .name("proclife-escalation".to_string())
            .spawn(move || lifecycle.escalate(termination, killing));

        if let Err(e) = spawned {
            let message = format!("Unable to start shutdown escalation timer: {}", e);
            self.log(Level::Critical, &message);
        }
    }

    fn escalate(&self, termination: Duration, killing: Duration) {
        thread::sleep(termination);
        if !self.is_exit_launched() {
            self.log(Level::Critical, "Application shutdown timeout. Forced completion.");
            let lifecycle = self.clone();
            let spawned = thread::Builder::new()
                .name("proclife-forced-exit".to_string())
                .spawn(move || lifecycle.exit());
            if let Err(e) = spawned {
                self.log(Level::Critical, &format!("Unable to force exit: {}", e));
            }
        }

        thread::sleep(killing);
        if !self.inner.terminated.load(Ordering::SeqCst) {
            self.log(Level::Critical, "Application forced completion timeout. Forced killing.");
            self.terminate();
        }
    }

    fn terminate(&self) {
        if !self.inner.terminated.swap(true, Ordering::SeqCst) {
            self.inner.terminator.terminate(self.exit_code());
        }
    }

    /// Writes through the coordinator's logger with an empty facility
    pub fn log(&self, level: Level, message: &str) {
        self.inner.logger.log("", level, message);
    }

    fn lock_finalizers(&self) -> MutexGuard<'_, FinalizerChain> {
        self.inner
            .finalizers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn lock_config(&self) -> MutexGuard<'_, LifecycleConfig> {
        self.inner.config.lock().unwrap_or_else(|e| e.into_inner())
    }
}
