use proclife::{
    app_info, cli, exit_codes, install_signal_handler, log, set_log_file, Level, Lifecycle,
    LifecycleConfig,
};
use rand::Rng;
use std::io::ErrorKind;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

fn load_config(path: Option<&str>) -> LifecycleConfig {
    let loaded = match path {
        Some(path) => LifecycleConfig::from_file(path),
        None => Ok(LifecycleConfig::default()),
    };

    match loaded.and_then(LifecycleConfig::apply_env) {
        Ok(config) => config,
        Err(e) => {
            let _ = log("", Level::Error, &format!("Error loading config: {}", e));
            let code = if e.kind() == ErrorKind::NotFound {
                exit_codes::MISSING_CONFIG_FILE
            } else {
                exit_codes::CONFIG_INCORRECT
            };
            process::exit(code);
        }
    }
}

/// Runs units of work until the application stops
fn worker(lifecycle: Lifecycle, id: usize, interval: Duration, done: Arc<AtomicU64>) {
    let mut rng = rand::thread_rng();
    loop {
        let unit = done.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = log(&format!("worker-{}", id), Level::Debug, &format!("Unit {} done", unit));

        // jitter keeps workers from ticking in lockstep
        let jitter = Duration::from_millis(rng.gen_range(0..=interval.as_millis() as u64 / 10));
        if !lifecycle.interruptible_sleep(interval + jitter) {
            break;
        }
    }
    let _ = log(&format!("worker-{}", id), Level::Debug, "Stopped");
}

fn main() {
    let args = cli::parse_args();
    if let Some(log_file) = &args.log_file {
        if let Err(e) = set_log_file(log_file) {
            eprintln!("Error: {}", e);
            process::exit(exit_codes::CONFIG_INCORRECT);
        }
    }

    let config = load_config(args.config_file.as_deref());
    let lifecycle = Lifecycle::builder().config(config).build();

    let info = app_info();
    lifecycle.log(
        Level::Info,
        &format!(
            "{} {} started, pid {}, work dir {}",
            info.name,
            info.version,
            process::id(),
            info.work_dir.display()
        ),
    );

    let _signals = match install_signal_handler(&lifecycle) {
        Ok(handler) => handler,
        Err(e) => {
            lifecycle.log(Level::Error, &format!("Error setting signal handler: {}", e));
            process::exit(exit_codes::SERVICE_INITIALIZATION_ERROR);
        }
    };

    let done = Arc::new(AtomicU64::new(0));
    let interval = Duration::from_millis(args.interval_ms);
    let mut workers: Vec<JoinHandle<()>> = Vec::with_capacity(args.workers);
    for id in 1..=args.workers {
        let lifecycle_for_worker = lifecycle.clone();
        let done = Arc::clone(&done);
        let spawned = thread::Builder::new()
            .name(format!("worker-{}", id))
            .spawn(move || worker(lifecycle_for_worker, id, interval, done));
        match spawned {
            Ok(handle) => workers.push(handle),
            Err(e) => {
                lifecycle.log(Level::Error, &format!("Unable to start worker {}: {}", id, e));
                lifecycle.request_stop(exit_codes::SERVICE_INITIALIZATION_ERROR);
                break;
            }
        }
    }

    // runs last
    lifecycle.add_finalizer("report", done, |code, done| {
        let _ = log(
            "",
            Level::Info,
            &format!(
                "{} units done in {}s, exit code {}",
                done.load(Ordering::SeqCst),
                app_info().uptime().num_seconds(),
                code
            ),
        );
    });
    lifecycle.add_finalizer("workers", workers, |_, workers| {
        for handle in workers {
            let _ = handle.join();
        }
    });

    lifecycle.wait_for_stop();
    lifecycle.exit();
}
