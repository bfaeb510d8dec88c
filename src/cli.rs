use std::env;
use std::process;

use crate::exit_codes;

/// Default number of demo worker threads
pub const DEFAULT_WORKERS: usize = 2;
/// Default pause between units of work (milliseconds)
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Options for the demo daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// Path to log file (None for stdout)
    pub log_file: Option<String>,
    /// Path to JSON lifecycle config
    pub config_file: Option<String>,
    /// Number of worker threads
    pub workers: usize,
    /// Pause between units of work, milliseconds
    pub interval_ms: u64,
}

impl Default for Args {
    fn default() -> Self {
        Args {
            log_file: None,
            config_file: None,
            workers: DEFAULT_WORKERS,
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

/// Result of parsing the command line
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Version,
    Run(Args),
}

/// Prints usage instructions for the program.
pub fn print_usage() {
    println!(
        "Usage: {} [-h] [-v] [-l logfile] [-c config_file] [-w workers] [-i interval_ms]",
        crate::PROGRAM_NAME
    );
}

fn next_value<I: Iterator<Item = String>>(args: &mut I, what: &str) -> Result<String, String> {
    args.next()
        .ok_or_else(|| format!("Missing {} argument", what))
}

/// Parses arguments (without the program name)
///
/// # Errors
/// Message describing the first bad or missing argument
pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Command, String> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" => return Ok(Command::Help),
            "-v" => return Ok(Command::Version),
            "-l" => parsed.log_file = Some(next_value(&mut args, "log file")?),
            "-c" => parsed.config_file = Some(next_value(&mut args, "config file")?),
            "-w" => {
                parsed.workers = match next_value(&mut args, "workers count")?.parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => return Err("Workers count must be a positive number".to_string()),
                }
            }
            "-i" => {
                parsed.interval_ms = next_value(&mut args, "interval")?
                    .parse()
                    .map_err(|_| "Interval must be a non-negative number".to_string())?
            }
            _ => return Err(format!("Unexpected argument: {}", arg)),
        }
    }

    Ok(Command::Run(parsed))
}

/// Parses process arguments, handling `-h`, `-v` and errors by exiting
pub fn parse_args() -> Args {
    match parse(env::args().skip(1)) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            print_usage();
            process::exit(exit_codes::SUCCESS);
        }
        Ok(Command::Version) => {
            println!("{} version {}", crate::PROGRAM_NAME, crate::PROGRAM_VERSION);
            process::exit(exit_codes::VERSION);
        }
        Err(message) => {
            eprintln!("Error: {}", message);
            print_usage();
            process::exit(exit_codes::CONFIG_INCORRECT);
        }
    }
}
