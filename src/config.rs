use serde::Deserialize;
use std::env;
use std::fs;
use std::io::{Error, ErrorKind};
use std::path::Path;
use std::time::Duration;

/// Default time between a stop request and the forced `exit`
pub const DEFAULT_TERMINATION_TIMEOUT: Duration = Duration::from_millis(5000);
/// Default time between the forced `exit` and the hard kill
pub const DEFAULT_KILLING_TIMEOUT: Duration = Duration::from_millis(5000);
/// Default pause around the sleep interrupt in `request_stop`
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);
/// Default drain delay before finalizers run
pub const DEFAULT_EXIT_GRACE: Duration = Duration::from_millis(1000);

/// Environment variables overriding the config file (values in milliseconds)
pub const ENV_TERMINATION_TIMEOUT: &str = "PROCLIFE_TERMINATION_TIMEOUT_MS";
pub const ENV_KILLING_TIMEOUT: &str = "PROCLIFE_KILLING_TIMEOUT_MS";
pub const ENV_SETTLE_DELAY: &str = "PROCLIFE_SETTLE_DELAY_MS";
pub const ENV_EXIT_GRACE: &str = "PROCLIFE_EXIT_GRACE_MS";

/// Shutdown timing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Stage 1 of the escalation: stop request -> forced `exit`
    pub termination_timeout: Duration,
    /// Stage 2 of the escalation: forced `exit` -> hard kill
    pub killing_timeout: Duration,
    /// Pause before and after interrupting sleepers
    pub settle_delay: Duration,
    /// Pause between the exit announcement and the finalizer chain
    pub exit_grace: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        LifecycleConfig {
            termination_timeout: DEFAULT_TERMINATION_TIMEOUT,
            killing_timeout: DEFAULT_KILLING_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            exit_grace: DEFAULT_EXIT_GRACE,
        }
    }
}

/// On-disk form; every field is optional and falls back to the default
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(rename = "termination_timeout_ms")]
    termination_timeout: Option<u64>,
    #[serde(rename = "killing_timeout_ms")]
    killing_timeout: Option<u64>,
    #[serde(rename = "settle_delay_ms")]
    settle_delay: Option<u64>,
    #[serde(rename = "exit_grace_ms")]
    exit_grace: Option<u64>,
}

impl LifecycleConfig {
    /// Parses a JSON config document
    ///
    /// # Errors
    /// `InvalidInput` on malformed JSON or unknown fields
    ///
    /// # File Format
    /// ```text
    /// {"termination_timeout_ms": 5000, "killing_timeout_ms": 5000,
    ///  "settle_delay_ms": 100, "exit_grace_ms": 1000}
    /// ```
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let raw: RawConfig = serde_json::from_str(text).map_err(|e| {
            Error::new(ErrorKind::InvalidInput, format!("invalid lifecycle config: {}", e))
        })?;

        let mut config = LifecycleConfig::default();
        if let Some(ms) = raw.termination_timeout {
            config.termination_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = raw.killing_timeout {
            config.killing_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = raw.settle_delay {
            config.settle_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = raw.exit_grace {
            config.exit_grace = Duration::from_millis(ms);
        }
        Ok(config)
    }

    /// Reads and parses a JSON config file
    ///
    /// # Errors
    /// - File not found or unreadable
    /// - Invalid JSON or unknown fields
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            Error::new(e.kind(), format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Overrides fields from `PROCLIFE_*_MS` environment variables
    ///
    /// Unset variables leave the field untouched.
    ///
    /// # Errors
    /// `InvalidInput` if a variable is set but is not a non-negative integer
    pub fn apply_env(mut self) -> Result<Self, Error> {
        if let Some(d) = env_millis(ENV_TERMINATION_TIMEOUT)? {
            self.termination_timeout = d;
        }
        if let Some(d) = env_millis(ENV_KILLING_TIMEOUT)? {
            self.killing_timeout = d;
        }
        if let Some(d) = env_millis(ENV_SETTLE_DELAY)? {
            self.settle_delay = d;
        }
        if let Some(d) = env_millis(ENV_EXIT_GRACE)? {
            self.exit_grace = d;
        }
        Ok(self)
    }
}

fn env_millis(name: &str) -> Result<Option<Duration>, Error> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|e| {
                Error::new(
                    ErrorKind::InvalidInput,
                    format!("{}: invalid value {:?}: {}", name, value, e),
                )
            }),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(Error::new(ErrorKind::InvalidInput, format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = LifecycleConfig::default();
        assert_eq!(config.termination_timeout, Duration::from_secs(5));
        assert_eq!(config.killing_timeout, Duration::from_secs(5));
        assert_eq!(config.settle_delay, Duration::from_millis(100));
        assert_eq!(config.exit_grace, Duration::from_secs(1));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = LifecycleConfig::from_json(r#"{"killing_timeout_ms": 200}"#).unwrap();
        assert_eq!(config.killing_timeout, Duration::from_millis(200));
        assert_eq!(config.termination_timeout, DEFAULT_TERMINATION_TIMEOUT);
        assert_eq!(config.exit_grace, DEFAULT_EXIT_GRACE);
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lifecycle.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(
            br#"{"termination_timeout_ms":200,"killing_timeout_ms":300,"settle_delay_ms":0,"exit_grace_ms":10}"#,
        )
        .unwrap();

        let config = LifecycleConfig::from_file(&path).unwrap();
        assert_eq!(
            config,
            LifecycleConfig {
                termination_timeout: Duration::from_millis(200),
                killing_timeout: Duration::from_millis(300),
                settle_delay: Duration::ZERO,
                exit_grace: Duration::from_millis(10),
            }
        );
    }

    #[test]
    fn test_invalid_json_and_unknown_field() {
        let err = LifecycleConfig::from_json("{not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = LifecycleConfig::from_json(r#"{"grace": 1}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = LifecycleConfig::from_file(dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        temp_env::with_vars(
            [
                (ENV_TERMINATION_TIMEOUT, Some("250")),
                (ENV_EXIT_GRACE, Some(" 0 ")),
                (ENV_KILLING_TIMEOUT, None),
                (ENV_SETTLE_DELAY, None),
            ],
            || {
                let config = LifecycleConfig::default().apply_env().unwrap();
                assert_eq!(config.termination_timeout, Duration::from_millis(250));
                assert_eq!(config.exit_grace, Duration::ZERO);
                assert_eq!(config.killing_timeout, DEFAULT_KILLING_TIMEOUT);
            },
        );
    }

    #[test]
    #[serial]
    fn test_env_invalid_value() {
        temp_env::with_var(ENV_KILLING_TIMEOUT, Some("soon"), || {
            let err = LifecycleConfig::default().apply_env().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        });
    }
}
