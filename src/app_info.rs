use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::env;
use std::path::{Path, PathBuf};

static APP_INFO: Lazy<AppInfo> = Lazy::new(AppInfo::capture);

/// Identity of the running process, captured once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    /// When the info was first captured (effectively process start)
    pub start_time: DateTime<Utc>,
    /// Absolute path of the executable
    pub full_name: PathBuf,
    /// Directory containing the executable
    pub exec_path: PathBuf,
    /// Executable file name
    pub exec_name: String,
    /// Executable file name without its last extension
    pub name: String,
    /// Working directory at startup
    pub work_dir: PathBuf,
    pub version: &'static str,
}

impl AppInfo {
    /// Reads process identity from the environment
    ///
    /// Paths that cannot be determined are left empty.
    pub fn capture() -> Self {
        let full_name = env::current_exe()
            .map(|p| absolute(&p))
            .unwrap_or_default();
        let work_dir = env::current_dir().unwrap_or_default();
        Self::from_parts(Utc::now(), full_name, work_dir)
    }

    fn from_parts(start_time: DateTime<Utc>, full_name: PathBuf, work_dir: PathBuf) -> Self {
        let exec_path = full_name
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let exec_name = full_name
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = full_name
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        AppInfo {
            start_time,
            full_name,
            exec_path,
            exec_name,
            name,
            work_dir,
            version: crate::PROGRAM_VERSION,
        }
    }

    /// Time elapsed since `start_time`
    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.start_time
    }
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Process-wide `AppInfo`, captured on first call
pub fn app_info() -> &'static AppInfo {
    &APP_INFO
}
