//! Conventional application exit codes (mostly from `sysexits.h`)

pub const SUCCESS: i32 = 0;
/// Stopped by request
pub const STOPPED: i32 = 1;
/// Version printed, nothing else done
pub const VERSION: i32 = 64;
pub const MISSING_CONFIG_FILE: i32 = 66;
pub const INCORRECT_CONFIG_FILE: i32 = 78;
pub const CONFIG_INCORRECT: i32 = 78;
pub const CONFIG_ERRORS: i32 = 78;
pub const CREATE_LISTENER_ERROR: i32 = 71;
pub const START_LISTENER_ERROR: i32 = 71;
pub const SERVICE_INITIALIZATION_ERROR: i32 = 71;
pub const SERVICE_ERROR: i32 = 71;
pub const ACCESS_DENIED: i32 = 77;
/// Internal software error
pub const PROGRAMMER_ERROR: i32 = 70;
pub const PANIC: i32 = 70;
