//! Configuration constants and utilities for rat
//!
//! Locations of the mode file and the environment variables that control
//! logging.

use std::path::PathBuf;

/// Default mode file path
pub const DEFAULT_MODES_PATH: &str = "~/.rat/modes.ini";

/// Environment variable name for overriding the mode file path
pub const MODES_PATH_ENV_VAR: &str = "RAT_MODES_PATH";

/// Environment variable naming the log file; logging is off when unset
pub const LOG_FILE_ENV_VAR: &str = "RAT_LOG_FILE";

/// Environment variable holding the log filter, e.g. `debug` or `rat=trace`
pub const LOG_LEVEL_ENV_VAR: &str = "RAT_LOG_LEVEL";

/// Log filter used when `RAT_LOG_LEVEL` is unset
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Get the mode file path, checking the environment variable first, then
/// falling back to the default. A leading `~` is expanded.
pub fn get_modes_path() -> PathBuf {
    let raw = std::env::var_os(MODES_PATH_ENV_VAR)
        .and_then(|val| val.into_string().ok())
        .unwrap_or_else(|| DEFAULT_MODES_PATH.to_string());
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}

/// Log file path, if logging was requested
pub fn get_log_file() -> Option<PathBuf> {
    std::env::var_os(LOG_FILE_ENV_VAR)
        .filter(|val| !val.is_empty())
        .map(|val| PathBuf::from(shellexpand::tilde(&val.to_string_lossy()).into_owned()))
}

/// Log filter directive
pub fn get_log_level() -> String {
    std::env::var(LOG_LEVEL_ENV_VAR).unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
}
