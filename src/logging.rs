use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use crate::app_dirs::AppDirs;

/// Environment variable holding the `env_logger` filter
pub const LOG_ENV: &str = "MATHMANIA_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Route log records to the state-dir log file. The terminal belongs to the
/// UI, so when no file can be opened logging stays off.
pub fn init() -> Option<PathBuf> {
    let path = AppDirs::log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;

    env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_ENV, DEFAULT_FILTER))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .ok()?;

    Some(path)
}
