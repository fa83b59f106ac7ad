//! Logging setup
//!
//! Console output by default, or a daily rolling file when a log directory is
//! given. Hosts that install their own subscriber can skip this module; a
//! second initialisation is ignored.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialize console logging at `info` (overridable through `RUST_LOG`)
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize logging with an optional level and log directory
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.is_dir()
            && let Some(dir_str) = log_path.to_str()
        {
            let file_appender = tracing_appender::rolling::daily(dir_str, "buyagain-cards");
            let _ = subscriber.with_ansi(false).with_writer(file_appender).try_init();
            return;
        }
    }

    let _ = subscriber.try_init();
}
