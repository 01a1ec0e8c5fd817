//! Logging Infrastructure
//!
//! Structured logging setup for the engine and the demo binary.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialize the logger
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger with optional file output
///
/// `RUST_LOG` takes precedence over `log_level` when set. File output is
/// only enabled when `log_dir` already exists.
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
        if log_path.exists()
            && let Some(dir_str) = log_path.to_str()
        {
            let file_appender = tracing_appender::rolling::daily(dir_str, "hq-engine");
            // try_init: a second call (tests, embedding) keeps the first subscriber
            let _ = subscriber.with_writer(file_appender).try_init();
            return;
        }
    }

    let _ = subscriber.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_with_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        init_logger_with_file(Some("debug"), Some(path));
        // Second initialisation keeps the first subscriber instead of panicking
        init_logger_with_file(Some("info"), Some(path));
        init_logger();
        tracing::info!("logger test line");
    }

    #[test]
    fn test_missing_log_dir_falls_back_to_console() {
        init_logger_with_file(None, Some("/nonexistent/hq-engine-logs"));
    }
}
