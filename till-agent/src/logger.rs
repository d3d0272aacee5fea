//! Logging Infrastructure
//!
//! Human-readable logs go to stderr so stdout stays clean for JSON output.
//! With a log directory configured, logs go to a daily rolling file instead.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialize the logger
///
/// `RUST_LOG` wins over `level` when set.
pub fn init_logger(level: &str, log_dir: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir
        && dir.is_dir()
    {
        let file_appender = tracing_appender::rolling::daily(dir, "till-agent");
        subscriber.with_ansi(false).with_writer(file_appender).init();
        return;
    }

    subscriber.with_writer(std::io::stderr).init();
}
