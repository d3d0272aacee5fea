use std::path::PathBuf;

use till_printer::PrinterConfig;

/// Agent configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | LOG_LEVEL | info | Log filter when `RUST_LOG` is unset |
/// | LOG_DIR | (unset) | Directory for daily rolling log files |
///
/// Printer settings come from [`PrinterConfig::from_env`].
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub printer: PrinterConfig,
}

impl AgentConfig {
    pub fn from_env() -> Self {
        Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR")
                .ok()
                .filter(|d| !d.is_empty())
                .map(PathBuf::from),
            printer: PrinterConfig::from_env(),
        }
    }
}
