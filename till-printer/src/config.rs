use std::path::PathBuf;
use std::time::Duration;

/// Printer subsystem configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | PRINT_TEMP_DIR | OS temp dir | Temp files for queue printing |
/// | PRINT_COMMAND_TIMEOUT_MS | 20000 | Timeout per external command |
/// | KITCHEN_PRINT_TIMEOUT_MS | 5000 | Bounded wait for kitchen tickets |
/// | PRINT_TEMP_GRACE_MS | 2000 | Delay before temp file deletion |
/// | SERIAL_SETTLE_MS | 300 | Wait after write when drain is unsupported |
/// | PRINT_FILTER_VIRTUAL | false | Legacy discovery drops PDF/XPS/Fax queues |
/// | RECEIPT_CURRENCY | Rs. | Money prefix |
/// | RECEIPT_FOOTER | Thank You! Visit Again! | Closing message |
#[derive(Debug, Clone)]
pub struct PrinterConfig {
    pub temp_dir: PathBuf,
    pub command_timeout: Duration,
    pub kitchen_timeout: Duration,
    pub temp_grace: Duration,
    pub serial_settle: Duration,
    pub filter_virtual: bool,
    pub currency: String,
    pub footer: String,
}

impl PrinterConfig {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            temp_dir: std::env::var("PRINT_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            command_timeout: env_millis("PRINT_COMMAND_TIMEOUT_MS")
                .unwrap_or(defaults.command_timeout),
            kitchen_timeout: env_millis("KITCHEN_PRINT_TIMEOUT_MS")
                .unwrap_or(defaults.kitchen_timeout),
            temp_grace: env_millis("PRINT_TEMP_GRACE_MS").unwrap_or(defaults.temp_grace),
            serial_settle: env_millis("SERIAL_SETTLE_MS").unwrap_or(defaults.serial_settle),
            filter_virtual: std::env::var("PRINT_FILTER_VIRTUAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.filter_virtual),
            currency: std::env::var("RECEIPT_CURRENCY").unwrap_or(defaults.currency),
            footer: std::env::var("RECEIPT_FOOTER").unwrap_or(defaults.footer),
        }
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
            command_timeout: Duration::from_secs(20),
            kitchen_timeout: Duration::from_secs(5),
            temp_grace: Duration::from_secs(2),
            serial_settle: Duration::from_millis(300),
            filter_virtual: false,
            currency: "Rs.".to_string(),
            footer: "Thank You! Visit Again!".to_string(),
        }
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
}
