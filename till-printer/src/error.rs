//! Error types for the printer library

use thiserror::Error;

/// A single enumeration source failed
///
/// Never fatal: discovery logs it and continues with the remaining sources.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// External query command failed or timed out
    #[error("Query command failed: {0}")]
    Command(#[from] CommandError),

    /// Serial port enumeration failed
    #[error("Serial enumeration failed: {0}")]
    Serial(String),

    /// Spooler API enumeration failed
    #[error("Spooler query failed: {0}")]
    Spooler(String),

    /// Source is not available on this platform
    #[error("Source unavailable: {0}")]
    Unavailable(&'static str),
}

/// Requested device cannot be connected
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Empty device path
    #[error("Printer path required")]
    EmptyPath,

    /// The OS refused to open the serial port
    #[error("Cannot open {port}: {source}")]
    CannotOpenPort {
        port: String,
        #[source]
        source: std::io::Error,
    },

    /// Blocking open task did not complete
    #[error("Open task failed: {0}")]
    Task(String),
}

impl ConnectionError {
    /// Stable reason string reported to callers
    pub fn reason(&self) -> &'static str {
        match self {
            ConnectionError::EmptyPath => "printer path required",
            ConnectionError::CannotOpenPort { .. } | ConnectionError::Task(_) => {
                "cannot open port"
            }
        }
    }
}

/// No delivery path succeeded
#[derive(Debug, Error)]
pub enum PrintError {
    /// No printer connected, or the serial target is not the open link
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// Writing to the serial link failed
    #[error("Serial write failed on {port}: {source}")]
    SerialWrite {
        port: String,
        #[source]
        source: std::io::Error,
    },

    /// Every strategy in the queue chain failed
    #[error("All print strategies exhausted for {queue}: {last_cause}")]
    StrategiesExhausted { queue: String, last_cause: String },

    /// Temp file for queue printing could not be written
    #[error("Temp file error: {0}")]
    TempFile(#[source] std::io::Error),

    /// Blocking print task did not complete
    #[error("Print task failed: {0}")]
    Task(String),
}

impl PrintError {
    /// Stable reason string reported to callers
    pub fn reason(&self) -> &'static str {
        match self {
            PrintError::NotConnected(_) => "not connected",
            PrintError::SerialWrite { .. } => "serial write failed",
            PrintError::StrategiesExhausted { .. } => "all print strategies exhausted",
            PrintError::TempFile(_) => "temp file unavailable",
            PrintError::Task(_) => "print task failed",
        }
    }
}

/// External process invocation error
#[derive(Debug, Error)]
pub enum CommandError {
    /// Process could not be started
    #[error("{program}: spawn failed: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Process exited unsuccessfully
    #[error("{program}: exit code {code:?}: {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Process did not finish in time
    #[error("{program}: timed out after {millis}ms")]
    TimedOut { program: String, millis: u128 },
}

/// One fallback-chain attempt failed
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("timed out after {0}ms")]
    TimedOut(u128),

    #[error("native print failed: {0}")]
    Native(String),
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons() {
        assert_eq!(
            PrintError::NotConnected("none".into()).reason(),
            "not connected"
        );
        assert_eq!(
            PrintError::StrategiesExhausted {
                queue: "POS-80".into(),
                last_cause: "boom".into()
            }
            .reason(),
            "all print strategies exhausted"
        );
        let err = ConnectionError::CannotOpenPort {
            port: "COM3".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.reason(), "cannot open port");
        assert!(err.to_string().contains("COM3"));
    }
}
