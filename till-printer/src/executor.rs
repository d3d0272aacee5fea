//! Print job executor
//!
//! Delivers formatted receipt text to a device: raw ESC/POS bytes over the
//! open serial link, or a temp file pushed through the queue strategy chain.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempPath;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::config::PrinterConfig;
use crate::connection::ConnectionState;
use crate::error::{PrintError, PrintResult, StrategyError};
use crate::escpos;
use crate::strategy::{Cleanup, QueueJob, QueueStrategy};
use crate::types::{DeviceClass, DeviceDescriptor, PrintOutcome};

/// Print job executor
pub struct PrintExecutor {
    strategies: Vec<Box<dyn QueueStrategy>>,
    temp_dir: PathBuf,
    temp_grace: Duration,
    serial_settle: Duration,
    /// Deferred temp-file removals still waiting out the grace delay
    pending: Mutex<JoinSet<()>>,
}

impl PrintExecutor {
    pub fn new(strategies: Vec<Box<dyn QueueStrategy>>, config: &PrinterConfig) -> Self {
        Self {
            strategies,
            temp_dir: config.temp_dir.clone(),
            temp_grace: config.temp_grace,
            serial_settle: config.serial_settle,
            pending: Mutex::new(JoinSet::new()),
        }
    }

    /// Wait for every deferred temp-file removal to run
    ///
    /// Call before the runtime shuts down; dropping a pending removal
    /// deletes its file without the grace delay.
    pub async fn flush(&self) {
        let mut pending = std::mem::replace(&mut *self.pending.lock(), JoinSet::new());
        if !pending.is_empty() {
            debug!(count = pending.len(), "Waiting for temp file cleanup");
        }
        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Temp file cleanup task failed");
            }
        }
    }

    /// Deliver `content` to `device`
    ///
    /// The caller holds the connection lock for the whole call.
    #[instrument(
        skip(self, state, content),
        fields(path = %device.path, class = ?device.device_class)
    )]
    pub async fn print(
        &self,
        state: &ConnectionState,
        content: &str,
        device: &DeviceDescriptor,
    ) -> PrintResult<PrintOutcome> {
        match device.device_class {
            DeviceClass::Serial => self.print_serial(state, content, &device.path).await,
            DeviceClass::Queue => self.print_queue(content, &device.path).await,
        }
    }

    async fn print_serial(
        &self,
        state: &ConnectionState,
        content: &str,
        port: &str,
    ) -> PrintResult<PrintOutcome> {
        let link = state
            .link_for(port)
            .ok_or_else(|| PrintError::NotConnected(format!("serial port {} is not open", port)))?;

        let data = escpos::encode(content);
        let len = data.len();
        info!(port, bytes = len, "Writing to serial port");

        let drained = tokio::task::spawn_blocking(move || {
            let mut link = link.lock();
            link.write_all(&data)?;
            link.drain()
        })
        .await
        .map_err(|e| PrintError::Task(e.to_string()))?
        .map_err(|source| PrintError::SerialWrite {
            port: port.to_string(),
            source,
        })?;

        if !drained {
            tokio::time::sleep(self.serial_settle).await;
        }

        info!(port, bytes = len, "Serial print sent");
        Ok(PrintOutcome::ok(format!("Sent {} bytes to {}", len, port)))
    }

    async fn print_queue(&self, content: &str, queue: &str) -> PrintResult<PrintOutcome> {
        let temp = self.write_temp(content).await?;
        let job = QueueJob {
            queue,
            file: &temp,
            content,
        };

        let mut last_cause = String::from("no print strategies available");

        for strategy in &self.strategies {
            info!(strategy = strategy.name(), queue, "Attempting print");

            let result = match strategy.timeout() {
                Some(limit) => tokio::time::timeout(limit, strategy.attempt(job))
                    .await
                    .unwrap_or(Err(StrategyError::TimedOut(limit.as_millis()))),
                None => strategy.attempt(job).await,
            };

            match result {
                Ok(()) => {
                    info!(strategy = strategy.name(), queue, "Print job sent");
                    self.cleanup(temp, strategy.cleanup());
                    return Ok(PrintOutcome::ok(format!(
                        "Printed to {} via {}",
                        queue,
                        strategy.name()
                    )));
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "Strategy failed, trying next");
                    last_cause = format!("{}: {}", strategy.name(), e);
                }
            }
        }

        self.cleanup(temp, Cleanup::Immediate);
        Err(PrintError::StrategiesExhausted {
            queue: queue.to_string(),
            last_cause,
        })
    }

    async fn write_temp(&self, content: &str) -> PrintResult<TempPath> {
        let dir = self.temp_dir.clone();
        let body = content.to_string();

        tokio::task::spawn_blocking(move || -> std::io::Result<TempPath> {
            std::fs::create_dir_all(&dir)?;
            let mut file = tempfile::Builder::new()
                .prefix("print_")
                .suffix(".txt")
                .tempfile_in(&dir)?;
            file.write_all(body.as_bytes())?;
            file.flush()?;
            // Close our handle so the spooler can open the file
            Ok(file.into_temp_path())
        })
        .await
        .map_err(|e| PrintError::Task(e.to_string()))?
        .map_err(PrintError::TempFile)
    }

    fn cleanup(&self, temp: TempPath, when: Cleanup) {
        match when {
            Cleanup::Immediate => remove_temp(temp),
            Cleanup::Deferred => {
                let grace = self.temp_grace;
                let mut pending = self.pending.lock();
                // Reap finished removals so the set stays small
                while pending.try_join_next().is_some() {}
                pending.spawn(async move {
                    tokio::time::sleep(grace).await;
                    remove_temp(temp);
                });
            }
        }
    }
}

fn remove_temp(temp: TempPath) {
    let path = temp.to_path_buf();
    if let Err(e) = temp.close() {
        warn!(path = %path.display(), error = %e, "Temp file cleanup failed");
    }
}
