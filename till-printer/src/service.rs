//! Printer service
//!
//! Front door for the POS: discovery, the single active connection, and the
//! three print operations. One instance is shared by the whole process.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use crate::config::PrinterConfig;
use crate::connection::ConnectionManager;
use crate::discovery::Discovery;
use crate::error::{ConnectionError, PrintError, PrintResult};
use crate::executor::PrintExecutor;
use crate::link::{LinkOpener, SerialPortOpener};
use crate::process::{CommandRunner, SystemRunner};
use crate::receipt::{ReceiptFormatter, ReceiptKind, sample_order};
use crate::strategy::default_chain;
use crate::types::{DeviceDescriptor, OrderSnapshot, PrintOutcome, ShopInfo};

/// Printer service
pub struct PrinterService {
    discovery: Discovery,
    connections: Arc<ConnectionManager>,
    executor: Arc<PrintExecutor>,
    formatter: ReceiptFormatter,
    kitchen_timeout: Duration,
    /// Kitchen deliveries still running after their caller stopped waiting
    background: Mutex<JoinSet<()>>,
}

impl PrinterService {
    pub fn new(
        discovery: Discovery,
        connections: ConnectionManager,
        executor: PrintExecutor,
        formatter: ReceiptFormatter,
        kitchen_timeout: Duration,
    ) -> Self {
        Self {
            discovery,
            connections: Arc::new(connections),
            executor: Arc::new(executor),
            formatter,
            kitchen_timeout,
            background: Mutex::new(JoinSet::new()),
        }
    }

    /// Wire up the real spooler, shell and serial backends
    pub fn system(config: &PrinterConfig) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
        let opener: Arc<dyn LinkOpener> = Arc::new(SerialPortOpener);

        Self::new(
            Discovery::system(runner.clone(), config),
            ConnectionManager::new(opener),
            PrintExecutor::new(default_chain(runner, config.command_timeout), config),
            ReceiptFormatter::from_config(config),
            config.kitchen_timeout,
        )
    }

    // ========== Devices ==========

    pub async fn list_devices(&self) -> Vec<DeviceDescriptor> {
        self.discovery.discover().await
    }

    pub async fn connect(&self, path: &str) -> Result<DeviceDescriptor, ConnectionError> {
        self.connections.connect(path).await.inspect_err(|e| {
            error!(path, reason = e.reason(), error = %e, "Connect failed");
        })
    }

    pub async fn disconnect(&self) {
        self.connections.disconnect().await;
    }

    pub async fn current_connection(&self) -> Option<DeviceDescriptor> {
        self.connections.current_connection().await
    }

    /// Let background kitchen deliveries and pending temp-file removals
    /// finish
    ///
    /// Call before the runtime shuts down.
    pub async fn shutdown(&self) {
        let mut background = std::mem::replace(&mut *self.background.lock(), JoinSet::new());
        if !background.is_empty() {
            debug!(count = background.len(), "Waiting for kitchen deliveries");
        }
        while let Some(joined) = background.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Kitchen delivery task failed");
            }
        }
        self.executor.flush().await;
    }

    // ========== Printing ==========

    /// Print the fixed sample order to the active device
    #[instrument(skip(self, shop))]
    pub async fn test_print(&self, shop: &ShopInfo) -> PrintResult<PrintOutcome> {
        let content = self
            .formatter
            .format(&sample_order(), shop, &ReceiptKind::Test);

        let result = deliver(&self.connections, &self.executor, &content, None)
            .await
            .map(|_| PrintOutcome::ok("Test print sent successfully"));
        log_failure("Test print", &result);
        result
    }

    /// Print a customer receipt to `target`, or the active device when
    /// `target` is absent
    #[instrument(skip(self, order, shop), fields(order = %order.order_number))]
    pub async fn print_receipt(
        &self,
        order: &OrderSnapshot,
        shop: &ShopInfo,
        target: Option<&str>,
    ) -> PrintResult<PrintOutcome> {
        let content = self.formatter.format(order, shop, &ReceiptKind::Customer);
        let result = deliver(&self.connections, &self.executor, &content, target).await;
        log_failure("Receipt print", &result);
        result
    }

    /// Best-effort kitchen ticket
    ///
    /// Waits at most the configured kitchen timeout and always reports
    /// success; failures only reach the log. The delivery runs on its own
    /// task, so a slow fallback chain keeps going after the wait ends.
    #[instrument(skip(self, order, notes), fields(order = %order.order_number))]
    pub async fn print_kitchen_ticket(
        &self,
        order: &OrderSnapshot,
        notes: Option<&str>,
        target: Option<&str>,
    ) -> PrintOutcome {
        let kind = ReceiptKind::Kitchen {
            notes: notes.map(str::to_string),
        };
        let content = self.formatter.format(order, &ShopInfo::default(), &kind);

        let connections = self.connections.clone();
        let executor = self.executor.clone();
        let target = target.map(str::to_string);
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();

        {
            let mut background = self.background.lock();
            while background.try_join_next().is_some() {}
            background.spawn(async move {
                match deliver(&connections, &executor, &content, target.as_deref()).await {
                    Ok(outcome) => info!(message = %outcome.message, "Kitchen ticket printed"),
                    Err(e) => warn!(reason = e.reason(), error = %e, "Kitchen ticket failed"),
                }
                let _ = done_tx.send(());
            });
        }

        if tokio::time::timeout(self.kitchen_timeout, done_rx).await.is_err() {
            warn!(
                timeout_ms = self.kitchen_timeout.as_millis() as u64,
                "Kitchen ticket still printing, no longer waiting"
            );
        }

        PrintOutcome::ok("Kitchen ticket queued")
    }
}

/// Resolve the device and run the print with the connection lock held
async fn deliver(
    connections: &ConnectionManager,
    executor: &PrintExecutor,
    content: &str,
    target: Option<&str>,
) -> PrintResult<PrintOutcome> {
    let state = connections.lock().await;

    let device = match target.map(str::trim).filter(|t| !t.is_empty()) {
        Some(path) => DeviceDescriptor::from_path(path),
        None => state
            .active_device()
            .cloned()
            .ok_or_else(|| PrintError::NotConnected("no printer connected".to_string()))?,
    };

    executor.print(&state, content, &device).await
}

fn log_failure(what: &str, result: &PrintResult<PrintOutcome>) {
    if let Err(e) = result {
        error!(reason = e.reason(), error = %e, "{} failed", what);
    }
}
