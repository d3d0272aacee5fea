//! Device discovery
//!
//! Each [`DeviceSource`] enumerates one kind of device. A failing source is
//! logged and contributes nothing; the result is deduplicated by
//! `(device class, path)`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::config::PrinterConfig;
use crate::error::DiscoveryError;
use crate::process::{CommandRunner, run_with_timeout};
use crate::types::{DeviceClass, DeviceDescriptor, is_serial_port_name};

/// One enumeration source
#[async_trait]
pub trait DeviceSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, DiscoveryError>;
}

/// Runs all sources and merges their results
pub struct Discovery {
    sources: Vec<Box<dyn DeviceSource>>,
}

impl Discovery {
    pub fn new(sources: Vec<Box<dyn DeviceSource>>) -> Self {
        Self { sources }
    }

    /// Platform default: spooler queues (with legacy fallback) and serial
    /// ports
    pub fn system(runner: Arc<dyn CommandRunner>, config: &PrinterConfig) -> Self {
        let timeout = config.command_timeout;
        let filter = config.filter_virtual;

        #[cfg(windows)]
        let queues = FallbackSource::new(
            Box::new(SpoolerApiSource),
            Box::new(WmicSource::new(runner, timeout, filter)),
        );

        #[cfg(not(windows))]
        let queues = FallbackSource::new(
            Box::new(LpstatQueueSource::new(runner.clone(), timeout)),
            Box::new(LpstatPrinterSource::new(runner, timeout, filter)),
        );

        Self::new(vec![Box::new(queues), Box::new(SerialPortSource)])
    }

    /// Enumerate every source. Never fails; ordering is not stable across
    /// calls.
    #[instrument(skip(self))]
    pub async fn discover(&self) -> Vec<DeviceDescriptor> {
        let results =
            futures::future::join_all(self.sources.iter().map(|s| async move {
                (s.name(), s.enumerate().await)
            }))
            .await;

        let mut seen: HashSet<(DeviceClass, String)> = HashSet::new();
        let mut devices = Vec::new();

        for (source, result) in results {
            match result {
                Ok(found) => {
                    for device in found {
                        let (class, path) = device.key();
                        if seen.insert((class, path.to_string())) {
                            devices.push(device);
                        }
                    }
                }
                Err(e) => {
                    warn!(source, error = %e, "Discovery source failed");
                }
            }
        }

        info!(count = devices.len(), "Found printers");
        devices
    }
}

/// Tries `primary`; when it fails, logs and tries `secondary`
pub struct FallbackSource {
    primary: Box<dyn DeviceSource>,
    secondary: Box<dyn DeviceSource>,
}

impl FallbackSource {
    pub fn new(primary: Box<dyn DeviceSource>, secondary: Box<dyn DeviceSource>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl DeviceSource for FallbackSource {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    async fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, DiscoveryError> {
        match self.primary.enumerate().await {
            Ok(devices) => Ok(devices),
            Err(e) => {
                warn!(
                    source = self.primary.name(),
                    fallback = self.secondary.name(),
                    error = %e,
                    "Primary source failed, trying fallback"
                );
                self.secondary.enumerate().await
            }
        }
    }
}

/// Whether a queue name looks like a virtual/system printer
pub fn is_virtual_printer(name: &str) -> bool {
    let n = name.to_lowercase();
    ["pdf", "xps", "fax", "onenote", "document writer"]
        .iter()
        .any(|p| n.contains(p))
}

fn queues_from_names<I, S>(names: I) -> Vec<DeviceDescriptor>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .filter(|n| !n.is_empty())
        .map(|n| DeviceDescriptor::queue(&n))
        .collect()
}

// ============================================================================
// Serial ports
// ============================================================================

/// Serial ports registered with the OS, filtered to printer-style names
pub struct SerialPortSource;

#[async_trait]
impl DeviceSource for SerialPortSource {
    fn name(&self) -> &'static str {
        "serial-ports"
    }

    async fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, DiscoveryError> {
        let ports = tokio::task::spawn_blocking(serialport::available_ports)
            .await
            .map_err(|e| DiscoveryError::Serial(e.to_string()))?
            .map_err(|e| DiscoveryError::Serial(e.to_string()))?;

        Ok(serial_devices(ports.iter().map(|p| p.port_name.as_str())))
    }
}

fn serial_devices<'a>(names: impl Iterator<Item = &'a str>) -> Vec<DeviceDescriptor> {
    names
        .map(str::trim)
        .filter(|n| is_serial_port_name(n))
        .map(DeviceDescriptor::serial)
        .collect()
}

// ============================================================================
// Windows spooler
// ============================================================================

/// Registered queues from `EnumPrintersW` (local + connections, unfiltered)
#[cfg(windows)]
pub struct SpoolerApiSource;

#[cfg(windows)]
#[async_trait]
impl DeviceSource for SpoolerApiSource {
    fn name(&self) -> &'static str {
        "spooler"
    }

    async fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, DiscoveryError> {
        let names = tokio::task::spawn_blocking(crate::native::list_queues)
            .await
            .map_err(|e| DiscoveryError::Spooler(e.to_string()))?
            .map_err(DiscoveryError::Spooler)?;
        Ok(queues_from_names(names))
    }
}

/// `wmic printer get Name,PortName /format:csv`
pub struct WmicSource {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
    filter_virtual: bool,
}

impl WmicSource {
    pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration, filter_virtual: bool) -> Self {
        Self {
            runner,
            timeout,
            filter_virtual,
        }
    }
}

#[async_trait]
impl DeviceSource for WmicSource {
    fn name(&self) -> &'static str {
        "wmic"
    }

    async fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, DiscoveryError> {
        let args: Vec<String> = ["printer", "get", "Name,PortName", "/format:csv"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = run_with_timeout(self.runner.as_ref(), "wmic", &args, self.timeout).await?;

        let names = parse_wmic_csv(&out.stdout)
            .into_iter()
            .filter(|n| !self.filter_virtual || !is_virtual_printer(n));
        Ok(queues_from_names(names))
    }
}

/// Parse `Node,Name,PortName` CSV rows into queue names
///
/// The header row and blank lines are skipped.
pub fn parse_wmic_csv(stdout: &str) -> Vec<String> {
    let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());

    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    let name_idx = columns
        .iter()
        .position(|c| c.eq_ignore_ascii_case("name"))
        .unwrap_or(1);

    lines
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            // Queue names may contain commas; the port column is last
            let end = fields
                .len()
                .saturating_sub(columns.len().saturating_sub(name_idx + 1));
            let name = fields.get(name_idx..end)?.join(",");
            (!name.is_empty()).then_some(name)
        })
        .collect()
}

// ============================================================================
// CUPS
// ============================================================================

/// `lpstat -e`: one queue name per line
pub struct LpstatQueueSource {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
}

impl LpstatQueueSource {
    pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self { runner, timeout }
    }
}

#[async_trait]
impl DeviceSource for LpstatQueueSource {
    fn name(&self) -> &'static str {
        "lpstat-e"
    }

    async fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, DiscoveryError> {
        let args = vec!["-e".to_string()];
        let out = run_with_timeout(self.runner.as_ref(), "lpstat", &args, self.timeout).await?;
        Ok(queues_from_names(out.stdout.lines()))
    }
}

/// `lpstat -p`: `printer <name> is idle. ...` lines
pub struct LpstatPrinterSource {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
    filter_virtual: bool,
}

impl LpstatPrinterSource {
    pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration, filter_virtual: bool) -> Self {
        Self {
            runner,
            timeout,
            filter_virtual,
        }
    }
}

#[async_trait]
impl DeviceSource for LpstatPrinterSource {
    fn name(&self) -> &'static str {
        "lpstat-p"
    }

    async fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, DiscoveryError> {
        let args = vec!["-p".to_string()];
        let out = run_with_timeout(self.runner.as_ref(), "lpstat", &args, self.timeout).await?;

        let names = parse_lpstat_printers(&out.stdout)
            .into_iter()
            .filter(|n| !self.filter_virtual || !is_virtual_printer(n));
        Ok(queues_from_names(names))
    }
}

pub fn parse_lpstat_printers(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|l| l.strip_prefix("printer "))
        .filter_map(|rest| rest.split_whitespace().next())
        .map(str::to_string)
        .collect()
}
