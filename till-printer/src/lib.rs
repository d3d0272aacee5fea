//! # till-printer
//!
//! Receipt printing and device connection for a point-of-sale till.
//!
//! ## Scope
//!
//! - Device discovery: spooler queues and USB-serial thermal printers
//! - A single active connection, serial links held open
//! - Receipt layout for 80mm paper (48 characters per line)
//! - ESC/POS framing for serial and RAW delivery
//! - Queue delivery through an ordered chain of fallback strategies
//!
//! ## Example
//!
//! ```ignore
//! use till_printer::{PrinterConfig, PrinterService, ShopInfo};
//!
//! let service = PrinterService::system(&PrinterConfig::from_env());
//!
//! for device in service.list_devices().await {
//!     println!("{} ({})", device.display_name, device.path);
//! }
//!
//! service.connect("COM3").await?;
//! service.test_print(&ShopInfo::default()).await?;
//! ```

mod config;
mod connection;
mod discovery;
mod error;
mod escpos;
mod executor;
mod link;
#[cfg(windows)]
mod native;
mod process;
mod receipt;
mod service;
mod strategy;
mod text;
mod types;

// Re-exports
pub use config::PrinterConfig;
pub use connection::{ConnectionManager, ConnectionState};
pub use discovery::{
    DeviceSource, Discovery, FallbackSource, LpstatPrinterSource, LpstatQueueSource,
    SerialPortSource, WmicSource, is_virtual_printer, parse_lpstat_printers, parse_wmic_csv,
};
pub use error::{
    CommandError, ConnectionError, DiscoveryError, PrintError, PrintResult, StrategyError,
};
pub use escpos::{CUT, INIT, encode};
pub use executor::PrintExecutor;
pub use link::{LinkOpener, SerialLink, SerialPortOpener, SharedLink};
pub use process::{CommandOutput, CommandRunner, SystemRunner, run_with_timeout};
pub use receipt::{RECEIPT_WIDTH, ReceiptFormatter, ReceiptKind, format_timestamp, sample_order};
pub use service::PrinterService;
pub use strategy::{
    Cleanup, CupsLp, CupsLpr, LegacyPrint, OutPrinter, QueueJob, QueueStrategy, ShellPrintTo,
    default_chain,
};
pub use text::{center, line_lr, pad, text_width, truncate, wrap};
pub use types::{
    DeviceClass, DeviceDescriptor, LineItem, OrderSnapshot, Parity, PrintOutcome,
    SerialParameters, ShopInfo, is_serial_port_name,
};

#[cfg(windows)]
pub use discovery::SpoolerApiSource;
#[cfg(windows)]
pub use strategy::NativeRaw;
