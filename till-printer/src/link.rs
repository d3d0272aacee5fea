//! Serial links to thermal printers
//!
//! A link is an open OS handle with an explicit close. [`SerialPortOpener`]
//! backs it with the `serialport` crate; tests inject their own opener.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::info;

use crate::types::{Parity, SerialParameters};

/// An open serial connection
///
/// All calls block; callers run them on the blocking pool.
pub trait SerialLink: Send {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Wait until written bytes have left the transmit buffer
    ///
    /// Returns `Ok(false)` when the transport has no drain operation.
    fn drain(&mut self) -> io::Result<bool>;

    /// Release the OS handle. Closing twice is a no-op.
    fn close(&mut self) -> io::Result<()>;
}

/// Opens serial links
pub trait LinkOpener: Send + Sync {
    fn open(&self, port: &str, params: &SerialParameters) -> io::Result<Box<dyn SerialLink>>;
}

/// Link shared between the connection state and an in-flight write
pub type SharedLink = Arc<Mutex<Box<dyn SerialLink>>>;

/// Opens real ports through `serialport`
#[derive(Debug, Default, Clone)]
pub struct SerialPortOpener;

impl LinkOpener for SerialPortOpener {
    fn open(&self, port: &str, params: &SerialParameters) -> io::Result<Box<dyn SerialLink>> {
        let data_bits = match params.data_bits {
            5 => serialport::DataBits::Five,
            6 => serialport::DataBits::Six,
            7 => serialport::DataBits::Seven,
            _ => serialport::DataBits::Eight,
        };
        let stop_bits = match params.stop_bits {
            2 => serialport::StopBits::Two,
            _ => serialport::StopBits::One,
        };
        let parity = match params.parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        };

        let handle = serialport::new(port, params.baud_rate)
            .data_bits(data_bits)
            .stop_bits(stop_bits)
            .parity(parity)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_secs(5))
            .open()
            .map_err(io::Error::from)?;

        info!(port, baud = params.baud_rate, "Serial port opened");

        Ok(Box::new(SerialPortLink {
            name: port.to_string(),
            port: Some(handle),
        }))
    }
}

struct SerialPortLink {
    name: String,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl SerialPortLink {
    fn port(&mut self) -> io::Result<&mut Box<dyn serialport::SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "port closed"))
    }
}

impl SerialLink for SerialPortLink {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port()?.write_all(data)
    }

    fn drain(&mut self) -> io::Result<bool> {
        // flush() waits for the OS transmit buffer (tcdrain / FlushFileBuffers)
        self.port()?.flush()?;
        Ok(true)
    }

    fn close(&mut self) -> io::Result<()> {
        if self.port.take().is_some() {
            info!(port = %self.name, "Serial port closed");
        }
        Ok(())
    }
}
