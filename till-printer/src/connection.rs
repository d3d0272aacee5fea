//! Connection manager
//!
//! Holds at most one active device. Serial devices carry an open link;
//! queue devices are address-only and are not verified until print time.
//! Every operation takes the state lock, so connect, disconnect and print
//! run one after another.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use tracing::{info, instrument, warn};

use crate::error::ConnectionError;
use crate::link::{LinkOpener, SharedLink};
use crate::types::{DeviceClass, DeviceDescriptor};

/// Current device and its link
///
/// A link is present only while the active device is a serial device.
#[derive(Default)]
pub struct ConnectionState {
    active: Option<DeviceDescriptor>,
    link: Option<SharedLink>,
}

impl ConnectionState {
    pub fn active_device(&self) -> Option<&DeviceDescriptor> {
        self.active.as_ref()
    }

    /// Link for `port`, if that port is the open serial connection
    pub fn link_for(&self, port: &str) -> Option<SharedLink> {
        match (&self.active, &self.link) {
            (Some(device), Some(link)) if device.path.eq_ignore_ascii_case(port) => {
                Some(link.clone())
            }
            _ => None,
        }
    }

    pub fn has_link(&self) -> bool {
        self.link.is_some()
    }
}

impl std::fmt::Debug for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionState")
            .field("active", &self.active)
            .field("link", &self.link.as_ref().map(|_| "<SerialLink>"))
            .finish()
    }
}

/// Owns the process-wide connection state
pub struct ConnectionManager {
    state: AsyncMutex<ConnectionState>,
    opener: Arc<dyn LinkOpener>,
}

impl ConnectionManager {
    pub fn new(opener: Arc<dyn LinkOpener>) -> Self {
        Self {
            state: AsyncMutex::new(ConnectionState::default()),
            opener,
        }
    }

    /// Connect to `path`, replacing any existing connection
    ///
    /// `COM<n>`-style paths open a serial link; anything else is recorded as
    /// a queue name. If the serial open fails the manager is left
    /// disconnected.
    #[instrument(skip(self))]
    pub async fn connect(&self, path: &str) -> Result<DeviceDescriptor, ConnectionError> {
        if path.trim().is_empty() {
            return Err(ConnectionError::EmptyPath);
        }

        let mut state = self.state.lock().await;
        release(&mut state).await;

        let device = DeviceDescriptor::from_path(path);

        if device.device_class == DeviceClass::Serial {
            let opener = self.opener.clone();
            let port = device.path.clone();
            let params = device.serial_parameters.clone().unwrap_or_default();

            let link = tokio::task::spawn_blocking(move || opener.open(&port, &params))
                .await
                .map_err(|e| ConnectionError::Task(e.to_string()))?
                .map_err(|source| ConnectionError::CannotOpenPort {
                    port: device.path.clone(),
                    source,
                })?;

            state.link = Some(Arc::new(Mutex::new(link)));
        }

        state.active = Some(device.clone());
        info!(path = %device.path, class = ?device.device_class, "Connected");
        Ok(device)
    }

    /// Close any link and clear the connection. Never fails.
    #[instrument(skip(self))]
    pub async fn disconnect(&self) {
        let mut state = self.state.lock().await;
        if let Some(device) = state.active.as_ref() {
            info!(path = %device.path, "Disconnecting");
        }
        release(&mut state).await;
    }

    pub async fn current_connection(&self) -> Option<DeviceDescriptor> {
        self.state.lock().await.active.clone()
    }

    /// Exclusive access for the duration of a print
    pub async fn lock(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().await
    }
}

/// Best-effort close of the current link, then clear both fields
async fn release(state: &mut ConnectionState) {
    if let Some(link) = state.link.take() {
        // A write abandoned by a timeout may still hold the link; close waits
        // for it on the blocking pool.
        let closed = tokio::task::spawn_blocking(move || link.lock().close()).await;
        match closed {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Serial close failed"),
            Err(e) => warn!(error = %e, "Serial close task failed"),
        }
    }
    state.active = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::SerialLink;
    use crate::types::SerialParameters;
    use std::io;

    #[derive(Default)]
    struct Log(Mutex<Vec<String>>);

    struct FakeLink {
        port: String,
        log: Arc<Log>,
        closed: bool,
    }

    impl SerialLink for FakeLink {
        fn write_all(&mut self, _data: &[u8]) -> io::Result<()> {
            Ok(())
        }

        fn drain(&mut self) -> io::Result<bool> {
            Ok(true)
        }

        fn close(&mut self) -> io::Result<()> {
            if !self.closed {
                self.closed = true;
                self.log.0.lock().push(format!("close {}", self.port));
            }
            Ok(())
        }
    }

    struct FakeOpener {
        log: Arc<Log>,
        refuse: Option<&'static str>,
    }

    impl LinkOpener for FakeOpener {
        fn open(&self, port: &str, _params: &SerialParameters) -> io::Result<Box<dyn SerialLink>> {
            if self.refuse == Some(port) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "busy"));
            }
            self.log.0.lock().push(format!("open {}", port));
            Ok(Box::new(FakeLink {
                port: port.to_string(),
                log: self.log.clone(),
                closed: false,
            }))
        }
    }

    fn manager(refuse: Option<&'static str>) -> (ConnectionManager, Arc<Log>) {
        let log = Arc::new(Log::default());
        let opener = FakeOpener {
            log: log.clone(),
            refuse,
        };
        (ConnectionManager::new(Arc::new(opener)), log)
    }

    #[tokio::test]
    async fn test_empty_path_rejected() {
        let (m, _) = manager(None);
        let err = m.connect("  ").await.unwrap_err();
        assert_eq!(err.reason(), "printer path required");
        assert!(m.current_connection().await.is_none());
    }

    #[tokio::test]
    async fn test_queue_connect_opens_nothing() {
        let (m, log) = manager(None);
        let device = m.connect("EPSON TM-T88V").await.unwrap();
        assert_eq!(device.device_class, DeviceClass::Queue);
        assert!(!m.lock().await.has_link());
        assert!(log.0.lock().is_empty());
    }

    #[tokio::test]
    async fn test_reconnect_closes_previous_link_first() {
        let (m, log) = manager(None);
        m.connect("COM3").await.unwrap();
        m.connect("COM4").await.unwrap();

        assert_eq!(*log.0.lock(), vec!["open COM3", "close COM3", "open COM4"]);
        let state = m.lock().await;
        assert!(state.link_for("com4").is_some());
        assert!(state.link_for("COM3").is_none());
    }

    #[tokio::test]
    async fn test_failed_open_leaves_disconnected() {
        let (m, log) = manager(Some("COM9"));
        m.connect("COM3").await.unwrap();

        let err = m.connect("COM9").await.unwrap_err();
        assert_eq!(err.reason(), "cannot open port");
        assert!(m.current_connection().await.is_none());
        assert!(!m.lock().await.has_link());
        assert_eq!(*log.0.lock(), vec!["open COM3", "close COM3"]);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let (m, log) = manager(None);
        m.connect("COM3").await.unwrap();
        m.disconnect().await;
        m.disconnect().await;

        assert!(m.current_connection().await.is_none());
        assert_eq!(*log.0.lock(), vec!["open COM3", "close COM3"]);
    }
}
