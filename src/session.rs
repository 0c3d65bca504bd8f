//! Connection session
//!
//! [`DeviceConnection`] connects a [`Transport`], logs in when credentials
//! are configured, and hands out the device request handle. The session and
//! the transport are closed when the connection is closed or dropped, on
//! every exit path.

use crate::config::ConnectionConfig;
use crate::device::ArmDevice;
use crate::error::DeviceError;
use crate::{ArmError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const TCP_PORT: u16 = 10000;
pub const UDP_PORT: u16 = 10001;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Tcp,
    /// Lower latency channel, intended for cyclic traffic
    Udp,
}

impl TransportKind {
    pub fn default_port(&self) -> u16 {
        match self {
            TransportKind::Tcp => TCP_PORT,
            TransportKind::Udp => UDP_PORT,
        }
    }
}

/// Login parameters for an authenticated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub username: String,
    pub password: String,
    pub session_inactivity_timeout_ms: u32,
    pub connection_inactivity_timeout_ms: u32,
}

/// Channel to the arm's controller
pub trait Transport: Send {
    fn connect(&mut self, host: &str, port: u16) -> std::result::Result<(), DeviceError>;

    fn disconnect(&mut self) -> std::result::Result<(), DeviceError>;

    fn create_session(&mut self, info: &SessionInfo) -> std::result::Result<(), DeviceError>;

    /// Close the session, waiting at most `timeout` for the device to answer
    fn close_session(&mut self, timeout: Duration) -> std::result::Result<(), DeviceError>;

    /// Request handle for the arm's base controller
    fn device(&self) -> Arc<dyn ArmDevice>;
}

/// An open connection to the arm
pub struct DeviceConnection<T: Transport> {
    transport: T,
    host: String,
    port: u16,
    session_open: bool,
    connected: bool,
    close_session_timeout: Duration,
}

impl<T: Transport> DeviceConnection<T> {
    /// Connect and, when credentials are configured, log in
    pub fn open(mut transport: T, config: &ConnectionConfig) -> Result<Self> {
        let port = config.port();
        transport
            .connect(&config.host, port)
            .map_err(|e| ArmError::Connection(format!("{}:{}: {}", config.host, port, e)))?;
        info!("Connected to {}:{}", config.host, port);

        // From here on, dropping `connection` disconnects the transport
        let mut connection = Self {
            transport,
            host: config.host.clone(),
            port,
            session_open: false,
            connected: true,
            close_session_timeout: config.close_session_timeout(),
        };

        if let Some((username, password)) = config.credentials() {
            let info = SessionInfo {
                username: username.to_string(),
                password: password.to_string(),
                session_inactivity_timeout_ms: config.session_inactivity_timeout_ms(),
                connection_inactivity_timeout_ms: config.connection_inactivity_timeout_ms(),
            };
            info!("Logging as {} on device {}", username, config.host);
            connection
                .transport
                .create_session(&info)
                .map_err(|e| ArmError::Session(format!("login as {} failed: {}", username, e)))?;
            connection.session_open = true;
        }

        Ok(connection)
    }

    pub fn device(&self) -> Arc<dyn ArmDevice> {
        self.transport.device()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn has_session(&self) -> bool {
        self.session_open
    }

    /// Close the session and the transport, reporting the first failure
    pub fn close(mut self) -> Result<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<()> {
        let mut first_error = None;

        if self.session_open {
            self.session_open = false;
            if let Err(e) = self.transport.close_session(self.close_session_timeout) {
                warn!("Failed to close session on {}: {}", self.host, e);
                first_error.get_or_insert(ArmError::Session(e.to_string()));
            }
        }

        if self.connected {
            self.connected = false;
            if let Err(e) = self.transport.disconnect() {
                warn!("Failed to disconnect from {}: {}", self.host, e);
                first_error.get_or_insert(ArmError::Connection(e.to_string()));
            }
            info!("Disconnected from {}:{}", self.host, self.port);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<T: Transport> Drop for DeviceConnection<T> {
    fn drop(&mut self) {
        let _ = self.teardown();
    }
}
