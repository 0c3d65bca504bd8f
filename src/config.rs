//! Configuration loading for the arm connection and motion execution

use crate::coordinator::{ExecutionOptions, DEFAULT_TIMEOUT};
use crate::session::TransportKind;
use crate::{ArmError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArmConfig {
    pub connection: ConnectionConfig,
    pub execution: Option<ExecutionConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionConfig {
    pub host: String,
    #[serde(default)]
    pub transport: TransportKind,
    /// Overrides the transport's default port
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub session_inactivity_timeout_ms: Option<u32>,
    pub connection_inactivity_timeout_ms: Option<u32>,
    pub close_session_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutionConfig {
    pub action_timeout_seconds: Option<u64>,
    pub cancel_on_timeout: Option<bool>,
    pub emit_events: Option<bool>,
}

impl ArmConfig {
    pub fn load_from_path(config_path: &str) -> Result<Self> {
        let contents = fs::read_to_string(config_path)?;
        Self::load_from_str(&contents)
    }

    pub fn load_from_str(contents: &str) -> Result<Self> {
        let config: ArmConfig = serde_yaml::from_str(contents)?;
        if config.connection.host.trim().is_empty() {
            return Err(ArmError::Config("connection.host must not be empty".to_string()));
        }
        Ok(config)
    }

    /// Configuration for `host` with every other setting at its default
    pub fn for_host(host: &str) -> Self {
        Self {
            connection: ConnectionConfig {
                host: host.to_string(),
                transport: TransportKind::default(),
                port: None,
                username: None,
                password: None,
                session_inactivity_timeout_ms: None,
                connection_inactivity_timeout_ms: None,
                close_session_timeout_ms: None,
            },
            execution: None,
        }
    }

    /// Get execution configuration with defaults
    pub fn execution(&self) -> ExecutionConfig {
        self.execution.clone().unwrap_or_default()
    }
}

impl ConnectionConfig {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.transport.default_port())
    }

    /// Credentials, if a non-empty username is configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match self.username.as_deref() {
            Some(username) if !username.is_empty() => {
                Some((username, self.password.as_deref().unwrap_or("")))
            }
            _ => None,
        }
    }

    pub fn session_inactivity_timeout_ms(&self) -> u32 {
        self.session_inactivity_timeout_ms.unwrap_or(10_000)
    }

    pub fn connection_inactivity_timeout_ms(&self) -> u32 {
        self.connection_inactivity_timeout_ms.unwrap_or(2_000)
    }

    pub fn close_session_timeout(&self) -> Duration {
        Duration::from_millis(self.close_session_timeout_ms.unwrap_or(1_000))
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            action_timeout_seconds: Some(DEFAULT_TIMEOUT.as_secs()),
            cancel_on_timeout: Some(false),
            emit_events: Some(false),
        }
    }
}

impl ExecutionConfig {
    pub fn action_timeout(&self) -> Duration {
        self.action_timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn cancel_on_timeout(&self) -> bool {
        self.cancel_on_timeout.unwrap_or(false)
    }

    pub fn emit_events(&self) -> bool {
        self.emit_events.unwrap_or(false)
    }

    pub fn options(&self) -> ExecutionOptions {
        ExecutionOptions {
            timeout: self.action_timeout(),
            cancel_on_timeout: self.cancel_on_timeout(),
        }
    }
}
