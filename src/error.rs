//! Error types for arm control operations

use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArmError>;

#[derive(Error, Debug)]
pub enum ArmError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Invalid command: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Failures reported by the device RPC surface
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("request rejected by device: {0}")]
    Rejected(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unknown handle {0}")]
    UnknownHandle(u32),

    #[error("device not connected")]
    NotConnected,
}

/// A command could not be turned into something the device understands
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    #[error("named pose '{0}' is not registered on the device")]
    NamedPoseNotFound(String),

    #[error("expected {expected} joint angles, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("relative cartesian delta must have 3 or 6 components, got {0}")]
    InvalidDeltaLength(usize),

    #[error("relative cartesian target requires current feedback")]
    MissingFeedback,

    #[error("a pose needs exactly 6 values, got {0}")]
    InvalidPoseLength(usize),

    #[error("capability query failed: {0}")]
    Query(DeviceError),
}

/// Abort detail code reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AbortReason(pub u32);

impl AbortReason {
    pub fn code(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-error code {}", self.0)
    }
}

/// Why a motion did not complete
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("resolution failed: {0}")]
    ResolutionFailed(#[from] ResolutionError),

    #[error("submission failed: {0}")]
    SubmissionFailed(DeviceError),

    #[error("aborted by device ({0})")]
    Aborted(AbortReason),

    #[error("no terminal notification within {0:?}")]
    TimedOut(Duration),
}

/// Unsubscribe failed; the registration may still exist on the device
#[derive(Error, Debug, Clone, PartialEq)]
#[error("subscription {handle} leaked: {source}")]
pub struct SubscriptionLeak {
    pub handle: u32,
    pub source: DeviceError,
}
