//! armctl - motion control for networked robotic arms
//!
//! This library drives an arm's base controller through an opaque request
//! channel: it builds joint and cartesian motion commands, batches them into
//! sequences, submits them, and blocks until the controller reports that the
//! motion completed or aborted (or a timeout expires).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use armctl::{ArmConfig, ArmController, DeviceConnection, Pose, CartesianTarget};
//! use armctl::sim::{SimulatedArm, SimulatedTransport};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ArmConfig::for_host("192.168.1.10");
//!     let connection = DeviceConnection::open(SimulatedTransport::new(SimulatedArm::new()), &config.connection)?;
//!     let arm = ArmController::with_config(connection.device(), &config);
//!
//!     arm.move_named_pose("Retract")?;
//!     arm.move_cartesian(CartesianTarget::Absolute(Pose::new(0.15, 0.0, 0.20, 0.0, 180.0, 90.0)))?;
//!     println!("{}", arm.get_pose()?);
//!
//!     connection.close()?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Pose**: immutable tool pose value
//! - **DeviceConnection**: transport and session lifetime
//! - **Subscription**: scoped registration on a notification topic
//! - **action**: builders from poses and joint sets to motion commands
//! - **Coordinator**: submit-and-wait state machine for one invocation
//! - **ArmController**: high-level API over all of the above

pub mod action;
pub mod config;
pub mod controller;
pub mod coordinator;
pub mod device;
pub mod error;
pub mod events;
pub mod pose;
pub mod session;
pub mod sim;
pub mod subscription;

// High-level exports for easy usage
pub use action::{CartesianMode, CartesianTarget, JointConfiguration, MotionCommand, Sequence};
pub use config::{ArmConfig, ConnectionConfig, ExecutionConfig};
pub use controller::{ArmController, POSE_HOME, POSE_PACKAGING, POSE_RETRACT, POSE_ZERO};
pub use coordinator::{
    execute, execute_sequence, Coordinator, ExecutionOptions, ExecutionReport, ExecutionState,
    TerminalEvent, DEFAULT_TIMEOUT,
};
pub use error::{AbortReason, ArmError, DeviceError, ExecutionError, ResolutionError, Result, SubscriptionLeak};
pub use pose::Pose;
pub use session::{DeviceConnection, Transport, TransportKind};

// Lower-level exports
pub use action::{build_cartesian_target, build_joint_target, build_named_pose, build_sequence};
pub use device::{ArmDevice, Feedback};
pub use events::{ConsoleEvents, EventSink, ExecutionEvent, NoOpEvents};
pub use subscription::{CompletionSlot, Subscription, Topic};
