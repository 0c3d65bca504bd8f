//! Device RPC surface
//!
//! The arm's base controller is reached through an opaque request channel.
//! This module names the requests the motion core depends on and the
//! descriptors and notifications that cross that boundary. Implementations
//! wrap a real transport or the in-process simulator in [`crate::sim`].

use crate::error::DeviceError;
use crate::pose::Pose;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of an action stored on the device (named poses are stored actions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionHandle(pub u32);

/// Handle of a sequence created on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceHandle(pub u32);

/// Handle of a notification registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationHandle(pub u32);

impl fmt::Display for NotificationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named pose as listed by the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPoseEntry {
    pub name: String,
    pub handle: ActionHandle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointAngle {
    pub joint_identifier: u32,
    pub value: f64,
}

/// What a device action asks the arm to do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ReachJointAngles(Vec<JointAngle>),
    ReachPose(Pose),
    /// Replay an action already stored on the device
    FromReference(ActionHandle),
}

/// Device-level action descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub application_data: String,
    pub kind: ActionKind,
}

impl Action {
    pub fn new(name: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            application_data: String::new(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceTask {
    pub group_identifier: u32,
    pub action: Action,
}

/// Device-level sequence descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceDescriptor {
    pub name: String,
    pub tasks: Vec<SequenceTask>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionEvent {
    ActionStart,
    ActionEnd,
    ActionAbort,
    ActionPause,
    ActionFeedback,
}

/// Notification delivered on the action topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionNotification {
    pub action_event: ActionEvent,
    pub handle: Option<ActionHandle>,
    /// Sub-error code, meaningful for `ActionAbort`
    pub abort_details: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SequenceEvent {
    SequenceTaskStarted,
    SequenceTaskCompleted,
    SequenceAborted,
    SequenceCompleted,
    SequencePaused,
}

/// Notification delivered on the sequence-info topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceNotification {
    pub event_identifier: SequenceEvent,
    pub task_index: u32,
    pub abort_details: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorFeedback {
    pub position: f64,
    pub velocity: f64,
}

/// Measured device state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub tool_pose: Pose,
    pub actuators: Vec<ActuatorFeedback>,
}

impl Feedback {
    pub fn positions(&self) -> Vec<f64> {
        self.actuators.iter().map(|a| a.position).collect()
    }

    pub fn velocities(&self) -> Vec<f64> {
        self.actuators.iter().map(|a| a.velocity).collect()
    }
}

/// Callback for the action topic, invoked on the transport's delivery thread
pub type ActionHandler = Box<dyn Fn(&ActionNotification) + Send + Sync>;

/// Callback for the sequence-info topic, invoked on the transport's delivery thread
pub type SequenceHandler = Box<dyn Fn(&SequenceNotification) + Send + Sync>;

/// Requests understood by the arm's base controller.
///
/// Submission calls (`execute_action`, `create_sequence`, `play_sequence`)
/// acknowledge receipt only; completion is reported through the
/// notification topics.
pub trait ArmDevice: Send + Sync {
    /// Stored actions the device exposes as named poses, in device order
    fn list_named_poses(&self) -> Result<Vec<NamedPoseEntry>, DeviceError>;

    fn actuator_count(&self) -> Result<usize, DeviceError>;

    fn execute_action(&self, action: &Action) -> Result<(), DeviceError>;

    fn create_sequence(&self, sequence: &SequenceDescriptor) -> Result<SequenceHandle, DeviceError>;

    fn play_sequence(&self, handle: SequenceHandle) -> Result<(), DeviceError>;

    /// Sample the current tool pose and actuator state
    fn refresh_feedback(&self) -> Result<Feedback, DeviceError>;

    fn subscribe_action_events(&self, handler: ActionHandler) -> Result<NotificationHandle, DeviceError>;

    fn subscribe_sequence_events(&self, handler: SequenceHandler) -> Result<NotificationHandle, DeviceError>;

    fn unsubscribe(&self, handle: NotificationHandle) -> Result<(), DeviceError>;

    /// Stop whatever motion is in progress
    fn stop_action(&self) -> Result<(), DeviceError>;
}
