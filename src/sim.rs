//! Simulated arm
//!
//! In-process implementation of the device RPC surface. Submissions are
//! acknowledged immediately and carried out on a separate delivery thread,
//! which then publishes notifications the way a real base controller does.
//! Behavior (motion time, abort, silence, rejections) is adjustable at
//! runtime, and every request is counted so tests can check call balance.

use crate::device::{
    Action, ActionEvent, ActionHandle, ActionHandler, ActionKind, ActionNotification,
    ActuatorFeedback, ArmDevice, Feedback, NamedPoseEntry, NotificationHandle, SequenceDescriptor,
    SequenceEvent, SequenceHandle, SequenceHandler, SequenceNotification,
};
use crate::error::DeviceError;
use crate::pose::Pose;
use crate::session::{SessionInfo, Transport};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::debug;

const DEFAULT_ACTUATORS: usize = 6;
const DEFAULT_MOTION_DELAY: Duration = Duration::from_millis(10);

/// How the simulated controller ends each motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimOutcome {
    Complete,
    /// Abort with the given sub-error code
    Abort(u32),
    /// Publish no notifications at all
    Silent,
}

#[derive(Debug, Clone, Copy)]
struct Behavior {
    motion_delay: Duration,
    outcome: SimOutcome,
    reject_submissions: bool,
    fail_unsubscribe: bool,
    synchronous_delivery: bool,
}

/// Ordered record of the requests that change device state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCall {
    SubscribeAction,
    SubscribeSequence,
    Unsubscribe,
    ExecuteAction,
    CreateSequence,
    PlaySequence,
    Stop,
}

/// Request counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimStats {
    pub subscribe_calls: usize,
    pub unsubscribe_calls: usize,
    pub active_subscriptions: usize,
    pub actions_submitted: usize,
    pub sequences_created: usize,
    pub sequences_played: usize,
    pub stop_calls: usize,
    pub named_pose_queries: usize,
    pub feedback_queries: usize,
}

#[derive(Default)]
struct Counters {
    subscribe: AtomicUsize,
    unsubscribe: AtomicUsize,
    actions: AtomicUsize,
    sequences_created: AtomicUsize,
    sequences_played: AtomicUsize,
    stops: AtomicUsize,
    named_pose_queries: AtomicUsize,
    feedback_queries: AtomicUsize,
}

struct StoredPose {
    name: String,
    handle: ActionHandle,
    joints: Vec<f64>,
    tool_pose: Pose,
}

struct ArmState {
    tool_pose: Pose,
    joints: Vec<f64>,
}

type SharedActionHandler = Arc<dyn Fn(&ActionNotification) + Send + Sync>;
type SharedSequenceHandler = Arc<dyn Fn(&SequenceNotification) + Send + Sync>;

#[derive(Default)]
struct Registrations {
    action: HashMap<u32, SharedActionHandler>,
    sequence: HashMap<u32, SharedSequenceHandler>,
}

struct Inner {
    actuator_count: usize,
    named_poses: Vec<StoredPose>,
    arm: Mutex<ArmState>,
    registrations: Mutex<Registrations>,
    sequences: Mutex<HashMap<u32, SequenceDescriptor>>,
    behavior: Mutex<Behavior>,
    counters: Counters,
    calls: Mutex<Vec<DeviceCall>>,
    connected: AtomicBool,
    next_handle: AtomicU32,
    /// Bumped by `stop_action`; in-flight motions from an older epoch stop silently
    motion_epoch: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn sized(values: &[f64], len: usize) -> Vec<f64> {
    let mut joints = values.to_vec();
    joints.resize(len, 0.0);
    joints
}

/// In-process arm controller
#[derive(Clone)]
pub struct SimulatedArm {
    inner: Arc<Inner>,
}

impl Default for SimulatedArm {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedArm {
    /// Six-actuator arm resting at the `Zero` pose
    pub fn new() -> Self {
        Self::with_actuators(DEFAULT_ACTUATORS)
    }

    pub fn with_actuators(actuator_count: usize) -> Self {
        let named_poses = vec![
            StoredPose {
                name: "Home".to_string(),
                handle: ActionHandle(1),
                joints: sized(&[0.0, 344.0, 75.0, 0.0, 300.0, 0.0], actuator_count),
                tool_pose: Pose::new(0.44, 0.19, 0.45, 90.0, 0.0, 150.0),
            },
            StoredPose {
                name: "Retract".to_string(),
                handle: ActionHandle(2),
                joints: sized(&[357.0, 21.0, 150.0, 272.0, 320.0, 273.0], actuator_count),
                tool_pose: Pose::new(0.13, -0.07, 0.12, 0.0, 180.0, 90.0),
            },
            StoredPose {
                name: "Packaging".to_string(),
                handle: ActionHandle(3),
                joints: sized(&[0.0, 330.0, 173.0, 0.0, 275.0, 0.0], actuator_count),
                tool_pose: Pose::new(0.06, 0.0, 0.35, 180.0, 0.0, 90.0),
            },
            StoredPose {
                name: "Zero".to_string(),
                handle: ActionHandle(4),
                joints: vec![0.0; actuator_count],
                tool_pose: Pose::new(0.0, 0.0, 1.0, 0.0, 0.0, 0.0),
            },
        ];

        let arm = ArmState {
            tool_pose: Pose::new(0.0, 0.0, 1.0, 0.0, 0.0, 0.0),
            joints: vec![0.0; actuator_count],
        };

        Self {
            inner: Arc::new(Inner {
                actuator_count,
                named_poses,
                arm: Mutex::new(arm),
                registrations: Mutex::new(Registrations::default()),
                sequences: Mutex::new(HashMap::new()),
                behavior: Mutex::new(Behavior {
                    motion_delay: DEFAULT_MOTION_DELAY,
                    outcome: SimOutcome::Complete,
                    reject_submissions: false,
                    fail_unsubscribe: false,
                    synchronous_delivery: false,
                }),
                counters: Counters::default(),
                calls: Mutex::new(Vec::new()),
                connected: AtomicBool::new(true),
                next_handle: AtomicU32::new(1),
                motion_epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Time each motion (or each sequence task) takes before it reports
    pub fn set_motion_delay(&self, delay: Duration) {
        lock(&self.inner.behavior).motion_delay = delay;
    }

    pub fn set_outcome(&self, outcome: SimOutcome) {
        lock(&self.inner.behavior).outcome = outcome;
    }

    /// Reject `execute_action`, `create_sequence` and `play_sequence`
    pub fn set_reject_submissions(&self, reject: bool) {
        lock(&self.inner.behavior).reject_submissions = reject;
    }

    /// Fail `unsubscribe` and keep the registration
    pub fn set_fail_unsubscribe(&self, fail: bool) {
        lock(&self.inner.behavior).fail_unsubscribe = fail;
    }

    /// Publish notifications on the submitting thread, before the
    /// submission call returns
    pub fn set_synchronous_delivery(&self, synchronous: bool) {
        lock(&self.inner.behavior).synchronous_delivery = synchronous;
    }

    /// While disconnected every request fails with `NotConnected`
    pub fn set_connected(&self, connected: bool) {
        self.inner.connected.store(connected, Ordering::SeqCst);
    }

    /// State-changing requests in the order they were made
    pub fn calls(&self) -> Vec<DeviceCall> {
        lock(&self.inner.calls).clone()
    }

    pub fn stats(&self) -> SimStats {
        let c = &self.inner.counters;
        let registrations = lock(&self.inner.registrations);
        SimStats {
            subscribe_calls: c.subscribe.load(Ordering::SeqCst),
            unsubscribe_calls: c.unsubscribe.load(Ordering::SeqCst),
            active_subscriptions: registrations.action.len() + registrations.sequence.len(),
            actions_submitted: c.actions.load(Ordering::SeqCst),
            sequences_created: c.sequences_created.load(Ordering::SeqCst),
            sequences_played: c.sequences_played.load(Ordering::SeqCst),
            stop_calls: c.stops.load(Ordering::SeqCst),
            named_pose_queries: c.named_pose_queries.load(Ordering::SeqCst),
            feedback_queries: c.feedback_queries.load(Ordering::SeqCst),
        }
    }

    fn behavior(&self) -> Behavior {
        *lock(&self.inner.behavior)
    }

    fn ensure_connected(&self) -> Result<(), DeviceError> {
        if self.inner.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DeviceError::NotConnected)
        }
    }

    fn record(&self, call: DeviceCall) {
        lock(&self.inner.calls).push(call);
    }

    fn allocate_handle(&self) -> u32 {
        self.inner.next_handle.fetch_add(1, Ordering::SeqCst)
    }

    fn check_action(&self, action: &Action) -> Result<(), DeviceError> {
        match &action.kind {
            ActionKind::FromReference(handle) => self
                .inner
                .stored_pose(*handle)
                .map(|_| ())
                .ok_or(DeviceError::UnknownHandle(handle.0)),
            ActionKind::ReachJointAngles(angles) => {
                match angles.iter().find(|a| a.joint_identifier as usize >= self.inner.actuator_count) {
                    Some(a) => Err(DeviceError::Rejected(format!(
                        "joint identifier {} out of range",
                        a.joint_identifier
                    ))),
                    None => Ok(()),
                }
            }
            ActionKind::ReachPose(_) => Ok(()),
        }
    }
}

impl Inner {
    fn stored_pose(&self, handle: ActionHandle) -> Option<&StoredPose> {
        self.named_poses.iter().find(|p| p.handle == handle)
    }

    fn apply(&self, action: &Action) {
        let mut arm = lock(&self.arm);
        match &action.kind {
            ActionKind::ReachPose(pose) => arm.tool_pose = *pose,
            ActionKind::ReachJointAngles(angles) => {
                for angle in angles {
                    if let Some(joint) = arm.joints.get_mut(angle.joint_identifier as usize) {
                        *joint = angle.value;
                    }
                }
            }
            ActionKind::FromReference(handle) => {
                if let Some(stored) = self.stored_pose(*handle) {
                    arm.joints = stored.joints.clone();
                    arm.tool_pose = stored.tool_pose;
                }
            }
        }
    }

    fn publish_action(&self, notification: ActionNotification) {
        let handlers: Vec<SharedActionHandler> = lock(&self.registrations).action.values().cloned().collect();
        for handler in handlers {
            handler(&notification);
        }
    }

    fn publish_sequence(&self, notification: SequenceNotification) {
        let handlers: Vec<SharedSequenceHandler> =
            lock(&self.registrations).sequence.values().cloned().collect();
        for handler in handlers {
            handler(&notification);
        }
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.motion_epoch.load(Ordering::SeqCst) == epoch
    }

    fn run_action(&self, action: Action, behavior: Behavior, epoch: u64) {
        if behavior.outcome == SimOutcome::Silent {
            return;
        }
        let handle = match action.kind {
            ActionKind::FromReference(handle) => Some(handle),
            _ => None,
        };
        let notify = |action_event, abort_details| ActionNotification {
            action_event,
            handle,
            abort_details,
        };

        self.publish_action(notify(ActionEvent::ActionStart, 0));
        thread::sleep(behavior.motion_delay);
        if !self.is_current(epoch) {
            return;
        }

        match behavior.outcome {
            SimOutcome::Abort(code) => self.publish_action(notify(ActionEvent::ActionAbort, code)),
            _ => {
                self.apply(&action);
                self.publish_action(notify(ActionEvent::ActionEnd, 0));
            }
        }
    }

    fn run_sequence(&self, sequence: SequenceDescriptor, behavior: Behavior, epoch: u64) {
        if behavior.outcome == SimOutcome::Silent {
            return;
        }
        let notify = |event_identifier, task_index, abort_details| SequenceNotification {
            event_identifier,
            task_index,
            abort_details,
        };

        for task in &sequence.tasks {
            self.publish_sequence(notify(SequenceEvent::SequenceTaskStarted, task.group_identifier, 0));
            thread::sleep(behavior.motion_delay);
            if !self.is_current(epoch) {
                return;
            }
            if let SimOutcome::Abort(code) = behavior.outcome {
                self.publish_sequence(notify(SequenceEvent::SequenceAborted, task.group_identifier, code));
                return;
            }
            self.apply(&task.action);
            self.publish_sequence(notify(SequenceEvent::SequenceTaskCompleted, task.group_identifier, 0));
        }
        self.publish_sequence(notify(SequenceEvent::SequenceCompleted, 0, 0));
    }
}

impl ArmDevice for SimulatedArm {
    fn list_named_poses(&self) -> Result<Vec<NamedPoseEntry>, DeviceError> {
        self.inner.counters.named_pose_queries.fetch_add(1, Ordering::SeqCst);
        self.ensure_connected()?;
        Ok(self
            .inner
            .named_poses
            .iter()
            .map(|p| NamedPoseEntry {
                name: p.name.clone(),
                handle: p.handle,
            })
            .collect())
    }

    fn actuator_count(&self) -> Result<usize, DeviceError> {
        self.ensure_connected()?;
        Ok(self.inner.actuator_count)
    }

    fn execute_action(&self, action: &Action) -> Result<(), DeviceError> {
        self.inner.counters.actions.fetch_add(1, Ordering::SeqCst);
        self.record(DeviceCall::ExecuteAction);
        self.ensure_connected()?;
        let behavior = self.behavior();
        if behavior.reject_submissions {
            return Err(DeviceError::Rejected(format!("action '{}' refused", action.name)));
        }
        self.check_action(action)?;

        debug!("Simulated arm accepted action '{}'", action.name);
        let inner = Arc::clone(&self.inner);
        let action = action.clone();
        let epoch = inner.motion_epoch.load(Ordering::SeqCst);
        if behavior.synchronous_delivery {
            inner.run_action(action, behavior, epoch);
        } else {
            thread::spawn(move || inner.run_action(action, behavior, epoch));
        }
        Ok(())
    }

    fn create_sequence(&self, sequence: &SequenceDescriptor) -> Result<SequenceHandle, DeviceError> {
        self.inner.counters.sequences_created.fetch_add(1, Ordering::SeqCst);
        self.record(DeviceCall::CreateSequence);
        self.ensure_connected()?;
        if self.behavior().reject_submissions {
            return Err(DeviceError::Rejected(format!("sequence '{}' refused", sequence.name)));
        }
        for task in &sequence.tasks {
            self.check_action(&task.action)?;
        }

        let handle = self.allocate_handle();
        lock(&self.inner.sequences).insert(handle, sequence.clone());
        Ok(SequenceHandle(handle))
    }

    fn play_sequence(&self, handle: SequenceHandle) -> Result<(), DeviceError> {
        self.inner.counters.sequences_played.fetch_add(1, Ordering::SeqCst);
        self.record(DeviceCall::PlaySequence);
        self.ensure_connected()?;
        let behavior = self.behavior();
        if behavior.reject_submissions {
            return Err(DeviceError::Rejected("sequence playback refused".to_string()));
        }
        let sequence = lock(&self.inner.sequences)
            .get(&handle.0)
            .cloned()
            .ok_or(DeviceError::UnknownHandle(handle.0))?;

        debug!("Simulated arm playing '{}'", sequence.name);
        let inner = Arc::clone(&self.inner);
        let epoch = inner.motion_epoch.load(Ordering::SeqCst);
        if behavior.synchronous_delivery {
            inner.run_sequence(sequence, behavior, epoch);
        } else {
            thread::spawn(move || inner.run_sequence(sequence, behavior, epoch));
        }
        Ok(())
    }

    fn refresh_feedback(&self) -> Result<Feedback, DeviceError> {
        self.inner.counters.feedback_queries.fetch_add(1, Ordering::SeqCst);
        self.ensure_connected()?;
        let arm = lock(&self.inner.arm);
        Ok(Feedback {
            tool_pose: arm.tool_pose,
            actuators: arm
                .joints
                .iter()
                .map(|&position| ActuatorFeedback {
                    position,
                    velocity: 0.0,
                })
                .collect(),
        })
    }

    fn subscribe_action_events(&self, handler: ActionHandler) -> Result<NotificationHandle, DeviceError> {
        self.inner.counters.subscribe.fetch_add(1, Ordering::SeqCst);
        self.record(DeviceCall::SubscribeAction);
        self.ensure_connected()?;
        let handle = self.allocate_handle();
        lock(&self.inner.registrations).action.insert(handle, Arc::from(handler));
        Ok(NotificationHandle(handle))
    }

    fn subscribe_sequence_events(&self, handler: SequenceHandler) -> Result<NotificationHandle, DeviceError> {
        self.inner.counters.subscribe.fetch_add(1, Ordering::SeqCst);
        self.record(DeviceCall::SubscribeSequence);
        self.ensure_connected()?;
        let handle = self.allocate_handle();
        lock(&self.inner.registrations).sequence.insert(handle, Arc::from(handler));
        Ok(NotificationHandle(handle))
    }

    fn unsubscribe(&self, handle: NotificationHandle) -> Result<(), DeviceError> {
        self.inner.counters.unsubscribe.fetch_add(1, Ordering::SeqCst);
        self.record(DeviceCall::Unsubscribe);
        self.ensure_connected()?;
        if self.behavior().fail_unsubscribe {
            return Err(DeviceError::Transport(format!("unsubscribe of {} timed out", handle)));
        }
        let mut registrations = lock(&self.inner.registrations);
        registrations.action.remove(&handle.0);
        registrations.sequence.remove(&handle.0);
        Ok(())
    }

    fn stop_action(&self) -> Result<(), DeviceError> {
        self.inner.counters.stops.fetch_add(1, Ordering::SeqCst);
        self.record(DeviceCall::Stop);
        self.ensure_connected()?;
        self.inner.motion_epoch.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Requests seen by a [`SimulatedTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Connect { host: String, port: u16 },
    CreateSession { username: String },
    CloseSession,
    Disconnect,
}

/// Transport that "connects" to a [`SimulatedArm`]
pub struct SimulatedTransport {
    arm: SimulatedArm,
    calls: Arc<Mutex<Vec<TransportCall>>>,
    fail_login: bool,
}

impl SimulatedTransport {
    pub fn new(arm: SimulatedArm) -> Self {
        Self {
            arm,
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_login: false,
        }
    }

    /// Refuse every session login
    pub fn failing_login(mut self) -> Self {
        self.fail_login = true;
        self
    }

    /// Shared view of the call log, usable after the transport is moved
    pub fn call_log(&self) -> Arc<Mutex<Vec<TransportCall>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: TransportCall) {
        lock(&self.calls).push(call);
    }
}

impl Transport for SimulatedTransport {
    fn connect(&mut self, host: &str, port: u16) -> Result<(), DeviceError> {
        self.record(TransportCall::Connect {
            host: host.to_string(),
            port,
        });
        self.arm.set_connected(true);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), DeviceError> {
        self.record(TransportCall::Disconnect);
        self.arm.set_connected(false);
        Ok(())
    }

    fn create_session(&mut self, info: &SessionInfo) -> Result<(), DeviceError> {
        self.record(TransportCall::CreateSession {
            username: info.username.clone(),
        });
        if self.fail_login {
            return Err(DeviceError::Rejected(format!("login refused for {}", info.username)));
        }
        Ok(())
    }

    fn close_session(&mut self, _timeout: Duration) -> Result<(), DeviceError> {
        self.record(TransportCall::CloseSession);
        Ok(())
    }

    fn device(&self) -> Arc<dyn ArmDevice> {
        Arc::new(self.arm.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{JointAngle, SequenceTask};
    use crossbeam::channel::{self, Receiver};

    fn recorder(arm: &SimulatedArm) -> (NotificationHandle, Receiver<ActionEvent>) {
        let (tx, rx) = channel::unbounded();
        let handle = arm
            .subscribe_action_events(Box::new(move |n: &ActionNotification| {
                let _ = tx.send(n.action_event);
            }))
            .unwrap();
        (handle, rx)
    }

    #[test]
    fn test_action_publishes_start_then_end() {
        let arm = SimulatedArm::new();
        let (_handle, rx) = recorder(&arm);

        arm.execute_action(&Action::new("Home", ActionKind::FromReference(ActionHandle(1))))
            .unwrap();

        let timeout = Duration::from_secs(1);
        assert_eq!(rx.recv_timeout(timeout), Ok(ActionEvent::ActionStart));
        assert_eq!(rx.recv_timeout(timeout), Ok(ActionEvent::ActionEnd));
        assert_eq!(arm.refresh_feedback().unwrap().tool_pose, Pose::new(0.44, 0.19, 0.45, 90.0, 0.0, 150.0));
    }

    #[test]
    fn test_unsubscribed_handler_hears_nothing() {
        let arm = SimulatedArm::new();
        let (handle, rx) = recorder(&arm);
        arm.unsubscribe(handle).unwrap();
        arm.unsubscribe(handle).unwrap();

        arm.execute_action(&Action::new("p", ActionKind::ReachPose(Pose::new(0.1, 0.0, 0.2, 0.0, 0.0, 0.0))))
            .unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(arm.stats().unsubscribe_calls, 2);
    }

    #[test]
    fn test_rejects_unknown_reference_and_joint() {
        let arm = SimulatedArm::with_actuators(6);
        assert_eq!(
            arm.execute_action(&Action::new("x", ActionKind::FromReference(ActionHandle(99)))),
            Err(DeviceError::UnknownHandle(99))
        );

        let angles = vec![JointAngle {
            joint_identifier: 6,
            value: 1.0,
        }];
        let sequence = SequenceDescriptor {
            name: "bad".to_string(),
            tasks: vec![SequenceTask {
                group_identifier: 0,
                action: Action::new("joints", ActionKind::ReachJointAngles(angles)),
            }],
        };
        assert!(matches!(arm.create_sequence(&sequence), Err(DeviceError::Rejected(_))));
    }

    #[test]
    fn test_stop_silences_in_flight_motion() {
        let arm = SimulatedArm::new();
        arm.set_motion_delay(Duration::from_millis(50));
        let (_handle, rx) = recorder(&arm);

        arm.execute_action(&Action::new("Home", ActionKind::FromReference(ActionHandle(1))))
            .unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)), Ok(ActionEvent::ActionStart));
        arm.stop_action().unwrap();

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        assert_eq!(arm.refresh_feedback().unwrap().tool_pose, Pose::new(0.0, 0.0, 1.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_synchronous_delivery_publishes_before_returning() {
        let arm = SimulatedArm::new();
        arm.set_synchronous_delivery(true);
        let (_handle, rx) = recorder(&arm);

        arm.execute_action(&Action::new("Retract", ActionKind::FromReference(ActionHandle(2))))
            .unwrap();
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![ActionEvent::ActionStart, ActionEvent::ActionEnd]);
        assert_eq!(arm.calls(), vec![DeviceCall::SubscribeAction, DeviceCall::ExecuteAction]);
    }

    #[test]
    fn test_disconnected_arm_refuses_requests() {
        let arm = SimulatedArm::new();
        let mut transport = SimulatedTransport::new(arm.clone());
        transport.connect("10.0.0.3", 10000).unwrap();
        transport.disconnect().unwrap();

        assert_eq!(arm.actuator_count(), Err(DeviceError::NotConnected));
        assert_eq!(arm.stop_action(), Err(DeviceError::NotConnected));

        transport.connect("10.0.0.3", 10000).unwrap();
        assert_eq!(arm.actuator_count(), Ok(6));
    }

    #[test]
    fn test_feedback_reports_one_entry_per_actuator() {
        let arm = SimulatedArm::with_actuators(7);
        let feedback = arm.refresh_feedback().unwrap();
        assert_eq!(feedback.actuators.len(), 7);
        assert_eq!(feedback.positions(), vec![0.0; 7]);
        assert_eq!(feedback.velocities(), vec![0.0; 7]);
    }
}
