//! Arm Controller - high-level motion API
//!
//! Wraps a device handle with the configured execution settings and offers
//! the everyday operations: moving to named poses, joint and cartesian
//! targets, sequences, and reading back feedback.

use crate::action::{
    build_cartesian_target, build_joint_target, build_named_pose, build_sequence, CartesianTarget,
    MotionCommand, Sequence,
};
use crate::config::ArmConfig;
use crate::coordinator::{Coordinator, ExecutionOptions, ExecutionReport};
use crate::device::ArmDevice;
use crate::error::{ExecutionError, ResolutionError};
use crate::events::{ConsoleEvents, EventSink, NoOpEvents};
use crate::pose::Pose;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Named poses every arm of this family stores
pub const POSE_RETRACT: &str = "Retract";
pub const POSE_HOME: &str = "Home";
pub const POSE_ZERO: &str = "Zero";
pub const POSE_PACKAGING: &str = "Packaging";

/// High-level controller for one arm
#[derive(Clone)]
pub struct ArmController {
    device: Arc<dyn ArmDevice>,
    options: ExecutionOptions,
    events: Arc<dyn EventSink>,
}

impl ArmController {
    pub fn new(device: Arc<dyn ArmDevice>) -> Self {
        Self {
            device,
            options: ExecutionOptions::default(),
            events: Arc::new(NoOpEvents),
        }
    }

    /// Controller using the execution section of `config`
    pub fn with_config(device: Arc<dyn ArmDevice>, config: &ArmConfig) -> Self {
        let execution = config.execution();
        let events: Arc<dyn EventSink> = if execution.emit_events() {
            Arc::new(ConsoleEvents::new())
        } else {
            Arc::new(NoOpEvents)
        };
        Self {
            device,
            options: execution.options(),
            events,
        }
    }

    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    pub fn device(&self) -> &Arc<dyn ArmDevice> {
        &self.device
    }

    /// Execute one command, returning the full report
    pub fn execute_with_report(&self, command: &MotionCommand) -> ExecutionReport {
        Coordinator::new(self.device.as_ref(), self.options)
            .with_events(self.events.as_ref())
            .execute(command)
    }

    /// Execute one sequence, returning the full report
    pub fn execute_sequence_with_report(&self, sequence: &Sequence) -> ExecutionReport {
        Coordinator::new(self.device.as_ref(), self.options)
            .with_events(self.events.as_ref())
            .execute_sequence(sequence)
    }

    pub fn execute(&self, command: &MotionCommand) -> std::result::Result<(), ExecutionError> {
        self.execute_with_report(command).into_result()
    }

    pub fn execute_sequence(&self, sequence: &Sequence) -> std::result::Result<(), ExecutionError> {
        self.execute_sequence_with_report(sequence).into_result()
    }

    /// Same as [`ArmController::execute`] with a one-off timeout
    pub fn execute_with_timeout(
        &self,
        command: &MotionCommand,
        timeout: Duration,
    ) -> std::result::Result<(), ExecutionError> {
        Coordinator::new(self.device.as_ref(), ExecutionOptions { timeout, ..self.options })
            .with_events(self.events.as_ref())
            .execute(command)
            .into_result()
    }

    /// Move to a pose stored on the device under `name`
    pub fn move_named_pose(&self, name: &str) -> std::result::Result<(), ExecutionError> {
        info!("Moving the arm to named pose '{}'", name);
        let result = self.execute(&build_named_pose(name));
        match &result {
            Ok(()) => info!("Named pose '{}' reached", name),
            Err(e) => error!("Can't reach named pose '{}': {}", name, e),
        }
        result
    }

    /// Move every actuator to the given angle, in degrees
    pub fn move_angular(&self, configuration: &[f64]) -> std::result::Result<(), ExecutionError> {
        let command = self.create_joint_action(configuration)?;
        let result = self.execute(&command);
        if result.is_ok() {
            info!("Angular movement completed");
        }
        result
    }

    pub fn move_cartesian(&self, target: CartesianTarget) -> std::result::Result<(), ExecutionError> {
        let command = self.create_cartesian_action(target)?;
        let result = self.execute(&command);
        if result.is_ok() {
            info!("Cartesian movement completed");
        }
        result
    }

    /// Run `commands` as one device sequence
    pub fn move_sequence(&self, commands: Vec<MotionCommand>) -> std::result::Result<(), ExecutionError> {
        self.execute_sequence(&build_sequence(commands))
    }

    /// Joint target checked against the device's actuator count
    pub fn create_joint_action(&self, joints: &[f64]) -> std::result::Result<MotionCommand, ExecutionError> {
        let actuator_count = self.device.actuator_count().map_err(ResolutionError::Query)?;
        Ok(build_joint_target(joints, actuator_count)?)
    }

    /// Cartesian target; relative targets are offset from freshly sampled feedback
    pub fn create_cartesian_action(
        &self,
        target: CartesianTarget,
    ) -> std::result::Result<MotionCommand, ExecutionError> {
        let current = match target {
            CartesianTarget::Absolute(_) => None,
            CartesianTarget::Relative(_) => Some(self.get_pose().map_err(ResolutionError::Query)?),
        };
        Ok(build_cartesian_target(target, current.as_ref())?)
    }

    /// Current tool pose
    pub fn get_pose(&self) -> std::result::Result<Pose, crate::DeviceError> {
        Ok(self.device.refresh_feedback()?.tool_pose)
    }

    /// Current actuator positions, in degrees
    pub fn get_joints(&self) -> Result<Vec<f64>> {
        Ok(self.device.refresh_feedback()?.positions())
    }

    /// Current actuator velocities
    pub fn get_joint_velocities(&self) -> Result<Vec<f64>> {
        Ok(self.device.refresh_feedback()?.velocities())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AbortReason;
    use crate::sim::{SimOutcome, SimulatedArm};

    fn controller(arm: &SimulatedArm) -> ArmController {
        ArmController::new(Arc::new(arm.clone()))
            .with_options(ExecutionOptions::with_timeout(Duration::from_secs(2)))
    }

    #[test]
    fn test_move_named_pose_updates_feedback() {
        let arm = SimulatedArm::new();
        let controller = controller(&arm);

        controller.move_named_pose(POSE_RETRACT).unwrap();
        assert_eq!(controller.get_pose().unwrap(), Pose::new(0.13, -0.07, 0.12, 0.0, 180.0, 90.0));
        assert_eq!(
            controller.get_joints().unwrap(),
            vec![357.0, 21.0, 150.0, 272.0, 320.0, 273.0]
        );
    }

    #[test]
    fn test_move_angular_sets_joints() {
        let arm = SimulatedArm::new();
        let controller = controller(&arm);

        controller.move_angular(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0]).unwrap();
        assert_eq!(controller.get_joints().unwrap(), vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
        assert_eq!(controller.get_joint_velocities().unwrap(), vec![0.0; 6]);
    }

    #[test]
    fn test_move_angular_rejects_wrong_arity_without_subscribing() {
        let arm = SimulatedArm::new();
        let result = controller(&arm).move_angular(&[0.0; 5]);

        assert_eq!(
            result,
            Err(ExecutionError::ResolutionFailed(ResolutionError::ArityMismatch {
                expected: 6,
                actual: 5
            }))
        );
        assert_eq!(arm.stats().subscribe_calls, 0);
    }

    #[test]
    fn test_relative_move_samples_feedback() {
        let arm = SimulatedArm::new();
        let controller = controller(&arm);
        controller
            .move_cartesian(CartesianTarget::Absolute(Pose::new(0.15, 0.0, 0.20, 0.0, 180.0, 90.0)))
            .unwrap();

        controller
            .move_cartesian(CartesianTarget::Relative(vec![0.1, 0.0, 0.0]))
            .unwrap();
        let pose = controller.get_pose().unwrap();
        assert_eq!(pose.x(), 0.15 + 0.1);
        assert_eq!(pose.rotation(), [0.0, 180.0, 90.0]);
        assert!(arm.stats().feedback_queries >= 1);
    }

    #[test]
    fn test_relative_move_with_bad_delta_fails() {
        let arm = SimulatedArm::new();
        let result = controller(&arm).move_cartesian(CartesianTarget::Relative(vec![0.1, 0.2]));
        assert_eq!(
            result,
            Err(ExecutionError::ResolutionFailed(ResolutionError::InvalidDeltaLength(2)))
        );
    }

    #[test]
    fn test_move_sequence_reports_abort() {
        let arm = SimulatedArm::new();
        arm.set_outcome(SimOutcome::Abort(3));
        let controller = controller(&arm);

        let result = controller.move_sequence(vec![build_named_pose(POSE_HOME), build_named_pose(POSE_ZERO)]);
        assert_eq!(result, Err(ExecutionError::Aborted(AbortReason(3))));
    }

    #[test]
    fn test_execute_with_timeout_overrides_default() {
        let arm = SimulatedArm::new();
        arm.set_outcome(SimOutcome::Silent);

        let result = controller(&arm).execute_with_timeout(&build_named_pose(POSE_PACKAGING), Duration::from_millis(30));
        assert_eq!(result, Err(ExecutionError::TimedOut(Duration::from_millis(30))));
    }

    #[test]
    fn test_config_drives_options() {
        let config = ArmConfig::load_from_str(
            "connection:\n  host: 10.0.0.1\nexecution:\n  action_timeout_seconds: 3\n  cancel_on_timeout: true\n",
        )
        .unwrap();
        let controller = ArmController::with_config(Arc::new(SimulatedArm::new()), &config);
        assert_eq!(controller.options().timeout, Duration::from_secs(3));
        assert!(controller.options().cancel_on_timeout);
    }
}
