//! Motion command and sequence builders
//!
//! Builders are pure: they turn poses and joint sets into [`MotionCommand`]
//! values without talking to the device. Device lookups (named pose handles,
//! actuator count) happen later in [`Resolver`], right before submission.

use crate::device::{
    Action, ActionKind, ArmDevice, JointAngle, NamedPoseEntry, SequenceDescriptor, SequenceTask,
};
use crate::error::ResolutionError;
use crate::pose::Pose;

/// Ordered joint angles in degrees, one per actuator
#[derive(Debug, Clone, PartialEq)]
pub struct JointConfiguration(Vec<f64>);

impl JointConfiguration {
    pub fn new(angles: Vec<f64>) -> Self {
        Self(angles)
    }

    pub fn angles(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f64>> for JointConfiguration {
    fn from(angles: Vec<f64>) -> Self {
        Self(angles)
    }
}

impl From<&[f64]> for JointConfiguration {
    fn from(angles: &[f64]) -> Self {
        Self(angles.to_vec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartesianMode {
    Absolute,
    Relative,
}

/// Cartesian goal as chosen by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum CartesianTarget {
    Absolute(Pose),
    /// Offset from the current tool pose: `[dx, dy, dz]` moves the tool and
    /// keeps its orientation, `[dx, dy, dz, dtx, dty, dtz]` also rotates it.
    Relative(Vec<f64>),
}

/// A built motion, ready to be resolved and submitted
#[derive(Debug, Clone, PartialEq)]
pub enum MotionCommand {
    NamedPose(String),
    JointTarget(JointConfiguration),
    CartesianTarget { pose: Pose, mode: CartesianMode },
}

pub fn build_named_pose(name: impl Into<String>) -> MotionCommand {
    MotionCommand::NamedPose(name.into())
}

pub fn build_joint_target(
    angles: impl Into<JointConfiguration>,
    actuator_count: usize,
) -> Result<MotionCommand, ResolutionError> {
    let angles = angles.into();
    if angles.len() != actuator_count {
        return Err(ResolutionError::ArityMismatch {
            expected: actuator_count,
            actual: angles.len(),
        });
    }
    Ok(MotionCommand::JointTarget(angles))
}

/// Build a cartesian command. `current_feedback` is the freshly sampled tool
/// pose and is only read for relative targets.
pub fn build_cartesian_target(
    target: CartesianTarget,
    current_feedback: Option<&Pose>,
) -> Result<MotionCommand, ResolutionError> {
    match target {
        CartesianTarget::Absolute(pose) => Ok(MotionCommand::CartesianTarget {
            pose,
            mode: CartesianMode::Absolute,
        }),
        CartesianTarget::Relative(delta) => {
            if delta.len() != 3 && delta.len() != 6 {
                return Err(ResolutionError::InvalidDeltaLength(delta.len()));
            }
            let current = current_feedback.ok_or(ResolutionError::MissingFeedback)?;

            let [x, y, z] = current.position();
            let [mut theta_x, mut theta_y, mut theta_z] = current.rotation();
            if delta.len() == 6 {
                theta_x += delta[3];
                theta_y += delta[4];
                theta_z += delta[5];
            }

            Ok(MotionCommand::CartesianTarget {
                pose: Pose::new(x + delta[0], y + delta[1], z + delta[2], theta_x, theta_y, theta_z),
                mode: CartesianMode::Relative,
            })
        }
    }
}

/// A command tagged with its position in a sequence
#[derive(Debug, Clone, PartialEq)]
pub struct SequencedCommand {
    group_identifier: u32,
    command: MotionCommand,
}

impl SequencedCommand {
    pub fn group_identifier(&self) -> u32 {
        self.group_identifier
    }

    pub fn command(&self) -> &MotionCommand {
        &self.command
    }
}

/// Ordered, immutable batch of motion commands
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    tasks: Vec<SequencedCommand>,
}

impl Sequence {
    pub fn tasks(&self) -> &[SequencedCommand] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn name(&self) -> String {
        format!("Sequence of {} tasks", self.tasks.len())
    }
}

pub fn build_sequence(commands: impl IntoIterator<Item = MotionCommand>) -> Sequence {
    let tasks = commands
        .into_iter()
        .zip(0u32..)
        .map(|(command, group_identifier)| SequencedCommand {
            group_identifier,
            command,
        })
        .collect();
    Sequence { tasks }
}

/// Turns motion commands into device actions.
///
/// Named poses and the actuator count are queried on first use and cached,
/// so resolving a whole sequence costs at most one query of each kind.
pub struct Resolver<'a> {
    device: &'a dyn ArmDevice,
    named_poses: Option<Vec<NamedPoseEntry>>,
    actuator_count: Option<usize>,
}

impl<'a> Resolver<'a> {
    pub fn new(device: &'a dyn ArmDevice) -> Self {
        Self {
            device,
            named_poses: None,
            actuator_count: None,
        }
    }

    pub fn resolve(&mut self, command: &MotionCommand) -> Result<Action, ResolutionError> {
        match command {
            MotionCommand::NamedPose(name) => {
                let entry = self
                    .named_poses()?
                    .iter()
                    .find(|entry| entry.name == *name)
                    .ok_or_else(|| ResolutionError::NamedPoseNotFound(name.clone()))?;
                Ok(Action::new(name.clone(), ActionKind::FromReference(entry.handle)))
            }
            MotionCommand::JointTarget(angles) => {
                let expected = self.actuator_count()?;
                if angles.len() != expected {
                    return Err(ResolutionError::ArityMismatch {
                        expected,
                        actual: angles.len(),
                    });
                }
                let joint_angles = angles
                    .angles()
                    .iter()
                    .zip(0u32..)
                    .map(|(&value, joint_identifier)| JointAngle {
                        joint_identifier,
                        value,
                    })
                    .collect();
                Ok(Action::new("Joint target", ActionKind::ReachJointAngles(joint_angles)))
            }
            MotionCommand::CartesianTarget { pose, .. } => {
                Ok(Action::new("Cartesian target", ActionKind::ReachPose(*pose)))
            }
        }
    }

    pub fn resolve_sequence(&mut self, sequence: &Sequence) -> Result<SequenceDescriptor, ResolutionError> {
        let tasks = sequence
            .tasks()
            .iter()
            .map(|task| {
                Ok(SequenceTask {
                    group_identifier: task.group_identifier(),
                    action: self.resolve(task.command())?,
                })
            })
            .collect::<Result<Vec<_>, ResolutionError>>()?;

        Ok(SequenceDescriptor {
            name: sequence.name(),
            tasks,
        })
    }

    fn named_poses(&mut self) -> Result<&[NamedPoseEntry], ResolutionError> {
        if self.named_poses.is_none() {
            let listed = self.device.list_named_poses().map_err(ResolutionError::Query)?;
            self.named_poses = Some(listed);
        }
        Ok(self.named_poses.as_deref().unwrap_or_default())
    }

    fn actuator_count(&mut self) -> Result<usize, ResolutionError> {
        match self.actuator_count {
            Some(count) => Ok(count),
            None => {
                let count = self.device.actuator_count().map_err(ResolutionError::Query)?;
                self.actuator_count = Some(count);
                Ok(count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ActionHandle;
    use crate::sim::SimulatedArm;

    fn feedback() -> Pose {
        Pose::new(0.2, -0.1, 0.3, 10.0, 170.0, 85.0)
    }

    #[test]
    fn test_absolute_target_copies_pose_fields() {
        let poses = [
            Pose::new(0.15, 0.0, 0.20, 0.0, 180.0, 90.0),
            Pose::new(-1.5, 2.25, 1e-9, -359.0, 0.5, 720.0),
            Pose::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
        ];
        for pose in poses {
            let command = build_cartesian_target(CartesianTarget::Absolute(pose), Some(&feedback())).unwrap();
            assert_eq!(
                command,
                MotionCommand::CartesianTarget {
                    pose,
                    mode: CartesianMode::Absolute
                }
            );
            let command = build_cartesian_target(CartesianTarget::Absolute(pose), None).unwrap();
            match command {
                MotionCommand::CartesianTarget { pose: built, .. } => {
                    assert_eq!(built.to_array(), pose.to_array())
                }
                other => panic!("unexpected command {:?}", other),
            }
        }
    }

    #[test]
    fn test_relative_translation_keeps_rotation() {
        let current = feedback();
        let command =
            build_cartesian_target(CartesianTarget::Relative(vec![0.1, 0.05, -0.02]), Some(&current)).unwrap();

        let MotionCommand::CartesianTarget { pose, mode } = command else {
            panic!("expected cartesian target");
        };
        assert_eq!(mode, CartesianMode::Relative);
        assert_eq!(pose.rotation(), current.rotation());
        assert_eq!(pose.x(), current.x() + 0.1);
        assert_eq!(pose.y(), current.y() + 0.05);
        assert_eq!(pose.z(), current.z() - 0.02);
    }

    #[test]
    fn test_relative_six_components_offsets_rotation() {
        let current = feedback();
        let delta = vec![0.01, 0.02, 0.03, 1.0, -2.0, 3.0];
        let command = build_cartesian_target(CartesianTarget::Relative(delta.clone()), Some(&current)).unwrap();

        let MotionCommand::CartesianTarget { pose, .. } = command else {
            panic!("expected cartesian target");
        };
        for (i, (built, base)) in pose.to_array().iter().zip(current.to_array()).enumerate() {
            assert_eq!(*built, base + delta[i]);
        }
    }

    #[test]
    fn test_relative_rejects_other_lengths() {
        for len in [0usize, 1, 2, 4, 5, 7, 12] {
            let delta = vec![0.5; len];
            assert_eq!(
                build_cartesian_target(CartesianTarget::Relative(delta), Some(&feedback())),
                Err(ResolutionError::InvalidDeltaLength(len))
            );
        }
    }

    #[test]
    fn test_relative_requires_feedback() {
        assert_eq!(
            build_cartesian_target(CartesianTarget::Relative(vec![0.0; 3]), None),
            Err(ResolutionError::MissingFeedback)
        );
    }

    #[test]
    fn test_joint_target_arity() {
        assert!(build_joint_target(vec![0.0; 6], 6).is_ok());
        for len in [0usize, 5, 7] {
            assert_eq!(
                build_joint_target(vec![12.5; len], 6),
                Err(ResolutionError::ArityMismatch { expected: 6, actual: len })
            );
        }
    }

    #[test]
    fn test_build_sequence_assigns_ids_in_order() {
        let sequence = build_sequence(vec![
            build_named_pose("Home"),
            build_named_pose("Retract"),
            build_named_pose("Zero"),
        ]);
        let ids: Vec<u32> = sequence.tasks().iter().map(|t| t.group_identifier()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(sequence.tasks()[1].command(), &build_named_pose("Retract"));
        assert_eq!(sequence.name(), "Sequence of 3 tasks");

        assert!(build_sequence(Vec::new()).is_empty());
    }

    #[test]
    fn test_resolver_matches_named_pose_exactly() {
        let arm = SimulatedArm::new();
        let mut resolver = Resolver::new(&arm);

        let action = resolver.resolve(&build_named_pose("Retract")).unwrap();
        assert!(matches!(action.kind, ActionKind::FromReference(ActionHandle(_))));

        assert_eq!(
            resolver.resolve(&build_named_pose("retract")),
            Err(ResolutionError::NamedPoseNotFound("retract".to_string()))
        );
        assert_eq!(arm.stats().named_pose_queries, 1);
    }

    #[test]
    fn test_resolver_checks_device_actuator_count() {
        let arm = SimulatedArm::with_actuators(7);
        let mut resolver = Resolver::new(&arm);
        let command = MotionCommand::JointTarget(JointConfiguration::new(vec![0.0; 6]));

        assert_eq!(
            resolver.resolve(&command),
            Err(ResolutionError::ArityMismatch { expected: 7, actual: 6 })
        );

        let command = build_joint_target(vec![1.0; 7], 7).unwrap();
        let action = resolver.resolve(&command).unwrap();
        let ActionKind::ReachJointAngles(angles) = action.kind else {
            panic!("expected joint angles");
        };
        let ids: Vec<u32> = angles.iter().map(|a| a.joint_identifier).collect();
        assert_eq!(ids, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_resolve_sequence_keeps_group_identifiers() {
        let arm = SimulatedArm::new();
        let sequence = build_sequence(vec![
            build_named_pose("Home"),
            build_cartesian_target(CartesianTarget::Absolute(feedback()), None).unwrap(),
        ]);

        let descriptor = Resolver::new(&arm).resolve_sequence(&sequence).unwrap();
        assert_eq!(descriptor.name, "Sequence of 2 tasks");
        let ids: Vec<u32> = descriptor.tasks.iter().map(|t| t.group_identifier).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(descriptor.tasks[1].action.kind, ActionKind::ReachPose(feedback()));
    }
}
