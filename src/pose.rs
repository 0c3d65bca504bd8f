//! Cartesian pose value
//!
//! Positions are in metres, orientations are Euler angles in degrees,
//! matching what the arm reports in its feedback.

use crate::error::ResolutionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable 6-DOF tool pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    x: f64,
    y: f64,
    z: f64,
    theta_x: f64,
    theta_y: f64,
    theta_z: f64,
}

impl Pose {
    pub const fn new(x: f64, y: f64, z: f64, theta_x: f64, theta_y: f64, theta_z: f64) -> Self {
        Self { x, y, z, theta_x, theta_y, theta_z }
    }

    /// Build a pose from `[x, y, z, theta_x, theta_y, theta_z]`
    pub fn from_slice(values: &[f64]) -> Result<Self, ResolutionError> {
        match values {
            &[x, y, z, theta_x, theta_y, theta_z] => Ok(Self::new(x, y, z, theta_x, theta_y, theta_z)),
            _ => Err(ResolutionError::InvalidPoseLength(values.len())),
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn theta_x(&self) -> f64 {
        self.theta_x
    }

    pub fn theta_y(&self) -> f64 {
        self.theta_y
    }

    pub fn theta_z(&self) -> f64 {
        self.theta_z
    }

    /// Translation `[x, y, z]`
    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Orientation `[theta_x, theta_y, theta_z]`
    pub fn rotation(&self) -> [f64; 3] {
        [self.theta_x, self.theta_y, self.theta_z]
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.x, self.y, self.z, self.theta_x, self.theta_y, self.theta_z]
    }
}

impl From<[f64; 6]> for Pose {
    fn from(v: [f64; 6]) -> Self {
        Self::new(v[0], v[1], v[2], v[3], v[4], v[5])
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Position:\n\tx: {}\n\ty: {}\n\tz: {}\nRotation:\n\tx: {}\n\ty: {}\n\tz: {}",
            self.x, self.y, self.z, self.theta_x, self.theta_y, self.theta_z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_requires_six_values() {
        let pose = Pose::from_slice(&[0.15, 0.0, 0.20, 0.0, 180.0, 90.0]).unwrap();
        assert_eq!(pose.x(), 0.15);
        assert_eq!(pose.theta_y(), 180.0);
        assert_eq!(pose.theta_z(), 90.0);

        assert_eq!(
            Pose::from_slice(&[0.1, 0.2, 0.3]),
            Err(ResolutionError::InvalidPoseLength(3))
        );
        assert_eq!(
            Pose::from_slice(&[0.0; 7]),
            Err(ResolutionError::InvalidPoseLength(7))
        );
    }

    #[test]
    fn test_display_lists_position_then_rotation() {
        let pose = Pose::new(0.25, 0.1, 0.2, 0.0, 180.0, 90.0);
        let rendered = pose.to_string();
        assert_eq!(
            rendered,
            "Position:\n\tx: 0.25\n\ty: 0.1\n\tz: 0.2\nRotation:\n\tx: 0\n\ty: 180\n\tz: 90"
        );
    }

    #[test]
    fn test_array_accessors() {
        let pose = Pose::from([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(pose.position(), [1.0, 2.0, 3.0]);
        assert_eq!(pose.rotation(), [4.0, 5.0, 6.0]);
        assert_eq!(pose.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
