use std::f64::consts::FRAC_PI_2;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::{PendulumError, PendulumResult};

// ---------------------------------------------------------------------------
// Defaults (canvas units: pixels, ticks)
// ---------------------------------------------------------------------------

pub const DEFAULT_GRAVITY: f64 = 2000.0; // px/s^2
pub const DEFAULT_DT: f64 = 0.005; // s per tick

// ---------------------------------------------------------------------------
// Base parameters: what the user picks before a run
// ---------------------------------------------------------------------------

/// Initial angles, arm lengths and bob masses of a pendulum at rest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PendulumParams {
    pub theta1: f64,  // rad from vertical (down)
    pub theta2: f64,  // rad
    pub length1: f64, // px
    pub length2: f64, // px
    pub mass1: f64,
    pub mass2: f64,
}

impl Default for PendulumParams {
    fn default() -> Self {
        Self {
            theta1: FRAC_PI_2,
            theta2: FRAC_PI_2,
            length1: 150.0,
            length2: 150.0,
            mass1: 1.0,
            mass2: 1.0,
        }
    }
}

impl PendulumParams {
    /// Check lengths and masses are positive and angles finite.
    pub fn validate(&self) -> PendulumResult<()> {
        check_angle(1, self.theta1)?;
        check_angle(2, self.theta2)?;
        check_length(1, self.length1)?;
        check_length(2, self.length2)?;
        check_mass(1, self.mass1)?;
        check_mass(2, self.mass2)
    }

    /// Same geometry, both angles shifted by `offset`.
    pub fn offset_angles(&self, offset: f64) -> Self {
        Self {
            theta1: self.theta1 + offset,
            theta2: self.theta2 + offset,
            ..*self
        }
    }

    /// A pendulum released from these angles with zero velocity.
    pub fn at_rest(&self) -> PendulumState {
        PendulumState {
            theta1: self.theta1,
            theta2: self.theta2,
            omega1: 0.0,
            omega2: 0.0,
            length1: self.length1,
            length2: self.length2,
            mass1: self.mass1,
            mass2: self.mass2,
        }
    }
}

// ---------------------------------------------------------------------------
// Dynamic state
// ---------------------------------------------------------------------------

/// Full state of one double pendulum.
///
/// Angles are phase variables and are never wrapped; they accumulate
/// across full rotations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendulumState {
    pub theta1: f64, // rad
    pub theta2: f64, // rad
    pub omega1: f64, // rad/s
    pub omega2: f64, // rad/s
    pub length1: f64,
    pub length2: f64,
    pub mass1: f64,
    pub mass2: f64,
}

impl PendulumState {
    /// Geometry and current angles as base parameters (velocities dropped).
    pub fn params(&self) -> PendulumParams {
        PendulumParams {
            theta1: self.theta1,
            theta2: self.theta2,
            length1: self.length1,
            length2: self.length2,
            mass1: self.mass1,
            mass2: self.mass2,
        }
    }

    pub fn validate(&self) -> PendulumResult<()> {
        self.params().validate()?;
        check_velocity(1, self.omega1)?;
        check_velocity(2, self.omega2)
    }

    pub fn is_finite(&self) -> bool {
        self.theta1.is_finite()
            && self.theta2.is_finite()
            && self.omega1.is_finite()
            && self.omega2.is_finite()
    }

    /// First and second bob positions relative to the pivot.
    /// Y grows downward, so a hanging pendulum has positive y.
    pub fn joint_positions(&self) -> (Vector2<f64>, Vector2<f64>) {
        let p1 = Vector2::new(
            self.length1 * self.theta1.sin(),
            self.length1 * self.theta1.cos(),
        );
        let p2 = p1
            + Vector2::new(
                self.length2 * self.theta2.sin(),
                self.length2 * self.theta2.cos(),
            );
        (p1, p2)
    }

    /// Position of the second bob, the point traced by trails.
    pub fn end_effector(&self) -> Vector2<f64> {
        self.joint_positions().1
    }
}

// ---------------------------------------------------------------------------
// Angular accelerations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accel {
    pub alpha1: f64, // rad/s^2
    pub alpha2: f64, // rad/s^2
}

// ---------------------------------------------------------------------------
// Precondition checks
// ---------------------------------------------------------------------------

fn check_angle(arm: u8, value: f64) -> PendulumResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PendulumError::NonFiniteAngle { arm, value })
    }
}

fn check_velocity(arm: u8, value: f64) -> PendulumResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PendulumError::NonFiniteVelocity { arm, value })
    }
}

fn check_length(arm: u8, value: f64) -> PendulumResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PendulumError::InvalidLength { arm, value })
    }
}

fn check_mass(arm: u8, value: f64) -> PendulumResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PendulumError::InvalidMass { arm, value })
    }
}
