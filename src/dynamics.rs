pub mod state;

use crate::dynamics::state::{Accel, PendulumState};

// ---------------------------------------------------------------------------
// Equations of motion (planar double pendulum, point masses)
// ---------------------------------------------------------------------------

/// Angular accelerations of both arms under gravity `g`.
///
/// Closed-form solution of the Lagrangian equations for two massless rods
/// with point masses at their ends. The term order is fixed so that runs
/// reproduce reference trajectories bit for bit: squared velocities are
/// formed first, then scaled left to right. Do not regroup.
///
/// Requires `length1 > 0`. The shared denominator
/// `(m1 + m2) L1 - m2 L1 cos^2(delta)` is at least `m1 L1 > 0` for positive
/// masses, so it can become small but never zero.
pub fn accelerations(state: &PendulumState, g: f64) -> Accel {
    let PendulumState {
        theta1,
        theta2,
        omega1,
        omega2,
        length1: l1,
        length2: l2,
        mass1: m1,
        mass2: m2,
    } = *state;

    let delta = theta2 - theta1;
    let (sin_d, cos_d) = (delta.sin(), delta.cos());

    let denom1 = (m1 + m2) * l1 - m2 * l1 * cos_d * cos_d;
    let denom2 = (l2 / l1) * denom1;

    let (omega1_sq, omega2_sq) = (omega1 * omega1, omega2 * omega2);

    let alpha1 = (m2 * l1 * omega1_sq * sin_d * cos_d
        + m2 * g * theta2.sin() * cos_d
        + m2 * l2 * omega2_sq * sin_d
        - (m1 + m2) * g * theta1.sin())
        / denom1;

    let alpha2 = (-m2 * l2 * omega2_sq * sin_d * cos_d
        + (m1 + m2) * g * theta1.sin() * cos_d
        - (m1 + m2) * l1 * omega1_sq * sin_d
        - (m1 + m2) * g * theta2.sin())
        / denom2;

    Accel { alpha1, alpha2 }
}

// ---------------------------------------------------------------------------
// Energy
// ---------------------------------------------------------------------------

pub fn kinetic_energy(state: &PendulumState) -> f64 {
    let PendulumState {
        theta1,
        theta2,
        omega1,
        omega2,
        length1: l1,
        length2: l2,
        mass1: m1,
        mass2: m2,
    } = *state;

    let v1_sq = l1 * l1 * omega1 * omega1;
    let v2_sq = v1_sq
        + l2 * l2 * omega2 * omega2
        + 2.0 * l1 * l2 * omega1 * omega2 * (theta1 - theta2).cos();
    0.5 * m1 * v1_sq + 0.5 * m2 * v2_sq
}

/// Potential energy with the pivot as reference height (y grows downward).
pub fn potential_energy(state: &PendulumState, g: f64) -> f64 {
    let (p1, p2) = state.joint_positions();
    -state.mass1 * g * p1.y - state.mass2 * g * p2.y
}

/// Kinetic plus potential energy.
pub fn total_energy(state: &PendulumState, g: f64) -> f64 {
    kinetic_energy(state) + potential_energy(state, g)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
