use crate::dynamics;
use crate::dynamics::state::PendulumState;
use crate::error::{PendulumError, PendulumResult};

// ---------------------------------------------------------------------------
// Semi-implicit (symplectic) Euler
// ---------------------------------------------------------------------------

/// Advance one tick without any input checks.
///
/// Velocities are updated first and the angles are advanced with the
/// *updated* velocities. Swapping the order gives explicit Euler, whose
/// energy grows without bound on this system.
pub fn semi_implicit_euler_step(state: &PendulumState, dt: f64, g: f64) -> PendulumState {
    let a = dynamics::accelerations(state, g);

    let omega1 = state.omega1 + a.alpha1 * dt;
    let omega2 = state.omega2 + a.alpha2 * dt;

    PendulumState {
        theta1: state.theta1 + omega1 * dt,
        theta2: state.theta2 + omega2 * dt,
        omega1,
        omega2,
        ..*state
    }
}

/// Advance one tick, rejecting invalid inputs and non-finite results.
///
/// The input is never modified; callers commit the returned state.
pub fn step(state: &PendulumState, dt: f64, g: f64) -> PendulumResult<PendulumState> {
    check_step_inputs(dt, g)?;
    state.validate()?;

    let next = semi_implicit_euler_step(state, dt, g);
    if !next.is_finite() {
        return Err(PendulumError::diverged(format!(
            "non-finite state after step (theta1={}, theta2={}, omega1={}, omega2={})",
            next.theta1, next.theta2, next.omega1, next.omega2
        )));
    }
    Ok(next)
}

pub(crate) fn check_step_inputs(dt: f64, g: f64) -> PendulumResult<()> {
    if !(dt.is_finite() && dt > 0.0) {
        return Err(PendulumError::InvalidTimestep(dt));
    }
    if !(g.is_finite() && g > 0.0) {
        return Err(PendulumError::InvalidGravity(g));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
