use std::io::{self, Write};
use std::path::Path;

use crate::dynamics;
use crate::dynamics::state::PendulumState;

/// Write one pendulum's per-tick history as CSV.
///
/// Row `i` is the state after `i` ticks of length `dt`.
/// Columns: tick, time, theta1, theta2, omega1, omega2, x2, y2, energy
pub fn write_trajectory<W: Write>(
    writer: &mut W,
    trajectory: &[PendulumState],
    dt: f64,
    g: f64,
) -> io::Result<()> {
    writeln!(writer, "tick,time,theta1,theta2,omega1,omega2,x2,y2,energy")?;

    for (tick, s) in trajectory.iter().enumerate() {
        let end = s.end_effector();
        writeln!(
            writer,
            "{},{:.4},{:.9},{:.9},{:.9},{:.9},{:.4},{:.4},{:.6}",
            tick,
            tick as f64 * dt,
            s.theta1,
            s.theta2,
            s.omega1,
            s.omega2,
            end.x,
            end.y,
            dynamics::total_energy(s, g),
        )?;
    }

    Ok(())
}

/// Write trajectory to a CSV file at the given path.
pub fn write_trajectory_file(
    path: impl AsRef<Path>,
    trajectory: &[PendulumState],
    dt: f64,
    g: f64,
) -> io::Result<()> {
    let mut file = io::BufWriter::new(std::fs::File::create(path)?);
    write_trajectory(&mut file, trajectory, dt, g)?;
    file.flush()
}
