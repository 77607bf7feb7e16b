use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::dynamics;
use crate::dynamics::state::PendulumState;
use crate::error::PendulumResult;

/// Summary statistics of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub copies: usize,
    pub deviation: f64,
    pub dt: f64,
    pub gravity: f64,
    pub ticks: usize,
    pub elapsed: f64,
    pub initial_energy: f64,
    pub final_energy: f64,
    /// Largest `|E - E0|` seen on the original pendulum, relative to the
    /// potential depth `(m1 + m2) g L1 + m2 g L2`.
    pub max_energy_drift: f64,
    pub final_spread: f64,
    pub max_spread: f64,
    pub final_state: Option<PendulumState>,
}

impl RunSummary {
    /// Summarise the original pendulum's trajectory (row `i` after `i` ticks)
    /// together with the ensemble spread history.
    pub fn from_run(config: &SimConfig, trajectory: &[PendulumState], spreads: &[f64]) -> Self {
        let mut recorder = SummaryRecorder::new(config);
        trajectory.iter().for_each(|s| recorder.record_state(s));
        spreads.iter().for_each(|&s| recorder.record_spread(s));
        recorder.finish()
    }
}

/// Builds a [`RunSummary`] one tick at a time without keeping the trajectory.
#[derive(Debug, Clone)]
pub struct SummaryRecorder {
    summary: RunSummary,
    gravity: f64,
    depth: f64,
    rows: usize,
}

impl SummaryRecorder {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            summary: RunSummary {
                copies: config.copies,
                deviation: config.deviation,
                dt: config.dt,
                gravity: config.gravity,
                ticks: 0,
                elapsed: 0.0,
                initial_energy: 0.0,
                final_energy: 0.0,
                max_energy_drift: 0.0,
                final_spread: 0.0,
                max_spread: 0.0,
                final_state: None,
            },
            gravity: config.gravity,
            depth: 0.0,
            rows: 0,
        }
    }

    /// Record the original pendulum after the next tick (the first call is
    /// the initial state).
    pub fn record_state(&mut self, state: &PendulumState) {
        let g = self.gravity;
        let energy = dynamics::total_energy(state, g);
        if self.rows == 0 {
            self.summary.initial_energy = energy;
            self.depth =
                (state.mass1 + state.mass2) * g * state.length1 + state.mass2 * g * state.length2;
        }
        if self.depth > 0.0 {
            let drift = (energy - self.summary.initial_energy).abs() / self.depth;
            self.summary.max_energy_drift = self.summary.max_energy_drift.max(drift);
        }
        self.summary.final_energy = energy;
        self.summary.final_state = Some(*state);
        self.rows += 1;
    }

    pub fn record_spread(&mut self, spread: f64) {
        self.summary.final_spread = spread;
        self.summary.max_spread = self.summary.max_spread.max(spread);
    }

    pub fn finish(self) -> RunSummary {
        let ticks = self.rows.saturating_sub(1);
        RunSummary {
            ticks,
            elapsed: ticks as f64 * self.summary.dt,
            ..self.summary
        }
    }
}

/// Write run summary as pretty JSON to a writer.
pub fn write_summary<W: Write>(writer: &mut W, summary: &RunSummary) -> PendulumResult<()> {
    serde_json::to_writer_pretty(&mut *writer, summary)?;
    writeln!(writer)?;
    Ok(())
}

/// Write run summary JSON to a file.
pub fn write_summary_file(path: impl AsRef<Path>, summary: &RunSummary) -> PendulumResult<()> {
    let mut file = std::fs::File::create(path)?;
    write_summary(&mut file, summary)
}
