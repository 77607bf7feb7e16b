use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::integrator::step;
use super::trail::Trail;
use crate::colormap::{ensemble_color, Rgb};
use crate::config::SimConfig;
use crate::dynamics::state::{PendulumParams, PendulumState};
use crate::ensemble;
use crate::error::{PendulumError, PendulumResult};

// ---------------------------------------------------------------------------
// Driver phase
// ---------------------------------------------------------------------------

/// `reset -> Preview`, `start -> Running`, `stop -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Parameters are being edited; nothing is integrated.
    Preview,
    Running,
    /// Frozen; state and trails are kept for display.
    Stopped,
}

// ---------------------------------------------------------------------------
// A live pendulum with its trail
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Tracked {
    pub state: PendulumState,
    pub trail: Trail,
    /// Position in the ensemble range `[-1, 1]`; `None` for the original.
    pub fraction: Option<f64>,
}

impl Tracked {
    fn new(
        state: PendulumState,
        fraction: Option<f64>,
        trail_capacity: usize,
    ) -> PendulumResult<Self> {
        Ok(Self {
            state,
            trail: Trail::new(trail_capacity)?,
            fraction,
        })
    }

    pub fn is_original(&self) -> bool {
        self.fraction.is_none()
    }

    pub fn color(&self) -> Rgb {
        self.fraction.map_or(Rgb::WHITE, ensemble_color)
    }
}

// ---------------------------------------------------------------------------
// Simulation driver
// ---------------------------------------------------------------------------

/// Owns every live pendulum and advances them one tick at a time.
///
/// Pendulums do not interact; each tick applies the integrator to each one
/// independently. A tick is all-or-nothing: if any pendulum fails to step,
/// nothing is committed.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    phase: Phase,
    preview: PendulumState,
    original: Option<Tracked>,
    ensemble: Vec<Tracked>,
    ticks: u64,
}

impl Simulation {
    pub fn new(config: SimConfig) -> PendulumResult<Self> {
        config.validate()?;
        Ok(Self {
            preview: config.params.at_rest(),
            config,
            phase: Phase::Preview,
            original: None,
            ensemble: Vec::new(),
            ticks: 0,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Replace the base parameters. Takes effect on the next `start`;
    /// in `Preview` the preview pendulum follows immediately.
    pub fn set_params(&mut self, params: PendulumParams) -> PendulumResult<()> {
        params.validate()?;
        self.config.params = params;
        if self.phase == Phase::Preview {
            self.preview = params.at_rest();
        }
        debug!(?params, "parameters updated");
        Ok(())
    }

    /// Replace the copy count and deviation used by the next `start`.
    pub fn set_ensemble(&mut self, copies: usize, deviation: f64) -> PendulumResult<()> {
        let updated = self.config.clone().with_ensemble(copies, deviation);
        updated.validate()?;
        self.config = updated;
        Ok(())
    }

    /// Seed a fresh ensemble plus the original and start running.
    /// Any previous run is discarded.
    pub fn start(&mut self) -> PendulumResult<()> {
        let seeding = self.config.ensemble();
        let states = ensemble::seed(&seeding)?;
        let capacity = self.config.trail_capacity;

        let members = states
            .into_iter()
            .zip(seeding.fractions())
            .map(|(state, frac)| Tracked::new(state, Some(frac), capacity))
            .collect::<PendulumResult<Vec<_>>>()?;
        let original = Tracked::new(self.config.params.at_rest(), None, capacity)?;

        self.ensemble = members;
        self.original = Some(original);
        self.ticks = 0;
        self.phase = Phase::Running;

        info!(
            copies = self.ensemble.len(),
            deviation = seeding.deviation,
            dt = self.config.dt,
            gravity = self.config.gravity,
            "simulation started"
        );
        Ok(())
    }

    pub fn stop(&mut self) {
        self.phase = Phase::Stopped;
        info!(ticks = self.ticks, "simulation stopped");
    }

    /// Drop every live pendulum and return to editing.
    pub fn reset(&mut self) {
        self.ensemble.clear();
        self.original = None;
        self.ticks = 0;
        self.preview = self.config.params.at_rest();
        self.phase = Phase::Preview;
        info!("simulation reset");
    }

    /// Advance every live pendulum by one timestep. No-op unless running.
    pub fn tick(&mut self) -> PendulumResult<()> {
        if self.phase != Phase::Running {
            return Ok(());
        }
        let (dt, g) = (self.config.dt, self.config.gravity);

        let stepped = step_all(&self.ensemble, dt, g).and_then(|members| {
            let original = match &self.original {
                Some(o) => Some(step(&o.state, dt, g)?),
                None => None,
            };
            Ok((members, original))
        });
        let (members, original) = match stepped {
            Ok(next) => next,
            Err(err) => {
                warn!(tick = self.ticks, error = %err, "tick rejected");
                return Err(err);
            }
        };

        for (tracked, state) in self.ensemble.iter_mut().zip(members) {
            tracked.state = state;
            tracked.trail.push(state.end_effector());
        }
        if let (Some(tracked), Some(state)) = (self.original.as_mut(), original) {
            tracked.state = state;
            tracked.trail.push(state.end_effector());
        }
        self.ticks += 1;
        Ok(())
    }

    /// Run `ticks` ticks back to back, stopping at the first failure.
    pub fn run(&mut self, ticks: u64) -> PendulumResult<()> {
        if self.phase != Phase::Running {
            return Err(PendulumError::config(format!(
                "cannot run in {:?} phase; call start() first",
                self.phase
            )));
        }
        for _ in 0..ticks {
            self.tick()?;
        }
        Ok(())
    }

    /// The pendulum shown while editing parameters.
    pub fn preview(&self) -> &PendulumState {
        &self.preview
    }

    pub fn original(&self) -> Option<&Tracked> {
        self.original.as_ref()
    }

    pub fn ensemble(&self) -> &[Tracked] {
        &self.ensemble
    }

    /// Ensemble first, original last (draw order).
    pub fn live(&self) -> impl Iterator<Item = &Tracked> + '_ {
        self.ensemble.iter().chain(self.original.iter())
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated time since `start`.
    pub fn elapsed(&self) -> f64 {
        self.ticks as f64 * self.config.dt
    }

    /// Largest `|theta1 - original.theta1|` across the ensemble.
    pub fn spread(&self) -> f64 {
        let Some(original) = &self.original else {
            return 0.0;
        };
        self.ensemble
            .iter()
            .map(|m| (m.state.theta1 - original.state.theta1).abs())
            .fold(0.0_f64, f64::max)
    }
}

#[cfg(not(feature = "parallel"))]
fn step_all(members: &[Tracked], dt: f64, g: f64) -> PendulumResult<Vec<PendulumState>> {
    members.iter().map(|m| step(&m.state, dt, g)).collect()
}

#[cfg(feature = "parallel")]
fn step_all(members: &[Tracked], dt: f64, g: f64) -> PendulumResult<Vec<PendulumState>> {
    use rayon::prelude::*;
    members.par_iter().map(|m| step(&m.state, dt, g)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::state::{DEFAULT_DT, DEFAULT_GRAVITY};
    use crate::ensemble::SingleCopyOffset;
    use approx::assert_relative_eq;

    fn config(copies: usize, deviation: f64) -> SimConfig {
        SimConfig::default().with_ensemble(copies, deviation)
    }

    #[test]
    fn starts_in_preview_with_nothing_live() {
        let sim = Simulation::new(config(10, 0.003)).unwrap();
        assert_eq!(sim.phase(), Phase::Preview);
        assert!(sim.original().is_none());
        assert!(sim.ensemble().is_empty());
        assert_eq!(*sim.preview(), PendulumParams::default().at_rest());
    }

    #[test]
    fn invalid_config_rejected() {
        let err = Simulation::new(SimConfig::default().with_dt(-0.1)).unwrap_err();
        assert!(matches!(err, PendulumError::InvalidTimestep(_)));
    }

    #[test]
    fn preview_follows_params_only_while_editing() {
        let mut sim = Simulation::new(config(0, 0.003)).unwrap();
        let p = PendulumParams {
            theta1: 0.4,
            ..Default::default()
        };
        sim.set_params(p).unwrap();
        assert_eq!(sim.preview().theta1, 0.4);

        sim.start().unwrap();
        sim.set_params(PendulumParams {
            theta1: 2.0,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(sim.preview().theta1, 0.4);
        assert_eq!(sim.original().unwrap().state.theta1, 0.4);
    }

    #[test]
    fn invalid_params_leave_config_untouched() {
        let mut sim = Simulation::new(config(0, 0.003)).unwrap();
        let bad = PendulumParams {
            length1: 0.0,
            ..Default::default()
        };
        assert!(sim.set_params(bad).is_err());
        assert_eq!(sim.config().params, PendulumParams::default());
        assert!(sim.set_ensemble(5, -1.0).is_err());
        assert_eq!(sim.config().copies, 0);
    }

    #[test]
    fn start_seeds_ensemble_and_original() {
        let mut sim = Simulation::new(config(10, 0.003)).unwrap();
        sim.start().unwrap();
        assert_eq!(sim.phase(), Phase::Running);
        assert_eq!(sim.ensemble().len(), 10);

        let original = sim.original().unwrap();
        assert!(original.is_original());
        assert_eq!(original.color(), Rgb::WHITE);
        assert_eq!(original.state, PendulumParams::default().at_rest());

        assert_eq!(sim.ensemble()[0].fraction, Some(-1.0));
        assert_eq!(sim.ensemble()[9].fraction, Some(1.0));
        assert!(sim.live().last().unwrap().is_original());
        assert_eq!(sim.live().count(), 11);
    }

    #[test]
    fn tick_is_noop_outside_running() {
        let mut sim = Simulation::new(config(3, 0.003)).unwrap();
        sim.tick().unwrap();
        assert_eq!(sim.ticks(), 0);

        sim.start().unwrap();
        sim.tick().unwrap();
        sim.stop();
        let frozen = sim.original().unwrap().state;
        let trail_len = sim.original().unwrap().trail.len();
        for _ in 0..10 {
            sim.tick().unwrap();
        }
        assert_eq!(sim.phase(), Phase::Stopped);
        assert_eq!(sim.ticks(), 1);
        assert_eq!(sim.original().unwrap().state, frozen);
        assert_eq!(sim.original().unwrap().trail.len(), trail_len);
    }

    #[test]
    fn run_requires_running_phase() {
        let mut sim = Simulation::new(config(0, 0.003)).unwrap();
        assert!(sim.run(5).is_err());
        sim.start().unwrap();
        sim.run(5).unwrap();
        assert_eq!(sim.ticks(), 5);
        assert_relative_eq!(sim.elapsed(), 5.0 * DEFAULT_DT);
    }

    #[test]
    fn reset_discards_everything() {
        let mut sim = Simulation::new(config(4, 0.003)).unwrap();
        sim.start().unwrap();
        sim.run(20).unwrap();
        sim.reset();
        assert_eq!(sim.phase(), Phase::Preview);
        assert!(sim.original().is_none());
        assert!(sim.ensemble().is_empty());
        assert_eq!(sim.ticks(), 0);
        assert_eq!(sim.spread(), 0.0);
    }

    #[test]
    fn restart_reseeds_from_base() {
        let mut sim = Simulation::new(config(2, 0.003)).unwrap();
        sim.start().unwrap();
        sim.run(50).unwrap();
        sim.stop();
        sim.start().unwrap();
        assert_eq!(sim.ticks(), 0);
        assert_eq!(sim.original().unwrap().state, PendulumParams::default().at_rest());
        assert!(sim.original().unwrap().trail.is_empty());
    }

    #[test]
    fn trails_are_bounded() {
        let mut sim = Simulation::new(config(2, 0.003).with_trail_capacity(50)).unwrap();
        sim.start().unwrap();
        sim.run(200).unwrap();
        for tracked in sim.live() {
            assert_eq!(tracked.trail.len(), 50);
            assert_eq!(tracked.trail.latest(), Some(&tracked.state.end_effector()));
        }
    }

    #[test]
    fn failed_tick_commits_nothing() {
        let mut sim = Simulation::new(config(3, 0.003)).unwrap();
        sim.start().unwrap();
        sim.run(3).unwrap();
        let before: Vec<PendulumState> = sim.live().map(|t| t.state).collect();

        sim.ensemble[2].state.omega1 = f64::NAN;
        let err = sim.tick().unwrap_err();
        assert!(matches!(err, PendulumError::NonFiniteVelocity { arm: 1, .. }));

        assert_eq!(sim.ticks(), 3);
        for (tracked, old) in sim.live().zip(&before).take(2) {
            assert_eq!(tracked.state, *old);
        }
        assert_eq!(sim.original().unwrap().state, before[3]);
        assert!(sim.live().all(|t| t.trail.len() == 3));
    }

    /// Both arms nearly upright; far from the weakly chaotic horizontal start.
    fn high_energy() -> PendulumParams {
        PendulumParams {
            theta1: 3.0,
            theta2: 3.0,
            ..Default::default()
        }
    }

    #[test]
    fn nearby_pendulums_diverge() {
        let a = high_energy().at_rest();
        let b = PendulumState {
            theta1: a.theta1 + 1e-6,
            ..a
        };

        let (mut a, mut b) = (a, b);
        for _ in 0..2000 {
            a = step(&a, DEFAULT_DT, DEFAULT_GRAVITY).unwrap();
            b = step(&b, DEFAULT_DT, DEFAULT_GRAVITY).unwrap();
        }
        let gap = (a.theta1 - b.theta1).abs();
        assert!(gap > 0.1, "expected chaotic divergence, final gap {gap}");
    }

    #[test]
    fn ensemble_spread_grows() {
        let cfg = config(1, 1e-6)
            .with_params(high_energy())
            .with_single_copy(SingleCopyOffset::RangeStart);
        let mut sim = Simulation::new(cfg).unwrap();
        sim.start().unwrap();
        assert_relative_eq!(sim.spread(), 1e-6, max_relative = 1e-6);

        let mut max_spread = 0.0_f64;
        for _ in 0..2000 {
            sim.tick().unwrap();
            max_spread = max_spread.max(sim.spread());
        }
        assert!(max_spread > 0.1, "spread stayed at {max_spread}");
    }

    #[test]
    fn zero_deviation_copies_track_original_exactly() {
        let mut sim = Simulation::new(config(4, 0.0)).unwrap();
        sim.start().unwrap();
        for _ in 0..2000 {
            sim.tick().unwrap();
            let original = sim.original().unwrap().state;
            for member in sim.ensemble() {
                assert_eq!(member.state.theta1.to_bits(), original.theta1.to_bits());
                assert_eq!(member.state.theta2.to_bits(), original.theta2.to_bits());
                assert_eq!(member.state.omega1.to_bits(), original.omega1.to_bits());
                assert_eq!(member.state.omega2.to_bits(), original.omega2.to_bits());
            }
        }
        assert_eq!(sim.spread(), 0.0);
    }
}
