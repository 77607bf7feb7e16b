use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dynamics::state::{PendulumParams, DEFAULT_DT, DEFAULT_GRAVITY};
use crate::ensemble::{EnsembleConfig, SingleCopyOffset};
use crate::error::{PendulumError, PendulumResult};
use crate::sim::integrator::check_step_inputs;
use crate::sim::trail::DEFAULT_TRAIL_CAPACITY;

// ---------------------------------------------------------------------------
// Simulation configuration
// ---------------------------------------------------------------------------

/// Everything needed to set up a run. Missing JSON fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub dt: f64,      // integration timestep per tick
    pub gravity: f64, // px/s^2
    pub trail_capacity: usize,
    pub params: PendulumParams,
    pub copies: usize,
    pub deviation: f64, // rad
    pub single_copy: SingleCopyOffset,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            gravity: DEFAULT_GRAVITY,
            trail_capacity: DEFAULT_TRAIL_CAPACITY,
            params: PendulumParams::default(),
            copies: 0,
            deviation: 0.003,
            single_copy: SingleCopyOffset::default(),
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> PendulumResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> PendulumResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> PendulumResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> PendulumResult<()> {
        check_step_inputs(self.dt, self.gravity)?;
        if self.trail_capacity == 0 {
            return Err(PendulumError::InvalidTrailCapacity(0));
        }
        self.ensemble().validate()
    }

    pub fn ensemble(&self) -> EnsembleConfig {
        EnsembleConfig::new(self.params, self.copies, self.deviation)
            .with_single_copy(self.single_copy)
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_params(mut self, params: PendulumParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_ensemble(mut self, copies: usize, deviation: f64) -> Self {
        self.copies = copies;
        self.deviation = deviation;
        self
    }

    pub fn with_single_copy(mut self, policy: SingleCopyOffset) -> Self {
        self.single_copy = policy;
        self
    }

    pub fn with_trail_capacity(mut self, capacity: usize) -> Self {
        self.trail_capacity = capacity;
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_are_valid() {
        let c = SimConfig::default();
        assert!(c.validate().is_ok());
        assert_relative_eq!(c.dt, 0.005);
        assert_relative_eq!(c.gravity, 2000.0);
        assert_eq!(c.trail_capacity, 600);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c = SimConfig::from_json_str(
            r#"{ "copies": 20, "deviation": 0.01, "params": { "theta1": 2.0 } }"#,
        )
        .unwrap();
        assert_eq!(c.copies, 20);
        assert_relative_eq!(c.deviation, 0.01);
        assert_relative_eq!(c.params.theta1, 2.0);
        assert_relative_eq!(c.params.length2, 150.0);
        assert_relative_eq!(c.dt, 0.005);
        assert_eq!(c.single_copy, SingleCopyOffset::RangeStart);
    }

    #[test]
    fn single_copy_policy_from_json() {
        let c = SimConfig::from_json_str(r#"{ "copies": 1, "single_copy": "center" }"#).unwrap();
        assert_eq!(c.single_copy, SingleCopyOffset::Center);
        assert_eq!(c.ensemble().offsets(), vec![0.0]);
    }

    #[test]
    fn invalid_values_rejected() {
        let err = SimConfig::from_json_str(r#"{ "dt": 0.0 }"#).unwrap_err();
        assert!(matches!(err, PendulumError::InvalidTimestep(_)));

        let err = SimConfig::from_json_str(r#"{ "params": { "mass1": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, PendulumError::InvalidMass { arm: 1, .. }));

        let err = SimConfig::from_json_str(r#"{ "trail_capacity": 0 }"#).unwrap_err();
        assert!(matches!(err, PendulumError::InvalidTrailCapacity(0)));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = SimConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, PendulumError::Json(_)));
    }

    #[test]
    fn json_round_trip_preserves_config() {
        let c = SimConfig::default()
            .with_ensemble(30, 0.005)
            .with_single_copy(SingleCopyOffset::Center);
        let back = SimConfig::from_json_str(&c.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back.copies, 30);
        assert_eq!(back.single_copy, SingleCopyOffset::Center);
        assert_relative_eq!(back.deviation, 0.005);
        assert_relative_eq!(back.params.theta1, c.params.theta1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SimConfig::from_file("/nonexistent/pendulum.json").unwrap_err();
        assert!(matches!(err, PendulumError::Io(_)));
    }
}
