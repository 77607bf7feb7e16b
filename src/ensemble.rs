//! Seeding of perturbed pendulum ensembles.
//!
//! Copy `i` of `N` gets both angles shifted by `frac_i * D`, where `frac_i`
//! runs linearly from -1 to +1. The family is symmetric about the base
//! configuration, so trajectory divergence can be read as a function of the
//! initial perturbation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dynamics::state::{PendulumParams, PendulumState};
use crate::error::{PendulumError, PendulumResult};

// ---------------------------------------------------------------------------
// Single-copy policy
// ---------------------------------------------------------------------------

/// Fraction given to the only copy when `N == 1`.
///
/// With one copy the index domain `[0, N - 1]` collapses to a point and the
/// linear map is undefined, so the offset has to be chosen explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleCopyOffset {
    /// `frac = -1`: the copy sits at the start of the range, offset `-D`.
    #[default]
    RangeStart,
    /// `frac = 0`: the copy coincides with the unperturbed original.
    Center,
}

impl SingleCopyOffset {
    pub fn fraction(self) -> f64 {
        match self {
            Self::RangeStart => -1.0,
            Self::Center => 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Linear spacing
// ---------------------------------------------------------------------------

/// Re-map `value` from `[in_start, in_stop]` onto `[out_start, out_stop]`.
/// No clamping; a collapsed input range yields NaN.
pub fn linear_map(value: f64, in_start: f64, in_stop: f64, out_start: f64, out_stop: f64) -> f64 {
    (value - in_start) / (in_stop - in_start) * (out_stop - out_start) + out_start
}

/// Fractions in `[-1, 1]` for each of `copies` ensemble members.
pub fn fractions(copies: usize, single: SingleCopyOffset) -> Vec<f64> {
    match copies {
        0 => Vec::new(),
        1 => vec![single.fraction()],
        n => {
            let last = (n - 1) as f64;
            (0..n)
                .map(|i| linear_map(i as f64, 0.0, last, -1.0, 1.0))
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// Ensemble configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleConfig {
    pub base: PendulumParams,
    pub copies: usize,
    pub deviation: f64, // rad, half-width of the offset range
    pub single_copy: SingleCopyOffset,
}

impl EnsembleConfig {
    pub fn new(base: PendulumParams, copies: usize, deviation: f64) -> Self {
        Self {
            base,
            copies,
            deviation,
            single_copy: SingleCopyOffset::default(),
        }
    }

    pub fn with_single_copy(mut self, policy: SingleCopyOffset) -> Self {
        self.single_copy = policy;
        self
    }

    /// `D = 0` is accepted: it seeds copies identical to the original.
    pub fn validate(&self) -> PendulumResult<()> {
        self.base.validate()?;
        if !(self.deviation.is_finite() && self.deviation >= 0.0) {
            return Err(PendulumError::InvalidDeviation(self.deviation));
        }
        Ok(())
    }

    pub fn fractions(&self) -> Vec<f64> {
        fractions(self.copies, self.single_copy)
    }

    /// Angular offset applied to each copy.
    pub fn offsets(&self) -> Vec<f64> {
        self.fractions()
            .into_iter()
            .map(|frac| frac * self.deviation)
            .collect()
    }
}

/// Build the perturbed copies, all at rest.
///
/// The unperturbed original is not included; build it with
/// [`PendulumParams::at_rest`] on the same base.
pub fn seed(config: &EnsembleConfig) -> PendulumResult<Vec<PendulumState>> {
    config.validate()?;

    let states: Vec<PendulumState> = config
        .offsets()
        .into_iter()
        .map(|offset| config.base.offset_angles(offset).at_rest())
        .collect();

    debug!(
        copies = states.len(),
        deviation = config.deviation,
        "seeded ensemble"
    );
    Ok(states)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn base() -> PendulumParams {
        PendulumParams {
            theta1: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn five_copies_are_linearly_spaced() {
        let config = EnsembleConfig::new(base(), 5, 0.01);
        assert_eq!(config.offsets(), vec![-0.01, -0.005, 0.0, 0.005, 0.01]);

        let states = seed(&config).unwrap();
        assert_eq!(states.len(), 5);
        for (state, offset) in states.iter().zip(config.offsets()) {
            assert_relative_eq!(state.theta1, 1.0 + offset);
            assert_relative_eq!(state.theta2, base().theta2 + offset);
            assert_eq!(state.omega1, 0.0);
            assert_eq!(state.omega2, 0.0);
            assert_eq!(state.length1, 150.0);
            assert_eq!(state.mass2, 1.0);
        }
    }

    #[test]
    fn zero_copies_is_empty() {
        let states = seed(&EnsembleConfig::new(base(), 0, 0.01)).unwrap();
        assert!(states.is_empty());
    }

    #[test]
    fn single_copy_defaults_to_range_start() {
        let config = EnsembleConfig::new(base(), 1, 0.01);
        assert_eq!(config.single_copy, SingleCopyOffset::RangeStart);
        assert_eq!(config.offsets(), vec![-0.01]);

        let states = seed(&config).unwrap();
        assert_eq!(states.len(), 1);
        assert_relative_eq!(states[0].theta1, 0.99);
    }

    #[test]
    fn single_copy_centered() {
        let config =
            EnsembleConfig::new(base(), 1, 0.01).with_single_copy(SingleCopyOffset::Center);
        assert_eq!(config.offsets(), vec![0.0]);
        let states = seed(&config).unwrap();
        assert_eq!(states[0], base().at_rest());
    }

    #[test]
    fn linear_map_collapsed_domain_is_nan() {
        assert!(linear_map(0.0, 0.0, 0.0, -1.0, 1.0).is_nan());
        assert_eq!(linear_map(3.0, 0.0, 4.0, -1.0, 1.0), 0.5);
    }

    #[test]
    fn zero_deviation_copies_match_base() {
        let states = seed(&EnsembleConfig::new(base(), 4, 0.0)).unwrap();
        for s in states {
            assert_eq!(s.theta1.to_bits(), base().theta1.to_bits());
            assert_eq!(s.theta2.to_bits(), base().theta2.to_bits());
        }
    }

    #[test]
    fn invalid_inputs_rejected() {
        let err = seed(&EnsembleConfig::new(base(), 3, -0.1)).unwrap_err();
        assert!(matches!(err, PendulumError::InvalidDeviation(_)));

        let err = seed(&EnsembleConfig::new(base(), 3, f64::NAN)).unwrap_err();
        assert!(matches!(err, PendulumError::InvalidDeviation(_)));

        let bad = PendulumParams {
            length2: 0.0,
            ..base()
        };
        let err = seed(&EnsembleConfig::new(bad, 3, 0.01)).unwrap_err();
        assert!(matches!(err, PendulumError::InvalidLength { arm: 2, .. }));
    }

    proptest! {
        #[test]
        fn offsets_are_symmetric(copies in 2usize..200, deviation in 1e-4..1.0_f64) {
            let offsets = EnsembleConfig::new(base(), copies, deviation).offsets();
            prop_assert_eq!(offsets.len(), copies);
            prop_assert_eq!(offsets[0], -deviation);
            prop_assert_eq!(offsets[copies - 1], deviation);
            for i in 0..copies {
                let mirrored = offsets[copies - 1 - i];
                prop_assert!((offsets[i] + mirrored).abs() < 1e-12);
            }
            for pair in offsets.windows(2) {
                prop_assert!(pair[1] > pair[0]);
            }
        }
    }
}
