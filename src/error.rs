use thiserror::Error;

/// Result alias used throughout the crate.
pub type PendulumResult<T> = Result<T, PendulumError>;

/// Errors raised by the pendulum core and its collaborators.
#[derive(Debug, Error)]
pub enum PendulumError {
    /// Arm length must be positive and finite.
    #[error("invalid length{arm}: {value} (must be positive and finite)")]
    InvalidLength { arm: u8, value: f64 },

    /// Bob mass must be positive and finite.
    #[error("invalid mass{arm}: {value} (must be positive and finite)")]
    InvalidMass { arm: u8, value: f64 },

    #[error("non-finite theta{arm}: {value}")]
    NonFiniteAngle { arm: u8, value: f64 },

    #[error("non-finite omega{arm}: {value}")]
    NonFiniteVelocity { arm: u8, value: f64 },

    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),

    #[error("invalid gravity: {0} (must be positive and finite)")]
    InvalidGravity(f64),

    /// Ensemble deviation must be finite and non-negative.
    #[error("invalid deviation: {0} (must be finite and >= 0)")]
    InvalidDeviation(f64),

    #[error("invalid trail capacity: {0} (must be at least 1)")]
    InvalidTrailCapacity(usize),

    /// A step produced NaN or Inf.
    #[error("simulation diverged: {reason}")]
    Diverged { reason: String },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PendulumError {
    pub fn diverged(reason: impl Into<String>) -> Self {
        Self::Diverged {
            reason: reason.into(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    pub fn is_diverged(&self) -> bool {
        matches!(self, Self::Diverged { .. })
    }

    /// True for errors caused by invalid caller input rather than by the run itself.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::InvalidLength { .. }
                | Self::InvalidMass { .. }
                | Self::NonFiniteAngle { .. }
                | Self::NonFiniteVelocity { .. }
                | Self::InvalidTimestep(_)
                | Self::InvalidGravity(_)
                | Self::InvalidDeviation(_)
                | Self::InvalidTrailCapacity(_)
        )
    }
}
