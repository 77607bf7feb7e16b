pub mod colormap;
pub mod config;
pub mod dynamics;
pub mod ensemble;
mod error;
pub mod io;
pub mod sim;

pub use error::{PendulumError, PendulumResult};

// Short paths for the pieces most callers need
pub mod integrator {
    pub use crate::sim::integrator::{semi_implicit_euler_step, step};
}

pub mod types {
    pub use crate::config::SimConfig;
    pub use crate::dynamics::state::{
        Accel, PendulumParams, PendulumState, DEFAULT_DT, DEFAULT_GRAVITY,
    };
    pub use crate::ensemble::{EnsembleConfig, SingleCopyOffset};
    pub use crate::sim::runner::{Phase, Simulation};
    pub use crate::sim::trail::{Trail, DEFAULT_TRAIL_CAPACITY};
}
