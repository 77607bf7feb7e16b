pub mod integrator;
pub mod runner;
pub mod trail;

pub use integrator::{semi_implicit_euler_step, step};
pub use runner::{Phase, Simulation, Tracked};
pub use trail::{Trail, DEFAULT_TRAIL_CAPACITY};
