use pendulum_ensemble::types::{PendulumParams, SimConfig, Simulation};

fn main() -> Result<(), pendulum_ensemble::PendulumError> {
    let params = PendulumParams {
        theta1: 3.0,
        theta2: 3.0,
        ..Default::default()
    };
    let config = SimConfig::default()
        .with_params(params)
        .with_ensemble(21, 1e-4);

    let mut sim = Simulation::new(config)?;
    sim.start()?;

    println!("=== Ensemble divergence: 21 copies, D = 1e-4 rad ===\n");
    println!("{:>7}  {:>8}  {:>12}", "tick", "time", "spread");

    for block in 0..=20 {
        if block > 0 {
            sim.run(100)?;
        }
        println!("{:>7}  {:>8.2}  {:>12.3e}", sim.ticks(), sim.elapsed(), sim.spread());
    }

    // Colour of each copy's trail, from -D (red) through the spectrum to +D.
    println!();
    for member in sim.ensemble().iter().step_by(5) {
        let c = member.color();
        println!(
            "  frac {:+.2}  theta1 {:>10.4}  rgb({:>3}, {:>3}, {:>3})",
            member.fraction.unwrap_or(0.0),
            member.state.theta1,
            c.r,
            c.g,
            c.b
        );
    }
    Ok(())
}
