use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use pendulum_ensemble::io::{csv, json, RunSummary, SummaryRecorder};
use pendulum_ensemble::types::{PendulumState, SimConfig, Simulation};
use pendulum_ensemble::{dynamics, PendulumError, PendulumResult};

const USAGE: &str = "usage: pendulum-ensemble [CONFIG.json] [--ticks N] [--copies N] \
                     [--deviation D] [--csv PATH] [--json PATH]";

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    ticks: u64,
    copies: Option<usize>,
    deviation: Option<f64>,
    csv: Option<String>,
    json: Option<String>,
    help: bool,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> PendulumResult<Args> {
    let mut args = Args {
        ticks: 2000,
        ..Default::default()
    };

    while let Some(arg) = raw.next() {
        let mut value = |flag: &str| {
            raw.next()
                .ok_or_else(|| PendulumError::config(format!("{flag} needs a value\n{USAGE}")))
        };
        match arg.as_str() {
            "--ticks" => args.ticks = parse_number(&value("--ticks")?)?,
            "--copies" => args.copies = Some(parse_number(&value("--copies")?)?),
            "--deviation" => args.deviation = Some(parse_number(&value("--deviation")?)?),
            "--csv" => args.csv = Some(value("--csv")?),
            "--json" => args.json = Some(value("--json")?),
            "-h" | "--help" => args.help = true,
            flag if flag.starts_with("--") => {
                return Err(PendulumError::config(format!("unknown flag {flag}\n{USAGE}")))
            }
            path => args.config = Some(path.to_string()),
        }
    }
    Ok(args)
}

fn parse_number<T: std::str::FromStr>(text: &str) -> PendulumResult<T> {
    text.parse()
        .map_err(|_| PendulumError::config(format!("not a number: {text}")))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "run failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> PendulumResult<()> {
    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => SimConfig::from_file(path)?,
        None => SimConfig::default(),
    };
    let mut sim = Simulation::new(apply_overrides(config, &args))?;
    sim.start()?;

    let mut recording = Recording::new(sim.config(), args.ticks, args.csv.is_some());
    recording.record(0, &sim);
    for tick in 1..=args.ticks {
        sim.tick()?;
        recording.record(tick, &sim);
    }
    sim.stop();

    let config = sim.config();
    let summary = recording.summary.finish();
    print_report(config, &recording.rows, &summary);

    if let (Some(path), Some(trajectory)) = (&args.csv, &recording.trajectory) {
        csv::write_trajectory_file(path, trajectory, config.dt, config.gravity)?;
        println!("  Exported trajectory: {path}");
    }
    if let Some(path) = &args.json {
        json::write_summary_file(path, &summary)?;
        println!("  Exported summary:    {path}");
    }
    Ok(())
}

fn apply_overrides(config: SimConfig, args: &Args) -> SimConfig {
    let copies = args.copies.unwrap_or(config.copies);
    let deviation = args.deviation.unwrap_or(config.deviation);
    config.with_ensemble(copies, deviation)
}

// ---------------------------------------------------------------------------
// Recording
// ---------------------------------------------------------------------------

/// Sampled row of the divergence table.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ReportRow {
    tick: u64,
    theta1: f64,
    spread: f64,
}

/// What a headless run keeps per tick. Only the CSV export needs the full
/// trajectory; everything else is constant size.
struct Recording {
    interval: u64,
    last: u64,
    rows: Vec<ReportRow>,
    trajectory: Option<Vec<PendulumState>>,
    summary: SummaryRecorder,
}

impl Recording {
    fn new(config: &SimConfig, ticks: u64, keep_trajectory: bool) -> Self {
        Self {
            interval: (ticks / 20).max(1),
            last: ticks,
            rows: Vec::new(),
            trajectory: keep_trajectory.then(Vec::new),
            summary: SummaryRecorder::new(config),
        }
    }

    fn record(&mut self, tick: u64, sim: &Simulation) {
        let spread = sim.spread();
        if let Some(original) = sim.original() {
            let state = original.state;
            self.summary.record_state(&state);
            if let Some(trajectory) = self.trajectory.as_mut() {
                trajectory.push(state);
            }
            if tick % self.interval == 0 || tick == self.last {
                self.rows.push(ReportRow {
                    tick,
                    theta1: state.theta1,
                    spread,
                });
            }
        }
        self.summary.record_spread(spread);
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

fn print_report(config: &SimConfig, rows: &[ReportRow], summary: &RunSummary) {
    let p = &config.params;

    println!();
    println!("====================================================================");
    println!("  DOUBLE PENDULUM ENSEMBLE");
    println!("====================================================================");
    println!();
    println!("  Parameters");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  theta1:   {:>9.2} deg      theta2:   {:>9.2} deg",
        p.theta1.to_degrees(),
        p.theta2.to_degrees()
    );
    println!(
        "  L1:       {:>9.1}          L2:       {:>9.1}",
        p.length1, p.length2
    );
    println!(
        "  m1:       {:>9.2}          m2:       {:>9.2}",
        p.mass1, p.mass2
    );
    println!(
        "  copies:   {:>9}          deviation:{:>9.4} rad",
        config.copies, config.deviation
    );
    println!(
        "  dt:       {:>9.4}          g:        {:>9.1}",
        config.dt, config.gravity
    );
    println!();

    println!("  Divergence");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  {:>8}  {:>9}  {:>12}  {:>12}", "tick", "time", "theta1", "spread");
    println!("  {}", "─".repeat(48));

    for row in rows {
        println!(
            "  {:>8}  {:>9.3}  {:>12.6}  {:>12.3e}",
            row.tick,
            row.tick as f64 * config.dt,
            row.theta1,
            row.spread
        );
    }
    println!();

    println!("  Summary");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Ticks:          {:>10}   ({:.2} s simulated)", summary.ticks, summary.elapsed);
    println!("  Max spread:     {:>10.4} rad", summary.max_spread);
    println!("  Final spread:   {:>10.4} rad", summary.final_spread);
    println!(
        "  Energy:         {:>10.1} -> {:.1}  (max drift {:.3}%)",
        summary.initial_energy,
        summary.final_energy,
        summary.max_energy_drift * 100.0
    );
    if let Some(last) = &summary.final_state {
        println!("  Final KE:       {:>10.1}", dynamics::kinetic_energy(last));
    }
    println!("====================================================================");
    println!();
}
