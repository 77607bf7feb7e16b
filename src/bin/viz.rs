use std::f64::consts::TAU;
use std::process::ExitCode;

use eframe::egui;
use egui::{Color32, Pos2, Sense, Stroke};
use egui_plot::{Line, Plot, PlotPoints};
use tracing::error;
use tracing_subscriber::EnvFilter;

use pendulum_ensemble::colormap::Rgb;
use pendulum_ensemble::{dynamics, PendulumResult};
use pendulum_ensemble::sim::{Phase, Simulation, Tracked};
use pendulum_ensemble::types::{PendulumParams, PendulumState, SimConfig};

const ENERGY_HISTORY: usize = 5000;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let app = match PendulumViz::new(SimConfig::default()) {
        Ok(app) => app,
        Err(err) => {
            error!(error = %err, "configuration rejected");
            return ExitCode::FAILURE;
        }
    };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 860.0]),
        ..Default::default()
    };
    match eframe::run_native("Double Pendulum Chaos Ensemble", options, Box::new(|_| Ok(Box::new(app)))) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "viewer failed");
            ExitCode::FAILURE
        }
    }
}

struct PendulumViz {
    params: PendulumParams,
    copies: usize,
    deviation: f64,
    sim: Simulation,
    energy: Vec<[f64; 2]>,
    status: Option<String>,
}

impl PendulumViz {
    fn new(config: SimConfig) -> PendulumResult<Self> {
        let sim = Simulation::new(config.clone())?;
        Ok(Self {
            params: config.params,
            copies: config.copies,
            deviation: config.deviation,
            sim,
            energy: Vec::new(),
            status: None,
        })
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Double Pendulum");
        ui.separator();

        let before = (self.params, self.copies, self.deviation);
        ui.add(egui::Slider::new(&mut self.params.theta1, 0.0..=TAU).text("θ₁ (rad)"));
        ui.add(egui::Slider::new(&mut self.params.theta2, 0.0..=TAU).text("θ₂ (rad)"));
        ui.add(egui::Slider::new(&mut self.params.length1, 50.0..=250.0).step_by(1.0).text("L₁"));
        ui.add(egui::Slider::new(&mut self.params.length2, 50.0..=250.0).step_by(1.0).text("L₂"));
        ui.add(egui::Slider::new(&mut self.params.mass1, 0.1..=5.0).step_by(0.1).text("m₁"));
        ui.add(egui::Slider::new(&mut self.params.mass2, 0.1..=5.0).step_by(0.1).text("m₂"));
        ui.add(egui::Slider::new(&mut self.copies, 0..=100).step_by(10.0).text("Copies"));
        ui.add(
            egui::Slider::new(&mut self.deviation, 0.001..=0.01)
                .step_by(0.001)
                .text("Deviation"),
        );
        ui.label(format!(
            "θ₁ = {:.2}°   θ₂ = {:.2}°",
            self.params.theta1.to_degrees(),
            self.params.theta2.to_degrees()
        ));

        if (self.params, self.copies, self.deviation) != before {
            let applied = self
                .sim
                .set_params(self.params)
                .and_then(|()| self.sim.set_ensemble(self.copies, self.deviation));
            if let Err(err) = applied {
                self.status = Some(err.to_string());
            }
        }

        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("Start").clicked() {
                self.energy.clear();
                self.status = self.sim.start().err().map(|e| e.to_string());
            }
            if ui.button("Stop").clicked() {
                self.sim.stop();
            }
            if ui.button("Reset").clicked() {
                self.energy.clear();
                self.status = None;
                self.sim.reset();
            }
        });

        ui.separator();
        ui.label(format!("Phase: {:?}", self.sim.phase()));
        ui.label(format!("t = {:.2} s  ({} ticks)", self.sim.elapsed(), self.sim.ticks()));
        ui.label(format!("Spread: {:.4} rad", self.sim.spread()));
        if let Some(status) = &self.status {
            ui.colored_label(Color32::LIGHT_RED, status);
        }

        ui.separator();
        ui.label("Total energy (original)");
        let points: PlotPoints = self.energy.iter().copied().collect();
        Plot::new("energy")
            .height(180.0)
            .x_axis_label("Time (s)")
            .show(ui, |plot_ui| {
                plot_ui.line(Line::new("Energy", points));
            });
    }

    fn advance(&mut self) {
        if self.sim.phase() != Phase::Running {
            return;
        }
        if let Err(err) = self.sim.tick() {
            self.status = Some(err.to_string());
            self.sim.stop();
            return;
        }
        if let Some(original) = self.sim.original() {
            let g = self.sim.config().gravity;
            self.energy
                .push([self.sim.elapsed(), dynamics::total_energy(&original.state, g)]);
            if self.energy.len() > ENERGY_HISTORY {
                let excess = self.energy.len() - ENERGY_HISTORY;
                self.energy.drain(..excess);
            }
        }
    }
}

impl eframe::App for PendulumViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.advance();

        egui::SidePanel::left("controls")
            .min_width(320.0)
            .show(ctx, |ui| self.controls(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(Color32::BLACK))
            .show(ctx, |ui| {
                let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::hover());
                let rect = response.rect;
                let origin = Pos2::new(rect.center().x, rect.top() + rect.height() * 0.42);

                let p = self.sim.config().params;
                let reach = (p.length1 + p.length2) as f32;
                let scale = (rect.width().min(rect.height()) * 0.55 / reach).min(1.0);
                let canvas = Canvas { painter: &painter, origin, scale };

                match self.sim.phase() {
                    Phase::Preview => canvas.pendulum(self.sim.preview()),
                    Phase::Running | Phase::Stopped => {
                        // Copies show as trails only; the original is drawn on top.
                        for tracked in self.sim.live() {
                            canvas.trail(tracked);
                        }
                        if let Some(original) = self.sim.original() {
                            canvas.pendulum(&original.state);
                        }
                    }
                }
            });

        if self.sim.phase() == Phase::Running {
            ctx.request_repaint();
        }
    }
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

struct Canvas<'a> {
    painter: &'a egui::Painter,
    origin: Pos2,
    scale: f32,
}

impl Canvas<'_> {
    fn to_screen(&self, x: f64, y: f64) -> Pos2 {
        Pos2::new(
            self.origin.x + x as f32 * self.scale,
            self.origin.y + y as f32 * self.scale,
        )
    }

    fn trail(&self, tracked: &Tracked) {
        if tracked.trail.len() < 2 {
            return;
        }
        let points: Vec<Pos2> = tracked.trail.iter().map(|p| self.to_screen(p.x, p.y)).collect();
        self.painter
            .add(egui::Shape::line(points, Stroke::new(1.0, color32(tracked.color()))));
    }

    fn pendulum(&self, state: &PendulumState) {
        let (p1, p2) = state.joint_positions();
        let j1 = self.to_screen(p1.x, p1.y);
        let j2 = self.to_screen(p2.x, p2.y);

        let rod = Stroke::new(1.5, Color32::WHITE);
        self.painter.line_segment([self.origin, j1], rod);
        self.painter.line_segment([j1, j2], rod);
        self.painter.circle_filled(j1, bob_radius(state.mass1), Color32::WHITE);
        self.painter.circle_filled(j2, bob_radius(state.mass2), Color32::WHITE);
    }
}

fn bob_radius(mass: f64) -> f32 {
    // Diameter 10 * sqrt(m) on the reference canvas.
    5.0 * mass.sqrt() as f32
}

fn color32(c: Rgb) -> Color32 {
    Color32::from_rgb(c.r, c.g, c.b)
}
