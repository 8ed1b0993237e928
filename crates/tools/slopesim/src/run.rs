//! Headless run loop with a simple autopilot

use std::fmt;

use downhill_physics::{
    ContactKind, ControlInput, PhysicsConfig, PhysicsStepper, SimState, SolverKind, TickResult,
};
use downhill_terrain::Course;
use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::RunConfig;

/// Distance from the bottom edge at which a run counts as finished
const FINISH_MARGIN: f32 = 2.0;

/// Place the player on the surface at the top middle of the course, facing down the fall line
pub fn start_at_top(
    course: &Course,
    config: PhysicsConfig,
) -> downhill_physics::Result<PhysicsStepper<'_>> {
    let footprint = course.footprint();
    let top = Vec3::new(footprint.center().x, f32::NEG_INFINITY, footprint.min.y + 1.0);
    let mut stepper = PhysicsStepper::spawn(course, config, top)?;
    // Heading is -Z at identity; the course falls toward +Z
    let facing = stepper
        .state()
        .with_orientation(Quat::from_rotation_y(std::f32::consts::PI));
    stepper.reset(facing);
    Ok(stepper)
}

/// Steers toward the middle of the course with some random wobble
pub struct Autopilot {
    config: RunConfig,
    center_x: f32,
    rng: StdRng,
}

impl Autopilot {
    pub fn new(config: RunConfig, center_x: f32) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            center_x,
            rng,
        }
    }

    /// Control input for the next tick given the committed state
    pub fn control(&mut self, tick: u32, state: &SimState) -> ControlInput {
        let jitter = if self.config.steer_jitter > 0.0 {
            self.rng
                .random_range(-self.config.steer_jitter..=self.config.steer_jitter)
        } else {
            0.0
        };
        // Positive turn drifts toward -X while heading down the slope
        let turn = (state.position.x - self.center_x) * self.config.steer_gain + jitter;
        let speed = state.speed();
        let jump = self.config.jump_every > 0 && tick > 0 && tick % self.config.jump_every == 0;

        ControlInput::turn(turn)
            .with_paddle(speed < self.config.paddle_below)
            .with_brake(speed > self.config.brake_above)
            .with_jump(jump)
    }
}

/// Optional mid-run solver change
#[derive(Debug, Clone, Copy)]
pub struct SolverSwitch {
    pub at_tick: u32,
    pub kind: SolverKind,
}

/// Aggregate statistics for one run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub course: String,
    pub solver: String,
    pub ticks: u64,
    pub time: f64,
    pub finished: bool,
    pub final_position: Vec3,
    pub final_speed: f32,
    pub top_speed: f32,
    pub distance: f32,
    pub collisions: usize,
    pub collected: usize,
    pub collectables: usize,
    pub airborne_ticks: u64,
    pub off_course_ticks: u64,
    pub substeps: u64,
    pub rejected: u64,
    pub floor_accepts: u64,
    pub evaluations: u64,
    pub max_error: f32,
}

impl RunSummary {
    fn record(&mut self, result: &TickResult) {
        self.top_speed = self.top_speed.max(result.state.speed());
        self.collisions += result.collisions().count();
        if !result.state.grounded {
            self.airborne_ticks += 1;
        }
        if result.off_course {
            self.off_course_ticks += 1;
        }
        let report = &result.report;
        self.substeps += report.substeps as u64;
        self.rejected += report.rejected as u64;
        self.floor_accepts += report.floor_accepts as u64;
        self.evaluations += report.evaluations as u64;
        self.max_error = self.max_error.max(report.max_error);
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Course:        {}", self.course)?;
        writeln!(f, "Solver:        {}", self.solver)?;
        writeln!(
            f,
            "Ticks:         {} ({:.2}s simulated){}",
            self.ticks,
            self.time,
            if self.finished { ", reached the bottom" } else { "" }
        )?;
        writeln!(
            f,
            "Final:         ({:.2}, {:.2}, {:.2}) at {:.2} m/s",
            self.final_position.x, self.final_position.y, self.final_position.z, self.final_speed
        )?;
        writeln!(f, "Top speed:     {:.2} m/s", self.top_speed)?;
        writeln!(f, "Distance:      {:.1}", self.distance)?;
        writeln!(f, "Collisions:    {}", self.collisions)?;
        writeln!(f, "Herring:       {}/{}", self.collected, self.collectables)?;
        writeln!(f, "Airborne:      {} ticks", self.airborne_ticks)?;
        writeln!(f, "Off course:    {} ticks", self.off_course_ticks)?;
        write!(
            f,
            "Integration:   {} substeps, {} rejected, {} at floor, {} evaluations, max error {:.2e}",
            self.substeps, self.rejected, self.floor_accepts, self.evaluations, self.max_error
        )
    }
}

/// Drive the stepper for up to `config.ticks` ticks
pub fn run(
    stepper: &mut PhysicsStepper<'_>,
    config: &RunConfig,
    switch: Option<SolverSwitch>,
) -> RunSummary {
    let course = stepper.course();
    let footprint = course.footprint();
    let mut autopilot = Autopilot::new(config.clone(), footprint.center().x);

    let mut summary = RunSummary {
        course: course.name().to_string(),
        solver: stepper.solver().to_string(),
        collectables: course
            .obstacles()
            .iter()
            .filter(|o| !o.kind.is_solid())
            .count(),
        ..RunSummary::default()
    };

    for tick in 0..config.ticks {
        if let Some(switch) = switch.filter(|s| s.at_tick == tick) {
            stepper.set_solver(switch.kind);
            summary.solver = format!("{} -> {} at tick {}", summary.solver, switch.kind, tick);
        }

        let control = autopilot.control(tick, stepper.state());
        let result = stepper.tick(control, config.dt);
        summary.record(&result);

        for contact in &result.contacts {
            match contact.kind {
                ContactKind::Obstacle { id, kind } => tracing::debug!(
                    "[slopesim] tick {}: hit {:?} {} at {:.2} m/s",
                    tick,
                    kind,
                    id,
                    contact.impact_speed()
                ),
                ContactKind::Collected { id } => {
                    tracing::debug!("[slopesim] tick {}: collected {}", tick, id)
                }
                ContactKind::Terrain(_) => {}
            }
        }

        if result.state.position.z >= footprint.max.y - FINISH_MARGIN {
            summary.finished = true;
            tracing::info!("[slopesim] reached the bottom after {} ticks", tick + 1);
            break;
        }
    }

    let state = stepper.state();
    summary.ticks = stepper.ticks();
    summary.time = stepper.time();
    summary.final_position = state.position;
    summary.final_speed = state.speed();
    summary.distance = stepper.distance_travelled();
    summary.collected = stepper.collected_count();
    summary
}
