//! Per-tick simulation driver
//!
//! One `tick` builds the force model for the current control input,
//! integrates over `dt`, resolves collisions and commits the result. The
//! committed state is only ever replaced as a whole at the end of a tick.

use std::collections::HashSet;

use downhill_terrain::{Course, ObstacleId};
use glam::{Quat, Vec3};

use crate::config::PhysicsConfig;
use crate::contact::{ContactInfo, ContactKind, ContactPhase};
use crate::control::ControlInput;
use crate::error::{ConfigError, Result};
use crate::forces::ForceModel;
use crate::ode::{Integrator, IntegrationReport, Solver, SolverKind, StepControl};
use crate::resolver::CollisionResolver;
use crate::state::SimState;

/// Speed used in place of zero when turning the travel limit into a step ceiling
const CEILING_MIN_SPEED: f32 = 1e-3;

/// Outcome of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickResult {
    /// Committed state
    pub state: SimState,
    /// Contacts reported this tick, after debouncing
    pub contacts: Vec<ContactInfo>,
    pub phase: ContactPhase,
    pub report: IntegrationReport,
    pub off_course: bool,
}

impl TickResult {
    /// Solid obstacle hits this tick
    pub fn collisions(&self) -> impl Iterator<Item = &ContactInfo> {
        self.contacts.iter().filter(|c| c.is_collision())
    }
}

/// Owns the player state for one simulation run on a borrowed course
pub struct PhysicsStepper<'c> {
    course: &'c Course,
    config: PhysicsConfig,
    integrator: Integrator,
    step_control: StepControl,
    state: SimState,
    /// Adaptive step size carried between ticks
    step_hint: f32,
    time: f64,
    ticks: u64,
    distance: f32,
    /// Solid obstacles overlapped on the previous tick
    touching: HashSet<ObstacleId>,
    /// Collectables already picked up this run
    collected: HashSet<ObstacleId>,
}

impl<'c> PhysicsStepper<'c> {
    /// Create a stepper starting from `initial`
    ///
    /// # Errors
    /// Rejects an invalid configuration or a non-finite initial state.
    pub fn new(course: &'c Course, config: PhysicsConfig, initial: SimState) -> Result<Self> {
        config.validate()?;
        if !initial.is_finite() {
            return Err(ConfigError::Invalid(
                "initial player state is not finite".to_string(),
            ));
        }

        let integrator = Integrator::new(config.solver.kind);
        let step_control = StepControl::from_config(&config.solver);

        tracing::info!(
            "[PhysicsStepper] '{}' using {} (tolerance {:.1e}, steps {}..{})",
            course.name(),
            config.solver.kind,
            config.solver.tolerance,
            config.solver.min_step,
            config.solver.max_step
        );

        Ok(Self {
            course,
            step_hint: config.solver.max_step,
            config,
            integrator,
            step_control,
            state: SimState {
                orientation: initial.orientation.normalize(),
                ..initial
            },
            time: 0.0,
            ticks: 0,
            distance: 0.0,
            touching: HashSet::new(),
            collected: HashSet::new(),
        })
    }

    /// Create a stepper with the player at rest on the surface below `position`
    pub fn spawn(course: &'c Course, config: PhysicsConfig, position: Vec3) -> Result<Self> {
        let position = course.clamp_to_bounds(position);
        let ground = course.sampler().height_at(position.x, position.z);
        let mut initial = SimState::at_rest(Vec3::new(position.x, position.y.max(ground), position.z));
        initial.grounded = initial.position.y <= ground + config.contact.epsilon;
        Self::new(course, config, initial)
    }

    /// Advance the simulation by `dt` seconds
    ///
    /// Never fails. A non-positive or non-finite `dt` commits the current
    /// state unchanged.
    pub fn tick(&mut self, control: ControlInput, dt: f32) -> TickResult {
        let control = control.clamped();
        let previous = self.state;

        if !(dt.is_finite() && dt > 0.0) {
            return TickResult {
                state: previous,
                contacts: Vec::new(),
                phase: if previous.grounded {
                    ContactPhase::Grounded
                } else {
                    ContactPhase::Free
                },
                report: IntegrationReport::default(),
                off_course: false,
            };
        }

        let mut start = previous;
        if control.jump_requested && start.grounded {
            let normal = self
                .course
                .sampler()
                .normal_at(start.position.x, start.position.z);
            start.velocity += normal * self.config.player.jump_speed;
            start.grounded = false;
            tracing::trace!("[PhysicsStepper] jump at t={:.3}", self.time);
        }

        let forces = ForceModel::new(self.course, &self.config, control);
        let max_distance = self.config.solver.max_step_distance;
        let integration = self.step_control.integrate(
            &self.integrator,
            &start,
            dt,
            self.step_hint,
            |state: &SimState, t: f32| forces.derivative(state, t),
            |state: &SimState| max_distance / state.speed().max(CEILING_MIN_SPEED),
        );
        self.step_hint = integration.next_step;

        let resolution = CollisionResolver::new(self.course, &self.config).resolve(integration.state);
        let contacts = self.debounce(resolution.contacts);

        let mut state = resolution.state;
        if state.grounded {
            let rate = (self.config.player.alignment_rate * dt).min(1.0);
            state.orientation = align_up(state.orientation, resolution.normal, rate);
        }
        state.orientation = state.orientation.normalize();

        if !state.is_finite() {
            tracing::warn!(
                "[PhysicsStepper] non-finite state at t={:.3}, holding previous position",
                self.time
            );
            state = SimState {
                velocity: Vec3::ZERO,
                angular_velocity: Vec3::ZERO,
                ..previous
            };
        }

        self.distance += state.position.distance(previous.position);
        self.time += dt as f64;
        self.ticks += 1;
        self.state = state;

        tracing::trace!(
            "[PhysicsStepper] tick {} pos=({:.2}, {:.2}, {:.2}) speed={:.2} substeps={}",
            self.ticks,
            state.position.x,
            state.position.y,
            state.position.z,
            state.speed(),
            integration.report.substeps
        );

        TickResult {
            state,
            contacts,
            phase: resolution.phase,
            report: integration.report,
            off_course: resolution.off_course,
        }
    }

    /// Drop obstacle contacts that continue an overlap from the previous tick
    /// and collectables picked up earlier in the run
    fn debounce(&mut self, contacts: Vec<ContactInfo>) -> Vec<ContactInfo> {
        let mut touching = HashSet::new();
        let contacts = contacts
            .into_iter()
            .filter(|contact| match contact.kind {
                ContactKind::Terrain(_) => true,
                ContactKind::Obstacle { id, .. } => {
                    touching.insert(id);
                    !self.touching.contains(&id)
                }
                ContactKind::Collected { id } => self.collected.insert(id),
            })
            .collect();
        self.touching = touching;
        contacts
    }

    /// Switch solvers between ticks
    pub fn set_solver(&mut self, kind: SolverKind) {
        if kind == self.integrator.kind() {
            return;
        }
        tracing::debug!(
            "[PhysicsStepper] switching solver {} -> {} at t={:.3}",
            self.integrator.kind(),
            kind,
            self.time
        );
        self.integrator = Integrator::new(kind);
        self.config.solver.kind = kind;
    }

    /// Restart the run from `state`, forgetting contacts and pickups
    pub fn reset(&mut self, state: SimState) {
        self.state = SimState {
            orientation: state.orientation.normalize(),
            ..state
        };
        self.step_hint = self.config.solver.max_step;
        self.time = 0.0;
        self.ticks = 0;
        self.distance = 0.0;
        self.touching.clear();
        self.collected.clear();
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn solver(&self) -> SolverKind {
        self.integrator.kind()
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn course(&self) -> &'c Course {
        self.course
    }

    /// Simulated time since the start of the run
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Path length travelled since the start of the run
    pub fn distance_travelled(&self) -> f32 {
        self.distance
    }

    /// Number of collectables picked up this run
    pub fn collected_count(&self) -> usize {
        self.collected.len()
    }

    /// Step size the next adaptive tick will start with
    pub fn step_hint(&self) -> f32 {
        self.step_hint
    }
}

/// Rotate `orientation` so its up axis moves toward `normal` by fraction `rate`
fn align_up(orientation: Quat, normal: Vec3, rate: f32) -> Quat {
    let Some(normal) = normal.try_normalize() else {
        return orientation;
    };
    let up = (orientation * Vec3::Y).normalize();
    let target = Quat::from_rotation_arc(up, normal) * orientation;
    orientation.slerp(target, rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use downhill_terrain::{HeightField, Obstacle, QuadtreeConfig, TerrainType};
    use glam::{UVec2, Vec2};

    fn flat_course(obstacles: Vec<Obstacle>) -> Course {
        let field =
            HeightField::flat(UVec2::new(32, 32), 1.0, Vec2::ZERO, 0.0, TerrainType::Snow).unwrap();
        Course::new("flat", field, obstacles, &QuadtreeConfig::default()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_setup() {
        let course = flat_course(vec![]);
        let mut config = PhysicsConfig::default();
        config.player.mass = -1.0;
        assert!(PhysicsStepper::new(&course, config, SimState::default()).is_err());

        let bad = SimState::at_rest(Vec3::new(f32::NAN, 0.0, 0.0));
        assert!(PhysicsStepper::new(&course, PhysicsConfig::default(), bad).is_err());
    }

    #[test]
    fn test_spawn_lands_on_surface() {
        let course = flat_course(vec![]);
        let stepper =
            PhysicsStepper::spawn(&course, PhysicsConfig::default(), Vec3::new(4.0, -3.0, 4.0))
                .unwrap();
        assert_eq!(stepper.state().position, Vec3::new(4.0, 0.0, 4.0));
        assert!(stepper.state().grounded);
    }

    #[test]
    fn test_invalid_dt_commits_nothing() {
        let course = flat_course(vec![]);
        let mut stepper =
            PhysicsStepper::spawn(&course, PhysicsConfig::default(), Vec3::new(4.0, 2.0, 4.0))
                .unwrap();
        let before = *stepper.state();
        for dt in [0.0, -0.1, f32::NAN] {
            let result = stepper.tick(ControlInput::default(), dt);
            assert_eq!(result.state, before);
        }
        assert_eq!(stepper.ticks(), 0);
    }

    #[test]
    fn test_collision_event_is_debounced() {
        let course = flat_course(vec![Obstacle::tree(1, Vec3::new(10.0, 0.0, 10.0), 1.0)]);
        let mut config = PhysicsConfig::default();
        config.contact.obstacle_restitution = 0.0;
        config.contact.obstacle_speed_retention = 1.0;
        // Standing inside the trunk's reach with no approach keeps the overlap
        let mut stepper =
            PhysicsStepper::spawn(&course, config, Vec3::new(8.7, 0.0, 10.0)).unwrap();

        let first = stepper.tick(ControlInput::default(), 1.0 / 60.0);
        assert_eq!(first.collisions().count(), 1);
        for _ in 0..5 {
            let next = stepper.tick(ControlInput::default(), 1.0 / 60.0);
            assert_eq!(next.collisions().count(), 0);
        }
    }

    #[test]
    fn test_set_solver_between_ticks() {
        let course = flat_course(vec![]);
        let mut stepper =
            PhysicsStepper::spawn(&course, PhysicsConfig::default(), Vec3::new(4.0, 3.0, 4.0))
                .unwrap();
        assert_eq!(stepper.solver(), SolverKind::Rk45);
        stepper.tick(ControlInput::default(), 0.02);
        stepper.set_solver(SolverKind::Euler);
        assert_eq!(stepper.solver(), SolverKind::Euler);
        assert_eq!(stepper.config().solver.kind, SolverKind::Euler);
        let result = stepper.tick(ControlInput::default(), 0.02);
        assert_eq!(result.report.evaluations, result.report.substeps);
    }

    #[test]
    fn test_align_up_follows_normal() {
        let normal = Vec3::new(0.0, 1.0, 1.0).normalize();
        let aligned = align_up(Quat::IDENTITY, normal, 1.0);
        assert!(((aligned * Vec3::Y) - normal).length() < 1e-5);
        let halfway = align_up(Quat::IDENTITY, normal, 0.5);
        let up = halfway * Vec3::Y;
        assert!(up.dot(normal) > Vec3::Y.dot(normal));
    }

    #[test]
    fn test_reset_clears_run() {
        let course = flat_course(vec![]);
        let mut stepper =
            PhysicsStepper::spawn(&course, PhysicsConfig::default(), Vec3::new(4.0, 3.0, 4.0))
                .unwrap();
        for _ in 0..10 {
            stepper.tick(ControlInput::default(), 0.02);
        }
        assert!(stepper.distance_travelled() > 0.0);
        stepper.reset(SimState::at_rest(Vec3::new(4.0, 3.0, 4.0)));
        assert_eq!(stepper.ticks(), 0);
        assert_eq!(stepper.distance_travelled(), 0.0);
        assert_eq!(stepper.time(), 0.0);
    }
}
