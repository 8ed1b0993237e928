//! End-to-end simulation scenarios
//!
//! Each test loads a small course, runs the stepper for a number of ticks
//! and checks the committed state and the contact stream.

use downhill_physics::{
    ContactKind, ControlInput, PhysicsConfig, PhysicsStepper, SimState, SolverKind,
};
use downhill_terrain::{
    Course, HeightField, Obstacle, ObstacleId, ObstacleKind, QuadtreeConfig, TerrainType,
};
use glam::{UVec2, Vec2, Vec3};

const DT: f32 = 1.0 / 60.0;

fn flat_course(terrain: TerrainType, obstacles: Vec<Obstacle>) -> Course {
    let field = HeightField::flat(UVec2::new(32, 32), 1.0, Vec2::ZERO, 0.0, terrain)
        .expect("valid field");
    Course::new("flat", field, obstacles, &QuadtreeConfig::default()).expect("valid course")
}

/// Plane falling toward +Z with gradient `slope`
fn slope_course(slope: f32, terrain: TerrainType) -> Course {
    let field = HeightField::from_fn(UVec2::new(40, 80), 1.0, Vec2::ZERO, |_, j| {
        (-slope * j as f32, terrain)
    })
    .expect("valid field");
    Course::new("slope", field, vec![], &QuadtreeConfig::default()).expect("valid course")
}

/// Frictionless, drag-free ice
fn slick_config() -> PhysicsConfig {
    let mut config = PhysicsConfig::default();
    config.terrain.ice.friction = 0.0;
    config.player.drag = 0.0;
    config
}

#[test]
fn test_drop_on_flat_terrain_settles() {
    let course = flat_course(TerrainType::Snow, vec![]);
    let mut config = PhysicsConfig::default();
    config.solver.kind = SolverKind::Euler;
    config.solver.euler_step = 0.01;
    config.player.gravity = 9.8;

    let initial = SimState::at_rest(Vec3::new(16.0, 10.0, 16.0));
    let mut stepper = PhysicsStepper::new(&course, config, initial).unwrap();

    let mut landed_at = None;
    for tick in 0..600 {
        let result = stepper.tick(ControlInput::default(), DT);
        assert!(result.state.position.y.is_finite());
        if landed_at.is_none() && result.state.grounded {
            landed_at = Some(tick);
        }
    }

    let state = stepper.state();
    assert!(landed_at.is_some());
    assert!(state.grounded);
    assert!(state.position.y.abs() < 1e-3, "y = {}", state.position.y);
    assert!(state.velocity.y.abs() < 1e-3, "vy = {}", state.velocity.y);
    assert_eq!(state.position.x, 16.0);
    assert_eq!(state.position.z, 16.0);
}

#[test]
fn test_obstacle_event_fires_on_first_overlap() {
    let course = flat_course(
        TerrainType::Ice,
        vec![Obstacle::tree(42, Vec3::new(5.0, 0.0, 5.0), 1.0)],
    );
    let mut config = slick_config();
    config.player.radius = 0.5;

    let mut initial = SimState::at_rest(Vec3::new(0.0, 0.0, 5.0)).with_velocity(Vec3::new(2.0, 0.0, 0.0));
    initial.grounded = true;
    let mut stepper = PhysicsStepper::new(&course, config, initial).unwrap();

    let mut first_within = None;
    let mut first_event = None;
    for tick in 0..200 {
        let result = stepper.tick(ControlInput::default(), DT);
        let position = result.state.position;
        let distance = Vec2::new(position.x - 5.0, position.z - 5.0).length();

        let hit = result
            .collisions()
            .any(|c| {
                c.kind
                    == ContactKind::Obstacle {
                        id: ObstacleId(42),
                        kind: ObstacleKind::Tree,
                    }
            });

        if first_within.is_none() && distance <= 1.5 {
            first_within = Some(tick);
        }
        if hit && first_event.is_none() {
            first_event = Some(tick);
            // Deflected back along the approach axis
            assert!(result.state.velocity.x < 0.0);
        }
        if first_within.is_none() {
            assert!(!hit, "event before overlap at tick {tick}");
        }
    }

    assert!(first_event.is_some());
    assert_eq!(first_event, first_within);
}

#[test]
fn test_rk45_fall_matches_closed_form() {
    let course = flat_course(TerrainType::Snow, vec![]);
    let run = |kind: SolverKind| {
        let mut config = PhysicsConfig::default();
        config.player.drag = 0.0;
        config.solver.kind = kind;
        config.solver.euler_step = 0.01;
        let mut stepper =
            PhysicsStepper::new(&course, config, SimState::at_rest(Vec3::new(8.0, 100.0, 8.0)))
                .unwrap();
        for _ in 0..60 {
            stepper.tick(ControlInput::default(), DT);
        }
        *stepper.state()
    };

    let g = PhysicsConfig::default().player.gravity;
    let t = 60.0 * DT;
    let expected = 100.0 - 0.5 * g * t * t;

    let rk45 = run(SolverKind::Rk45);
    let euler = run(SolverKind::Euler);
    let rk45_dev = (rk45.position.y - expected).abs();
    let euler_dev = (euler.position.y - expected).abs();

    assert!(rk45_dev < PhysicsConfig::default().solver.tolerance, "rk45 {rk45_dev}");
    assert!(euler_dev > rk45_dev);
    assert!(euler_dev <= 0.5 * g * 0.01 * t + 1e-3, "euler {euler_dev}");
}

#[test]
fn test_runs_are_deterministic() {
    let field = HeightField::from_fn(UVec2::new(48, 96), 1.0, Vec2::ZERO, |i, j| {
        let h = -0.35 * j as f32 + (i as f32 * 0.4).sin() * 0.6;
        let terrain = if (i / 6 + j / 9) % 3 == 0 {
            TerrainType::Ice
        } else {
            TerrainType::Snow
        };
        (h, terrain)
    })
    .unwrap();
    let obstacles = (0..20)
        .map(|k| Obstacle::tree(k, Vec3::new(8.0 + (k % 5) as f32 * 7.0, 0.0, 10.0 + k as f32 * 4.0), 0.8))
        .collect();
    let course = Course::new("det", field, obstacles, &QuadtreeConfig::default()).unwrap();

    let run = || {
        let mut stepper =
            PhysicsStepper::spawn(&course, PhysicsConfig::default(), Vec3::new(24.0, 0.0, 2.0))
                .unwrap();
        let mut contacts = 0;
        for tick in 0..400 {
            let turn = ((tick as f32) * 0.05).sin();
            let control = ControlInput::turn(turn).with_paddle(tick % 50 < 10);
            contacts += stepper.tick(control, DT).contacts.len();
        }
        (*stepper.state(), contacts, stepper.distance_travelled())
    };

    assert_eq!(run(), run());
}

#[test]
fn test_slides_down_icy_slope() {
    let course = slope_course(0.3, TerrainType::Ice);
    // Below the surface, so the player starts on it
    let mut stepper =
        PhysicsStepper::spawn(&course, PhysicsConfig::default(), Vec3::new(20.0, -100.0, 5.0))
            .unwrap();
    assert!(stepper.state().grounded);

    for _ in 0..120 {
        stepper.tick(ControlInput::default(), DT);
    }

    let state = stepper.state();
    assert!(state.velocity.z > 1.0, "vz = {}", state.velocity.z);
    assert!(state.position.z > 6.0);
    let ground = course.sampler().height_at(state.position.x, state.position.z);
    assert!((state.position.y - ground).abs() < 0.05);
    assert!(state.grounded);
    assert!(stepper.distance_travelled() > 1.0);

    // Up axis follows the slope normal
    let normal = course.sampler().normal_at(state.position.x, state.position.z);
    assert!(state.up().dot(normal) > 0.99);
}

#[test]
fn test_friction_stops_player_on_rock() {
    let course = flat_course(TerrainType::Rock, vec![]);
    let mut initial = SimState::at_rest(Vec3::new(4.0, 0.0, 16.0)).with_velocity(Vec3::new(3.0, 0.0, 0.0));
    initial.grounded = true;
    let mut stepper = PhysicsStepper::new(&course, PhysicsConfig::default(), initial).unwrap();
    for _ in 0..180 {
        stepper.tick(ControlInput::default(), DT);
    }
    assert!(stepper.state().speed() < 0.1);
    assert!(stepper.state().position.x < 6.0);
}

#[test]
fn test_leaving_course_is_clamped() {
    let course = flat_course(TerrainType::Ice, vec![]);
    let mut initial = SimState::at_rest(Vec3::new(30.0, 0.0, 16.0)).with_velocity(Vec3::new(10.0, 0.0, 0.0));
    initial.grounded = true;
    let mut stepper = PhysicsStepper::new(&course, slick_config(), initial).unwrap();

    let mut flagged = false;
    for _ in 0..30 {
        let result = stepper.tick(ControlInput::default(), DT);
        flagged |= result.off_course;
        assert!(course.contains(result.state.position));
    }
    assert!(flagged);
    assert_eq!(stepper.state().position.x, course.footprint().max.x);
    assert_eq!(stepper.state().velocity.x, 0.0);
    assert!(stepper.state().grounded);
}

#[test]
fn test_collectable_counted_once() {
    let course = flat_course(
        TerrainType::Ice,
        vec![Obstacle::collectable(3, Vec3::new(10.0, 0.0, 5.0), 0.3)],
    );
    let mut initial = SimState::at_rest(Vec3::new(7.0, 0.0, 5.0)).with_velocity(Vec3::new(3.0, 0.0, 0.0));
    initial.grounded = true;
    let mut stepper = PhysicsStepper::new(&course, slick_config(), initial).unwrap();

    let mut pickups = 0;
    for _ in 0..120 {
        let result = stepper.tick(ControlInput::default(), DT);
        pickups += result
            .contacts
            .iter()
            .filter(|c| matches!(c.kind, ContactKind::Collected { .. }))
            .count();
    }
    assert_eq!(pickups, 1);
    assert_eq!(stepper.collected_count(), 1);
    // Passed straight through
    assert!(stepper.state().position.x > 12.0);
    assert!((stepper.state().velocity.x - 3.0).abs() < 1e-4);
}

#[test]
fn test_jump_leaves_and_returns_to_ground() {
    let course = flat_course(TerrainType::Snow, vec![]);
    let mut stepper =
        PhysicsStepper::spawn(&course, PhysicsConfig::default(), Vec3::new(16.0, 0.0, 16.0)).unwrap();

    let result = stepper.tick(ControlInput::default().with_jump(true), DT);
    assert!(!result.state.grounded);
    assert!(result.state.velocity.y > 0.0);

    let mut peak: f32 = 0.0;
    for _ in 0..120 {
        let result = stepper.tick(ControlInput::default(), DT);
        peak = peak.max(result.state.position.y);
    }
    let jump = PhysicsConfig::default().player.jump_speed;
    let expected_peak = jump * jump / (2.0 * PhysicsConfig::default().player.gravity);
    assert!((peak - expected_peak).abs() < 0.1, "peak {peak}");
    assert!(stepper.state().grounded);
    assert!(stepper.state().position.y.abs() < 1e-3);
}

#[test]
fn test_steering_changes_heading() {
    let course = slope_course(0.2, TerrainType::Ice);
    // Moving along the surface: 5 m/s of run, 1 m/s of drop
    let mut initial = SimState::at_rest(Vec3::new(20.0, 0.0, 5.0)).with_velocity(Vec3::new(0.0, -1.0, 5.0));
    initial.position.y = course.sampler().height_at(20.0, 5.0);
    initial.grounded = true;
    let mut stepper = PhysicsStepper::new(&course, PhysicsConfig::default(), initial).unwrap();

    for _ in 0..60 {
        stepper.tick(ControlInput::turn(1.0), DT);
    }
    // Heading down +Z, turning right drifts toward -X
    assert!(stepper.state().position.x < 19.5);
    assert!(stepper.state().angular_velocity.y < 0.0);
}
