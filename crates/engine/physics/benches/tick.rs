//! Benchmark for the per-frame simulation tick
//!
//! Runs a player down a tree-lined slope with each solver and measures the
//! cost of a single tick, including collision resolution.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use downhill_physics::{ControlInput, PhysicsConfig, PhysicsStepper, SolverKind};
use downhill_terrain::{Course, HeightField, Obstacle, QuadtreeConfig, TerrainType};
use glam::{UVec2, Vec2, Vec3};
use std::hint::black_box;

const DT: f32 = 1.0 / 60.0;

/// Long slope with a tree line on both sides and some bumps
fn create_course() -> Course {
    let field = HeightField::from_fn(UVec2::new(64, 512), 1.0, Vec2::ZERO, |i, j| {
        let bump = (i as f32 * 0.3).sin() * (j as f32 * 0.2).cos() * 0.4;
        let terrain = if j % 40 < 4 {
            TerrainType::Ice
        } else {
            TerrainType::Snow
        };
        (-0.3 * j as f32 + bump, terrain)
    })
    .expect("Failed to build height field");

    let mut obstacles = Vec::new();
    for j in (0..512).step_by(3) {
        for x in [10.0, 54.0] {
            obstacles.push(Obstacle::tree(obstacles.len() as u32, Vec3::new(x, 0.0, j as f32), 0.8));
        }
    }

    Course::new("bench", field, obstacles, &QuadtreeConfig::default())
        .expect("Failed to build course")
}

fn bench_tick(c: &mut Criterion) {
    let course = create_course();
    let mut group = c.benchmark_group("tick");

    for kind in SolverKind::ALL {
        let mut config = PhysicsConfig::default();
        config.solver.kind = kind;

        group.bench_with_input(BenchmarkId::from_parameter(kind), &config, |b, config| {
            let mut stepper = PhysicsStepper::spawn(&course, config.clone(), Vec3::new(32.0, -100.0, 2.0))
                .expect("Failed to spawn player");
            let mut frame = 0u32;
            b.iter(|| {
                // Restart before the player runs off the bottom of the course
                if frame % 600 == 0 {
                    stepper.reset(downhill_physics::SimState::at_rest(Vec3::new(
                        32.0,
                        course.sampler().height_at(32.0, 2.0),
                        2.0,
                    )));
                }
                let turn = (frame as f32 * 0.02).sin();
                frame += 1;
                black_box(stepper.tick(black_box(ControlInput::turn(turn)), DT))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
