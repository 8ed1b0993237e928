//! Benchmark for course construction and terrain queries
//!
//! Measures quadtree build time and the per-frame query paths used by the
//! physics: point location, height/normal sampling and obstacle lookups.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use downhill_terrain::{Course, HeightField, Obstacle, QuadtreeConfig, TerrainType};
use glam::{UVec2, Vec2, Vec3};
use std::hint::black_box;

/// Rolling slope with a tree every few cells
fn create_course(size: u32) -> Course {
    let field = HeightField::from_fn(UVec2::splat(size), 1.0, Vec2::ZERO, |i, j| {
        let x = i as f32 * 0.15;
        let z = j as f32 * 0.1;
        let h = -0.4 * j as f32 + x.sin() * 1.5 + z.cos();
        let terrain = if (i + j) % 17 == 0 {
            TerrainType::Ice
        } else {
            TerrainType::Snow
        };
        (h, terrain)
    })
    .expect("Failed to build height field");

    let mut obstacles = Vec::new();
    let mut id = 0;
    for j in (2..size).step_by(7) {
        for i in (3..size).step_by(11) {
            obstacles.push(Obstacle::tree(id, Vec3::new(i as f32, 0.0, j as f32), 0.6));
            id += 1;
        }
    }

    Course::new("bench", field, obstacles, &QuadtreeConfig::default())
        .expect("Failed to build course")
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("course_build");
    for size in [64u32, 256, 512] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| create_course(black_box(size)))
        });
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let course = create_course(512);
    let sampler = course.sampler();

    // Points along a diagonal run, a few of them off the course
    let points: Vec<Vec2> = (0..256)
        .map(|k| Vec2::new(k as f32 * 2.1 - 10.0, k as f32 * 1.9 + 3.3))
        .collect();

    c.bench_function("locate", |b| {
        b.iter(|| {
            for p in &points {
                black_box(course.tree().locate(black_box(*p)));
            }
        })
    });

    c.bench_function("height_and_normal", |b| {
        b.iter(|| {
            for p in &points {
                black_box(sampler.height_at(p.x, p.y));
                black_box(sampler.normal_at(p.x, p.y));
            }
        })
    });

    c.bench_function("obstacles_near", |b| {
        b.iter(|| {
            for p in &points {
                black_box(course.obstacles_near(Vec3::new(p.x, 0.0, p.y), black_box(1.5)));
            }
        })
    });
}

criterion_group!(benches, bench_build, bench_queries);
criterion_main!(benches);
