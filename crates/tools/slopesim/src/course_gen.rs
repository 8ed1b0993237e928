//! Procedural course generation
//!
//! A constant fall line along +Z with fractal bumps, terrain patches picked
//! from a second noise field, trees scattered toward the edges and herring
//! scattered along the middle.

use anyhow::Context;
use downhill_terrain::{Course, HeightField, Obstacle, QuadtreeConfig, TerrainType};
use glam::{UVec2, Vec2, Vec3};
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::CourseConfig;

/// Obstacle-free run-in at the top of the course
const MIN_PLACEMENT_LENGTH: f32 = 10.0;

/// Build a course from its generation parameters
pub fn generate(config: &CourseConfig, quadtree: &QuadtreeConfig) -> anyhow::Result<Course> {
    anyhow::ensure!(
        config.length as f32 * config.cell_size > MIN_PLACEMENT_LENGTH,
        "course '{}' is too short to place obstacles on",
        config.name
    );

    let field = generate_field(config)?;
    let obstacles = place_obstacles(config, &field);
    Course::new(config.name.clone(), field, obstacles, quadtree)
        .with_context(|| format!("failed to build course '{}'", config.name))
}

fn generate_field(config: &CourseConfig) -> anyhow::Result<HeightField> {
    let bumps = Fbm::<Perlin>::new(config.seed).set_octaves(4);
    let patches = Perlin::new(config.seed.wrapping_add(1));
    let scale = config.noise_scale;
    let cell = config.cell_size;

    HeightField::from_fn(
        UVec2::new(config.width, config.length),
        cell,
        Vec2::ZERO,
        |i, j| {
            let x = i as f64 * cell as f64;
            let z = j as f64 * cell as f64;

            let bump = bumps.get([x * scale, z * scale]) as f32 * config.roughness;
            let height = -config.slope * z as f32 + bump;

            let patch = patches.get([x * scale * 0.5, z * scale * 0.5]);
            (height, terrain_for(patch))
        },
    )
    .context("failed to build height field")
}

/// Terrain type for a patch noise value in `[-1, 1]`
fn terrain_for(patch: f64) -> TerrainType {
    if patch > 0.45 {
        TerrainType::Ice
    } else if patch > 0.35 {
        TerrainType::Rock
    } else if patch < -0.4 {
        TerrainType::Powder
    } else {
        TerrainType::Snow
    }
}

fn place_obstacles(config: &CourseConfig, field: &HeightField) -> Vec<Obstacle> {
    let mut rng = StdRng::seed_from_u64(config.seed as u64);
    let footprint = field.footprint();
    let width = footprint.size().x;
    let center = footprint.center().x;
    let mut obstacles = Vec::with_capacity(config.trees + config.collectables);

    let ground = |x: f32, z: f32| {
        let g = field.grid_coords(Vec2::new(x, z)).round();
        field.height(g.x.max(0.0) as u32, g.y.max(0.0) as u32)
    };

    // Trees: mostly in the outer thirds, leaving a skiable lane
    for _ in 0..config.trees {
        let side = if rng.random_bool(0.5) { -1.0 } else { 1.0 };
        let offset = rng.random_range(0.18..0.5) * width * side;
        let x = center + offset;
        let z = rng.random_range(footprint.min.y + MIN_PLACEMENT_LENGTH..footprint.max.y);
        let id = obstacles.len() as u32;
        obstacles.push(Obstacle::tree(id, Vec3::new(x, ground(x, z), z), config.tree_radius));
    }

    // Herring: near the middle lane
    for _ in 0..config.collectables {
        let x = center + rng.random_range(-0.15..0.15) * width;
        let z = rng.random_range(footprint.min.y + 0.5 * MIN_PLACEMENT_LENGTH..footprint.max.y);
        let id = obstacles.len() as u32;
        obstacles.push(
            Obstacle::collectable(id, Vec3::new(x, ground(x, z), z), config.collectable_radius)
                .with_height(1.0),
        );
    }

    obstacles
}
