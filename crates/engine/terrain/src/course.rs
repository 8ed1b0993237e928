//! Loaded course: height field, obstacle catalog and spatial index
//!
//! A `Course` is built once at load time and is immutable afterwards. Any
//! number of simulations may borrow the same course concurrently.

use std::collections::HashSet;
use std::time::Instant;

use glam::{Vec2, Vec3};

use crate::error::{CourseError, Result};
use crate::height_field::HeightField;
use crate::obstacle::Obstacle;
use crate::quadtree::{Quadtree, QuadtreeConfig};
use crate::rect::Rect;
use crate::sampler::TerrainSampler;

#[derive(Debug, Clone)]
pub struct Course {
    name: String,
    field: HeightField,
    obstacles: Vec<Obstacle>,
    tree: Quadtree,
}

impl Course {
    /// Validate the obstacle catalog and build the quadtree
    ///
    /// # Arguments
    /// * `name` - Display name used in logs
    /// * `field` - Height field supplied by the course loader
    /// * `obstacles` - Obstacle catalog; ids must be unique
    /// * `config` - Quadtree build parameters
    pub fn new(
        name: impl Into<String>,
        field: HeightField,
        obstacles: Vec<Obstacle>,
        config: &QuadtreeConfig,
    ) -> Result<Self> {
        let start = Instant::now();
        let name = name.into();
        config.validate()?;

        let mut ids = HashSet::with_capacity(obstacles.len());
        for obstacle in &obstacles {
            obstacle.validate()?;
            if !ids.insert(obstacle.id) {
                return Err(CourseError::InvalidObstacle {
                    id: obstacle.id,
                    reason: "duplicate id".to_string(),
                });
            }
        }

        let tree = Quadtree::build(&field, &obstacles, config);

        tracing::info!(
            "[Course] '{}' loaded: {}x{} cells, {} obstacles, {} leaves in {:.2}ms",
            name,
            field.width(),
            field.depth(),
            obstacles.len(),
            tree.leaf_count(),
            start.elapsed().as_secs_f32() * 1000.0
        );

        Ok(Self {
            name,
            field,
            obstacles,
            tree,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> &HeightField {
        &self.field
    }

    pub fn tree(&self) -> &Quadtree {
        &self.tree
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn sampler(&self) -> TerrainSampler<'_> {
        TerrainSampler::new(&self.field, &self.tree)
    }

    /// World rectangle covered by the course
    pub fn footprint(&self) -> Rect {
        *self.tree.bounds()
    }

    /// Check whether the horizontal part of `position` lies on the course
    pub fn contains(&self, position: Vec3) -> bool {
        self.footprint().contains(Vec2::new(position.x, position.z))
    }

    /// Pull the horizontal part of `position` back onto the course footprint
    ///
    /// The vertical component is kept as is; non-finite horizontal
    /// components are replaced by the footprint center.
    pub fn clamp_to_bounds(&self, position: Vec3) -> Vec3 {
        let ground = self.footprint().clamp(Vec2::new(position.x, position.z));
        Vec3::new(ground.x, position.y, ground.y)
    }

    /// Obstacles whose bounding disk lies within `radius` of `point`
    ///
    /// Uses the quadtree for candidates and filters them with the exact
    /// horizontal distance test. Results are in catalog order.
    pub fn obstacles_near(&self, point: Vec3, radius: f32) -> Vec<&Obstacle> {
        let ground = Vec2::new(point.x, point.z);
        self.tree
            .obstacle_candidates(ground, radius)
            .into_iter()
            .map(|index| &self.obstacles[index])
            .filter(|obstacle| obstacle.horizontal_distance(point) <= obstacle.radius + radius)
            .collect()
    }
}
