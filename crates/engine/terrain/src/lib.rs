//! Terrain representation for downhill courses
//!
//! A course is a regular height field of typed terrain samples plus a
//! catalog of obstacles, indexed by a quadtree for point location and
//! radius queries. Everything here is built once at load time and read-only
//! afterwards.

mod course;
mod error;
mod height_field;
mod obstacle;
mod quadtree;
mod rect;
mod sampler;
mod terrain_type;

pub use course::Course;
pub use error::{CourseError, Result};
pub use height_field::{gradient_normal, HeightCell, HeightField};
pub use obstacle::{Obstacle, ObstacleId, ObstacleKind};
pub use quadtree::{CellLocation, CellRange, Leaf, LeafId, LeafRef, Quadtree, QuadtreeConfig};
pub use rect::Rect;
pub use sampler::{TerrainSample, TerrainSampler};
pub use terrain_type::TerrainType;

// Re-export for convenience
pub use glam;
