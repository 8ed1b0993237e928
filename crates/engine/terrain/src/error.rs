//! Error types for course construction

use thiserror::Error;

use crate::obstacle::ObstacleId;

/// Result type for course construction
pub type Result<T> = std::result::Result<T, CourseError>;

/// Errors raised while loading a course
///
/// These only occur at load time. Once a [`crate::Course`] exists every query
/// against it is infallible.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CourseError {
    /// Grid has zero cells along at least one axis
    #[error("height field must have at least one cell, got {width}x{depth}")]
    EmptyGrid { width: u32, depth: u32 },

    /// Number of samples does not match the grid dimensions
    #[error("expected {expected} height samples, got {actual}")]
    SampleCountMismatch { expected: usize, actual: usize },

    /// Cell size is zero, negative or not finite
    #[error("invalid cell size: {0}")]
    InvalidCellSize(f32),

    /// Obstacle record failed validation
    #[error("invalid obstacle {id}: {reason}")]
    InvalidObstacle { id: ObstacleId, reason: String },

    /// Quadtree parameters out of range
    #[error("invalid quadtree config: {0}")]
    InvalidQuadtreeConfig(String),
}
