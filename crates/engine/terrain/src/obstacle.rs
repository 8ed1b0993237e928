//! Discrete course objects: trees, barriers and collectables

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{CourseError, Result};

/// Identifier supplied by the obstacle catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(pub u32);

impl std::fmt::Display for ObstacleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the player does when touching an obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleKind {
    /// Solid, deflects the player
    Tree,
    /// Solid, deflects the player
    Barrier,
    /// Picked up on contact, never deflects
    Collectable,
}

impl ObstacleKind {
    #[inline]
    pub fn is_solid(self) -> bool {
        !matches!(self, ObstacleKind::Collectable)
    }
}

/// Obstacle record as delivered by the course loader
///
/// The bounding volume is a vertical cylinder: `radius` around `position` on
/// the ground plane, from `position.y` up to `position.y + height` (unbounded
/// when `height` is `None`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub kind: ObstacleKind,
    pub position: Vec3,
    pub radius: f32,
    #[serde(default)]
    pub height: Option<f32>,
}

impl Obstacle {
    pub fn new(id: u32, kind: ObstacleKind, position: Vec3, radius: f32) -> Self {
        Self {
            id: ObstacleId(id),
            kind,
            position,
            radius,
            height: None,
        }
    }

    pub fn tree(id: u32, position: Vec3, radius: f32) -> Self {
        Self::new(id, ObstacleKind::Tree, position, radius)
    }

    pub fn collectable(id: u32, position: Vec3, radius: f32) -> Self {
        Self::new(id, ObstacleKind::Collectable, position, radius)
    }

    pub fn with_height(mut self, height: f32) -> Self {
        self.height = Some(height);
        self
    }

    /// Ground-plane center of the bounding cylinder
    #[inline]
    pub fn ground_position(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.z)
    }

    /// Horizontal center-to-center distance to a point
    #[inline]
    pub fn horizontal_distance(&self, point: Vec3) -> f32 {
        self.ground_position().distance(Vec2::new(point.x, point.z))
    }

    /// Check whether a sphere of `radius` at `point` overlaps the bounding cylinder
    pub fn overlaps(&self, point: Vec3, radius: f32) -> bool {
        if self.horizontal_distance(point) > self.radius + radius {
            return false;
        }
        let bottom = self.position.y - radius;
        let top = self.height.map_or(f32::INFINITY, |h| self.position.y + h + radius);
        point.y >= bottom && point.y <= top
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| CourseError::InvalidObstacle {
            id: self.id,
            reason: reason.to_string(),
        };

        if !self.position.is_finite() {
            return Err(invalid("position is not finite"));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(invalid("radius must be positive"));
        }
        if let Some(height) = self.height {
            if !(height.is_finite() && height >= 0.0) {
                return Err(invalid("height must be non-negative"));
            }
        }
        Ok(())
    }
}
