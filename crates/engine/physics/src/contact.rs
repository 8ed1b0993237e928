//! Per-tick contact records
//!
//! Contacts are plain data produced while resolving a tick. Scoring, sound or
//! debug drawing consume them after the fact; nothing here calls back out.

use downhill_terrain::{ObstacleId, ObstacleKind, TerrainType};
use glam::Vec3;

/// Relation between the player and the terrain surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContactPhase {
    /// Above the contact distance
    #[default]
    Free,
    /// On the surface or within the contact distance above it
    Grounded,
    /// Below the surface
    Penetrating,
}

impl ContactPhase {
    #[inline]
    pub fn is_touching(self) -> bool {
        !matches!(self, ContactPhase::Free)
    }
}

/// What the player touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactKind {
    Terrain(ContactPhase),
    /// Solid obstacle hit; deflects the player
    Obstacle { id: ObstacleId, kind: ObstacleKind },
    /// Collectable picked up
    Collected { id: ObstacleId },
}

/// One contact detected during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactInfo {
    pub kind: ContactKind,
    /// Contact point in world space
    pub position: Vec3,
    /// How far the player was inside the surface or obstacle (zero if just touching)
    pub penetration_depth: f32,
    /// Unit normal pointing from the surface toward the player
    pub normal: Vec3,
    /// Terrain type under the player
    pub terrain: TerrainType,
    /// Player velocity relative to the contacted surface, before the response
    pub relative_velocity: Vec3,
}

impl ContactInfo {
    /// Obstacle or collectable id, if this is not a terrain contact
    pub fn obstacle_id(&self) -> Option<ObstacleId> {
        match self.kind {
            ContactKind::Obstacle { id, .. } | ContactKind::Collected { id } => Some(id),
            ContactKind::Terrain(_) => None,
        }
    }

    pub fn is_collision(&self) -> bool {
        matches!(self.kind, ContactKind::Obstacle { .. })
    }

    /// Speed of approach along the contact normal
    pub fn impact_speed(&self) -> f32 {
        (-self.relative_velocity.dot(self.normal)).max(0.0)
    }
}
