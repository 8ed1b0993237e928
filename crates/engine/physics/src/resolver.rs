//! Collision response for a candidate state
//!
//! Runs after integration. Classifies the terrain contact, snaps and corrects
//! the velocity against the surface, keeps the player on the course footprint
//! and deflects it off solid obstacles. Every contact it reacts to is also
//! reported as a `ContactInfo`.

use downhill_terrain::{Course, ObstacleKind, TerrainSample};
use glam::{Vec2, Vec3};

use crate::config::PhysicsConfig;
use crate::contact::{ContactInfo, ContactKind, ContactPhase};
use crate::state::SimState;

/// Corrected state plus what was touched on the way
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub state: SimState,
    pub phase: ContactPhase,
    /// Terrain normal under the resolved position
    pub normal: Vec3,
    pub contacts: Vec<ContactInfo>,
    /// The candidate position was outside the course and was pulled back
    pub off_course: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct CollisionResolver<'a> {
    course: &'a Course,
    config: &'a PhysicsConfig,
}

impl<'a> CollisionResolver<'a> {
    pub fn new(course: &'a Course, config: &'a PhysicsConfig) -> Self {
        Self { course, config }
    }

    /// Resolve a candidate state produced by the integrator
    pub fn resolve(&self, candidate: SimState) -> Resolution {
        let mut state = candidate;
        let mut contacts = Vec::new();

        let off_course = self.keep_on_course(&mut state);

        let sample = self
            .course
            .sampler()
            .sample(state.position.x, state.position.z);
        let phase = self.classify(&state, &sample);

        if phase.is_touching() {
            let depth = (sample.height - state.position.y).max(0.0);
            contacts.push(ContactInfo {
                kind: ContactKind::Terrain(phase),
                position: Vec3::new(state.position.x, sample.height, state.position.z),
                penetration_depth: depth,
                normal: sample.normal,
                terrain: sample.terrain,
                relative_velocity: state.velocity,
            });
            self.respond_to_surface(&mut state, &sample, phase, depth);
            state.grounded = true;
        } else {
            state.grounded = false;
        }

        self.enforce_min_speed(&mut state);
        self.resolve_obstacles(&mut state, &sample, &mut contacts);

        Resolution {
            state,
            phase,
            normal: sample.normal,
            contacts,
            off_course,
        }
    }

    /// Terrain contact classification for `state` over `sample`
    pub fn classify(&self, state: &SimState, sample: &TerrainSample) -> ContactPhase {
        let gap = state.position.y - sample.height;
        if gap > self.config.contact.epsilon {
            ContactPhase::Free
        } else if gap < 0.0 {
            ContactPhase::Penetrating
        } else {
            ContactPhase::Grounded
        }
    }

    /// Clamp the horizontal position onto the footprint and stop outward motion
    fn keep_on_course(&self, state: &mut SimState) -> bool {
        if self.course.contains(state.position) {
            return false;
        }

        let footprint = self.course.footprint();
        let original = Vec2::new(state.position.x, state.position.z);
        state.position = self.course.clamp_to_bounds(state.position);

        if original.x < footprint.min.x {
            state.velocity.x = state.velocity.x.max(0.0);
        } else if original.x > footprint.max.x {
            state.velocity.x = state.velocity.x.min(0.0);
        }
        if original.y < footprint.min.y {
            state.velocity.z = state.velocity.z.max(0.0);
        } else if original.y > footprint.max.y {
            state.velocity.z = state.velocity.z.min(0.0);
        }

        tracing::debug!(
            "[CollisionResolver] off course at ({:.2}, {:.2}), clamped to ({:.2}, {:.2})",
            original.x,
            original.y,
            state.position.x,
            state.position.z
        );
        true
    }

    fn respond_to_surface(
        &self,
        state: &mut SimState,
        sample: &TerrainSample,
        phase: ContactPhase,
        depth: f32,
    ) {
        let contact = &self.config.contact;
        let surface = self.config.terrain.get(sample.terrain);
        let normal = sample.normal;

        state.position.y = sample.height;

        let normal_speed = state.velocity.dot(normal);
        let mut removed = 0.0;

        if normal_speed < 0.0 {
            let impact = -normal_speed;
            let bounce = if impact > contact.bounce_threshold {
                surface.restitution
            } else {
                0.0
            };
            removed = impact * (1.0 + bounce);
            state.velocity += normal * removed;
        } else if normal_speed < contact.separation_speed {
            state.velocity -= normal * normal_speed;
        }

        // Coulomb friction for the impulse that stopped the normal motion
        if removed > 0.0 {
            let tangential = state.velocity - normal * state.velocity.dot(normal);
            let speed = tangential.length();
            if speed > 0.0 {
                let reduction = (surface.friction * removed).min(speed);
                state.velocity -= tangential * (reduction / speed);
            }
        }

        // Soft snow gives way by its compression depth before pushing back
        if phase == ContactPhase::Penetrating {
            let sunk = (depth - surface.compression).max(0.0);
            let push = (contact.penetration_stiffness * sunk).min(contact.max_push_speed);
            state.velocity += normal * push;
        }
    }

    fn enforce_min_speed(&self, state: &mut SimState) {
        let min_speed = self.config.player.min_speed;
        if !state.grounded || min_speed <= 0.0 {
            return;
        }
        let speed = state.velocity.length();
        if speed > 1e-4 && speed < min_speed {
            state.velocity *= min_speed / speed;
        }
    }

    fn resolve_obstacles(
        &self,
        state: &mut SimState,
        sample: &TerrainSample,
        contacts: &mut Vec<ContactInfo>,
    ) {
        let radius = self.config.player.radius;
        let contact = &self.config.contact;

        for obstacle in self.course.obstacles_near(state.position, radius) {
            if !obstacle.overlaps(state.position, radius) {
                continue;
            }

            let offset = Vec2::new(
                state.position.x - obstacle.position.x,
                state.position.z - obstacle.position.z,
            );
            let distance = offset.length();
            let axis = offset
                .try_normalize()
                .or_else(|| Vec2::new(-state.velocity.x, -state.velocity.z).try_normalize())
                .unwrap_or(Vec2::X);
            let normal = Vec3::new(axis.x, 0.0, axis.y);

            let info = ContactInfo {
                kind: match obstacle.kind {
                    ObstacleKind::Collectable => ContactKind::Collected { id: obstacle.id },
                    kind => ContactKind::Obstacle {
                        id: obstacle.id,
                        kind,
                    },
                },
                position: Vec3::new(
                    obstacle.position.x + normal.x * obstacle.radius,
                    state.position.y,
                    obstacle.position.z + normal.z * obstacle.radius,
                ),
                penetration_depth: (obstacle.radius + radius - distance).max(0.0),
                normal,
                terrain: sample.terrain,
                relative_velocity: state.velocity,
            };
            contacts.push(info);

            if !obstacle.kind.is_solid() {
                continue;
            }

            // Reflect only while still approaching
            let approach = state.velocity.dot(normal);
            if approach < 0.0 {
                state.velocity -= normal * (approach * (1.0 + contact.obstacle_restitution));
                state.velocity *= contact.obstacle_speed_retention;
            }
        }
    }
}
