//! Player equations of motion
//!
//! Builds the derivative function handed to the solvers. It is a pure
//! function of the state: the terrain, configuration and this tick's control
//! input are captured up front.

use downhill_terrain::Course;
use glam::{Quat, Vec3};

use crate::config::PhysicsConfig;
use crate::control::ControlInput;
use crate::state::SimState;

/// Speeds below this are treated as standing still
const REST_SPEED: f32 = 1e-4;

/// Forces acting on the player during one tick
#[derive(Debug, Clone, Copy)]
pub struct ForceModel<'a> {
    course: &'a Course,
    config: &'a PhysicsConfig,
    control: ControlInput,
}

impl<'a> ForceModel<'a> {
    pub fn new(course: &'a Course, config: &'a PhysicsConfig, control: ControlInput) -> Self {
        Self {
            course,
            config,
            control: control.clamped(),
        }
    }

    /// Time derivative of `state`
    ///
    /// Gravity and quadratic drag always act. Within the contact distance of
    /// the terrain the surface also supports the player, applies sliding
    /// friction scaled by the terrain type and the brake, and transmits the
    /// steering and paddling forces.
    pub fn derivative(&self, state: &SimState, _t: f32) -> SimState {
        SimState {
            position: state.velocity,
            velocity: self.acceleration(state),
            orientation: orientation_rate(state.orientation, state.angular_velocity),
            angular_velocity: self.angular_acceleration(state),
            grounded: state.grounded,
        }
    }

    /// Linear acceleration at `state`
    pub fn acceleration(&self, state: &SimState) -> Vec3 {
        let player = &self.config.player;
        let mut accel = Vec3::new(0.0, -player.gravity, 0.0);

        if let Some(normal) = self.contact_normal(state) {
            accel += self.surface_acceleration(state, normal, accel);
        }

        let air = state.velocity - player.wind;
        accel - air * (air.length() * player.drag / player.mass)
    }

    /// Surface normal when `state` is within contact distance of the terrain
    fn contact_normal(&self, state: &SimState) -> Option<Vec3> {
        let sample = self
            .course
            .sampler()
            .sample(state.position.x, state.position.z);
        let gap = state.position.y - sample.height;
        (gap <= self.config.contact.epsilon).then_some(sample.normal)
    }

    fn surface_acceleration(&self, state: &SimState, normal: Vec3, applied: Vec3) -> Vec3 {
        let player = &self.config.player;
        let contact = &self.config.contact;
        let control = &self.control;

        // Support: cancel the part of the applied force pushing into the surface
        let into_surface = applied.dot(normal).min(0.0);
        let load = -into_surface;
        let mut accel = -normal * into_surface;

        let tangential = state.velocity - normal * state.velocity.dot(normal);
        let speed = tangential.length();

        if speed > REST_SPEED {
            let direction = tangential / speed;
            let ramp = (speed / contact.friction_ramp_speed).min(1.0);

            let terrain = self
                .course
                .sampler()
                .terrain_type_at(state.position.x, state.position.z);
            let mut friction = self.config.terrain.get(terrain).friction;
            if control.brake {
                friction += player.brake_friction;
            }
            accel -= direction * (friction * load * ramp);

            // Positive turn steers right of the direction of travel
            let right = direction.cross(normal);
            accel += right * (control.turn * player.turn_acceleration * ramp);

            if control.paddle && speed < player.max_paddle_speed {
                accel += direction * player.paddle_acceleration;
            }
        } else if control.paddle {
            let forward = state.forward();
            let forward = forward - normal * forward.dot(normal);
            if let Some(forward) = forward.try_normalize() {
                accel += forward * player.paddle_acceleration;
            }
        }

        accel
    }

    /// Angular acceleration toward the yaw rate requested by the turn input
    pub fn angular_acceleration(&self, state: &SimState) -> Vec3 {
        let player = &self.config.player;
        let Some(normal) = self.contact_normal(state) else {
            return Vec3::ZERO;
        };
        // Turning right is a negative rotation about the up axis
        let target = normal * (-self.control.turn * player.turn_rate);
        (target - state.angular_velocity) * player.angular_damping
    }

    pub fn control(&self) -> &ControlInput {
        &self.control
    }
}

/// Quaternion rate for angular velocity `omega` (world frame)
#[inline]
pub fn orientation_rate(orientation: Quat, omega: Vec3) -> Quat {
    Quat::from_xyzw(omega.x, omega.y, omega.z, 0.0) * orientation * 0.5
}
