//! Player state vector

use glam::{Quat, Vec3};

use crate::ode::OdeState;

/// Physical state of the player
///
/// The same type doubles as its own time derivative: for a derivative value
/// `position` holds the velocity, `velocity` the acceleration, `orientation`
/// the (unnormalised) quaternion rate and `angular_velocity` the angular
/// acceleration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: Quat,
    pub angular_velocity: Vec3,
    /// Board is in contact with the terrain
    pub grounded: bool,
}

impl Default for SimState {
    fn default() -> Self {
        Self::at_rest(Vec3::ZERO)
    }
}

impl SimState {
    pub fn at_rest(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            angular_velocity: Vec3::ZERO,
            grounded: false,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Direction the board points along (local -Z)
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    /// Board up axis (local +Y)
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.orientation.is_finite()
            && self.angular_velocity.is_finite()
    }
}

/// Weight of velocity differences relative to position differences in the
/// error norm (position tolerance over velocity tolerance)
const VELOCITY_ERROR_WEIGHT: f32 = 0.1;

impl OdeState for SimState {
    fn add_scaled(&self, derivative: &Self, h: f32) -> Self {
        Self {
            position: self.position + derivative.position * h,
            velocity: self.velocity + derivative.velocity * h,
            orientation: self.orientation + derivative.orientation * h,
            angular_velocity: self.angular_velocity + derivative.angular_velocity * h,
            grounded: self.grounded,
        }
    }

    fn error_norm(&self, other: &Self) -> f32 {
        let position = self.position.distance(other.position);
        let velocity = self.velocity.distance(other.velocity) * VELOCITY_ERROR_WEIGHT;
        position.max(velocity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_scaled() {
        let state = SimState::at_rest(Vec3::new(1.0, 2.0, 3.0)).with_velocity(Vec3::X);
        let derivative = SimState {
            position: Vec3::X,
            velocity: Vec3::new(0.0, -10.0, 0.0),
            orientation: Quat::from_xyzw(0.0, 0.0, 0.0, 0.0),
            angular_velocity: Vec3::ZERO,
            grounded: true,
        };
        let next = state.add_scaled(&derivative, 0.5);
        assert_eq!(next.position, Vec3::new(1.5, 2.0, 3.0));
        assert_eq!(next.velocity, Vec3::new(1.0, -5.0, 0.0));
        assert_eq!(next.orientation, Quat::IDENTITY);
        assert!(!next.grounded);
    }

    #[test]
    fn test_error_norm_weights_velocity() {
        let a = SimState::at_rest(Vec3::ZERO);
        let b = SimState::at_rest(Vec3::new(0.0, 0.002, 0.0)).with_velocity(Vec3::new(0.05, 0.0, 0.0));
        assert!((a.error_norm(&b) - 0.005).abs() < 1e-7);
        assert_eq!(a.error_norm(&a), 0.0);
    }

    #[test]
    fn test_forward_and_up() {
        let state = SimState::default();
        assert_eq!(state.forward(), Vec3::NEG_Z);
        assert_eq!(state.up(), Vec3::Y);
    }
}
