//! Tuning constants for the player simulation
//!
//! Loaded from the `[physics]` part of a TOML file. Every field has a default,
//! so an empty table yields a playable configuration.

use downhill_terrain::TerrainType;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, Result};
use crate::ode::SolverKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub solver: SolverConfig,
    pub player: PlayerConfig,
    pub contact: ContactConfig,
    pub terrain: TerrainTable,
}

impl PhysicsConfig {
    /// Parse and validate a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: PhysicsConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check every value against its accepted range
    pub fn validate(&self) -> Result<()> {
        self.solver.validate()?;
        self.player.validate()?;
        self.contact.validate()?;
        self.terrain.validate()
    }
}

/// Solver selection and adaptive step control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub kind: SolverKind,
    /// Fixed step used by the Euler solver
    pub euler_step: f32,
    /// Largest accepted local error per adaptive substep
    pub tolerance: f32,
    /// Step floor; a step this small is accepted even above tolerance
    pub min_step: f32,
    /// Step ceiling
    pub max_step: f32,
    /// Farthest the player may travel in one substep
    pub max_step_distance: f32,
    /// Grow the step when the error falls below `tolerance * growth_threshold`
    pub growth_threshold: f32,
    pub growth_factor: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            kind: SolverKind::Rk45,
            euler_step: 0.01,
            tolerance: 0.005,
            min_step: 0.001,
            max_step: 0.1,
            max_step_distance: 0.2,
            growth_threshold: 0.1,
            growth_factor: 2.0,
        }
    }
}

impl SolverConfig {
    fn validate(&self) -> Result<()> {
        positive("solver.euler_step", self.euler_step)?;
        positive("solver.tolerance", self.tolerance)?;
        positive("solver.min_step", self.min_step)?;
        positive("solver.max_step", self.max_step)?;
        positive("solver.max_step_distance", self.max_step_distance)?;
        if self.min_step > self.max_step {
            return Err(ConfigError::Invalid(format!(
                "solver.min_step ({}) exceeds solver.max_step ({})",
                self.min_step, self.max_step
            )));
        }
        in_range("solver.growth_threshold", self.growth_threshold, 0.0, 1.0)?;
        if !(self.growth_factor.is_finite() && self.growth_factor >= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "solver.growth_factor must be at least 1, got {}",
                self.growth_factor
            )));
        }
        Ok(())
    }
}

/// Player body and control response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub mass: f32,
    /// Radius of the bounding sphere used against obstacles
    pub radius: f32,
    /// Gravitational acceleration (positive, applied along -Y)
    pub gravity: f32,
    /// Quadratic air drag coefficient
    pub drag: f32,
    /// Course wind; drag acts on the velocity relative to it
    pub wind: Vec3,
    /// Lateral acceleration at full turn input
    pub turn_acceleration: f32,
    /// Yaw rate the body turns toward at full turn input (rad/s)
    pub turn_rate: f32,
    /// Rate at which angular velocity approaches its target
    pub angular_damping: f32,
    /// Friction coefficient added while braking
    pub brake_friction: f32,
    pub paddle_acceleration: f32,
    /// Paddling has no effect above this speed
    pub max_paddle_speed: f32,
    /// Speed added along the surface normal by a jump
    pub jump_speed: f32,
    /// Grounded speed floor; zero disables it
    pub min_speed: f32,
    /// Rate at which the body's up axis follows the surface normal
    pub alignment_rate: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            mass: 20.0,
            radius: 0.5,
            gravity: 9.81,
            drag: 0.15,
            wind: Vec3::ZERO,
            turn_acceleration: 8.0,
            turn_rate: 2.0,
            angular_damping: 4.0,
            brake_friction: 0.5,
            paddle_acceleration: 6.0,
            max_paddle_speed: 16.7,
            jump_speed: 5.0,
            min_speed: 0.0,
            alignment_rate: 8.0,
        }
    }
}

impl PlayerConfig {
    fn validate(&self) -> Result<()> {
        positive("player.mass", self.mass)?;
        positive("player.radius", self.radius)?;
        non_negative("player.gravity", self.gravity)?;
        non_negative("player.drag", self.drag)?;
        if !self.wind.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "player.wind must be finite, got {}",
                self.wind
            )));
        }
        non_negative("player.turn_acceleration", self.turn_acceleration)?;
        non_negative("player.turn_rate", self.turn_rate)?;
        non_negative("player.angular_damping", self.angular_damping)?;
        non_negative("player.brake_friction", self.brake_friction)?;
        non_negative("player.paddle_acceleration", self.paddle_acceleration)?;
        non_negative("player.max_paddle_speed", self.max_paddle_speed)?;
        non_negative("player.jump_speed", self.jump_speed)?;
        non_negative("player.min_speed", self.min_speed)?;
        non_negative("player.alignment_rate", self.alignment_rate)
    }
}

/// Contact classification and collision response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    /// Height above the surface still treated as touching it
    pub epsilon: f32,
    /// Push-out speed per unit of penetration depth
    pub penetration_stiffness: f32,
    pub max_push_speed: f32,
    /// Slower outward motion than this is absorbed while grounded
    pub separation_speed: f32,
    /// Impact speed above which terrain restitution applies
    pub bounce_threshold: f32,
    /// Restitution of the velocity component toward a solid obstacle
    pub obstacle_restitution: f32,
    /// Fraction of speed kept after hitting a solid obstacle
    pub obstacle_speed_retention: f32,
    /// Sliding friction fades in linearly up to this speed
    pub friction_ramp_speed: f32,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            penetration_stiffness: 2.0,
            max_push_speed: 2.0,
            separation_speed: 0.5,
            bounce_threshold: 1.0,
            obstacle_restitution: 0.5,
            obstacle_speed_retention: 0.8,
            friction_ramp_speed: 0.5,
        }
    }
}

impl ContactConfig {
    fn validate(&self) -> Result<()> {
        non_negative("contact.epsilon", self.epsilon)?;
        non_negative("contact.penetration_stiffness", self.penetration_stiffness)?;
        non_negative("contact.max_push_speed", self.max_push_speed)?;
        non_negative("contact.separation_speed", self.separation_speed)?;
        non_negative("contact.bounce_threshold", self.bounce_threshold)?;
        in_range("contact.obstacle_restitution", self.obstacle_restitution, 0.0, 1.0)?;
        in_range(
            "contact.obstacle_speed_retention",
            self.obstacle_speed_retention,
            0.0,
            1.0,
        )?;
        positive("contact.friction_ramp_speed", self.friction_ramp_speed)
    }
}

/// Surface response of one terrain type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceParams {
    pub friction: f32,
    pub restitution: f32,
    /// Depth the player may sink in before the push-out response kicks in
    #[serde(default)]
    pub compression: f32,
}

impl SurfaceParams {
    pub const fn new(friction: f32, restitution: f32, compression: f32) -> Self {
        Self {
            friction,
            restitution,
            compression,
        }
    }
}

/// Per-terrain surface parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainTable {
    pub ice: SurfaceParams,
    pub snow: SurfaceParams,
    pub rock: SurfaceParams,
    pub powder: SurfaceParams,
}

impl Default for TerrainTable {
    fn default() -> Self {
        Self {
            ice: SurfaceParams::new(0.05, 0.0, 0.0),
            snow: SurfaceParams::new(0.35, 0.0, 0.02),
            rock: SurfaceParams::new(0.8, 0.2, 0.0),
            powder: SurfaceParams::new(0.5, 0.0, 0.08),
        }
    }
}

impl TerrainTable {
    #[inline]
    pub fn get(&self, terrain: TerrainType) -> &SurfaceParams {
        match terrain {
            TerrainType::Ice => &self.ice,
            TerrainType::Snow => &self.snow,
            TerrainType::Rock => &self.rock,
            TerrainType::Powder => &self.powder,
        }
    }

    pub fn get_mut(&mut self, terrain: TerrainType) -> &mut SurfaceParams {
        match terrain {
            TerrainType::Ice => &mut self.ice,
            TerrainType::Snow => &mut self.snow,
            TerrainType::Rock => &mut self.rock,
            TerrainType::Powder => &mut self.powder,
        }
    }

    fn validate(&self) -> Result<()> {
        for terrain in TerrainType::ALL {
            let params = self.get(terrain);
            let name = terrain.name();
            non_negative(&format!("terrain.{name}.friction"), params.friction)?;
            in_range(&format!("terrain.{name}.restitution"), params.restitution, 0.0, 1.0)?;
            non_negative(&format!("terrain.{name}.compression"), params.compression)?;
        }
        Ok(())
    }
}

fn positive(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")))
    }
}

fn non_negative(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be non-negative, got {value}")))
    }
}

fn in_range(name: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be within [{min}, {max}], got {value}"
        )))
    }
}
