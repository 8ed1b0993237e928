use anyhow::Context;
use downhill_physics::PhysicsConfig;
use downhill_terrain::QuadtreeConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration loaded from slopesim.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub course: CourseConfig,
    #[serde(default)]
    pub quadtree: QuadtreeConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub run: RunConfig,
}

impl SimConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: SimConfig =
            toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }
}

/// Procedural course parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseConfig {
    #[serde(default = "default_course_name")]
    pub name: String,
    /// Cells across the slope (X)
    #[serde(default = "default_width")]
    pub width: u32,
    /// Cells down the slope (Z)
    #[serde(default = "default_length")]
    pub length: u32,
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    /// Height drop per world unit travelled down the slope
    #[serde(default = "default_slope")]
    pub slope: f32,
    /// Amplitude of the rolling bumps
    #[serde(default = "default_roughness")]
    pub roughness: f32,
    /// Spatial frequency of the bumps
    #[serde(default = "default_noise_scale")]
    pub noise_scale: f64,
    /// Seed for terrain noise and obstacle placement
    #[serde(default = "default_course_seed")]
    pub seed: u32,
    #[serde(default = "default_trees")]
    pub trees: usize,
    #[serde(default = "default_tree_radius")]
    pub tree_radius: f32,
    /// Number of collectable herring
    #[serde(default = "default_collectables")]
    pub collectables: usize,
    #[serde(default = "default_collectable_radius")]
    pub collectable_radius: f32,
}

fn default_course_name() -> String {
    "generated".to_string()
}

fn default_width() -> u32 {
    64
}

fn default_length() -> u32 {
    400
}

fn default_cell_size() -> f32 {
    1.0
}

fn default_slope() -> f32 {
    0.3
}

fn default_roughness() -> f32 {
    1.2
}

fn default_noise_scale() -> f64 {
    0.04
}

fn default_course_seed() -> u32 {
    7
}

fn default_trees() -> usize {
    120
}

fn default_tree_radius() -> f32 {
    0.6
}

fn default_collectables() -> usize {
    40
}

fn default_collectable_radius() -> f32 {
    0.4
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            name: default_course_name(),
            width: default_width(),
            length: default_length(),
            cell_size: default_cell_size(),
            slope: default_slope(),
            roughness: default_roughness(),
            noise_scale: default_noise_scale(),
            seed: default_course_seed(),
            trees: default_trees(),
            tree_radius: default_tree_radius(),
            collectables: default_collectables(),
            collectable_radius: default_collectable_radius(),
        }
    }
}

/// Run length and autopilot behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_ticks")]
    pub ticks: u32,
    #[serde(default = "default_dt")]
    pub dt: f32,
    /// Seed for the autopilot's steering jitter
    #[serde(default)]
    pub seed: u64,
    /// How hard the autopilot steers back toward the middle of the course
    #[serde(default = "default_steer_gain")]
    pub steer_gain: f32,
    /// Random steering added each tick
    #[serde(default = "default_steer_jitter")]
    pub steer_jitter: f32,
    /// Paddle while slower than this
    #[serde(default = "default_paddle_below")]
    pub paddle_below: f32,
    /// Brake while faster than this
    #[serde(default = "default_brake_above")]
    pub brake_above: f32,
    /// Jump every this many ticks (0 disables)
    #[serde(default)]
    pub jump_every: u32,
}

fn default_ticks() -> u32 {
    1800
}

fn default_dt() -> f32 {
    1.0 / 60.0
}

fn default_steer_gain() -> f32 {
    0.15
}

fn default_steer_jitter() -> f32 {
    0.3
}

fn default_paddle_below() -> f32 {
    3.0
}

fn default_brake_above() -> f32 {
    18.0
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            dt: default_dt(),
            seed: 0,
            steer_gain: default_steer_gain(),
            steer_jitter: default_steer_jitter(),
            paddle_below: default_paddle_below(),
            brake_above: default_brake_above(),
            jump_every: 0,
        }
    }
}
