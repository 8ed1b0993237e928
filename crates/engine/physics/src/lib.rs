//! Player physics for downhill courses
//!
//! A [`PhysicsStepper`] owns the player state and advances it one tick at a
//! time over a borrowed [`downhill_terrain::Course`]: the force model feeds a
//! selectable ODE solver, and the collision resolver corrects the result
//! against the terrain, the course bounds and the obstacles.

mod config;
mod contact;
mod control;
mod error;
mod forces;
pub mod ode;
mod resolver;
mod state;
mod stepper;

pub use config::{ContactConfig, PhysicsConfig, PlayerConfig, SolverConfig, SurfaceParams, TerrainTable};
pub use contact::{ContactInfo, ContactKind, ContactPhase};
pub use control::ControlInput;
pub use error::{ConfigError, Result};
pub use forces::{orientation_rate, ForceModel};
pub use ode::{Integrator, IntegrationReport, OdeState, Solver, SolverKind, StepResult};
pub use resolver::{CollisionResolver, Resolution};
pub use state::SimState;
pub use stepper::{PhysicsStepper, TickResult};

// Re-export for convenience
pub use downhill_terrain as terrain;
pub use glam;
