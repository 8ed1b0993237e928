//! ODE solvers
//!
//! Each solver advances an opaque state by one step of size `h` given a
//! caller-supplied derivative function `f(state, t)`. Solvers hold no state
//! between calls; the same inputs always produce the same output.
//!
//! | Solver | Order | Evaluations | Error estimate |
//! |--------|-------|-------------|----------------|
//! | Euler  | 1     | 1           | none           |
//! | RK2(3) | 2     | 3           | 3rd order      |
//! | RK4(5) | 4     | 6           | 5th order      |

mod adaptive;
mod euler;
mod rk23;
mod rk45;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

pub use adaptive::{Integration, IntegrationReport, StepControl};
pub use euler::Euler;
pub use rk23::Rk23;
pub use rk45::Rk45;

/// State vector an ODE solver can advance
///
/// The derivative of a state is represented by the same type.
pub trait OdeState: Clone {
    /// `self + h * derivative`
    fn add_scaled(&self, derivative: &Self, h: f32) -> Self;

    /// Size of the difference between two states, used as the local error
    fn error_norm(&self, other: &Self) -> f32;
}

impl OdeState for f32 {
    fn add_scaled(&self, derivative: &Self, h: f32) -> Self {
        self + derivative * h
    }

    fn error_norm(&self, other: &Self) -> f32 {
        (self - other).abs()
    }
}

impl OdeState for Vec2 {
    fn add_scaled(&self, derivative: &Self, h: f32) -> Self {
        *self + *derivative * h
    }

    fn error_norm(&self, other: &Self) -> f32 {
        self.distance(*other)
    }
}

impl OdeState for Vec3 {
    fn add_scaled(&self, derivative: &Self, h: f32) -> Self {
        *self + *derivative * h
    }

    fn error_norm(&self, other: &Self) -> f32 {
        self.distance(*other)
    }
}

/// Output of a single solver step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult<S> {
    pub state: S,
    /// Local truncation error estimate; `None` for fixed-step solvers
    pub error: Option<f32>,
}

/// One integration scheme
pub trait Solver {
    fn kind(&self) -> SolverKind;

    /// Order of the combination used to advance the state
    fn order(&self) -> u32;

    /// Derivative evaluations per step
    fn evaluations(&self) -> u32;

    /// Advance `state` from time `t` by `h`
    ///
    /// # Arguments
    /// * `state` - State at time `t`
    /// * `t` - Time at the start of the step
    /// * `h` - Step size
    /// * `f` - Derivative function, evaluated exactly `evaluations()` times
    fn step<S, F>(&self, state: &S, t: f32, h: f32, f: &F) -> StepResult<S>
    where
        S: OdeState,
        F: Fn(&S, f32) -> S;
}

/// Available solvers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    Euler,
    Rk23,
    #[default]
    Rk45,
}

impl SolverKind {
    pub const ALL: [SolverKind; 3] = [SolverKind::Euler, SolverKind::Rk23, SolverKind::Rk45];

    /// Solvers with an error estimate use adaptive step control
    pub fn is_adaptive(self) -> bool {
        !matches!(self, SolverKind::Euler)
    }

    pub fn name(self) -> &'static str {
        match self {
            SolverKind::Euler => "euler",
            SolverKind::Rk23 => "rk23",
            SolverKind::Rk45 => "rk45",
        }
    }
}

impl std::fmt::Display for SolverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for SolverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euler" => Ok(SolverKind::Euler),
            "rk23" | "rk2" => Ok(SolverKind::Rk23),
            "rk45" | "rk4" => Ok(SolverKind::Rk45),
            other => Err(format!("unknown solver '{other}' (expected euler, rk23 or rk45)")),
        }
    }
}

/// Solver selected once per session and dispatched without trait objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integrator {
    Euler(Euler),
    Rk23(Rk23),
    Rk45(Rk45),
}

impl Integrator {
    pub fn new(kind: SolverKind) -> Self {
        match kind {
            SolverKind::Euler => Integrator::Euler(Euler),
            SolverKind::Rk23 => Integrator::Rk23(Rk23),
            SolverKind::Rk45 => Integrator::Rk45(Rk45),
        }
    }
}

impl Solver for Integrator {
    fn kind(&self) -> SolverKind {
        match self {
            Integrator::Euler(s) => s.kind(),
            Integrator::Rk23(s) => s.kind(),
            Integrator::Rk45(s) => s.kind(),
        }
    }

    fn order(&self) -> u32 {
        match self {
            Integrator::Euler(s) => s.order(),
            Integrator::Rk23(s) => s.order(),
            Integrator::Rk45(s) => s.order(),
        }
    }

    fn evaluations(&self) -> u32 {
        match self {
            Integrator::Euler(s) => s.evaluations(),
            Integrator::Rk23(s) => s.evaluations(),
            Integrator::Rk45(s) => s.evaluations(),
        }
    }

    fn step<S, F>(&self, state: &S, t: f32, h: f32, f: &F) -> StepResult<S>
    where
        S: OdeState,
        F: Fn(&S, f32) -> S,
    {
        match self {
            Integrator::Euler(s) => s.step(state, t, h, f),
            Integrator::Rk23(s) => s.step(state, t, h, f),
            Integrator::Rk45(s) => s.step(state, t, h, f),
        }
    }
}

/// `y + h * sum(weights[i] * k[i])`, skipping zero weights
pub(crate) fn combine<S: OdeState>(y: &S, h: f32, weights: &[f32], k: &[S]) -> S {
    weights
        .iter()
        .zip(k)
        .filter(|(w, _)| **w != 0.0)
        .fold(y.clone(), |acc, (w, ki)| acc.add_scaled(ki, h * w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// y' = -y, exact solution e^-t
    fn decay(y: &f32, _t: f32) -> f32 {
        -y
    }

    #[test]
    fn test_evaluation_counts() {
        for kind in SolverKind::ALL {
            let integrator = Integrator::new(kind);
            let calls = Cell::new(0);
            let f = |y: &f32, _t: f32| {
                calls.set(calls.get() + 1);
                -y
            };
            integrator.step(&1.0f32, 0.0, 0.1, &f);
            assert_eq!(calls.get(), integrator.evaluations(), "{kind}");
        }
        assert_eq!(Integrator::new(SolverKind::Euler).evaluations(), 1);
        assert_eq!(Integrator::new(SolverKind::Rk23).evaluations(), 3);
        assert_eq!(Integrator::new(SolverKind::Rk45).evaluations(), 6);
    }

    #[test]
    fn test_zero_derivative_leaves_state_unchanged() {
        let zero = |_: &Vec3, _t: f32| Vec3::ZERO;
        let start = Vec3::new(1.5, -2.0, 7.25);
        for kind in SolverKind::ALL {
            let result = Integrator::new(kind).step(&start, 0.0, 0.05, &zero);
            assert_eq!(result.state, start, "{kind}");
            if kind.is_adaptive() {
                assert_eq!(result.error, Some(0.0));
            } else {
                assert_eq!(result.error, None);
            }
        }
    }

    #[test]
    fn test_step_is_idempotent() {
        for kind in SolverKind::ALL {
            let integrator = Integrator::new(kind);
            let a = integrator.step(&1.0f32, 0.3, 0.07, &decay);
            let b = integrator.step(&1.0f32, 0.3, 0.07, &decay);
            assert_eq!(a, b, "{kind}");
        }
    }

    #[test]
    fn test_accuracy_improves_with_order() {
        let h = 0.1;
        let exact = (-h as f32).exp();
        let err = |kind| (Integrator::new(kind).step(&1.0f32, 0.0, h, &decay).state - exact).abs();
        let (e1, e2, e4) = (err(SolverKind::Euler), err(SolverKind::Rk23), err(SolverKind::Rk45));
        assert!(e2 < e1, "rk23 {e2} vs euler {e1}");
        assert!(e4 < e2, "rk45 {e4} vs rk23 {e2}");
        assert!(e4 < 1e-6);
    }

    #[test]
    fn test_error_estimate_tracks_true_error() {
        let h = 0.2;
        let exact = (-h as f32).exp();
        for kind in [SolverKind::Rk23, SolverKind::Rk45] {
            let result = Integrator::new(kind).step(&1.0f32, 0.0, h, &decay);
            let estimate = result.error.unwrap();
            let actual = (result.state - exact).abs();
            // The estimate compares against a higher-order solution, so it
            // should be within a small factor of the true error
            assert!(estimate > 0.0);
            assert!(estimate < actual * 4.0 + 1e-6, "{kind}: {estimate} vs {actual}");
        }
    }

    #[test]
    fn test_parse_solver_kind() {
        assert_eq!("RK45".parse::<SolverKind>(), Ok(SolverKind::Rk45));
        assert_eq!("euler".parse::<SolverKind>(), Ok(SolverKind::Euler));
        assert!("midpoint".parse::<SolverKind>().is_err());
        assert_eq!(SolverKind::Rk23.to_string(), "rk23");
    }
}
