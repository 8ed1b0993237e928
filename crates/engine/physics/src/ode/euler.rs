use super::{OdeState, Solver, SolverKind, StepResult};

/// Explicit Euler: `y + h * f(y, t)`
///
/// First order with no error estimate; always run at a fixed step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Euler;

impl Solver for Euler {
    fn kind(&self) -> SolverKind {
        SolverKind::Euler
    }

    fn order(&self) -> u32 {
        1
    }

    fn evaluations(&self) -> u32 {
        1
    }

    fn step<S, F>(&self, state: &S, t: f32, h: f32, f: &F) -> StepResult<S>
    where
        S: OdeState,
        F: Fn(&S, f32) -> S,
    {
        let k1 = f(state, t);
        StepResult {
            state: state.add_scaled(&k1, h),
            error: None,
        }
    }
}
