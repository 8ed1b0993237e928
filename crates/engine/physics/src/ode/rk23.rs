use super::{combine, OdeState, Solver, SolverKind, StepResult};

// Bogacki-Shampine stages
const C2: f32 = 1.0 / 2.0;
const C3: f32 = 3.0 / 4.0;

/// Third-order weights, used only for the error estimate
const B3: [f32; 3] = [2.0 / 9.0, 1.0 / 3.0, 4.0 / 9.0];

/// Second-order midpoint weights used to advance
const B2: [f32; 3] = [0.0, 1.0, 0.0];

/// Embedded Runge-Kutta 2(3)
///
/// Advances with the midpoint rule and estimates the local error against the
/// third-order Bogacki-Shampine solution built from the same stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rk23;

impl Solver for Rk23 {
    fn kind(&self) -> SolverKind {
        SolverKind::Rk23
    }

    fn order(&self) -> u32 {
        2
    }

    fn evaluations(&self) -> u32 {
        3
    }

    fn step<S, F>(&self, state: &S, t: f32, h: f32, f: &F) -> StepResult<S>
    where
        S: OdeState,
        F: Fn(&S, f32) -> S,
    {
        let k1 = f(state, t);
        let k2 = f(&state.add_scaled(&k1, h * C2), t + h * C2);
        let k3 = f(&state.add_scaled(&k2, h * C3), t + h * C3);
        let k = [k1, k2, k3];

        let low = combine(state, h, &B2, &k);
        let high = combine(state, h, &B3, &k);
        let error = high.error_norm(&low);

        StepResult {
            state: low,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        assert!((B3.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert_eq!(B2.iter().sum::<f32>(), 1.0);
    }

    #[test]
    fn test_exact_for_linear_in_time() {
        // y' = 2t integrates exactly with the midpoint rule
        let result = Rk23.step(&1.0f32, 1.0, 0.5, &|_y: &f32, t: f32| 2.0 * t);
        assert!((result.state - 2.25).abs() < 1e-6);
        assert!(result.error.unwrap() < 1e-6);
    }
}
