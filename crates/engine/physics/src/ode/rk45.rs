use super::{combine, OdeState, Solver, SolverKind, StepResult};

// Runge-Kutta-Fehlberg tableau
const C: [f32; 6] = [0.0, 1.0 / 4.0, 3.0 / 8.0, 12.0 / 13.0, 1.0, 1.0 / 2.0];

const A2: [f32; 1] = [1.0 / 4.0];
const A3: [f32; 2] = [3.0 / 32.0, 9.0 / 32.0];
const A4: [f32; 3] = [1932.0 / 2197.0, -7200.0 / 2197.0, 7296.0 / 2197.0];
const A5: [f32; 4] = [439.0 / 216.0, -8.0, 3680.0 / 513.0, -845.0 / 4104.0];
const A6: [f32; 5] = [
    -8.0 / 27.0,
    2.0,
    -3544.0 / 2565.0,
    1859.0 / 4104.0,
    -11.0 / 40.0,
];

/// Fourth-order weights used to advance
const B4: [f32; 6] = [
    25.0 / 216.0,
    0.0,
    1408.0 / 2565.0,
    2197.0 / 4104.0,
    -1.0 / 5.0,
    0.0,
];

/// Fifth-order weights, used only for the error estimate
const B5: [f32; 6] = [
    16.0 / 135.0,
    0.0,
    6656.0 / 12825.0,
    28561.0 / 56430.0,
    -9.0 / 50.0,
    2.0 / 55.0,
];

/// Embedded Runge-Kutta 4(5)
///
/// Six stages shared by a fourth-order solution, which advances the state,
/// and a fifth-order solution used to estimate the local error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rk45;

impl Solver for Rk45 {
    fn kind(&self) -> SolverKind {
        SolverKind::Rk45
    }

    fn order(&self) -> u32 {
        4
    }

    fn evaluations(&self) -> u32 {
        6
    }

    fn step<S, F>(&self, state: &S, t: f32, h: f32, f: &F) -> StepResult<S>
    where
        S: OdeState,
        F: Fn(&S, f32) -> S,
    {
        let mut k: Vec<S> = Vec::with_capacity(6);
        k.push(f(state, t));

        let rows: [&[f32]; 5] = [&A2, &A3, &A4, &A5, &A6];
        for (stage, row) in rows.iter().enumerate() {
            let y = combine(state, h, row, &k);
            k.push(f(&y, t + h * C[stage + 1]));
        }

        let low = combine(state, h, &B4, &k);
        let high = combine(state, h, &B5, &k);
        let error = high.error_norm(&low);

        StepResult {
            state: low,
            error: Some(error),
        }
    }
}
