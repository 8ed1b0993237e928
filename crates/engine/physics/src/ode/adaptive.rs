//! Step size control across one tick
//!
//! Splits a tick of length `dt` into substeps. Fixed-step solvers use the
//! configured Euler step. Solvers with an error estimate reject and halve
//! steps above tolerance, grow them when the error is well below it, and
//! accept a step at the floor size even if it misses the tolerance, so a
//! tick always completes.

use super::{Integrator, OdeState, Solver};
use crate::config::SolverConfig;

/// Fraction of the remaining time below which a substep is stretched to
/// finish the tick instead of leaving a sliver behind
const FINISH_SLACK: f32 = 1.1;

/// Diagnostics for one tick's integration
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntegrationReport {
    /// Accepted substeps
    pub substeps: u32,
    /// Attempts thrown away because the error exceeded tolerance
    pub rejected: u32,
    /// Substeps accepted at the step floor above tolerance
    pub floor_accepts: u32,
    /// Derivative evaluations, including rejected attempts
    pub evaluations: u32,
    /// Largest error estimate among accepted substeps
    pub max_error: f32,
}

/// Result of integrating over one tick
#[derive(Debug, Clone, PartialEq)]
pub struct Integration<S> {
    pub state: S,
    /// Step size to start the next tick with
    pub next_step: f32,
    pub report: IntegrationReport,
}

/// Adaptive step size policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepControl {
    pub fixed_step: f32,
    pub tolerance: f32,
    pub min_step: f32,
    pub max_step: f32,
    pub growth_threshold: f32,
    pub growth_factor: f32,
}

impl StepControl {
    pub fn from_config(config: &SolverConfig) -> Self {
        Self {
            fixed_step: config.euler_step,
            tolerance: config.tolerance,
            min_step: config.min_step,
            max_step: config.max_step,
            growth_threshold: config.growth_threshold,
            growth_factor: config.growth_factor,
        }
    }

    /// Integrate `state` over `dt`
    ///
    /// # Arguments
    /// * `integrator` - Solver to use
    /// * `state` - State at the start of the tick
    /// * `dt` - Tick length
    /// * `initial_step` - Step size carried over from the previous tick
    /// * `f` - Derivative function
    /// * `step_ceiling` - Largest step allowed from a given state (e.g. a
    ///   travel distance limit divided by speed); ignored by fixed-step solvers
    pub fn integrate<S, F, C>(
        &self,
        integrator: &Integrator,
        state: &S,
        dt: f32,
        initial_step: f32,
        f: F,
        step_ceiling: C,
    ) -> Integration<S>
    where
        S: OdeState,
        F: Fn(&S, f32) -> S,
        C: Fn(&S) -> f32,
    {
        if !(dt.is_finite() && dt > 0.0) {
            return Integration {
                state: state.clone(),
                next_step: self.clamp_step(initial_step),
                report: IntegrationReport::default(),
            };
        }

        if integrator.kind().is_adaptive() {
            self.integrate_adaptive(integrator, state, dt, initial_step, &f, &step_ceiling)
        } else {
            self.integrate_fixed(integrator, state, dt, &f)
        }
    }

    fn integrate_fixed<S, F>(&self, integrator: &Integrator, state: &S, dt: f32, f: &F) -> Integration<S>
    where
        S: OdeState,
        F: Fn(&S, f32) -> S,
    {
        let mut report = IntegrationReport::default();
        let mut current = state.clone();
        let mut t = 0.0f32;

        loop {
            let remaining = dt - t;
            if remaining <= dt * f32::EPSILON {
                break;
            }
            let mut h = self.fixed_step;
            if h * FINISH_SLACK >= remaining {
                h = remaining;
            }

            current = integrator.step(&current, t, h, f).state;
            report.substeps += 1;
            report.evaluations += integrator.evaluations();

            if h == remaining {
                break;
            }
            t += h;
        }

        Integration {
            state: current,
            next_step: self.fixed_step,
            report,
        }
    }

    fn integrate_adaptive<S, F, C>(
        &self,
        integrator: &Integrator,
        state: &S,
        dt: f32,
        initial_step: f32,
        f: &F,
        step_ceiling: &C,
    ) -> Integration<S>
    where
        S: OdeState,
        F: Fn(&S, f32) -> S,
        C: Fn(&S) -> f32,
    {
        let mut report = IntegrationReport::default();
        let mut current = state.clone();
        let mut t = 0.0f32;
        let mut h_next = self.clamp_step(initial_step);

        loop {
            let remaining = dt - t;
            if remaining <= dt * f32::EPSILON {
                break;
            }

            let ceiling = step_ceiling(&current);
            let ceiling = if ceiling.is_nan() { self.max_step } else { ceiling };
            let mut h = h_next.min(ceiling).clamp(self.min_step, self.max_step);
            let finishing = h * FINISH_SLACK >= remaining;
            if finishing {
                h = remaining;
            }

            let result = integrator.step(&current, t, h, f);
            report.evaluations += integrator.evaluations();
            let error = result.error.unwrap_or(0.0);
            let error = if error.is_nan() { f32::INFINITY } else { error };

            // A finishing step this short would be stretched back to `remaining`
            // after halving, so retrying cannot make it smaller
            let floor = if finishing {
                self.min_step * FINISH_SLACK
            } else {
                self.min_step
            };

            if error > self.tolerance {
                if h > floor {
                    report.rejected += 1;
                    h_next = (h * 0.5).max(self.min_step);
                    tracing::trace!(
                        "[StepControl] rejected h={:.5} error={:.3e}, retrying with {:.5}",
                        h,
                        error,
                        h_next
                    );
                    continue;
                }
                report.floor_accepts += 1;
                tracing::warn!(
                    "[StepControl] accepting h={:.5} at step floor with error {:.3e} (tolerance {:.3e})",
                    h,
                    error,
                    self.tolerance
                );
            }

            current = result.state;
            report.substeps += 1;
            if error.is_finite() {
                report.max_error = report.max_error.max(error);
            }

            if !finishing {
                h_next = if error < self.tolerance * self.growth_threshold {
                    (h * self.growth_factor).min(self.max_step)
                } else {
                    h
                };
            }

            if finishing {
                break;
            }
            t += h;
        }

        if report.rejected > 0 {
            tracing::debug!(
                "[StepControl] tick finished in {} substeps after {} rejections",
                report.substeps,
                report.rejected
            );
        }

        Integration {
            state: current,
            next_step: h_next,
            report,
        }
    }

    fn clamp_step(&self, h: f32) -> f32 {
        if h.is_finite() && h > 0.0 {
            h.clamp(self.min_step, self.max_step)
        } else {
            self.max_step
        }
    }
}
