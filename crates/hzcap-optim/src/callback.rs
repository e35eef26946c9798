//! Callback support for capacity estimation.
//!
//! This module provides traits and types for implementing callbacks that can
//! monitor and control the estimation process. Callbacks see every iterate,
//! every accepted line-search step and the final configuration; the last one
//! is where a visualisation of the loop would hook in.

use crate::result::TerminationReason;
use hzcap_core::{error::EstimatorResult, types::Matrix};
use std::time::Duration;

/// Information passed at the start of estimation.
#[derive(Debug, Clone, Copy)]
pub struct StartInfo<'a> {
    /// Random starting configuration
    pub initial_point: &'a Matrix,
    /// Action `F` at the starting configuration
    pub initial_action: f64,
    /// Whether `dG` is computed by root finding
    pub numerical_legendre: bool,
}

/// Information passed once per iteration, before the convergence check.
#[derive(Debug, Clone, Copy)]
pub struct IterationInfo<'a> {
    /// Iteration index, starting at 1
    pub iteration: usize,
    /// Action `F(x)`
    pub action: f64,
    /// Constraint value `f(x)`
    pub constraint: f64,
    /// Squared norm of the projected descent direction
    pub tangent_gradient_norm_sq: f64,
    /// Current iterate
    pub point: &'a Matrix,
    /// Elapsed time since estimation start
    pub elapsed: Duration,
}

/// Details of an accepted line-search step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInfo {
    /// Iteration the step belongs to
    pub iteration: usize,
    /// Accepted step size
    pub step_size: f64,
    /// Curvature bound on the step size
    pub max_step_size: f64,
    /// First step size tried
    pub initial_step_size: f64,
    /// `F(x) - F(x + L y)` at the raw step
    pub raw_decrease: f64,
    /// `F(x) - F(R(x, L y))` at the retracted step
    pub retracted_decrease: f64,
    /// Halvings before acceptance
    pub backtracks: usize,
}

impl StepInfo {
    /// Whether the step satisfies the acceptance test `4 del_2 > del_1`.
    pub fn is_sufficient(&self) -> bool {
        4.0 * self.retracted_decrease > self.raw_decrease
    }
}

/// Information passed at the end of estimation.
#[derive(Debug, Clone, Copy)]
pub struct EstimationSummary<'a> {
    /// Final iterate
    pub point: &'a Matrix,
    /// Estimated capacity
    pub capacity: f64,
    /// Number of iterations started
    pub iterations: usize,
    /// Why the run stopped
    pub termination_reason: TerminationReason,
    /// Total elapsed time
    pub elapsed: Duration,
}

/// Trait for estimation callbacks.
pub trait EstimationCallback {
    /// Called once the starting point has been sampled.
    fn on_estimation_start(&mut self, info: &StartInfo<'_>) -> EstimatorResult<()> {
        let _ = info;
        Ok(())
    }

    /// Called at every iteration.
    ///
    /// Returns `true` to continue, `false` to stop early.
    fn on_iteration_end(&mut self, info: &IterationInfo<'_>) -> EstimatorResult<bool> {
        let _ = info;
        Ok(true)
    }

    /// Called after each accepted step.
    fn on_step_accepted(&mut self, info: &StepInfo) -> EstimatorResult<()> {
        let _ = info;
        Ok(())
    }

    /// Called with the final iterate.
    fn on_estimation_end(&mut self, summary: &EstimationSummary<'_>) -> EstimatorResult<()> {
        let _ = summary;
        Ok(())
    }
}

/// A no-op callback that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl EstimationCallback for NoOpCallback {}

/// A callback that logs progress through the `log` facade.
#[derive(Debug, Clone)]
pub struct LoggingCallback {
    log_every: usize,
}

impl LoggingCallback {
    /// Logs every `log_every`-th iteration (at least every iteration).
    pub fn new(log_every: usize) -> Self {
        Self {
            log_every: log_every.max(1),
        }
    }
}

impl Default for LoggingCallback {
    fn default() -> Self {
        Self::new(1)
    }
}

impl EstimationCallback for LoggingCallback {
    fn on_estimation_start(&mut self, info: &StartInfo<'_>) -> EstimatorResult<()> {
        log::info!(
            "Starting capacity estimation: F(x0) = {}, numerical Legendre = {}",
            info.initial_action,
            info.numerical_legendre
        );
        Ok(())
    }

    fn on_iteration_end(&mut self, info: &IterationInfo<'_>) -> EstimatorResult<bool> {
        if info.iteration % self.log_every == 0 {
            log::info!(
                "iteration = {}, F = {}, f = {}, |y_hat|^2 = {:e}",
                info.iteration,
                info.action,
                info.constraint,
                info.tangent_gradient_norm_sq
            );
        }
        Ok(true)
    }

    fn on_estimation_end(&mut self, summary: &EstimationSummary<'_>) -> EstimatorResult<()> {
        log::info!(
            "Estimation finished after {} iterations ({:?}): capacity = {}",
            summary.iterations,
            summary.termination_reason,
            summary.capacity
        );
        Ok(())
    }
}

/// Metrics of one iteration as recorded by [`HistoryCallback`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationRecord {
    /// Iteration index
    pub iteration: usize,
    /// Action `F(x)`
    pub action: f64,
    /// Constraint value `f(x)`
    pub constraint: f64,
    /// Squared tangent gradient norm
    pub tangent_gradient_norm_sq: f64,
}

/// A callback that records the whole run.
#[derive(Debug, Clone, Default)]
pub struct HistoryCallback {
    /// One record per iteration
    pub iterations: Vec<IterationRecord>,
    /// Every accepted step
    pub steps: Vec<StepInfo>,
    /// Final iterate, once the run has finished
    pub final_point: Option<Matrix>,
    /// Stop after this many iterations
    pub stop_after: Option<usize>,
}

impl HistoryCallback {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop once `iterations` iterations have been recorded.
    pub fn stopping_after(iterations: usize) -> Self {
        Self {
            stop_after: Some(iterations),
            ..Self::default()
        }
    }
}

impl EstimationCallback for HistoryCallback {
    fn on_iteration_end(&mut self, info: &IterationInfo<'_>) -> EstimatorResult<bool> {
        self.iterations.push(IterationRecord {
            iteration: info.iteration,
            action: info.action,
            constraint: info.constraint,
            tangent_gradient_norm_sq: info.tangent_gradient_norm_sq,
        });
        Ok(self.stop_after.map_or(true, |limit| self.iterations.len() < limit))
    }

    fn on_step_accepted(&mut self, info: &StepInfo) -> EstimatorResult<()> {
        self.steps.push(*info);
        Ok(())
    }

    fn on_estimation_end(&mut self, summary: &EstimationSummary<'_>) -> EstimatorResult<()> {
        self.final_point = Some(summary.point.clone());
        Ok(())
    }
}

impl<C: EstimationCallback + ?Sized> EstimationCallback for &mut C {
    fn on_estimation_start(&mut self, info: &StartInfo<'_>) -> EstimatorResult<()> {
        (**self).on_estimation_start(info)
    }

    fn on_iteration_end(&mut self, info: &IterationInfo<'_>) -> EstimatorResult<bool> {
        (**self).on_iteration_end(info)
    }

    fn on_step_accepted(&mut self, info: &StepInfo) -> EstimatorResult<()> {
        (**self).on_step_accepted(info)
    }

    fn on_estimation_end(&mut self, summary: &EstimationSummary<'_>) -> EstimatorResult<()> {
        (**self).on_estimation_end(summary)
    }
}
