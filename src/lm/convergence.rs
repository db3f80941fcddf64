//! Convergence criteria for the Levenberg-Marquardt iteration.
//!
//! This module defines the criteria used to determine when the iteration has
//! converged to a solution, and the terminal states it can end in.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Possible convergence states for an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// The algorithm is still running.
    Running,

    /// The residuals vanished.
    ZeroResidual,

    /// The algorithm has converged due to a small parameter change.
    ParameterConvergence,

    /// The algorithm has converged due to a small relative change in cost.
    FunctionValueConvergence,

    /// The algorithm has converged due to a small gradient.
    GradientConvergence,

    /// The algorithm has terminated due to reaching the maximum number of iterations.
    MaxIterationsReached,

    /// No acceptable step could be found before the damping parameter hit its ceiling.
    DampingExhausted,

    /// The algorithm has terminated due to a numerical error.
    NumericalError,
}

impl ConvergenceStatus {
    /// Returns true if the optimization has terminated (either converged or failed).
    pub fn is_terminated(&self) -> bool {
        !matches!(self, ConvergenceStatus::Running)
    }

    /// Returns true if the optimization has converged.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            ConvergenceStatus::ZeroResidual
                | ConvergenceStatus::ParameterConvergence
                | ConvergenceStatus::FunctionValueConvergence
                | ConvergenceStatus::GradientConvergence
        )
    }

    /// Returns a description of the convergence status.
    pub fn description(&self) -> &'static str {
        match self {
            ConvergenceStatus::Running => "Optimization is still running",
            ConvergenceStatus::ZeroResidual => "Converged: residuals are zero",
            ConvergenceStatus::ParameterConvergence => "Converged: small parameter change",
            ConvergenceStatus::FunctionValueConvergence => "Converged: small relative cost change",
            ConvergenceStatus::GradientConvergence => "Converged: small gradient",
            ConvergenceStatus::MaxIterationsReached => "Terminated: maximum iterations reached",
            ConvergenceStatus::DampingExhausted => "Terminated: no step reduces the cost",
            ConvergenceStatus::NumericalError => "Terminated: numerical error",
        }
    }
}

/// Criteria for determining when the iteration has converged.
#[derive(Debug, Clone)]
pub struct ConvergenceCriteria {
    /// Tolerance for relative change in parameter values.
    pub xtol: f64,

    /// Tolerance for relative change in cost.
    pub ftol: f64,

    /// Tolerance for the infinity norm of the gradient.
    pub gtol: f64,

    /// Cost regarded as an exact fit.
    pub zero_cost: f64,

    /// Maximum number of iterations.
    pub max_iterations: usize,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self {
            xtol: 1e-10,
            ftol: 1e-10,
            gtol: 1e-12,
            zero_cost: 1e-30,
            max_iterations: 200,
        }
    }
}

impl ConvergenceCriteria {
    /// Creates a new set of convergence criteria with the given tolerances.
    pub fn new(xtol: f64, ftol: f64, gtol: f64, max_iterations: usize) -> Self {
        Self {
            xtol,
            ftol,
            gtol,
            max_iterations,
            ..Default::default()
        }
    }

    /// Checks the gradient `g = Jᵀr` at the current point.
    pub fn check_gradient(&self, gradient: &Array1<f64>) -> ConvergenceStatus {
        let inf_norm = gradient.iter().fold(0.0_f64, |acc, g| acc.max(g.abs()));
        if inf_norm < self.gtol {
            ConvergenceStatus::GradientConvergence
        } else {
            ConvergenceStatus::Running
        }
    }

    /// Checks whether a step is negligible relative to the current parameters.
    pub fn is_small_step(&self, params: &Array1<f64>, step: &Array1<f64>) -> bool {
        let step_norm = step.dot(step).sqrt();
        let params_norm = params.dot(params).sqrt();
        step_norm < self.xtol * (params_norm + self.xtol)
    }

    /// Checks convergence after an accepted step.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameters before the step
    /// * `step` - The accepted step
    /// * `cost` - The cost before the step
    /// * `new_cost` - The cost after the step
    pub fn check_accepted(
        &self,
        params: &Array1<f64>,
        step: &Array1<f64>,
        cost: f64,
        new_cost: f64,
    ) -> ConvergenceStatus {
        if new_cost < self.zero_cost {
            return ConvergenceStatus::ZeroResidual;
        }

        if (cost - new_cost) <= self.ftol * cost {
            return ConvergenceStatus::FunctionValueConvergence;
        }

        if self.is_small_step(params, step) {
            return ConvergenceStatus::ParameterConvergence;
        }

        ConvergenceStatus::Running
    }

    /// Checks whether the iteration budget is spent.
    pub fn check_iterations(&self, iterations: usize) -> ConvergenceStatus {
        if iterations >= self.max_iterations {
            ConvergenceStatus::MaxIterationsReached
        } else {
            ConvergenceStatus::Running
        }
    }
}
