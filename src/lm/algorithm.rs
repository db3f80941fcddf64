//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! This module contains the bounded Levenberg-Marquardt driver used for every
//! circuit fit. Parameters are optimized in internal coordinates (see
//! [`BoundedProblem`]) so that each trial point is a physically valid circuit.

use ndarray::{Array1, Array2};
use std::fmt;

use crate::error::{EisError, Result};
use crate::parameters::Bounds;
use crate::problem::Problem;
use crate::uncertainty::calculate_covariance;
use crate::utils::finite_difference;

use super::bounded::BoundedProblem;
use super::config::LmConfig;
use super::convergence::{ConvergenceCriteria, ConvergenceStatus};
use super::step::LmStep;
use super::trust_region::TrustRegion;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values (external coordinates)
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of iterations performed, including rejected steps
    pub iterations: usize,

    /// Number of residual evaluations
    pub func_evals: usize,

    /// Terminal state of the iteration
    pub status: ConvergenceStatus,

    /// Whether the optimization converged
    pub success: bool,

    /// A message describing the result
    pub message: String,

    /// Parameter covariance at the solution (if requested and defined)
    pub covariance: Option<Array2<f64>>,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// A bounded nonlinear least-squares solver.
///
/// Implementations minimize `‖r(x)‖²` over parameters `x` that stay inside
/// `bounds` at every evaluation. Failing to converge is not an error: it is
/// reported through [`LmResult::success`]. Errors are reserved for malformed
/// inputs and evaluation failures.
pub trait Minimizer {
    /// Minimize the sum of squared residuals of `problem` starting from `initial`.
    fn minimize(
        &self,
        problem: &dyn Problem,
        initial: &Array1<f64>,
        bounds: &[Bounds],
    ) -> Result<LmResult>;
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for relative change in cost.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for change in parameter values.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the tolerance for gradient norm.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    /// Request the parameter covariance at the solution.
    pub fn with_calc_covariance(mut self, calc_covariance: bool) -> Self {
        self.config.calc_covariance = calc_covariance;
        self
    }

    /// Set the singular value ratio below which the covariance is undefined.
    pub fn with_rank_tolerance(mut self, rank_tolerance: f64) -> Self {
        self.config.rank_tolerance = rank_tolerance;
        self
    }

    fn criteria(&self) -> ConvergenceCriteria {
        ConvergenceCriteria {
            xtol: self.config.xtol,
            ftol: self.config.ftol,
            gtol: self.config.gtol,
            zero_cost: self.config.zero_cost,
            max_iterations: self.config.max_iterations,
        }
    }

    fn covariance(&self, problem: &dyn Problem, result: &LmResult) -> Result<Option<Array2<f64>>> {
        let n = result.params.len();
        let m = result.residuals.len();
        if m <= n {
            return Ok(None);
        }
        let redchi = result.cost / (m - n) as f64;
        let jacobian = finite_difference::jacobian_central(problem, &result.params, None)?;
        calculate_covariance(&jacobian, &result.params, redchi, self.config.rank_tolerance)
    }
}

impl Minimizer for LevenbergMarquardt {
    fn minimize(
        &self,
        problem: &dyn Problem,
        initial: &Array1<f64>,
        bounds: &[Bounds],
    ) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial.len() != n_params {
            return Err(EisError::DimensionMismatch(format!(
                "Expected {} initial values, got {}",
                n_params,
                initial.len()
            )));
        }

        let bounded = BoundedProblem::new(problem, bounds)?;
        let criteria = self.criteria();
        let mut trust_region = TrustRegion::from_config(&self.config);

        let mut internal = bounded.to_internal(initial);
        let mut residuals = bounded.eval(&internal)?;
        let mut cost = residuals.dot(&residuals);
        let mut func_evals = 1;
        let mut iterations = 0;

        let mut status = if cost.is_finite() {
            ConvergenceStatus::Running
        } else {
            ConvergenceStatus::NumericalError
        };
        if cost < criteria.zero_cost {
            status = ConvergenceStatus::ZeroResidual;
        }

        let mut jacobian = if status.is_terminated() {
            Array2::zeros((residuals.len(), n_params))
        } else {
            func_evals += n_params;
            finite_difference::jacobian(&bounded, &internal, Some(self.config.fd_epsilon))?
        };

        while !status.is_terminated() {
            status = criteria.check_iterations(iterations);
            if status.is_terminated() {
                break;
            }
            iterations += 1;

            let gradient = jacobian.t().dot(&residuals);
            status = criteria.check_gradient(&gradient);
            if status.is_terminated() {
                break;
            }

            let step = match LmStep::calculate_step(&jacobian, &residuals, cost, &trust_region) {
                Ok(step) => step,
                Err(e) => {
                    log::debug!("Step rejected at lambda {:.3e}: {}", trust_region.lambda, e);
                    trust_region.reject();
                    if trust_region.is_exhausted() {
                        status = ConvergenceStatus::DampingExhausted;
                    }
                    continue;
                }
            };

            let trial = &internal + &step.step;
            let trial_residuals = bounded.eval(&trial)?;
            let trial_cost = trial_residuals.dot(&trial_residuals);
            func_evals += 1;

            let gain = if trial_cost.is_finite() {
                TrustRegion::gain_ratio(cost, trial_cost, step.predicted_reduction)
            } else {
                -1.0
            };

            if trial_cost.is_finite() && trial_cost < cost && trust_region.accepts(gain) {
                log::trace!(
                    "Iteration {}: cost {:.6e} -> {:.6e}, gain {:.3}",
                    iterations,
                    cost,
                    trial_cost,
                    gain
                );
                trust_region.update_lambda(gain);
                status = criteria.check_accepted(&internal, &step.step, cost, trial_cost);

                internal = trial;
                residuals = trial_residuals;
                cost = trial_cost;

                if !status.is_terminated() {
                    func_evals += n_params;
                    jacobian = finite_difference::jacobian(
                        &bounded,
                        &internal,
                        Some(self.config.fd_epsilon),
                    )?;
                }
            } else {
                trust_region.reject();
                if criteria.is_small_step(&internal, &step.step) {
                    status = ConvergenceStatus::ParameterConvergence;
                } else if trust_region.is_exhausted() {
                    status = ConvergenceStatus::DampingExhausted;
                }
            }
        }

        log::debug!(
            "Levenberg-Marquardt finished after {} iterations: {} (cost {:.6e})",
            iterations,
            status.description(),
            cost
        );

        let mut result = LmResult {
            params: bounded.to_external(&internal),
            residuals,
            cost,
            iterations,
            func_evals,
            status,
            success: status.is_converged(),
            message: status.description().to_string(),
            covariance: None,
        };

        if self.config.calc_covariance {
            result.covariance = self.covariance(problem, &result)?;
        }

        Ok(result)
    }
}
