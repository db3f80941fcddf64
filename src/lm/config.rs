//! Configuration options for the Levenberg-Marquardt algorithm.
//!
//! This module defines the tolerances, damping schedule and finite-difference
//! settings used by [`LevenbergMarquardt`](super::LevenbergMarquardt).

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone)]
pub struct LmConfig {
    /// Maximum number of iterations, counting rejected steps. Default: 200
    pub max_iterations: usize,

    /// Tolerance for relative change in cost. Default: 1e-10
    pub ftol: f64,

    /// Tolerance for relative change in parameter values. Default: 1e-10
    pub xtol: f64,

    /// Tolerance for the infinity norm of the gradient. Default: 1e-12
    pub gtol: f64,

    /// Cost below which the residuals are treated as exactly zero. Default: 1e-30
    pub zero_cost: f64,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase lambda after a rejected step. Default: 10.0
    pub lambda_up_factor: f64,

    /// Factor by which to decrease lambda after a very good step. Default: 0.1
    pub lambda_down_factor: f64,

    /// Minimum value for lambda. Default: 1e-12
    pub min_lambda: f64,

    /// Maximum value for lambda. Reaching it stops the search. Default: 1e12
    pub max_lambda: f64,

    /// Relative step for the forward-difference Jacobian. Default: 1.49e-8
    pub fd_epsilon: f64,

    /// Whether to calculate the parameter covariance at the solution. Default: false
    pub calc_covariance: bool,

    /// Singular value ratio below which the covariance is treated as undefined. Default: 1e-12
    pub rank_tolerance: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-12,
            zero_cost: 1e-30,
            initial_lambda: 1e-3,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e12,
            fd_epsilon: crate::utils::finite_difference::DEFAULT_EPSILON,
            calc_covariance: false,
            rank_tolerance: 1e-12,
        }
    }
}
