//! Finite difference methods for numerical differentiation.
//!
//! This module provides functions for computing Jacobians using finite
//! difference approximations.

use crate::error::{EisError, Result};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Default step size for forward differences (square root of machine epsilon).
pub const DEFAULT_EPSILON: f64 = 1.49e-8;

/// Default step size for central differences (cube root of machine epsilon).
pub const DEFAULT_CENTRAL_EPSILON: f64 = 6.06e-6;

/// Compute the Jacobian matrix using forward finite differences.
///
/// The Jacobian is the matrix of partial derivatives of the residuals with
/// respect to the parameters: J[i,j] = ∂residual[i]/∂param[j]. The step for
/// parameter j is `epsilon * max(|param_j|, 1)`, which suits the O(1)
/// internal coordinates the optimizer works in.
pub fn jacobian<P: Problem + ?Sized>(
    problem: &P,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let residuals = problem.eval(params)?;
    let n_residuals = check_residuals(problem, &residuals)?;

    let mut jac = Array2::zeros((n_residuals, params.len()));
    for j in 0..params.len() {
        let eps_j = eps * params[j].abs().max(1.0);

        let mut params_perturbed = params.clone();
        params_perturbed[j] += eps_j;
        let residuals_perturbed = problem.eval(&params_perturbed)?;

        for i in 0..n_residuals {
            jac[[i, j]] = (residuals_perturbed[i] - residuals[i]) / eps_j;
        }
    }

    Ok(jac)
}

/// Compute the Jacobian matrix using central finite differences.
///
/// The step is relative to each parameter (`epsilon * |param_j|`), so
/// parameters of very different magnitude such as ohms and microfarads are
/// differentiated with the same relative accuracy. Zero parameters fall back
/// to an absolute step of `epsilon`.
pub fn jacobian_central<P: Problem + ?Sized>(
    problem: &P,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_CENTRAL_EPSILON);
    let n_residuals = problem.residual_count();

    let mut jac = Array2::zeros((n_residuals, params.len()));
    for j in 0..params.len() {
        let eps_j = if params[j] != 0.0 {
            eps * params[j].abs()
        } else {
            eps
        };

        let mut forward = params.clone();
        forward[j] += eps_j;
        let mut backward = params.clone();
        backward[j] -= eps_j;

        let r_forward = problem.eval(&forward)?;
        let r_backward = problem.eval(&backward)?;
        check_residuals(problem, &r_forward)?;
        check_residuals(problem, &r_backward)?;

        for i in 0..n_residuals {
            jac[[i, j]] = (r_forward[i] - r_backward[i]) / (2.0 * eps_j);
        }
    }

    Ok(jac)
}

fn check_residuals<P: Problem + ?Sized>(problem: &P, residuals: &Array1<f64>) -> Result<usize> {
    let expected = problem.residual_count();
    if residuals.len() != expected {
        return Err(EisError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            expected,
            residuals.len()
        )));
    }
    Ok(expected)
}
