//! Step calculation for the Levenberg-Marquardt algorithm.
//!
//! This module computes the damped Gauss-Newton step
//! `(JᵀJ + λ·diag(JᵀJ)) h = −Jᵀr`, which interpolates between Gauss-Newton
//! and scaled gradient descent.

use crate::error::{EisError, Result};
use crate::lm::trust_region::TrustRegion;
use crate::utils::matrix_convert::{
    nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};
use ndarray::{Array1, Array2};

/// Smallest diagonal entry used for Marquardt scaling.
const MIN_DIAGONAL: f64 = 1e-12;

/// Result of a Levenberg-Marquardt step calculation.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// The calculated step vector
    pub step: Array1<f64>,

    /// The reduction in cost predicted by the linearized model
    pub predicted_reduction: f64,

    /// The damping parameter used to calculate the step
    pub lambda: f64,
}

/// Handles step calculation for the Levenberg-Marquardt algorithm.
pub struct LmStep;

impl LmStep {
    /// Calculates the Levenberg-Marquardt step.
    ///
    /// # Arguments
    ///
    /// * `jacobian` - The Jacobian matrix at the current position
    /// * `residuals` - The residuals at the current position
    /// * `cost` - The current cost, `‖r‖²`
    /// * `trust_region` - The damping controller
    ///
    /// # Errors
    ///
    /// * `EisError::LinearAlgebraError` if the damped normal equations cannot be solved
    pub fn calculate_step(
        jacobian: &Array2<f64>,
        residuals: &Array1<f64>,
        cost: f64,
        trust_region: &TrustRegion,
    ) -> Result<StepResult> {
        let j_t_j = jacobian.t().dot(jacobian);
        let j_t_r = jacobian.t().dot(residuals);

        let mut augmented = j_t_j;
        for i in 0..augmented.nrows() {
            augmented[[i, i]] += trust_region.lambda * augmented[[i, i]].max(MIN_DIAGONAL);
        }

        let step = LmStep::solve(&augmented, &-&j_t_r)?;
        if step.iter().any(|h| !h.is_finite()) {
            return Err(EisError::LinearAlgebraError(
                "Step contains non-finite values".to_string(),
            ));
        }

        let predicted_reduction = LmStep::predicted_reduction(jacobian, residuals, &step, cost);

        Ok(StepResult {
            step,
            predicted_reduction,
            lambda: trust_region.lambda,
        })
    }

    /// Solves the symmetric system `A x = b` by Cholesky decomposition, falling
    /// back to an SVD least-squares solve when `A` is not positive definite.
    fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
        let a_na = ndarray_to_nalgebra(a);
        let b_na = ndarray_vec_to_nalgebra(b);

        if let Some(cholesky) = a_na.clone().cholesky() {
            return Ok(nalgebra_vec_to_ndarray(&cholesky.solve(&b_na)));
        }

        let svd = a_na.svd(true, true);
        let x = svd
            .solve(&b_na, f64::EPSILON)
            .map_err(|e| EisError::LinearAlgebraError(e.to_string()))?;
        Ok(nalgebra_vec_to_ndarray(&x))
    }

    /// Calculates the reduction in cost predicted by the linear model,
    /// `‖r‖² − ‖r + J h‖²`.
    fn predicted_reduction(
        jacobian: &Array2<f64>,
        residuals: &Array1<f64>,
        step: &Array1<f64>,
        cost: f64,
    ) -> f64 {
        let linearized = residuals + &jacobian.dot(step);
        cost - linearized.dot(&linearized)
    }
}
