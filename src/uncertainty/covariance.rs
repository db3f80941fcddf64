//! # Covariance Matrix Calculations
//!
//! This module provides functions for calculating and manipulating covariance
//! matrices from Jacobian matrices in nonlinear least-squares optimization.

use crate::error::{EisError, Result};
use crate::utils::matrix_convert::{nalgebra_to_ndarray, ndarray_to_nalgebra};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// Calculate the covariance matrix from a Jacobian matrix.
///
/// For nonlinear least-squares problems, the covariance matrix is estimated as:
///   covar = redchi * inv(J^T * J)
/// where:
///   - J is the Jacobian matrix
///   - redchi is the reduced chi-square (chi^2 / dof)
///
/// The columns of J are first multiplied by `scale` (typically the parameter
/// values), so that parameters spanning many decades are compared on a
/// relative footing. The inverse is taken through the SVD of the scaled
/// Jacobian and the scaling is undone afterwards:
///   covar = S * redchi * inv(Js^T * Js) * S,  Js = J * S
///
/// Returns `Ok(None)` when the scaled Jacobian is rank deficient, i.e. when the
/// ratio of its smallest to largest singular value is below `rank_tolerance`,
/// or when the result is not finite.
pub fn calculate_covariance(
    jacobian: &Array2<f64>,
    scale: &Array1<f64>,
    redchi: f64,
    rank_tolerance: f64,
) -> Result<Option<Array2<f64>>> {
    let n = jacobian.ncols();
    if scale.len() != n {
        return Err(EisError::DimensionMismatch(format!(
            "Jacobian has {} columns but {} scale factors were given",
            n,
            scale.len()
        )));
    }
    if jacobian.nrows() < n || n == 0 || !redchi.is_finite() {
        return Ok(None);
    }
    if jacobian.iter().any(|v| !v.is_finite()) {
        return Ok(None);
    }

    let scale: Vec<f64> = scale
        .iter()
        .map(|&s| if s != 0.0 && s.is_finite() { s } else { 1.0 })
        .collect();

    let mut scaled = ndarray_to_nalgebra(jacobian);
    for (j, &s) in scale.iter().enumerate() {
        scaled.column_mut(j).scale_mut(s);
    }

    let svd = scaled.svd(false, true);
    let singular_values = &svd.singular_values;
    let s_max = singular_values.max();
    let s_min = singular_values.min();
    if s_max <= 0.0 || s_min / s_max < rank_tolerance {
        return Ok(None);
    }

    let v_t = svd
        .v_t
        .ok_or_else(|| EisError::LinearAlgebraError("SVD did not return V^T".to_string()))?;

    // inv(Js^T Js) = V * diag(1/s^2) * V^T
    let inv_sq = DMatrix::from_diagonal(&singular_values.map(|s| 1.0 / (s * s)));
    let inverse = nalgebra_to_ndarray(&(v_t.transpose() * inv_sq * &v_t));

    let covar = Array2::from_shape_fn((n, n), |(i, j)| {
        redchi * scale[i] * inverse[[i, j]] * scale[j]
    });

    if covar.iter().any(|v| !v.is_finite()) {
        return Ok(None);
    }

    Ok(Some(covar))
}

/// Calculate correlation matrix from covariance matrix.
///
/// This normalizes the covariance matrix so that diagonal elements are 1.0,
/// and off-diagonal elements represent correlation coefficients between -1 and 1.
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    let mut correl = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..n {
            if i == j {
                correl[[i, j]] = 1.0;
            } else {
                let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
                if denom > 0.0 {
                    correl[[i, j]] = covar[[i, j]] / denom;
                }
            }
        }
    }

    correl
}

/// Extract standard errors from the covariance matrix.
///
/// Standard errors are the square roots of the diagonal elements of the
/// covariance matrix. Returns `None` if any diagonal element is negative or
/// not finite.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Option<Array1<f64>> {
    let diagonal = covar.diag();
    if diagonal.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return None;
    }
    Some(diagonal.mapv(f64::sqrt))
}
