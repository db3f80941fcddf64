//! # Uncertainty Calculation
//!
//! This module estimates parameter uncertainties from the Jacobian of the
//! residuals at a solution: the covariance matrix, the standard errors on its
//! diagonal and the correlation matrix derived from it.

mod covariance;

pub use covariance::{
    calculate_correlation, calculate_covariance, standard_errors_from_covariance,
};
