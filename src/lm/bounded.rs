//! Bounded problem adapter.
//!
//! Wraps a [`Problem`] so the optimizer can iterate over unconstrained internal
//! coordinates while every evaluation of the wrapped problem sees parameters
//! that lie inside their domains.

use crate::error::{EisError, Result};
use crate::parameters::{Bounds, BoundsTransform};
use crate::problem::Problem;
use ndarray::Array1;

/// A problem evaluated in internal (unbounded) coordinates.
pub struct BoundedProblem<'a> {
    inner: &'a dyn Problem,
    transforms: Vec<BoundsTransform>,
}

impl<'a> BoundedProblem<'a> {
    /// Create an adapter for `inner` with one bounds entry per parameter.
    pub fn new(inner: &'a dyn Problem, bounds: &[Bounds]) -> Result<Self> {
        if bounds.len() != inner.parameter_count() {
            return Err(EisError::DimensionMismatch(format!(
                "Expected {} bounds, got {}",
                inner.parameter_count(),
                bounds.len()
            )));
        }
        Ok(Self {
            inner,
            transforms: bounds.iter().copied().map(BoundsTransform::new).collect(),
        })
    }

    /// Map external values to internal coordinates.
    ///
    /// Values outside their domain (or exactly on an open bound) are clamped
    /// to the nearest valid value first.
    pub fn to_internal(&self, external: &Array1<f64>) -> Array1<f64> {
        self.transforms
            .iter()
            .zip(external.iter())
            .map(|(transform, &value)| {
                transform.to_internal(value).unwrap_or_else(|_| {
                    let clamped = transform.bounds().clamp(value);
                    log::debug!("Starting value {} clamped to {}", value, clamped);
                    transform.to_internal(clamped).unwrap_or(0.0)
                })
            })
            .collect()
    }

    /// Map internal coordinates back to external values.
    pub fn to_external(&self, internal: &Array1<f64>) -> Array1<f64> {
        self.transforms
            .iter()
            .zip(internal.iter())
            .map(|(transform, &value)| transform.to_external(value))
            .collect()
    }
}

impl Problem for BoundedProblem<'_> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        self.inner.eval(&self.to_external(params))
    }

    fn parameter_count(&self) -> usize {
        self.inner.parameter_count()
    }

    fn residual_count(&self) -> usize {
        self.inner.residual_count()
    }
}
