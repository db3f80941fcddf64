//! The impedance fitting problem.
//!
//! Real and imaginary parts are fitted together: for N observations the
//! residual vector has 2N entries, `[re_1, im_1, re_2, im_2, ...]`, each divided
//! by the observation weight.

use crate::circuit::{CircuitModel, Node};
use crate::error::{EisError, Result};
use crate::problem::Problem;
use crate::spectrum::Spectrum;
use ndarray::Array1;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// How residuals are scaled before they enter the cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Weighting {
    /// Divide by `|Z_obs|`, so every frequency contributes on a relative scale.
    #[default]
    Modulus,

    /// Raw residuals in ohms.
    Unit,
}

impl Weighting {
    fn weight(&self, observed: Complex64) -> f64 {
        match self {
            Weighting::Modulus => {
                let modulus = observed.norm();
                if modulus > 0.0 && modulus.is_finite() {
                    modulus
                } else {
                    1.0
                }
            }
            Weighting::Unit => 1.0,
        }
    }
}

/// Least-squares problem for one circuit model against one spectrum.
#[derive(Debug, Clone)]
pub struct ImpedanceProblem {
    model: CircuitModel,
    circuit: &'static Node,
    omegas: Vec<f64>,
    observed: Vec<Complex64>,
    weights: Vec<f64>,
}

impl ImpedanceProblem {
    /// Build the problem from a (possibly filtered) spectrum.
    pub fn new(model: CircuitModel, spectrum: &Spectrum, weighting: Weighting) -> Self {
        let observed = spectrum.impedances();
        let weights = observed.iter().map(|&z| weighting.weight(z)).collect();
        Self {
            model,
            circuit: model.circuit(),
            omegas: spectrum.iter().map(|o| o.angular_frequency()).collect(),
            observed,
            weights,
        }
    }

    /// The circuit model being fitted.
    pub fn model(&self) -> CircuitModel {
        self.model
    }

    /// Model impedance at every observed frequency.
    pub fn predicted(&self, params: &[f64]) -> Result<Vec<Complex64>> {
        self.model.check_parameters(params)?;
        Ok(self
            .omegas
            .iter()
            .map(|&omega| self.circuit.impedance(params, omega))
            .collect())
    }
}

impl Problem for ImpedanceProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let params = params
            .as_slice()
            .ok_or_else(|| EisError::InvalidInput("Parameters are not contiguous".to_string()))?;
        let predicted = self.predicted(params)?;

        let mut residuals = Array1::zeros(self.residual_count());
        for (i, ((z_model, z_obs), w)) in predicted
            .iter()
            .zip(self.observed.iter())
            .zip(self.weights.iter())
            .enumerate()
        {
            residuals[2 * i] = (z_model.re - z_obs.re) / w;
            residuals[2 * i + 1] = (z_model.im - z_obs.im) / w;
        }
        Ok(residuals)
    }

    fn parameter_count(&self) -> usize {
        self.model.parameter_count()
    }

    fn residual_count(&self) -> usize {
        2 * self.observed.len()
    }
}
