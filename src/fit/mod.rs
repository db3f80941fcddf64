//! # Circuit Fitting
//!
//! Fits one circuit model to one spectrum: initial-guess generation, bounded
//! Levenberg-Marquardt minimization over the combined real/imaginary residual
//! vector, and the goodness-of-fit statistics of the solution.
//!
//! ```no_run
//! use eisfit_rs::{fit_one, CircuitModel, FitOptions, Observation, Spectrum};
//!
//! let spectrum = Spectrum::new(vec![
//!     Observation::new(1000.0, 50.0, 0.0),
//!     Observation::new(100.0, 55.0, -20.0),
//!     Observation::new(10.0, 60.0, -40.0),
//!     Observation::new(1.0, 65.0, -15.0),
//! ])?;
//!
//! let result = fit_one(CircuitModel::Randles, &spectrum, None, &FitOptions::default())?;
//! println!("Rs = {:?}, chi² = {:?}", result.value("Rs"), result.chi_squared);
//! # Ok::<(), eisfit_rs::EisError>(())
//! ```

pub mod evaluate;
pub mod guess;
pub mod problem;

pub use evaluate::{evaluate, Evaluation};
pub use guess::{guess_from_cues, initial_guesses, DataCues};
pub use problem::{ImpedanceProblem, Weighting};

use crate::circuit::{predicted_curve, CircuitModel};
use crate::error::{EisError, Result};
use crate::lm::{LevenbergMarquardt, LmConfig, LmResult, Minimizer};
use crate::parameters::clamp_to_domain;
use crate::spectrum::Spectrum;
use ndarray::Array1;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Options controlling a fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Residual weighting. Default: `Modulus`
    pub weighting: Weighting,

    /// Hard iteration budget per optimizer run. Default: 200
    pub max_iterations: usize,

    /// Relative cost tolerance. Default: 1e-10
    pub ftol: f64,

    /// Relative parameter tolerance. Default: 1e-10
    pub xtol: f64,

    /// Start from every −Z″ peak and keep the best solution. Default: true
    pub multi_start: bool,

    /// Singular value ratio below which parameter errors are not available. Default: 1e-12
    pub rank_tolerance: f64,

    /// Fit auto-fit candidates on the rayon thread pool. Default: true
    pub parallel: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        let lm = LmConfig::default();
        Self {
            weighting: Weighting::default(),
            max_iterations: lm.max_iterations,
            ftol: lm.ftol,
            xtol: lm.xtol,
            multi_start: true,
            rank_tolerance: lm.rank_tolerance,
            parallel: true,
        }
    }
}

impl FitOptions {
    /// Optimizer configuration for these options.
    pub fn lm_config(&self) -> LmConfig {
        LmConfig {
            max_iterations: self.max_iterations,
            ftol: self.ftol,
            xtol: self.xtol,
            rank_tolerance: self.rank_tolerance,
            ..Default::default()
        }
    }
}

/// A fitted parameter with its standard error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedParameter {
    pub name: String,
    pub unit: String,
    pub value: f64,
    /// `None` when the error is not available
    pub stderr: Option<f64>,
}

/// Observed minus predicted impedance at one frequency, in ohms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Residual {
    pub frequency_hz: f64,
    pub real: f64,
    pub imag: f64,
}

/// The outcome of fitting one model to one spectrum.
///
/// Non-convergence is not an error: the best iterate is returned with
/// `converged == false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub model: CircuitModel,
    /// Fitted parameters in schema order
    pub parameters: Vec<FittedParameter>,
    /// Reduced chi-squared, `None` when there are no degrees of freedom
    pub chi_squared: Option<f64>,
    pub r_squared: f64,
    /// Residuals in spectrum order
    pub residuals: Vec<Residual>,
    pub converged: bool,
    pub iterations: usize,
    /// Sum of squared weighted residuals
    pub cost: f64,
    pub degrees_of_freedom: i64,
    pub weighting: Weighting,
    /// Parameter correlation matrix (row-major), when errors are available
    pub correlation: Option<Vec<Vec<f64>>>,
    /// Adjustments and warnings recorded during the fit
    pub notes: Vec<String>,
    /// Optimizer termination message
    pub message: String,
}

impl FitResult {
    /// Fitted values in schema order.
    pub fn values(&self) -> Vec<f64> {
        self.parameters.iter().map(|p| p.value).collect()
    }

    /// Value of the named parameter.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.parameter(name).map(|p| p.value)
    }

    /// Standard error of the named parameter, if available.
    pub fn error(&self, name: &str) -> Option<f64> {
        self.parameter(name).and_then(|p| p.stderr)
    }

    /// Whether standard errors could be computed.
    pub fn errors_available(&self) -> bool {
        self.parameters.iter().all(|p| p.stderr.is_some())
    }

    /// The named parameter.
    pub fn parameter(&self, name: &str) -> Option<&FittedParameter> {
        self.model
            .parameter_index(name)
            .and_then(|i| self.parameters.get(i))
    }

    /// The fitted curve at the given frequencies, for Nyquist and Bode overlays.
    pub fn predicted_curve(&self, frequencies_hz: &[f64]) -> Result<Vec<Complex64>> {
        predicted_curve(self.model, &self.values(), frequencies_hz)
    }
}

impl fmt::Display for FitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.model, self.model.description())?;
        for p in &self.parameters {
            match p.stderr {
                Some(err) => writeln!(
                    f,
                    "  {} = {:.6e} ± {:.3e} {}",
                    p.name, p.value, err, p.unit
                )?,
                None => writeln!(f, "  {} = {:.6e} {}", p.name, p.value, p.unit)?,
            }
        }
        match self.chi_squared {
            Some(chi2) => writeln!(f, "  chi² = {:.6e}", chi2)?,
            None => writeln!(f, "  chi² = undefined")?,
        }
        writeln!(f, "  R² = {:.6}", self.r_squared)?;
        write!(
            f,
            "  converged = {} after {} iterations",
            self.converged, self.iterations
        )
    }
}

/// Fit `model` to `spectrum` with the default Levenberg-Marquardt optimizer.
///
/// Without `initial_guess` the starting values are derived from the data.
/// A supplied guess outside the parameter domains is clamped and the
/// adjustment is recorded in [`FitResult::notes`].
///
/// # Errors
///
/// * `EisError::InsufficientData` if the spectrum has fewer observations than
///   the model has parameters
/// * `EisError::DimensionMismatch` if the guess has the wrong length
pub fn fit_one(
    model: CircuitModel,
    spectrum: &Spectrum,
    initial_guess: Option<&[f64]>,
    options: &FitOptions,
) -> Result<FitResult> {
    let optimizer = LevenbergMarquardt::with_config(options.lm_config());
    fit_with(&optimizer, model, spectrum, initial_guess, options)
}

/// Fit `model` to `spectrum` with any [`Minimizer`].
pub fn fit_with(
    minimizer: &dyn Minimizer,
    model: CircuitModel,
    spectrum: &Spectrum,
    initial_guess: Option<&[f64]>,
    options: &FitOptions,
) -> Result<FitResult> {
    let n_params = model.parameter_count();
    if spectrum.len() < n_params {
        return Err(EisError::InsufficientData {
            observations: spectrum.len(),
            parameters: n_params,
        });
    }

    let mut notes = Vec::new();
    let starts = match initial_guess {
        Some(guess) => {
            model.check_parameters(guess)?;
            let (values, adjustments) = clamp_to_domain(model.parameter_specs(), guess);
            for adjustment in adjustments {
                log::warn!("{}: {}", model, adjustment);
                notes.push(adjustment.to_string());
            }
            vec![values]
        }
        None => initial_guesses(model, spectrum, options.multi_start),
    };

    let problem = ImpedanceProblem::new(model, spectrum, options.weighting);
    let bounds = model.default_bounds();

    let mut best: Option<LmResult> = None;
    for start in starts {
        let solution = minimizer.minimize(&problem, &Array1::from(start), &bounds)?;
        let improves = match &best {
            Some(current) => solution.cost < current.cost || !current.cost.is_finite(),
            None => true,
        };
        if improves {
            best = Some(solution);
        }
    }
    let best = best.ok_or_else(|| EisError::InvalidInput("no starting point".to_string()))?;

    log::debug!(
        "{}: {} after {} iterations, cost {:.6e}",
        model,
        best.message,
        best.iterations,
        best.cost
    );
    if !best.success {
        log::warn!("{} did not converge: {}", model, best.message);
        notes.push(format!("did not converge: {}", best.message));
    }

    let params = best.params.to_vec();
    let evaluation = evaluate(model, &params, spectrum, options)?;
    if evaluation.parameter_errors.is_none() {
        notes.push("parameter errors not available".to_string());
    }

    let parameters = model
        .parameter_specs()
        .iter()
        .enumerate()
        .map(|(i, spec)| FittedParameter {
            name: spec.name.to_string(),
            unit: spec.unit.to_string(),
            value: params[i],
            stderr: evaluation.parameter_errors.as_ref().map(|e| e[i]),
        })
        .collect();

    Ok(FitResult {
        model,
        parameters,
        chi_squared: evaluation.chi_squared,
        r_squared: evaluation.r_squared,
        residuals: evaluation.residuals,
        converged: best.success,
        iterations: best.iterations,
        cost: evaluation.cost,
        degrees_of_freedom: evaluation.degrees_of_freedom,
        weighting: options.weighting,
        correlation: evaluation
            .correlation
            .map(|c| c.outer_iter().map(|row| row.to_vec()).collect()),
        notes,
        message: best.message,
    })
}
