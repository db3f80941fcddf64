//! Goodness-of-fit statistics and parameter uncertainties.

use super::problem::ImpedanceProblem;
use super::{FitOptions, Residual};
use crate::circuit::CircuitModel;
use crate::error::Result;
use crate::problem::Problem;
use crate::spectrum::Spectrum;
use crate::uncertainty::{
    calculate_correlation, calculate_covariance, standard_errors_from_covariance,
};
use crate::utils::finite_difference;
use ndarray::{Array1, Array2};

/// Statistics of one parameter vector against one spectrum.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Sum of squared weighted residuals
    pub cost: f64,

    /// `2N − p`; may be zero or negative
    pub degrees_of_freedom: i64,

    /// `cost / dof`, `None` when `dof ≤ 0`
    pub chi_squared: Option<f64>,

    /// Coefficient of determination over stacked real and imaginary parts
    pub r_squared: f64,

    /// Observed minus predicted impedance per frequency, in ohms
    pub residuals: Vec<Residual>,

    /// Standard errors in parameter order, `None` when not available
    pub parameter_errors: Option<Vec<f64>>,

    /// Parameter correlation matrix, `None` when errors are not available
    pub correlation: Option<Array2<f64>>,
}

/// Evaluate `parameters` of `model` against `spectrum`.
///
/// The weighting and rank tolerance are taken from `options`. Errors are only
/// returned for malformed input (a parameter vector of the wrong length);
/// numerical trouble surfaces as unavailable parameter errors.
pub fn evaluate(
    model: CircuitModel,
    parameters: &[f64],
    spectrum: &Spectrum,
    options: &FitOptions,
) -> Result<Evaluation> {
    let problem = ImpedanceProblem::new(model, spectrum, options.weighting);
    let params = Array1::from(parameters.to_vec());

    let weighted = problem.eval(&params)?;
    let cost = weighted.dot(&weighted);
    let degrees_of_freedom = problem.residual_count() as i64 - parameters.len() as i64;
    let chi_squared = (degrees_of_freedom > 0).then(|| cost / degrees_of_freedom as f64);

    let predicted = problem.predicted(parameters)?;
    let residuals: Vec<Residual> = spectrum
        .iter()
        .zip(predicted.iter())
        .map(|(obs, z)| Residual {
            frequency_hz: obs.frequency_hz,
            real: obs.z_real - z.re,
            imag: obs.z_imag - z.im,
        })
        .collect();

    let r_squared = r_squared(spectrum, &residuals);

    let mut parameter_errors = None;
    let mut correlation = None;
    if let Some(redchi) = chi_squared.filter(|c| c.is_finite()) {
        let jacobian = finite_difference::jacobian_central(&problem, &params, None)?;
        match calculate_covariance(&jacobian, &params, redchi, options.rank_tolerance)? {
            Some(covar) => {
                parameter_errors = standard_errors_from_covariance(&covar).map(|e| e.to_vec());
                if parameter_errors.is_some() {
                    correlation = Some(calculate_correlation(&covar));
                }
            }
            None => log::warn!(
                "{}: Jacobian is rank deficient, parameter errors are not available",
                model
            ),
        }
    }

    Ok(Evaluation {
        cost,
        degrees_of_freedom,
        chi_squared,
        r_squared,
        residuals,
        parameter_errors,
        correlation,
    })
}

/// `1 − SS_res/SS_tot` over `[Z′_1, Z″_1, Z′_2, Z″_2, …]` with a single mean.
fn r_squared(spectrum: &Spectrum, residuals: &[Residual]) -> f64 {
    let stacked: Vec<f64> = spectrum
        .iter()
        .flat_map(|o| [o.z_real, o.z_imag])
        .collect();
    if stacked.is_empty() {
        return 1.0;
    }

    let mean = stacked.iter().sum::<f64>() / stacked.len() as f64;
    let ss_tot: f64 = stacked.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = residuals
        .iter()
        .map(|r| r.real.powi(2) + r.imag.powi(2))
        .sum();

    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    }
}
