//! Export of fit results.
//!
//! JSON carries the complete [`FitResult`] and can be read back without
//! re-running the optimizer. The CSV writers produce the parameter table and
//! the residual table for spreadsheet use.

use crate::error::Result;
use crate::fit::FitResult;
use crate::selector::ModelOutcome;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ParameterRow<'a> {
    model: &'a str,
    name: &'a str,
    unit: &'a str,
    value: f64,
    stderr: Option<f64>,
}

#[derive(Serialize)]
struct ResidualRow {
    frequency_hz: f64,
    real_residual: f64,
    imag_residual: f64,
    predicted_real: f64,
    predicted_imag: f64,
}

/// Serialize a fit result to pretty-printed JSON.
pub fn to_json(fit: &FitResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(fit)?)
}

/// Reconstruct a fit result from JSON written by [`to_json`].
pub fn from_json(json: &str) -> Result<FitResult> {
    Ok(serde_json::from_str(json)?)
}

/// Serialize a ranked auto-fit comparison to pretty-printed JSON.
pub fn comparison_to_json(outcomes: &[ModelOutcome]) -> Result<String> {
    Ok(serde_json::to_string_pretty(outcomes)?)
}

/// Write one row per parameter: model, name, unit, value and standard error.
///
/// An unavailable standard error is written as an empty field.
pub fn write_parameters_csv<W: Write>(fit: &FitResult, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for p in &fit.parameters {
        csv.serialize(ParameterRow {
            model: fit.model.name(),
            name: &p.name,
            unit: &p.unit,
            value: p.value,
            stderr: p.stderr,
        })?;
    }
    csv.flush()?;
    Ok(())
}

/// Write one row per observation: frequency, residuals and fitted impedance.
pub fn write_residuals_csv<W: Write>(fit: &FitResult, writer: W) -> Result<()> {
    let frequencies: Vec<f64> = fit.residuals.iter().map(|r| r.frequency_hz).collect();
    let predicted = fit.predicted_curve(&frequencies)?;

    let mut csv = csv::Writer::from_writer(writer);
    for (residual, z) in fit.residuals.iter().zip(predicted.iter()) {
        csv.serialize(ResidualRow {
            frequency_hz: residual.frequency_hz,
            real_residual: residual.real,
            imag_residual: residual.imag,
            predicted_real: z.re,
            predicted_imag: z.im,
        })?;
    }
    csv.flush()?;
    Ok(())
}
