//! # Model Selection
//!
//! Auto-fit runs every candidate model against the same (optionally
//! frequency-filtered) spectrum and ranks the outcomes. Each fit is
//! independent and only reads the shared spectrum, so with the `parallel`
//! feature the candidates are fitted on the rayon thread pool.
//!
//! Ranking policy:
//! 1. converged fits with a defined chi-squared, by ascending chi-squared,
//!    ties broken by descending R²
//! 2. converged fits with undefined chi-squared, by descending R²
//! 3. non-converged fits, ordered the same way
//! 4. models that could not be fitted at all, in candidate order

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::circuit::CircuitModel;
use crate::error::{EisError, Result};
use crate::fit::{fit_one, FitOptions, FitResult};
use crate::spectrum::{FrequencyFilter, Spectrum};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A model that could not be fitted, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitFailure {
    pub model: CircuitModel,
    pub reason: String,
}

/// The result of one candidate in an auto-fit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelOutcome {
    /// A fit was produced (converged or best-effort)
    Fitted(FitResult),
    /// No fit could be attempted
    Failed(FitFailure),
}

impl ModelOutcome {
    /// The candidate model.
    pub fn model(&self) -> CircuitModel {
        match self {
            ModelOutcome::Fitted(fit) => fit.model,
            ModelOutcome::Failed(failure) => failure.model,
        }
    }

    /// The fit, if one was produced.
    pub fn fit(&self) -> Option<&FitResult> {
        match self {
            ModelOutcome::Fitted(fit) => Some(fit),
            ModelOutcome::Failed(_) => None,
        }
    }

    /// The failure reason, if the model could not be fitted.
    pub fn failure(&self) -> Option<&str> {
        match self {
            ModelOutcome::Fitted(_) => None,
            ModelOutcome::Failed(failure) => Some(&failure.reason),
        }
    }

    fn tier(&self) -> u8 {
        match self {
            ModelOutcome::Fitted(fit) => match (fit.converged, fit.chi_squared.is_some()) {
                (true, true) => 0,
                (true, false) => 1,
                (false, true) => 2,
                (false, false) => 3,
            },
            ModelOutcome::Failed(_) => 4,
        }
    }
}

/// Fit every candidate to `spectrum` and return the outcomes, best first.
///
/// An empty candidate list means the whole model library. The filter is
/// applied once to a copy of the spectrum; the caller's data are untouched.
///
/// # Errors
///
/// * `EisError::InsufficientData` if the filtered spectrum has fewer
///   observations than the smallest candidate has parameters, so that no
///   candidate can be fitted at all
pub fn autofit(
    spectrum: &Spectrum,
    candidates: &[CircuitModel],
    filter: Option<&FrequencyFilter>,
    options: &FitOptions,
) -> Result<Vec<ModelOutcome>> {
    let candidates: &[CircuitModel] = if candidates.is_empty() {
        &CircuitModel::ALL
    } else {
        candidates
    };

    let filtered;
    let spectrum = match filter {
        Some(filter) if filter.is_active() => {
            filtered = spectrum.filter(filter);
            &filtered
        }
        _ => spectrum,
    };

    let smallest = candidates
        .iter()
        .map(CircuitModel::parameter_count)
        .min()
        .unwrap_or(0);
    if spectrum.len() < smallest || spectrum.is_empty() {
        return Err(EisError::InsufficientData {
            observations: spectrum.len(),
            parameters: smallest,
        });
    }

    let mut outcomes = fit_candidates(spectrum, candidates, options);
    rank(&mut outcomes);

    match outcomes.first().and_then(ModelOutcome::fit) {
        Some(best) => log::info!(
            "Auto-fit winner: {} (chi² {:?}, R² {:.6})",
            best.model,
            best.chi_squared,
            best.r_squared
        ),
        None => log::warn!("Auto-fit produced no fit for any candidate"),
    }

    Ok(outcomes)
}

fn fit_candidate(model: CircuitModel, spectrum: &Spectrum, options: &FitOptions) -> ModelOutcome {
    match fit_one(model, spectrum, None, options) {
        Ok(fit) => ModelOutcome::Fitted(fit),
        Err(e) => {
            log::warn!("{} could not be fitted: {}", model, e);
            ModelOutcome::Failed(FitFailure {
                model,
                reason: e.to_string(),
            })
        }
    }
}

#[cfg(feature = "parallel")]
fn fit_candidates(
    spectrum: &Spectrum,
    candidates: &[CircuitModel],
    options: &FitOptions,
) -> Vec<ModelOutcome> {
    if options.parallel {
        candidates
            .par_iter()
            .map(|&model| fit_candidate(model, spectrum, options))
            .collect()
    } else {
        candidates
            .iter()
            .map(|&model| fit_candidate(model, spectrum, options))
            .collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn fit_candidates(
    spectrum: &Spectrum,
    candidates: &[CircuitModel],
    options: &FitOptions,
) -> Vec<ModelOutcome> {
    candidates
        .iter()
        .map(|&model| fit_candidate(model, spectrum, options))
        .collect()
}

/// Sort outcomes by the ranking policy. The sort is stable, so equal
/// outcomes and failed models keep their candidate order.
pub fn rank(outcomes: &mut [ModelOutcome]) {
    outcomes.sort_by(compare);
}

fn compare(a: &ModelOutcome, b: &ModelOutcome) -> Ordering {
    a.tier().cmp(&b.tier()).then_with(|| match (a, b) {
        (ModelOutcome::Fitted(x), ModelOutcome::Fitted(y)) => {
            let by_chi = match (x.chi_squared, y.chi_squared) {
                (Some(cx), Some(cy)) => cx.total_cmp(&cy),
                _ => Ordering::Equal,
            };
            by_chi.then_with(|| y.r_squared.total_cmp(&x.r_squared))
        }
        _ => Ordering::Equal,
    })
}
