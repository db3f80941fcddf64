//! # Session State
//!
//! A [`Session`] is the host application's context object: the loaded
//! spectrum, the frequency filter, the selected model and its parameters, and
//! the most recent fit and model comparison. It is owned by the host and
//! passed by reference, so separate sessions never share state.

use crate::circuit::{predicted_curve, CircuitModel};
use crate::error::{EisError, Result};
use crate::fit::{fit_one, FitOptions, FitResult};
use crate::parameters::{clamp_to_domain, Adjustment};
use crate::selector::{autofit, ModelOutcome};
use crate::spectrum::{FrequencyFilter, Spectrum};
use num_complex::Complex64;

/// Analysis state for one dataset.
#[derive(Debug, Clone)]
pub struct Session {
    spectrum: Option<Spectrum>,
    filter: FrequencyFilter,
    model: CircuitModel,
    parameters: Option<Vec<f64>>,
    options: FitOptions,
    last_fit: Option<FitResult>,
    last_comparison: Option<Vec<ModelOutcome>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// An empty session with the Randles model selected.
    pub fn new() -> Self {
        Self::with_options(FitOptions::default())
    }

    /// An empty session using the given fit options.
    pub fn with_options(options: FitOptions) -> Self {
        Self {
            spectrum: None,
            filter: FrequencyFilter::unbounded(),
            model: CircuitModel::Randles,
            parameters: None,
            options,
            last_fit: None,
            last_comparison: None,
        }
    }

    /// Load a new dataset, discarding the previous one together with its
    /// parameters and fit results.
    pub fn load(&mut self, spectrum: Spectrum) {
        log::debug!("Session loaded {} observations", spectrum.len());
        self.spectrum = Some(spectrum);
        self.parameters = None;
        self.last_fit = None;
        self.last_comparison = None;
    }

    /// The loaded spectrum, unfiltered.
    pub fn spectrum(&self) -> Option<&Spectrum> {
        self.spectrum.as_ref()
    }

    /// Restrict subsequent fits to a frequency window.
    pub fn set_filter(&mut self, filter: FrequencyFilter) {
        self.filter = filter;
    }

    /// Remove the frequency window.
    pub fn clear_filter(&mut self) {
        self.filter = FrequencyFilter::unbounded();
    }

    /// The current frequency window.
    pub fn filter(&self) -> &FrequencyFilter {
        &self.filter
    }

    /// A filtered copy of the loaded spectrum.
    pub fn active_spectrum(&self) -> Result<Spectrum> {
        let spectrum = self
            .spectrum
            .as_ref()
            .ok_or_else(|| EisError::InvalidInput("no spectrum loaded".to_string()))?;
        Ok(spectrum.filter(&self.filter))
    }

    /// Select the model for manual fitting. Parameters of a different model are dropped.
    pub fn select_model(&mut self, model: CircuitModel) {
        if model != self.model {
            self.parameters = None;
        }
        self.model = model;
    }

    /// The selected model.
    pub fn model(&self) -> CircuitModel {
        self.model
    }

    /// Set manual parameters for the selected model.
    ///
    /// Values outside their domain are clamped; the returned adjustments say
    /// which ones.
    pub fn set_parameters(&mut self, values: &[f64]) -> Result<Vec<Adjustment>> {
        self.model.check_parameters(values)?;
        let (clamped, adjustments) = clamp_to_domain(self.model.parameter_specs(), values);
        self.parameters = Some(clamped);
        Ok(adjustments)
    }

    /// The manual parameters, if set.
    pub fn parameters(&self) -> Option<&[f64]> {
        self.parameters.as_deref()
    }

    /// The fit options.
    pub fn options(&self) -> &FitOptions {
        &self.options
    }

    /// Replace the fit options.
    pub fn set_options(&mut self, options: FitOptions) {
        self.options = options;
    }

    /// Fit the selected model to the active spectrum.
    ///
    /// Manual parameters, when set, are used as the starting point. The
    /// fitted values become the session's parameters.
    pub fn fit_active(&mut self) -> Result<&FitResult> {
        let spectrum = self.active_spectrum()?;
        let fit = fit_one(
            self.model,
            &spectrum,
            self.parameters.as_deref(),
            &self.options,
        )?;
        self.parameters = Some(fit.values());
        Ok(self.last_fit.insert(fit))
    }

    /// Auto-fit the candidates (all models when empty) to the active spectrum.
    ///
    /// The winner becomes the selected model and the last fit; the full ranked
    /// comparison stays available through [`Session::last_comparison`].
    pub fn autofit(&mut self, candidates: &[CircuitModel]) -> Result<&[ModelOutcome]> {
        let spectrum = self.active_spectrum()?;
        let outcomes = autofit(&spectrum, candidates, None, &self.options)?;

        if let Some(best) = outcomes.first().and_then(ModelOutcome::fit) {
            self.model = best.model;
            self.parameters = Some(best.values());
            self.last_fit = Some(best.clone());
        }
        Ok(self.last_comparison.insert(outcomes))
    }

    /// The most recent fit.
    pub fn last_fit(&self) -> Option<&FitResult> {
        self.last_fit.as_ref()
    }

    /// The most recent ranked model comparison.
    pub fn last_comparison(&self) -> Option<&[ModelOutcome]> {
        self.last_comparison.as_deref()
    }

    /// The selected model's curve at the given frequencies, using the session
    /// parameters (fitted or manual).
    pub fn predicted_curve(&self, frequencies_hz: &[f64]) -> Result<Vec<Complex64>> {
        let params = self.parameters.as_deref().ok_or_else(|| {
            EisError::InvalidInput(format!("no parameters set for {}", self.model))
        })?;
        predicted_curve(self.model, params, frequencies_hz)
    }

    /// Drop the dataset, parameters and results. Options are kept.
    pub fn reset(&mut self) {
        *self = Self::with_options(self.options.clone());
    }
}
