//! Impedance spectra and their observations.
//!
//! A [`Spectrum`] is the ordered sequence of `(frequency, Z', Z'')` observations
//! handed over by the data-import layer. Order is preserved for plotting, but
//! it is irrelevant to fitting. Frequency filtering always produces a new
//! spectrum and never mutates the original dataset.

use crate::error::{EisError, Result};
use log::warn;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A single impedance measurement in rectangular form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Excitation frequency in hertz, strictly positive and finite
    pub frequency_hz: f64,

    /// Real part of the impedance Z' in ohms
    pub z_real: f64,

    /// Imaginary part of the impedance Z'' in ohms
    pub z_imag: f64,
}

impl Observation {
    /// Create an observation from rectangular components.
    pub fn new(frequency_hz: f64, z_real: f64, z_imag: f64) -> Self {
        Self {
            frequency_hz,
            z_real,
            z_imag,
        }
    }

    /// Create an observation from modulus and phase (in radians).
    ///
    /// `z_real = |Z| cos(θ)` and `z_imag = |Z| sin(θ)`.
    pub fn from_polar(frequency_hz: f64, modulus: f64, phase_rad: f64) -> Self {
        Self {
            frequency_hz,
            z_real: modulus * phase_rad.cos(),
            z_imag: modulus * phase_rad.sin(),
        }
    }

    /// The observed impedance as a complex number.
    pub fn impedance(&self) -> Complex64 {
        Complex64::new(self.z_real, self.z_imag)
    }

    /// Angular frequency ω = 2πf in rad/s.
    pub fn angular_frequency(&self) -> f64 {
        2.0 * PI * self.frequency_hz
    }

    /// Impedance modulus |Z|.
    pub fn modulus(&self) -> f64 {
        self.z_real.hypot(self.z_imag)
    }
}

/// Unit of the phase column in polar input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseUnit {
    Radians,
    Degrees,
}

/// Layout of the impedance columns supplied by the import layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputFormat {
    /// Columns are Z' and Z''
    Rectangular,

    /// Columns are |Z| and phase
    Polar(PhaseUnit),
}

/// Data-quality findings that are reported but never cause rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataWarning {
    /// The same frequency occurs more than once.
    DuplicateFrequency { frequency_hz: f64, count: usize },

    /// Frequencies are neither ascending nor descending.
    NonMonotonicOrder,
}

impl std::fmt::Display for DataWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataWarning::DuplicateFrequency {
                frequency_hz,
                count,
            } => write!(f, "frequency {} Hz occurs {} times", frequency_hz, count),
            DataWarning::NonMonotonicOrder => {
                write!(f, "frequencies are not ordered monotonically")
            }
        }
    }
}

/// Frequency window applied before fitting. `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyFilter {
    /// Lowest frequency kept (inclusive)
    pub min_hz: Option<f64>,

    /// Highest frequency kept (inclusive)
    pub max_hz: Option<f64>,
}

impl FrequencyFilter {
    /// Create a filter with optional lower and upper limits.
    pub fn new(min_hz: Option<f64>, max_hz: Option<f64>) -> Self {
        Self { min_hz, max_hz }
    }

    /// A filter that keeps every observation.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Returns true if the filter removes anything at all.
    pub fn is_active(&self) -> bool {
        self.min_hz.is_some() || self.max_hz.is_some()
    }

    /// Returns true if `frequency_hz` lies inside the window.
    pub fn contains(&self, frequency_hz: f64) -> bool {
        self.min_hz.map_or(true, |min| frequency_hz >= min)
            && self.max_hz.map_or(true, |max| frequency_hz <= max)
    }
}

/// An ordered impedance spectrum.
///
/// Deserialization goes through [`Spectrum::new`], so a spectrum read from JSON
/// is validated like any other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSpectrum")]
pub struct Spectrum {
    observations: Vec<Observation>,
}

impl Spectrum {
    /// Create a spectrum, validating every observation.
    ///
    /// Frequencies must be strictly positive and finite and impedance components
    /// finite. Duplicate frequencies are accepted and logged as a warning.
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        for (i, obs) in observations.iter().enumerate() {
            if !obs.frequency_hz.is_finite() || obs.frequency_hz <= 0.0 {
                return Err(EisError::InvalidInput(format!(
                    "observation {} has invalid frequency {}",
                    i, obs.frequency_hz
                )));
            }
            if !obs.z_real.is_finite() || !obs.z_imag.is_finite() {
                return Err(EisError::InvalidInput(format!(
                    "observation {} at {} Hz has a non-finite impedance",
                    i, obs.frequency_hz
                )));
            }
        }

        let spectrum = Self { observations };
        for warning in spectrum.warnings() {
            warn!("spectrum data quality: {}", warning);
        }
        Ok(spectrum)
    }

    /// Build a spectrum from column data in either rectangular or polar form.
    ///
    /// Polar input is converted to rectangular before it enters the fitting core.
    pub fn from_columns(
        frequency_hz: &[f64],
        first: &[f64],
        second: &[f64],
        format: InputFormat,
    ) -> Result<Self> {
        if frequency_hz.len() != first.len() || frequency_hz.len() != second.len() {
            return Err(EisError::DimensionMismatch(format!(
                "column lengths differ: {} frequencies, {} and {} impedance values",
                frequency_hz.len(),
                first.len(),
                second.len()
            )));
        }

        let observations = frequency_hz
            .iter()
            .zip(first.iter().zip(second.iter()))
            .map(|(&f, (&a, &b))| match format {
                InputFormat::Rectangular => Observation::new(f, a, b),
                InputFormat::Polar(PhaseUnit::Radians) => Observation::from_polar(f, a, b),
                InputFormat::Polar(PhaseUnit::Degrees) => {
                    Observation::from_polar(f, a, b.to_radians())
                }
            })
            .collect();

        Self::new(observations)
    }

    /// All observations in their original order.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Iterate over the observations.
    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Returns true if the spectrum holds no observations.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Frequencies in hertz, in spectrum order.
    pub fn frequencies(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.frequency_hz).collect()
    }

    /// Observed impedances, in spectrum order.
    pub fn impedances(&self) -> Vec<Complex64> {
        self.observations.iter().map(Observation::impedance).collect()
    }

    /// Return a filtered copy. The original spectrum is left untouched.
    pub fn filter(&self, filter: &FrequencyFilter) -> Spectrum {
        Spectrum {
            observations: self
                .observations
                .iter()
                .filter(|o| filter.contains(o.frequency_hz))
                .copied()
                .collect(),
        }
    }

    /// Collect data-quality warnings without rejecting anything.
    pub fn warnings(&self) -> Vec<DataWarning> {
        let mut warnings = Vec::new();

        let mut sorted = self.frequencies();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mut i = 0;
        while i < sorted.len() {
            let mut j = i + 1;
            while j < sorted.len() && sorted[j] == sorted[i] {
                j += 1;
            }
            if j - i > 1 {
                warnings.push(DataWarning::DuplicateFrequency {
                    frequency_hz: sorted[i],
                    count: j - i,
                });
            }
            i = j;
        }

        let freqs = self.frequencies();
        let ascending = freqs.windows(2).all(|w| w[0] <= w[1]);
        let descending = freqs.windows(2).all(|w| w[0] >= w[1]);
        if !ascending && !descending {
            warnings.push(DataWarning::NonMonotonicOrder);
        }

        warnings
    }
}

#[derive(Deserialize)]
struct RawSpectrum {
    observations: Vec<Observation>,
}

impl TryFrom<RawSpectrum> for Spectrum {
    type Error = EisError;

    fn try_from(raw: RawSpectrum) -> Result<Self> {
        Spectrum::new(raw.observations)
    }
}

impl<'a> IntoIterator for &'a Spectrum {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}
