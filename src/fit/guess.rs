//! Initial-guess heuristics.
//!
//! Starting values are read off the Nyquist shape of the data: the
//! high-frequency real intercept gives the series resistance, the width of the
//! arc gives the charge-transfer resistance and the frequency of the arc apex
//! (`ωRC = 1`) gives the capacitance. When those cues are missing the guesses
//! fall back to fixed defaults.

use crate::circuit::CircuitModel;
use crate::parameters::clamp_to_domain;
use crate::spectrum::{Observation, Spectrum};
use std::f64::consts::PI;

/// Number of local −Z″ maxima used as multi-start seeds.
const MAX_PEAK_CANDIDATES: usize = 3;

/// Fixed fallbacks used when the spectrum has no usable arc.
const FALLBACK_RS: f64 = 10.0;
const FALLBACK_RCT: f64 = 100.0;
const FALLBACK_PEAK_HZ: f64 = 10.0;
const FALLBACK_SIGMA: f64 = 10.0;
const FALLBACK_SERIES_C: f64 = 1e-5;
const INITIAL_ALPHA: f64 = 0.9;
const MIN_RESISTANCE: f64 = 1e-3;

/// Geometric cues extracted from a spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct DataCues {
    /// Real part at the highest frequency, floored at 1 mΩ
    pub high_frequency_real: f64,
    /// Lowest observed frequency in hertz
    pub low_frequency_hz: f64,
    /// Observation at the lowest frequency
    pub low_frequency: Observation,
    /// Real part at the lowest frequency minus the high-frequency intercept
    pub arc_width: f64,
    /// Mean real part over the whole spectrum
    pub mean_real: f64,
    /// Frequencies of −Z″ peaks, most prominent first
    pub peak_frequencies_hz: Vec<f64>,
}

impl DataCues {
    /// Extract cues from a spectrum. Returns `None` for an empty spectrum.
    pub fn from_spectrum(spectrum: &Spectrum) -> Option<Self> {
        let observations = spectrum.observations();
        let high = observations
            .iter()
            .max_by(|a, b| a.frequency_hz.total_cmp(&b.frequency_hz))?;
        let low = observations
            .iter()
            .min_by(|a, b| a.frequency_hz.total_cmp(&b.frequency_hz))?;

        let high_frequency_real = high.z_real.max(MIN_RESISTANCE);
        let mean_real =
            observations.iter().map(|o| o.z_real).sum::<f64>() / observations.len() as f64;

        Some(Self {
            high_frequency_real,
            low_frequency_hz: low.frequency_hz,
            low_frequency: *low,
            arc_width: low.z_real - high_frequency_real,
            mean_real,
            peak_frequencies_hz: peak_frequencies(observations),
        })
    }
}

/// Frequencies of the interior local maxima of −Z″ (scanning from high to low
/// frequency), most prominent first and at most [`MAX_PEAK_CANDIDATES`], plus
/// the global maximum if it is not among them. Only positive −Z″ counts.
fn peak_frequencies(observations: &[Observation]) -> Vec<f64> {
    if observations.len() < 3 {
        return Vec::new();
    }

    let mut sorted: Vec<&Observation> = observations.iter().collect();
    sorted.sort_by(|a, b| b.frequency_hz.total_cmp(&a.frequency_hz));
    let minus_imag: Vec<f64> = sorted.iter().map(|o| -o.z_imag).collect();

    let mut peaks: Vec<(f64, f64)> = (1..sorted.len() - 1)
        .filter(|&i| {
            minus_imag[i] > 0.0
                && minus_imag[i] > minus_imag[i - 1]
                && minus_imag[i] >= minus_imag[i + 1]
        })
        .map(|i| (minus_imag[i], sorted[i].frequency_hz))
        .collect();
    peaks.sort_by(|a, b| b.0.total_cmp(&a.0));
    peaks.truncate(MAX_PEAK_CANDIDATES);

    let mut frequencies: Vec<f64> = peaks.into_iter().map(|(_, f)| f).collect();

    let global = minus_imag
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .filter(|(_, y)| **y > 0.0)
        .map(|(i, _)| sorted[i].frequency_hz);
    if let Some(f) = global {
        if !frequencies.contains(&f) {
            frequencies.push(f);
        }
    }

    frequencies
}

/// Starting values for `model`, one vector per seed.
///
/// With `multi_start` every −Z″ peak seeds its own guess; otherwise only the
/// most prominent peak is used. At least one guess is always returned, and
/// every value lies inside its parameter domain.
pub fn initial_guesses(
    model: CircuitModel,
    spectrum: &Spectrum,
    multi_start: bool,
) -> Vec<Vec<f64>> {
    let Some(cues) = DataCues::from_spectrum(spectrum) else {
        return vec![model.default_parameters()];
    };

    let mut seeds: Vec<Option<f64>> = cues.peak_frequencies_hz.iter().copied().map(Some).collect();
    if seeds.is_empty() {
        seeds.push(None);
    }
    if !multi_start {
        seeds.truncate(1);
    }

    let mut guesses: Vec<Vec<f64>> = Vec::with_capacity(seeds.len());
    for peak_hz in seeds {
        let guess = guess_from_cues(model, &cues, peak_hz);
        if !guesses.contains(&guess) {
            guesses.push(guess);
        }
    }
    guesses
}

/// Starting values for `model` from the given cues and arc apex frequency.
pub fn guess_from_cues(model: CircuitModel, cues: &DataCues, peak_hz: Option<f64>) -> Vec<f64> {
    let usable = cues.arc_width > 0.0 && peak_hz.is_some();
    let peak_hz = peak_hz.filter(|_| usable).unwrap_or(FALLBACK_PEAK_HZ);

    let rs = if usable { cues.high_frequency_real } else { FALLBACK_RS };
    let rct = if usable { cues.arc_width } else { FALLBACK_RCT };
    let w_peak = 2.0 * PI * peak_hz;
    let w_low = 2.0 * PI * cues.low_frequency_hz;
    let cdl = 1.0 / (w_peak * rct);
    let low = cues.low_frequency;

    // Warburg coefficient from the low-frequency tail, Z'' = -σ/√ω
    let sigma = if usable {
        (-low.z_imag * w_low.sqrt()).max(MIN_RESISTANCE)
    } else {
        FALLBACK_SIGMA
    };
    let rct_diffusion = (rct - sigma / w_low.sqrt()).max(0.1 * rct);

    let alpha = INITIAL_ALPHA;
    let q = |r: f64| 1.0 / (r * w_peak.powf(alpha));

    let guess = match model {
        CircuitModel::R => vec![cues.mean_real.max(MIN_RESISTANCE)],
        CircuitModel::RCSeries => {
            let c = if low.z_imag < 0.0 {
                -1.0 / (w_low * low.z_imag)
            } else {
                FALLBACK_SERIES_C
            };
            vec![cues.high_frequency_real, c]
        }
        CircuitModel::RCParallel => {
            let r_total = low.z_real.max(MIN_RESISTANCE);
            vec![r_total, 1.0 / (w_peak * r_total)]
        }
        CircuitModel::Randles => vec![rs, rct, cdl],
        CircuitModel::RandlesWarburg => {
            vec![rs, rct_diffusion, 1.0 / (w_peak * rct_diffusion), sigma]
        }
        CircuitModel::Randles2RC => vec![rs, rct / 2.0, 2.0 * cdl, rct / 2.0, 20.0 * cdl],
        CircuitModel::Randles3RC => vec![
            rs,
            rct / 3.0,
            3.0 * cdl,
            rct / 3.0,
            30.0 * cdl,
            rct / 3.0,
            300.0 * cdl,
        ],
        CircuitModel::RandlesCpe => vec![rs, rct, q(rct), alpha],
        CircuitModel::Randles2Cpe => {
            let r = rct / 2.0;
            vec![rs, r, q(r), alpha, r, 10.0 * q(r), alpha]
        }
        CircuitModel::RandlesCpeParallel => {
            vec![rs, rct_diffusion, q(rct_diffusion), alpha, sigma]
        }
    };

    clamp_to_domain(model.parameter_specs(), &guess).0
}
