//! Synthetic spectra for integration tests.

use eisfit_rs::{CircuitModel, Observation, Spectrum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

/// Logarithmically spaced frequencies from `f_max` down to `f_min`.
pub fn log_frequencies(f_min: f64, f_max: f64, per_decade: usize) -> Vec<f64> {
    let decades = (f_max / f_min).log10();
    let n = (decades * per_decade as f64).round() as usize;
    (0..=n)
        .map(|i| f_max * 10f64.powf(-(i as f64) / per_decade as f64))
        .collect()
}

/// The default sweep used throughout: 0.01 Hz to 100 kHz, ten points per decade.
pub fn sweep() -> Vec<f64> {
    log_frequencies(0.01, 1e5, 10)
}

/// Noise-free spectrum generated from `model` with `params`.
pub fn synthetic(model: CircuitModel, params: &[f64], frequencies: &[f64]) -> Spectrum {
    let observations = frequencies
        .iter()
        .map(|&f| {
            let z = model.impedance(params, 2.0 * PI * f).unwrap();
            Observation::new(f, z.re, z.im)
        })
        .collect();
    Spectrum::new(observations).unwrap()
}

/// Spectrum with Gaussian noise of standard deviation `relative * |Z|` added
/// to both components.
pub fn noisy(
    model: CircuitModel,
    params: &[f64],
    frequencies: &[f64],
    relative: f64,
    seed: u64,
) -> Spectrum {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let observations = frequencies
        .iter()
        .map(|&f| {
            let z = model.impedance(params, 2.0 * PI * f).unwrap();
            let sigma = relative * z.norm();
            Observation::new(
                f,
                z.re + sigma * normal.sample(&mut rng),
                z.im + sigma * normal.sample(&mut rng),
            )
        })
        .collect();
    Spectrum::new(observations).unwrap()
}

/// Largest relative deviation between two parameter vectors.
pub fn max_relative_error(found: &[f64], expected: &[f64]) -> f64 {
    found
        .iter()
        .zip(expected.iter())
        .map(|(a, b)| ((a - b) / b).abs())
        .fold(0.0, f64::max)
}

/// The four-point spectrum of the end-to-end example.
pub fn example_spectrum() -> Spectrum {
    Spectrum::new(vec![
        Observation::new(1000.0, 50.0, 0.0),
        Observation::new(100.0, 55.0, -20.0),
        Observation::new(10.0, 60.0, -40.0),
        Observation::new(1.0, 65.0, -15.0),
    ])
    .unwrap()
}
