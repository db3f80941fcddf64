//! Tests for the optimizer and the fit evaluator.

use crate::common::{
    example_spectrum, log_frequencies, max_relative_error, noisy, sweep, synthetic,
};
use approx::assert_relative_eq;
use eisfit_rs::lm::{LevenbergMarquardt, Minimizer};
use eisfit_rs::{
    evaluate, fit_one, fit_with, CircuitModel, EisError, FitOptions, InputFormat, Observation,
    PhaseUnit, Spectrum, Weighting,
};

fn assert_round_trip(model: CircuitModel, params: &[f64]) {
    let spectrum = synthetic(model, params, &sweep());
    let result = fit_one(model, &spectrum, None, &FitOptions::default()).unwrap();

    assert!(result.converged, "{} did not converge: {}", model, result);
    let error = max_relative_error(&result.values(), params);
    assert!(error < 1e-4, "{}: relative error {:.3e}\n{}", model, error, result);
}

#[test]
fn test_round_trip_simple_models() {
    assert_round_trip(CircuitModel::R, &[42.0]);
    assert_round_trip(CircuitModel::RCSeries, &[30.0, 1e-4]);
    assert_round_trip(CircuitModel::RCParallel, &[200.0, 5e-6]);
}

#[test]
fn test_round_trip_randles() {
    assert_round_trip(CircuitModel::Randles, &[20.0, 100.0, 2e-5]);
}

#[test]
fn test_round_trip_randles_warburg() {
    assert_round_trip(CircuitModel::RandlesWarburg, &[10.0, 80.0, 1e-5, 30.0]);
}

#[test]
fn test_round_trip_randles_cpe() {
    assert_round_trip(CircuitModel::RandlesCpe, &[15.0, 250.0, 5e-5, 0.85]);
}

#[test]
fn test_round_trip_randles_cpe_parallel() {
    assert_round_trip(
        CircuitModel::RandlesCpeParallel,
        &[10.0, 80.0, 2e-5, 0.85, 30.0],
    );
}

#[test]
fn test_round_trip_two_time_constants() {
    assert_round_trip(CircuitModel::Randles2RC, &[10.0, 50.0, 1e-6, 150.0, 1e-3]);
}

#[test]
fn test_round_trip_three_time_constants() {
    assert_round_trip(
        CircuitModel::Randles3RC,
        &[10.0, 30.0, 1e-7, 60.0, 1e-5, 120.0, 1e-3],
    );
}

#[test]
fn test_round_trip_two_cpe_arcs() {
    assert_round_trip(
        CircuitModel::Randles2Cpe,
        &[10.0, 50.0, 1e-6, 0.9, 150.0, 1e-3, 0.8],
    );
}

#[test]
fn test_fit_is_idempotent() {
    let spectrum = noisy(CircuitModel::Randles, &[20.0, 100.0, 2e-5], &sweep(), 0.01, 3);
    let guess = [15.0, 80.0, 1e-5];
    let options = FitOptions::default();

    let first = fit_one(CircuitModel::Randles, &spectrum, Some(&guess), &options).unwrap();
    let second = fit_one(CircuitModel::Randles, &spectrum, Some(&guess), &options).unwrap();

    for (a, b) in first.values().iter().zip(second.values().iter()) {
        assert_relative_eq!(*a, *b, max_relative = 1e-12);
    }
    assert_eq!(first.iterations, second.iterations);
}

#[test]
fn test_noise_robustness() {
    let cases: [(CircuitModel, &[f64]); 2] = [
        (CircuitModel::Randles, &[20.0, 100.0, 2e-5]),
        (CircuitModel::RandlesCpe, &[15.0, 250.0, 5e-5, 0.85]),
    ];

    for seed in 0..5 {
        for (model, params) in cases {
            let spectrum = noisy(model, params, &sweep(), 0.01, seed);
            let result = fit_one(model, &spectrum, None, &FitOptions::default()).unwrap();

            assert!(result.converged, "{} seed {}", model, seed);
            assert!(result.r_squared > 0.99, "{} R² = {}", model, result.r_squared);
            let error = max_relative_error(&result.values(), params);
            assert!(error < 0.05, "{} seed {}: relative error {:.3}", model, seed, error);
            assert!(result.errors_available());
        }
    }
}

#[test]
fn test_standard_errors_cover_noisy_estimates() {
    let params = [20.0, 100.0, 2e-5];
    let spectrum = noisy(CircuitModel::Randles, &params, &sweep(), 0.01, 11);
    let result = fit_one(CircuitModel::Randles, &spectrum, None, &FitOptions::default()).unwrap();

    for (p, truth) in result.parameters.iter().zip(params.iter()) {
        let stderr = p.stderr.unwrap();
        assert!(stderr > 0.0);
        // Loose coverage check: within ten standard errors
        assert!(
            (p.value - truth).abs() < 10.0 * stderr,
            "{} = {} ± {}",
            p.name,
            p.value,
            stderr
        );
    }

    let correlation = result.correlation.unwrap();
    assert_eq!(correlation.len(), 3);
    assert_relative_eq!(correlation[1][1], 1.0, epsilon = 1e-12);
    assert!(correlation[0][2].abs() <= 1.0 + 1e-12);
}

#[test]
fn test_insufficient_data() {
    let spectrum = Spectrum::new(vec![
        Observation::new(100.0, 55.0, -20.0),
        Observation::new(10.0, 60.0, -40.0),
    ])
    .unwrap();

    let result = fit_one(
        CircuitModel::RandlesWarburg,
        &spectrum,
        None,
        &FitOptions::default(),
    );
    assert!(matches!(
        result,
        Err(EisError::InsufficientData {
            observations: 2,
            parameters: 4
        })
    ));
}

#[test]
fn test_end_to_end_example() {
    let result = fit_one(
        CircuitModel::Randles,
        &example_spectrum(),
        None,
        &FitOptions::default(),
    )
    .unwrap();

    assert!(result.converged, "{}", result);
    assert!((result.value("Rs").unwrap() - 50.0).abs() < 5.0);
    let chi2 = result.chi_squared.unwrap();
    assert!(chi2.is_finite());
    assert!(result.r_squared >= 0.0 && result.r_squared <= 1.0);

    let frequencies: Vec<f64> = result.residuals.iter().map(|r| r.frequency_hz).collect();
    assert_eq!(frequencies, vec![1000.0, 100.0, 10.0, 1.0]);
}

#[test]
fn test_unit_weighting_round_trip() {
    let params = [200.0, 5e-6];
    let spectrum = synthetic(CircuitModel::RCParallel, &params, &log_frequencies(1.0, 1e4, 8));
    let options = FitOptions {
        weighting: Weighting::Unit,
        ..Default::default()
    };

    let result = fit_one(CircuitModel::RCParallel, &spectrum, None, &options).unwrap();
    assert!(max_relative_error(&result.values(), &params) < 1e-4);
    assert_eq!(result.weighting, Weighting::Unit);
}

#[test]
fn test_custom_minimizer() {
    let params = [20.0, 100.0, 2e-5];
    let spectrum = synthetic(CircuitModel::Randles, &params, &sweep());
    let minimizer = LevenbergMarquardt::new().with_max_iterations(500);

    let result = fit_with(
        &minimizer as &dyn Minimizer,
        CircuitModel::Randles,
        &spectrum,
        None,
        &FitOptions::default(),
    )
    .unwrap();
    assert!(max_relative_error(&result.values(), &params) < 1e-4);
}

#[test]
fn test_evaluate_reports_undefined_chi_squared() {
    let spectrum = Spectrum::new(vec![
        Observation::new(100.0, 55.0, -20.0),
        Observation::new(10.0, 60.0, -40.0),
    ])
    .unwrap();

    // 4 residuals, 4 parameters
    let evaluation = evaluate(
        CircuitModel::RandlesCpe,
        &[50.0, 15.0, 1e-3, 0.9],
        &spectrum,
        &FitOptions::default(),
    )
    .unwrap();

    assert_eq!(evaluation.degrees_of_freedom, 0);
    assert!(evaluation.chi_squared.is_none());
    assert!(evaluation.parameter_errors.is_none());
}

#[test]
fn test_polar_input_in_degrees() {
    let params = [20.0, 100.0, 2e-5];
    let rectangular = synthetic(CircuitModel::Randles, &params, &sweep());

    let frequencies = rectangular.frequencies();
    let moduli: Vec<f64> = rectangular.iter().map(Observation::modulus).collect();
    let phases: Vec<f64> = rectangular
        .iter()
        .map(|o| o.impedance().arg().to_degrees())
        .collect();
    let polar = Spectrum::from_columns(
        &frequencies,
        &moduli,
        &phases,
        InputFormat::Polar(PhaseUnit::Degrees),
    )
    .unwrap();

    for (a, b) in polar.iter().zip(rectangular.iter()) {
        assert_relative_eq!(a.z_real, b.z_real, max_relative = 1e-9);
        assert_relative_eq!(a.z_imag, b.z_imag, max_relative = 1e-9, epsilon = 1e-9);
    }

    let result = fit_one(CircuitModel::Randles, &polar, None, &FitOptions::default()).unwrap();
    assert!(max_relative_error(&result.values(), &params) < 1e-4);
}
