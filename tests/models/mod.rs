//! Tests for the impedance model library.

use approx::assert_relative_eq;
use eisfit_rs::circuit::{parallel, SENTINEL_IMPEDANCE};
use eisfit_rs::{impedance, predicted_curve, CircuitModel, EisError};
use num_complex::Complex64;
use std::f64::consts::PI;

const DC: f64 = 0.0;
const VERY_HIGH: f64 = 1e13;

#[test]
fn test_every_model_is_finite_at_the_frequency_extremes() {
    for model in CircuitModel::ALL {
        let params = model.default_parameters();
        for &omega in &[DC, 1e-12, 1.0, 1e6, VERY_HIGH] {
            let z = impedance(model, &params, omega).unwrap();
            assert!(
                z.re.is_finite() && z.im.is_finite(),
                "{} at ω = {}: {}",
                model,
                omega,
                z
            );
        }
    }
}

#[test]
fn test_resistor_model_is_frequency_invariant() {
    for &omega in &[DC, 1e-3, 1.0, 1e3, VERY_HIGH] {
        let z = impedance(CircuitModel::R, &[42.0], omega).unwrap();
        assert_eq!(z, Complex64::new(42.0, 0.0));
    }
}

#[test]
fn test_randles_asymptotes() {
    let params = [20.0, 100.0, 2e-5];

    let z = impedance(CircuitModel::Randles, &params, DC).unwrap();
    assert_relative_eq!(z.re, 120.0, max_relative = 1e-9);
    assert!(z.im.abs() < 1e-6);

    let z = impedance(CircuitModel::Randles, &params, VERY_HIGH).unwrap();
    assert_relative_eq!(z.re, 20.0, max_relative = 1e-9);
    assert!(z.im.abs() < 1e-6);
}

#[test]
fn test_randles_family_asymptotes() {
    // Series resistances add up at DC for every finite-resistance ladder
    let cases: [(CircuitModel, &[f64], f64); 4] = [
        (CircuitModel::Randles2RC, &[10.0, 50.0, 1e-6, 150.0, 1e-3], 210.0),
        (
            CircuitModel::Randles3RC,
            &[10.0, 30.0, 1e-7, 60.0, 1e-5, 120.0, 1e-3],
            220.0,
        ),
        (CircuitModel::RandlesCpe, &[15.0, 250.0, 5e-5, 0.85], 265.0),
        (
            CircuitModel::Randles2Cpe,
            &[10.0, 50.0, 1e-6, 0.9, 150.0, 1e-3, 0.8],
            210.0,
        ),
    ];

    for (model, params, dc_resistance) in cases {
        let low = impedance(model, params, 1e-12).unwrap();
        assert_relative_eq!(low.re, dc_resistance, max_relative = 1e-6);

        let high = impedance(model, params, VERY_HIGH).unwrap();
        assert_relative_eq!(high.re, params[0], max_relative = 1e-3);
    }
}

#[test]
fn test_diffusion_tail_diverges_at_low_frequency() {
    let params = [10.0, 80.0, 1e-5, 30.0];
    let low = impedance(CircuitModel::RandlesWarburg, &params, 1e-8).unwrap();
    let lower = impedance(CircuitModel::RandlesWarburg, &params, 1e-10).unwrap();

    assert!(lower.re > low.re);
    assert!(-lower.im > -low.im);

    let high = impedance(CircuitModel::RandlesWarburg, &params, VERY_HIGH).unwrap();
    assert_relative_eq!(high.re, 10.0, max_relative = 1e-6);
}

#[test]
fn test_series_capacitor_blocks_dc() {
    let z = impedance(CircuitModel::RCSeries, &[30.0, 1e-4], DC).unwrap();
    assert_eq!(z.im, -SENTINEL_IMPEDANCE);
    assert_eq!(z.re, 30.0);
}

#[test]
fn test_cpe_with_unit_exponent_matches_capacitor_model() {
    for &f in &[0.1, 10.0, 1e4] {
        let omega = 2.0 * PI * f;
        let cpe = impedance(CircuitModel::RandlesCpe, &[15.0, 250.0, 5e-5, 1.0], omega).unwrap();
        let cap = impedance(CircuitModel::Randles, &[15.0, 250.0, 5e-5], omega).unwrap();
        assert_relative_eq!(cpe.re, cap.re, max_relative = 1e-9);
        assert_relative_eq!(cpe.im, cap.im, max_relative = 1e-9);
    }
}

#[test]
fn test_parallel_guard() {
    // A CPE with α = 0 is a pure resistor 1/Q; against a negative resistor it cancels
    let z_cpe = eisfit_rs::circuit::cpe(0.5, 0.0, 10.0);
    let z = parallel(Complex64::new(-2.0, 0.0), z_cpe);
    assert!(z.re.is_finite() && z.im.is_finite());
    assert_eq!(z.re, SENTINEL_IMPEDANCE);
}

#[test]
fn test_predicted_curve_and_errors() {
    let freqs = [1e4, 1.0, 100.0];
    let curve = predicted_curve(CircuitModel::Randles, &[20.0, 100.0, 2e-5], &freqs).unwrap();
    assert_eq!(curve.len(), 3);
    assert!(curve[1].re > curve[2].re && curve[2].re > curve[0].re);

    assert!(matches!(
        predicted_curve(CircuitModel::Randles, &[20.0], &freqs),
        Err(EisError::DimensionMismatch(_))
    ));
    assert!(matches!(
        "Randles_5RC".parse::<CircuitModel>(),
        Err(EisError::UnknownModel(_))
    ));
}

#[test]
fn test_parameter_schemas() {
    assert_eq!(
        CircuitModel::Randles.parameter_names(),
        vec!["Rs", "Rct", "Cdl"]
    );
    assert_eq!(CircuitModel::RandlesCpeParallel.parameter_count(), 5);
    assert_eq!(CircuitModel::Randles3RC.parameter_count(), 7);

    let alpha = &CircuitModel::RandlesCpe.parameter_specs()[3];
    assert!(alpha.bounds.is_within_bounds(1.0));
    assert!(!alpha.bounds.is_within_bounds(0.0));

    for model in CircuitModel::ALL {
        assert_eq!(model.name().parse::<CircuitModel>().unwrap(), model);
        for spec in model.parameter_specs() {
            assert!(!spec.bounds.is_within_bounds(-1.0), "{} {}", model, spec.name);
        }
    }
}
