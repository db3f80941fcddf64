//! Tests for JSON/CSV export and session workflows.

use crate::common::{example_spectrum, noisy, sweep};
use approx::assert_relative_eq;
use eisfit_rs::export::{
    comparison_to_json, from_json, to_json, write_parameters_csv, write_residuals_csv,
};
use eisfit_rs::{
    fit_one, CircuitModel, EisError, FitOptions, FitResult, FrequencyFilter, Session,
};

fn noisy_randles_fit() -> FitResult {
    let spectrum = noisy(CircuitModel::Randles, &[20.0, 100.0, 2e-5], &sweep(), 0.01, 1);
    fit_one(CircuitModel::Randles, &spectrum, None, &FitOptions::default()).unwrap()
}

#[test]
fn test_json_round_trip_of_a_real_fit() {
    let fit = noisy_randles_fit();
    let json = to_json(&fit).unwrap();
    assert!(json.contains("\"Randles\""));

    let restored = from_json(&json).unwrap();
    assert_eq!(restored.model, fit.model);
    assert_eq!(restored.converged, fit.converged);
    assert_eq!(restored.iterations, fit.iterations);
    assert_eq!(restored.notes, fit.notes);
    assert_eq!(restored.residuals.len(), fit.residuals.len());
    for (a, b) in restored.parameters.iter().zip(fit.parameters.iter()) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.unit, b.unit);
        assert_relative_eq!(a.value, b.value, max_relative = 1e-14);
        assert_relative_eq!(a.stderr.unwrap(), b.stderr.unwrap(), max_relative = 1e-14);
    }
    assert_relative_eq!(
        restored.chi_squared.unwrap(),
        fit.chi_squared.unwrap(),
        max_relative = 1e-14
    );

    // The restored result reproduces the model curve without refitting
    let curve = restored.predicted_curve(&[1.0, 100.0]).unwrap();
    let original = fit.predicted_curve(&[1.0, 100.0]).unwrap();
    assert_relative_eq!(curve[1].re, original[1].re, max_relative = 1e-12);
}

#[test]
fn test_from_json_rejects_garbage() {
    assert!(matches!(from_json("{ not json"), Err(EisError::JsonError(_))));
}

#[test]
fn test_parameters_csv() {
    let fit = noisy_randles_fit();
    let mut buffer = Vec::new();
    write_parameters_csv(&fit, &mut buffer).unwrap();

    let mut reader = csv::Reader::from_reader(buffer.as_slice());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["model", "name", "unit", "value", "stderr"]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][0], "Randles");
    assert_eq!(&rows[1][1], "Rct");
    let value: f64 = rows[1][3].parse().unwrap();
    assert_relative_eq!(value, fit.value("Rct").unwrap(), max_relative = 1e-14);
    let stderr: f64 = rows[1][4].parse().unwrap();
    assert!(stderr > 0.0);
}

#[test]
fn test_residuals_csv() {
    let fit = noisy_randles_fit();
    let mut buffer = Vec::new();
    write_residuals_csv(&fit, &mut buffer).unwrap();

    let mut reader = csv::Reader::from_reader(buffer.as_slice());
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), fit.residuals.len());

    let first = &rows[0];
    let frequency: f64 = first[0].parse().unwrap();
    let real_residual: f64 = first[1].parse().unwrap();
    assert_relative_eq!(frequency, fit.residuals[0].frequency_hz, max_relative = 1e-14);
    assert_relative_eq!(real_residual, fit.residuals[0].real, max_relative = 1e-12);
}

#[test]
fn test_comparison_json_lists_every_candidate() {
    let mut session = Session::new();
    session.load(noisy(CircuitModel::Randles, &[20.0, 100.0, 2e-5], &sweep(), 0.01, 2));
    let outcomes = session
        .autofit(&[CircuitModel::R, CircuitModel::Randles])
        .unwrap()
        .to_vec();

    let json = comparison_to_json(&outcomes).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);
}

#[test]
fn test_session_workflow() {
    let mut session = Session::new();
    assert!(matches!(session.fit_active(), Err(EisError::InvalidInput(_))));

    session.load(example_spectrum());
    assert_eq!(session.model(), CircuitModel::Randles);

    let fit = session.fit_active().unwrap().clone();
    assert!((fit.value("Rs").unwrap() - 50.0).abs() < 5.0);
    assert_eq!(session.parameters().unwrap(), fit.values().as_slice());
    assert_eq!(session.last_fit(), Some(&fit));

    let curve = session.predicted_curve(&[1000.0, 1.0]).unwrap();
    assert_eq!(curve.len(), 2);

    // Narrowing the window refits on fewer points only
    session.set_filter(FrequencyFilter::new(Some(5.0), None));
    assert_eq!(session.active_spectrum().unwrap().len(), 3);
    let refit = session.fit_active().unwrap();
    assert_eq!(refit.residuals.len(), 3);

    session.reset();
    assert!(session.spectrum().is_none());
    assert!(session.last_fit().is_none());
}

#[test]
fn test_session_autofit_selects_winner() {
    let mut session = Session::new();
    session.load(noisy(CircuitModel::RCParallel, &[200.0, 5e-6], &sweep(), 0.005, 4));

    let winner = session
        .autofit(&[CircuitModel::R, CircuitModel::RCSeries, CircuitModel::RCParallel])
        .unwrap()[0]
        .model();
    assert_eq!(winner, CircuitModel::RCParallel);
    assert_eq!(session.model(), CircuitModel::RCParallel);
    assert_eq!(session.last_fit().unwrap().model, CircuitModel::RCParallel);
    assert_eq!(session.last_comparison().unwrap().len(), 3);
}

#[test]
fn test_session_manual_parameters_are_clamped() {
    let mut session = Session::new();
    session.select_model(CircuitModel::RandlesCpe);

    let adjustments = session.set_parameters(&[10.0, 100.0, 1e-5, 1.4]).unwrap();
    assert_eq!(adjustments.len(), 1);
    assert_eq!(adjustments[0].parameter, "alpha");
    assert_eq!(session.parameters().unwrap()[3], 1.0);

    assert!(session.set_parameters(&[10.0]).is_err());
}
