//! Tests for auto-fit and ranking.

use crate::common::{log_frequencies, noisy, sweep, synthetic};
use eisfit_rs::{autofit, CircuitModel, EisError, FitOptions, FrequencyFilter, ModelOutcome};

fn winner(outcomes: &[ModelOutcome]) -> CircuitModel {
    outcomes[0].model()
}

fn position(outcomes: &[ModelOutcome], model: CircuitModel) -> usize {
    outcomes.iter().position(|o| o.model() == model).unwrap()
}

#[test]
fn test_autofit_ranks_generating_model_ahead_of_resistor() {
    let spectrum = synthetic(CircuitModel::Randles, &[20.0, 100.0, 2e-5], &sweep());
    let outcomes = autofit(&spectrum, &[], None, &FitOptions::default()).unwrap();

    assert_eq!(outcomes.len(), CircuitModel::ALL.len());
    for model in CircuitModel::ALL {
        assert!(outcomes.iter().any(|o| o.model() == model));
    }

    // The generating model or one of the models that contain it
    let best = outcomes[0].fit().unwrap();
    assert!(best.converged);
    assert!(best.chi_squared.unwrap() < 1e-10, "{}", best);
    assert!(position(&outcomes, CircuitModel::Randles) < position(&outcomes, CircuitModel::R));

    let resistor = outcomes[position(&outcomes, CircuitModel::R)].fit().unwrap();
    assert!(resistor.r_squared < best.r_squared);
}

#[test]
fn test_autofit_chi_squared_is_ascending_among_converged() {
    let spectrum = noisy(
        CircuitModel::RandlesCpe,
        &[15.0, 250.0, 5e-5, 0.85],
        &sweep(),
        0.01,
        7,
    );
    let outcomes = autofit(&spectrum, &[], None, &FitOptions::default()).unwrap();

    let converged: Vec<f64> = outcomes
        .iter()
        .filter_map(ModelOutcome::fit)
        .take_while(|fit| fit.converged && fit.chi_squared.is_some())
        .filter_map(|fit| fit.chi_squared)
        .collect();
    assert!(!converged.is_empty());
    assert!(converged.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_autofit_with_candidate_subset() {
    let spectrum = synthetic(CircuitModel::RCParallel, &[200.0, 5e-6], &sweep());
    let candidates = [CircuitModel::R, CircuitModel::RCSeries, CircuitModel::RCParallel];
    let outcomes = autofit(&spectrum, &candidates, None, &FitOptions::default()).unwrap();

    assert_eq!(outcomes.len(), 3);
    assert_eq!(winner(&outcomes), CircuitModel::RCParallel);
}

#[test]
fn test_autofit_marks_models_larger_than_the_data() {
    let spectrum = synthetic(
        CircuitModel::Randles,
        &[20.0, 100.0, 2e-5],
        &[1000.0, 100.0, 10.0],
    );
    let outcomes = autofit(&spectrum, &[], None, &FitOptions::default()).unwrap();

    let failed: Vec<CircuitModel> = outcomes
        .iter()
        .filter(|o| o.failure().is_some())
        .map(ModelOutcome::model)
        .collect();
    assert_eq!(
        failed,
        vec![
            CircuitModel::RandlesWarburg,
            CircuitModel::Randles2RC,
            CircuitModel::Randles3RC,
            CircuitModel::RandlesCpe,
            CircuitModel::Randles2Cpe,
            CircuitModel::RandlesCpeParallel,
        ]
    );

    // Failed models sit at the bottom
    let first_failure = outcomes.iter().position(|o| o.failure().is_some()).unwrap();
    assert!(outcomes[first_failure..].iter().all(|o| o.fit().is_none()));
    assert_eq!(first_failure, 4);
}

#[test]
fn test_autofit_applies_frequency_filter() {
    let spectrum = synthetic(CircuitModel::Randles, &[20.0, 100.0, 2e-5], &sweep());
    let filter = FrequencyFilter::new(Some(0.99), Some(1010.0));
    let outcomes = autofit(
        &spectrum,
        &[CircuitModel::Randles],
        Some(&filter),
        &FitOptions::default(),
    )
    .unwrap();

    let fit = outcomes[0].fit().unwrap();
    assert_eq!(fit.residuals.len(), 31);
    assert!(fit
        .residuals
        .iter()
        .all(|r| r.frequency_hz >= 0.99 && r.frequency_hz <= 1010.0));

    // The caller's spectrum is untouched
    assert_eq!(spectrum.len(), 71);
}

#[test]
fn test_autofit_filter_leaving_no_data_is_an_error() {
    let spectrum = synthetic(
        CircuitModel::Randles,
        &[20.0, 100.0, 2e-5],
        &log_frequencies(1.0, 1e3, 5),
    );
    let filter = FrequencyFilter::new(Some(1e6), None);

    let result = autofit(&spectrum, &[], Some(&filter), &FitOptions::default());
    assert!(matches!(
        result,
        Err(EisError::InsufficientData {
            observations: 0,
            ..
        })
    ));
}

#[test]
fn test_sequential_and_parallel_autofit_agree() {
    let spectrum = noisy(CircuitModel::Randles, &[20.0, 100.0, 2e-5], &sweep(), 0.01, 5);
    let sequential = FitOptions {
        parallel: false,
        ..Default::default()
    };

    let a = autofit(&spectrum, &[], None, &FitOptions::default()).unwrap();
    let b = autofit(&spectrum, &[], None, &sequential).unwrap();

    let order_a: Vec<CircuitModel> = a.iter().map(ModelOutcome::model).collect();
    let order_b: Vec<CircuitModel> = b.iter().map(ModelOutcome::model).collect();
    assert_eq!(order_a, order_b);
    assert_eq!(a, b);
}
