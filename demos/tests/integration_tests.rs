//! Integration tests for the demo suite.
//!
//! These run the demo circuits and datasets end to end on the local
//! simulator with fixed seeds.

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use polyq_adapter_sim::SimulatorBackend;
use polyq_demos::ansatz::{IRIS_BITSTRINGS, IRIS_PARAMS, XOR_BITSTRINGS, iris_circuit, xor_circuit};
use polyq_demos::datasets::{iris_like, split_every, xor};
use polyq_demos::create_backend;
use polyq_demos::report::{accuracy, confusion_matrix};
use polyq_hal::Backend;
use polyq_ml::{Classifier, ClassifierConfig, FitOptions, ParameterVector};

/// The XOR circuit separates the clusters with a known parameter setting.
#[test]
fn test_xor_known_solution() {
    let (x, y) = xor(10, 0.3, 3);
    let mut clf = Classifier::new(
        xor_circuit(None).unwrap(),
        &XOR_BITSTRINGS,
        ClassifierConfig::default(),
    )
    .unwrap();
    clf.set_params(ParameterVector::new(vec![FRAC_PI_2, 0.0, 0.0, 0.0]))
        .unwrap();

    assert_eq!(clf.score(x.view(), &y).unwrap(), 1.0);
}

/// Training from a nearby start recovers the XOR parity.
#[test]
fn test_xor_training() {
    let (x, y) = xor(8, 0.3, 5);
    let mut clf = Classifier::new(
        xor_circuit(None).unwrap(),
        &XOR_BITSTRINGS,
        ClassifierConfig::default().with_budget(150),
    )
    .unwrap();

    clf.fit_with(
        x.view(),
        &y,
        FitOptions::default().with_initial_params(ParameterVector::new(vec![1.2, 0.2, 0.0, 0.0])),
    )
    .unwrap();

    assert!(clf.score(x.view(), &y).unwrap() >= 0.9);
}

/// The iris workflow: exact training, then a 300-shot backend.
#[test]
fn test_iris_train_then_sample() {
    let (x, y) = iris_like(6, 0.3, 11);
    let ((train_x, train_y), (test_x, test_y)) = split_every(&x, &y, 3);

    let mut clf = Classifier::new(
        iris_circuit(None).unwrap(),
        &IRIS_BITSTRINGS,
        ClassifierConfig::default().with_budget(40),
    )
    .unwrap();
    let report = clf
        .fit_with(train_x.view(), &train_y, FitOptions::default())
        .unwrap();
    assert!(report.num_evaluations <= 40);

    let exact = clf.predict_label(test_x.view()).unwrap();
    let matrix = confusion_matrix(&exact, &test_y, 3);
    assert_eq!(matrix.sum(), test_x.nrows());

    let sampler: Arc<dyn Backend> = Arc::new(SimulatorBackend::new().with_seed(1));
    clf.set_circuit(iris_circuit(Some(sampler)).unwrap()).unwrap();
    clf.set_nbshots(Some(300)).unwrap();

    let sampled = clf.predict_label(test_x.view()).unwrap();
    assert_eq!(sampled.len(), test_x.nrows());
    assert!(sampled.iter().all(|&label| label < 3));
    assert_eq!(clf.params().map(|p| p.len()), Some(IRIS_PARAMS));

    let acc = accuracy(&sampled, &test_y);
    assert!((0.0..=1.0).contains(&acc));
}

/// A saved iris model reloads onto a fresh engine.
#[test]
fn test_iris_model_round_trip() {
    let (x, _) = iris_like(3, 0.3, 2);
    let mut clf = Classifier::new(
        iris_circuit(None).unwrap(),
        &IRIS_BITSTRINGS,
        ClassifierConfig::default(),
    )
    .unwrap();
    clf.set_params(ParameterVector::new((0..IRIS_PARAMS).map(|i| 0.3 * i as f64).collect()))
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iris.json");
    clf.save(&path).unwrap();

    let restored =
        Classifier::load(&path, iris_circuit(None).unwrap(), ClassifierConfig::default()).unwrap();
    assert_eq!(
        restored.predict_label(x.view()).unwrap(),
        clf.predict_label(x.view()).unwrap()
    );
}

/// Backends are picked by registered name.
#[test]
fn test_backend_selection_by_name() {
    let backend = create_backend("sim", 3).unwrap();
    assert_eq!(backend.name(), "sim");
    assert!(backend.capabilities().supports_exact);

    assert!(create_backend("qpu", 3).is_err());
}
