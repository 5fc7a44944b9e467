//! End-to-end classifier tests on the local simulator.
//!
//! The circuit encodes two features as Y rotations and adds one trainable Y
//! rotation per qubit. Labels live on qubit 1 (`"00"` vs `"01"`), so the
//! decision only depends on `x1 + p1` and the best separator sits at
//! `p1 = π/2` for clusters around `x1 = ±1`.

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use ndarray::Array2;
use polyq_adapter_sim::SimulatorBackend;
use polyq_ir::CircuitSpec;
use polyq_ml::{
    CircuitML, Classifier, ClassifierConfig, Features, FitOptions, Method, MlError, MlResult,
    ParameterVector,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn two_qubit_encoder(
    qc: &CircuitML,
    x: Option<&Features<'_>>,
    p: &ParameterVector,
    shots: Option<u32>,
) -> MlResult<CircuitSpec> {
    let batch = x.map_or(1, |x| x.nrows());
    let mut bdr = qc.circuit_builder(batch)?;
    if let Some(x) = x {
        bdr.allin_y(x.select(&[0, 1])?.view())?;
    }
    bdr.allin_y(p.select(&[0, 1])?.view())?;
    if shots.is_some() {
        bdr.measure_all()?;
    }
    Ok(bdr.circuit()?)
}

fn engine() -> CircuitML {
    CircuitML::new(two_qubit_encoder, 2, 2, None)
        .unwrap()
        .with_nbfeatures(2)
}

/// Two well separated clusters around (-1, -1) and (1, 1).
fn clusters(per_class: usize, seed: u64) -> (Array2<f64>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut x = Array2::zeros((2 * per_class, 2));
    let mut y = Vec::with_capacity(2 * per_class);
    for i in 0..2 * per_class {
        let label = i % 2;
        let center = if label == 0 { -1.0 } else { 1.0 };
        x[[i, 0]] = center + rng.gen_range(-0.3..0.3);
        x[[i, 1]] = center + rng.gen_range(-0.3..0.3);
        y.push(label);
    }
    (x, y)
}

fn classifier(config: ClassifierConfig) -> Classifier {
    Classifier::new(engine(), &["00", "01"], config).unwrap()
}

fn trained() -> (Classifier, Array2<f64>, Vec<usize>) {
    let (x, y) = clusters(20, 1);
    let mut clf = classifier(ClassifierConfig::default());
    clf.fit_with(
        x.view(),
        &y,
        FitOptions::default()
            .with_method(Method::NelderMead)
            .with_initial_params(ParameterVector::zeros(2)),
    )
    .unwrap();
    (clf, x, y)
}

#[test]
fn test_two_clusters_reach_high_accuracy() {
    let (x, y) = clusters(20, 1);
    let mut clf = classifier(ClassifierConfig::default());

    let report = clf
        .fit_with(
            x.view(),
            &y,
            FitOptions::default()
                .with_method(Method::NelderMead)
                .with_initial_params(ParameterVector::zeros(2)),
        )
        .unwrap();

    assert!(report.num_evaluations <= 100);
    assert!(clf.is_fitted());
    assert_eq!(clf.loss_progress().len(), report.num_evaluations);
    assert!(report.final_loss < clf.loss_progress()[0]);

    let accuracy = clf.score(x.view(), &y).unwrap();
    assert!(accuracy >= 0.95, "accuracy {accuracy} below 0.95");

    // Fresh samples from the same clusters
    let (x_test, y_test) = clusters(10, 99);
    assert!(clf.score(x_test.view(), &y_test).unwrap() >= 0.95);
}

#[test]
fn test_exact_predictions_are_idempotent() {
    let (clf, x, _) = trained();

    let first = clf.predict_proba(x.view()).unwrap();
    let second = clf.predict_proba(x.view()).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        clf.predict_label(x.view()).unwrap(),
        clf.predict_label(x.view()).unwrap()
    );

    for row in first.rows() {
        assert!((row.sum() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_sampled_predictions_match_exact_away_from_boundary() {
    let (x, y) = clusters(20, 3);
    let mut clf = classifier(ClassifierConfig::default());
    clf.set_params(ParameterVector::new(vec![0.0, FRAC_PI_2]))
        .unwrap();
    let exact = clf.predict_label(x.view()).unwrap();
    assert_eq!(exact, y);

    let seeded: Arc<dyn polyq_hal::Backend> = Arc::new(SimulatorBackend::new().with_seed(7));
    clf.set_circuit(engine().with_backend(seeded)).unwrap();
    clf.set_nbshots(Some(2000)).unwrap();

    assert_eq!(clf.predict_label(x.view()).unwrap(), exact);
}

#[test]
fn test_sampled_labels_are_stable_across_runs() {
    let (x, _) = clusters(20, 5);
    let mut clf = classifier(ClassifierConfig::default());
    clf.set_params(ParameterVector::new(vec![0.0, FRAC_PI_2]))
        .unwrap();
    let exact = clf.predict_label(x.view()).unwrap();

    // Unseeded: every run draws fresh samples
    let sampler: Arc<dyn polyq_hal::Backend> = Arc::new(SimulatorBackend::new());
    clf.set_circuit(engine().with_backend(sampler)).unwrap();
    clf.set_nbshots(Some(4000)).unwrap();

    for run in 0..10 {
        let sampled = clf.predict_label(x.view()).unwrap();
        assert_eq!(sampled, exact, "run {run} disagrees with exact labels");
    }
}

#[test]
fn test_swap_to_sampling_backend_after_training() {
    let (mut clf, x, _) = trained();
    let params = clf.params().cloned().unwrap();

    let sampler: Arc<dyn polyq_hal::Backend> =
        Arc::new(SimulatorBackend::new().with_seed(11).with_name("sampler"));
    clf.set_circuit(clf.circuit().clone().with_backend(sampler))
        .unwrap();
    clf.set_nbshots(Some(300)).unwrap();

    let labels = clf.predict_label(x.view()).unwrap();
    assert_eq!(labels.len(), x.nrows());
    assert!(labels.iter().all(|&label| label < 2));
    assert_eq!(clf.circuit().backend().name(), "sampler");
    assert_eq!(clf.params(), Some(&params));

    // Rows of a sampled prediction are still distributions
    let probs = clf.predict_proba(x.view()).unwrap();
    for row in probs.rows() {
        assert!((row.sum() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_wrong_parameter_count_is_a_dimension_error() {
    let qc = engine();
    for len in [0, 1, 3, 8] {
        let err = qc
            .run(&ParameterVector::zeros(len), None, None)
            .unwrap_err();
        assert!(matches!(err, MlError::Dimension(_)), "len {len}: {err}");
    }

    let mut clf = classifier(ClassifierConfig::default());
    let (x, y) = clusters(2, 0);
    let err = clf
        .fit_with(
            x.view(),
            &y,
            FitOptions::default().with_initial_params(ParameterVector::zeros(5)),
        )
        .unwrap_err();
    assert!(matches!(err, MlError::Dimension(_)));
    assert!(!clf.is_fitted());
}

#[test]
fn test_predict_requires_training() {
    let clf = classifier(ClassifierConfig::default());
    let (x, _) = clusters(2, 0);
    assert!(matches!(
        clf.predict_label(x.view()),
        Err(MlError::NotFitted)
    ));
    assert!(matches!(clf.to_model(), Err(MlError::NotFitted)));
}

#[test]
fn test_minibatch_and_spsa_training() {
    let (x, y) = clusters(20, 5);
    let config = ClassifierConfig::default()
        .with_method(Method::Spsa)
        .with_batch_size(Some(8))
        .with_budget(60);
    let mut clf = classifier(config);

    let report = clf
        .fit_with(
            x.view(),
            &y,
            FitOptions::default().with_initial_params(ParameterVector::new(vec![0.0, 1.2])),
        )
        .unwrap();

    assert_eq!(report.method, Method::Spsa);
    assert!(report.num_evaluations <= 60);
    assert_eq!(clf.params().map(|p| p.len()), Some(2));
}

#[test]
fn test_bfgs_training() {
    let (x, y) = clusters(10, 8);
    let mut clf = classifier(ClassifierConfig::default());
    let report = clf
        .fit_with(
            x.view(),
            &y,
            FitOptions::default()
                .with_method(Method::Bfgs)
                .with_initial_params(ParameterVector::new(vec![0.0, 1.0])),
        )
        .unwrap();

    assert!(report.num_evaluations <= 100);
    assert!(clf.score(x.view(), &y).unwrap() >= 0.95);
}

#[test]
fn test_save_and_load_round_trip() {
    let (clf, x, _) = trained();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");

    clf.save(&path).unwrap();
    let restored = Classifier::load(&path, engine(), ClassifierConfig::default()).unwrap();

    assert_eq!(restored.params(), clf.params());
    assert_eq!(restored.labels().to_strings(), vec!["00", "01"]);
    assert_eq!(
        restored.predict_proba(x.view()).unwrap(),
        clf.predict_proba(x.view()).unwrap()
    );
}

#[test]
fn test_load_rejects_mismatched_engine() {
    let (clf, _, _) = trained();
    let model = clf.to_model().unwrap();

    let three_qubits = CircuitML::new(two_qubit_encoder, 3, 2, None).unwrap();
    let err = Classifier::from_model(model, three_qubits, ClassifierConfig::default()).unwrap_err();
    assert!(matches!(err, MlError::Dimension(_)));
}
