//! Variational classifier: training loop and label decoding.

use std::path::Path;

use ndarray::{Array2, ArrayView2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::circuitml::CircuitML;
use crate::config::ClassifierConfig;
use crate::data::{Features, ParameterVector};
use crate::error::{MlError, MlResult};
use crate::labels::{LabelMap, argmax};
use crate::metrics::{accuracy, cross_entropy};
use crate::optimizer::{CancelToken, Method};

/// Per-call overrides for [`Classifier::fit_with`].
#[derive(Debug, Clone, Default)]
pub struct FitOptions {
    /// Optimization method; defaults to the configured one.
    pub method: Option<Method>,
    /// Starting point; defaults to the current parameters, else seeded random.
    pub initial_params: Option<ParameterVector>,
    /// Evaluation budget; defaults to the configured one.
    pub budget: Option<usize>,
    /// Mini-batch size; defaults to the configured one.
    pub batch_size: Option<usize>,
    /// Cancellation flag checked between evaluations.
    pub cancel: Option<CancelToken>,
}

impl FitOptions {
    /// Set the method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the starting point.
    pub fn with_initial_params(mut self, params: ParameterVector) -> Self {
        self.initial_params = Some(params);
        self
    }

    /// Set the evaluation budget.
    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Set the mini-batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Summary of a successful fit.
#[derive(Debug, Clone)]
pub struct FitReport {
    /// Method used.
    pub method: Method,
    /// Loss evaluations performed.
    pub num_evaluations: usize,
    /// Optimizer iterations.
    pub num_iterations: usize,
    /// Loss at the retained parameters.
    pub final_loss: f64,
    /// Whether the optimizer stopped on its own criterion.
    pub converged: bool,
}

/// Serializable snapshot of a trained classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Number of qubits of the circuit the parameters were trained for.
    pub nbqbits: u32,
    /// Trained parameters.
    pub params: ParameterVector,
    /// Label bitstrings, in label order.
    pub bitstrings: Vec<String>,
    /// Shots used at inference.
    pub nbshots: Option<u32>,
}

/// Quantum circuit classifier.
///
/// Untrained until [`Classifier::fit`] succeeds or parameters are set
/// explicitly. A failed or cancelled fit leaves the previous state intact.
#[derive(Debug)]
pub struct Classifier {
    circuit: CircuitML,
    labels: LabelMap,
    config: ClassifierConfig,
    params: Option<ParameterVector>,
    loss_progress: Vec<f64>,
}

impl Classifier {
    /// Create an untrained classifier.
    ///
    /// `bitstrings[i]` is the measured outcome read as label `i`.
    pub fn new<S: AsRef<str>>(
        circuit: CircuitML,
        bitstrings: &[S],
        config: ClassifierConfig,
    ) -> MlResult<Self> {
        config.validate()?;
        let labels = LabelMap::new(bitstrings, circuit.nbqbits())?;
        Ok(Self {
            circuit,
            labels,
            config,
            params: None,
            loss_progress: Vec::new(),
        })
    }

    /// Train with `method` and the configured budget.
    pub fn fit(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        method: Method,
    ) -> MlResult<FitReport> {
        self.fit_with(x, y, FitOptions::default().with_method(method))
    }

    /// Train with explicit options.
    #[instrument(skip_all, fields(rows = x.nrows(), labels = self.labels.len()))]
    pub fn fit_with(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        options: FitOptions,
    ) -> MlResult<FitReport> {
        self.check_training_set(x, y)?;

        let method = options.method.unwrap_or(self.config.method);
        let budget = options.budget.unwrap_or(self.config.budget);
        if budget == 0 {
            return Err(MlError::InvalidConfig("budget must be at least 1".into()));
        }
        let batch_size = options.batch_size.or(self.config.batch_size);
        if batch_size == Some(0) {
            return Err(MlError::InvalidConfig("batch_size must be positive".into()));
        }

        let initial = match options.initial_params.or_else(|| self.params.clone()) {
            Some(params) => params,
            None => self.circuit.random_params(self.config.seed),
        };
        if initial.len() != self.circuit.nbparams() {
            return Err(MlError::Dimension(format!(
                "expected {} initial parameters, got {}",
                self.circuit.nbparams(),
                initial.len()
            )));
        }

        info!(
            "Fitting with {} (budget {}, shots {:?}, batch {:?})",
            method, budget, self.config.nbshots, batch_size
        );

        let circuit = &self.circuit;
        let labels = &self.labels;
        let schedule = &self.config.shot_schedule;
        let base_shots = self.config.nbshots;
        let mut batch_rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(1));
        let mut evaluation = 0usize;

        let objective = |params: &ParameterVector| -> MlResult<f64> {
            let shots = schedule.shots_at(base_shots, evaluation);
            let loss = match batch_size {
                Some(size) if size < x.nrows() => {
                    let rows = index::sample(&mut batch_rng, x.nrows(), size).into_vec();
                    let batch_x = x.select(Axis(0), &rows);
                    let batch_y: Vec<usize> = rows.iter().map(|&i| y[i]).collect();
                    batch_loss(circuit, labels, params, batch_x.view(), &batch_y, shots)?
                }
                _ => batch_loss(circuit, labels, params, x, y, shots)?,
            };
            debug!(evaluation, ?shots, loss, "evaluation");
            evaluation += 1;
            Ok(loss)
        };

        let result = method.minimize(
            objective,
            initial,
            budget,
            self.config.seed,
            options.cancel.as_ref(),
        )?;

        if !result.converged {
            warn!(
                "{} stopped after {} evaluations without converging",
                method, result.num_evaluations
            );
        }
        info!(
            "Fit finished: loss {:.6} after {} evaluations",
            result.optimal_value, result.num_evaluations
        );

        self.params = Some(result.optimal_params);
        self.loss_progress = result.history;

        Ok(FitReport {
            method,
            num_evaluations: result.num_evaluations,
            num_iterations: result.num_iterations,
            final_loss: result.optimal_value,
            converged: result.converged,
        })
    }

    /// Label probabilities: one row per sample, one column per label.
    ///
    /// An empty batch yields an empty `0 × labels` matrix without contacting
    /// the backend.
    pub fn predict_proba(&self, x: ArrayView2<'_, f64>) -> MlResult<Array2<f64>> {
        let params = self.params.as_ref().ok_or(MlError::NotFitted)?;
        if x.nrows() == 0 {
            return Ok(Array2::zeros((0, self.labels.len())));
        }
        let dists = self
            .circuit
            .run(params, Some(&Features::new(x)), self.config.nbshots)?;
        Ok(self.labels.reduce_batch(&dists))
    }

    /// Most likely label of every sample; ties go to the lowest label.
    ///
    /// An empty batch yields an empty vector.
    pub fn predict_label(&self, x: ArrayView2<'_, f64>) -> MlResult<Vec<usize>> {
        let probs = self.predict_proba(x)?;
        Ok(decode_labels(probs.view()))
    }

    /// Training-style accuracy of the current model on `(x, y)`.
    pub fn score(&self, x: ArrayView2<'_, f64>, y: &[usize]) -> MlResult<f64> {
        if x.nrows() != y.len() {
            return Err(MlError::Dimension(format!(
                "{} samples but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        Ok(accuracy(&self.predict_label(x)?, y))
    }

    /// Replace the execution engine, keeping parameters and labels.
    ///
    /// The new engine must have the same qubit and parameter counts.
    pub fn set_circuit(&mut self, circuit: CircuitML) -> MlResult<()> {
        if circuit.nbqbits() != self.circuit.nbqbits() || circuit.nbparams() != self.circuit.nbparams() {
            return Err(MlError::Dimension(format!(
                "new circuit has {} qubits / {} params, classifier expects {} / {}",
                circuit.nbqbits(),
                circuit.nbparams(),
                self.circuit.nbqbits(),
                self.circuit.nbparams()
            )));
        }
        debug!("Classifier: circuit now runs on {}", circuit.backend().name());
        self.circuit = circuit;
        Ok(())
    }

    /// Change the shot count used by fit and predict.
    pub fn set_nbshots(&mut self, nbshots: Option<u32>) -> MlResult<()> {
        let config = self.config.clone().with_nbshots(nbshots);
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Shot count used by fit and predict.
    pub fn nbshots(&self) -> Option<u32> {
        self.config.nbshots
    }

    /// Current parameters, if trained.
    pub fn params(&self) -> Option<&ParameterVector> {
        self.params.as_ref()
    }

    /// Install parameters directly, making the classifier trained.
    pub fn set_params(&mut self, params: ParameterVector) -> MlResult<()> {
        if params.len() != self.circuit.nbparams() {
            return Err(MlError::Dimension(format!(
                "expected {} parameters, got {}",
                self.circuit.nbparams(),
                params.len()
            )));
        }
        self.params = Some(params);
        Ok(())
    }

    /// Whether parameters are present.
    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    /// Loss of every evaluation of the last successful fit.
    pub fn loss_progress(&self) -> &[f64] {
        &self.loss_progress
    }

    /// The label map.
    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// The execution engine.
    pub fn circuit(&self) -> &CircuitML {
        &self.circuit
    }

    /// The configuration.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Snapshot of the trained state.
    pub fn to_model(&self) -> MlResult<TrainedModel> {
        Ok(TrainedModel {
            nbqbits: self.circuit.nbqbits(),
            params: self.params.clone().ok_or(MlError::NotFitted)?,
            bitstrings: self.labels.to_strings(),
            nbshots: self.config.nbshots,
        })
    }

    /// Write the trained state as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> MlResult<()> {
        let json = serde_json::to_string_pretty(&self.to_model()?)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Rebuild a trained classifier from a saved model and an engine.
    pub fn load<P: AsRef<Path>>(
        path: P,
        circuit: CircuitML,
        config: ClassifierConfig,
    ) -> MlResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let model: TrainedModel = serde_json::from_str(&contents)?;
        Self::from_model(model, circuit, config)
    }

    /// Rebuild a trained classifier from a snapshot and an engine.
    pub fn from_model(
        model: TrainedModel,
        circuit: CircuitML,
        config: ClassifierConfig,
    ) -> MlResult<Self> {
        if model.nbqbits != circuit.nbqbits() {
            return Err(MlError::Dimension(format!(
                "model was trained on {} qubits, circuit has {}",
                model.nbqbits,
                circuit.nbqbits()
            )));
        }
        let mut classifier =
            Self::new(circuit, model.bitstrings.as_slice(), config.with_nbshots(model.nbshots))?;
        classifier.set_params(model.params)?;
        Ok(classifier)
    }

    fn check_training_set(&self, x: ArrayView2<'_, f64>, y: &[usize]) -> MlResult<()> {
        if x.nrows() == 0 {
            return Err(MlError::Dimension("training set is empty".into()));
        }
        if x.nrows() != y.len() {
            return Err(MlError::Dimension(format!(
                "{} samples but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if let Some(&bad) = y.iter().find(|&&label| label >= self.labels.len()) {
            return Err(MlError::Dimension(format!(
                "label {bad} has no bitstring ({} labels)",
                self.labels.len()
            )));
        }
        Ok(())
    }
}

/// Mean cross-entropy of one batch.
fn batch_loss(
    circuit: &CircuitML,
    labels: &LabelMap,
    params: &ParameterVector,
    x: ArrayView2<'_, f64>,
    y: &[usize],
    shots: Option<u32>,
) -> MlResult<f64> {
    let dists = circuit.run(params, Some(&Features::new(x)), shots)?;
    let probs = labels.reduce_batch(&dists);
    Ok(cross_entropy(probs.view(), y))
}

/// Row-wise argmax of a label-probability matrix.
pub fn decode_labels(probs: ArrayView2<'_, f64>) -> Vec<usize> {
    probs.rows().into_iter().map(argmax).collect()
}
