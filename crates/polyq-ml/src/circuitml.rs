//! Batched circuit execution engine.
//!
//! A [`CircuitML`] owns the circuit-construction callback, the declared
//! qubit and parameter counts and a backend handle. `run` turns one
//! `(params, features, shots)` request into exactly one backend call:
//!
//! ```text
//!   params, features ──→ callback ──→ CircuitSpec ──→ Backend::execute
//!                          (Builder)                        │
//!   Vec<OutcomeDistribution> ←── per-row reduction ←────────┘
//! ```
//!
//! Shapes are checked before the backend is contacted. Backend faults are
//! surfaced as [`MlError::BackendExecution`] and never retried here.

use std::f64::consts::TAU;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::runtime::Runtime;
use tracing::{debug, instrument};

use polyq_adapter_sim::SimulatorBackend;
use polyq_hal::{Backend, ExecutionResult, HalError};
use polyq_ir::{Builder, CircuitSpec};

use crate::data::{Features, ParameterVector};
use crate::distribution::OutcomeDistribution;
use crate::error::{MlError, MlResult};

/// Circuit-construction callback.
///
/// Receives the engine (for [`CircuitML::circuit_builder`]), the feature
/// batch (`None` for a parameter-only circuit), the parameters and the shot
/// request, and returns a finalized circuit. It should call `measure_all`
/// exactly when `shots` is `Some`.
pub type MakeCircuit = dyn Fn(&CircuitML, Option<&Features<'_>>, &ParameterVector, Option<u32>) -> MlResult<CircuitSpec>
    + Send
    + Sync;

/// Parametrized circuit bound to a backend.
#[derive(Clone)]
pub struct CircuitML {
    make_circuit: Arc<MakeCircuit>,
    nbqbits: u32,
    nbparams: usize,
    nbfeatures: Option<usize>,
    backend: Arc<dyn Backend>,
    timeout: Option<Duration>,
    runtime: Arc<OnceLock<Runtime>>,
}

impl CircuitML {
    /// Create an engine.
    ///
    /// `backend = None` selects a local exact/sampling simulator.
    pub fn new<F>(
        make_circuit: F,
        nbqbits: u32,
        nbparams: usize,
        backend: Option<Arc<dyn Backend>>,
    ) -> MlResult<Self>
    where
        F: Fn(&CircuitML, Option<&Features<'_>>, &ParameterVector, Option<u32>) -> MlResult<CircuitSpec>
            + Send
            + Sync
            + 'static,
    {
        if nbqbits == 0 {
            return Err(MlError::Dimension("a circuit needs at least one qubit".into()));
        }
        let backend: Arc<dyn Backend> = match backend {
            Some(backend) => backend,
            None => Arc::new(SimulatorBackend::new()),
        };

        Ok(Self {
            make_circuit: Arc::new(make_circuit),
            nbqbits,
            nbparams,
            nbfeatures: None,
            backend,
            timeout: None,
            runtime: Arc::new(OnceLock::new()),
        })
    }

    /// Declare how many feature columns the callback reads.
    ///
    /// `run` then rejects feature batches of another width before the
    /// callback runs. Without a declaration the width is checked after the
    /// callback against the columns it actually read.
    pub fn with_nbfeatures(mut self, nbfeatures: usize) -> Self {
        self.nbfeatures = Some(nbfeatures);
        self
    }

    /// Fail backend calls that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Same circuit on another backend.
    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = backend;
        self
    }

    /// Swap the backend in place.
    pub fn set_backend(&mut self, backend: Arc<dyn Backend>) {
        debug!("CircuitML: backend {} -> {}", self.backend.name(), backend.name());
        self.backend = backend;
    }

    /// The current backend.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Number of qubits.
    pub fn nbqbits(&self) -> u32 {
        self.nbqbits
    }

    /// Number of parameters.
    pub fn nbparams(&self) -> usize {
        self.nbparams
    }

    /// Declared feature count, if any.
    pub fn nbfeatures(&self) -> Option<usize> {
        self.nbfeatures
    }

    /// Fresh builder over this engine's qubits.
    pub fn circuit_builder(&self, batch_size: usize) -> MlResult<Builder> {
        Ok(Builder::new(self.nbqbits, batch_size)?)
    }

    /// Uniform random parameters in `[0, 2π)`.
    pub fn random_params(&self, seed: u64) -> ParameterVector {
        let mut rng = StdRng::seed_from_u64(seed);
        ParameterVector::new((0..self.nbparams).map(|_| rng.gen_range(0.0..TAU)).collect())
    }

    /// Validate the inputs and build the circuit, without executing it.
    pub fn make_circuit(
        &self,
        params: &ParameterVector,
        features: Option<&Features<'_>>,
        shots: Option<u32>,
    ) -> MlResult<CircuitSpec> {
        if params.len() != self.nbparams {
            return Err(MlError::Dimension(format!(
                "expected {} parameters, got {}",
                self.nbparams,
                params.len()
            )));
        }
        if shots == Some(0) {
            return Err(MlError::InvalidState(
                "shots must be positive; use None for exact execution".into(),
            ));
        }

        let expected_rows = match features {
            Some(x) => {
                if x.nrows() == 0 {
                    return Err(MlError::Dimension("feature batch has no rows".into()));
                }
                if let Some(n) = self.nbfeatures {
                    if x.ncols() != n {
                        return Err(MlError::Dimension(format!(
                            "expected {n} feature columns, got {}",
                            x.ncols()
                        )));
                    }
                }
                x.reset_usage();
                x.nrows()
            }
            None => 1,
        };

        let spec = (self.make_circuit)(self, features, params, shots)?;

        if let (Some(x), None) = (features, self.nbfeatures) {
            let used = x.columns_used();
            if used > 0 && used != x.ncols() {
                return Err(MlError::Dimension(format!(
                    "callback reads {used} feature columns but the batch has {}",
                    x.ncols()
                )));
            }
        }

        if spec.num_qubits() != self.nbqbits {
            return Err(MlError::Dimension(format!(
                "callback built a {}-qubit circuit for a {}-qubit engine",
                spec.num_qubits(),
                self.nbqbits
            )));
        }
        if spec.batch_size() != expected_rows {
            return Err(MlError::Dimension(format!(
                "callback built a batch of {} rows for {expected_rows} samples",
                spec.batch_size()
            )));
        }
        match (spec.is_measured(), shots) {
            (true, None) => Err(MlError::InvalidState(
                "measure_all() requires finite shots".into(),
            )),
            (false, Some(n)) => Err(MlError::InvalidState(format!(
                "{n} shots requested but the circuit is not measured"
            ))),
            _ => Ok(spec),
        }
    }

    /// Execute the circuit and return one distribution per feature row.
    ///
    /// Blocks the calling thread; must not be called from inside an async
    /// runtime (use [`CircuitML::run_async`] there).
    #[instrument(skip_all, fields(backend = %self.backend.name(), shots = ?shots))]
    pub fn run(
        &self,
        params: &ParameterVector,
        features: Option<&Features<'_>>,
        shots: Option<u32>,
    ) -> MlResult<Vec<OutcomeDistribution>> {
        let spec = self.make_circuit(params, features, shots)?;
        let result = self.runtime()?.block_on(self.dispatch(&spec, shots))?;
        self.decode(&spec, &result)
    }

    /// Async variant of [`CircuitML::run`].
    pub async fn run_async(
        &self,
        params: &ParameterVector,
        features: Option<&Features<'_>>,
        shots: Option<u32>,
    ) -> MlResult<Vec<OutcomeDistribution>> {
        let spec = self.make_circuit(params, features, shots)?;
        let result = self.dispatch(&spec, shots).await?;
        self.decode(&spec, &result)
    }

    async fn dispatch(&self, spec: &CircuitSpec, shots: Option<u32>) -> MlResult<ExecutionResult> {
        debug!(
            "Dispatching {} ops x {} rows to {}",
            spec.num_ops(),
            spec.batch_size(),
            self.backend.name()
        );
        let execution = self.backend.execute(spec, shots);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, execution).await.map_err(|_| {
                HalError::Timeout(format!("{} did not answer within {limit:?}", self.backend.name()))
            })??,
            None => execution.await?,
        };
        Ok(result)
    }

    fn decode(&self, spec: &CircuitSpec, result: &ExecutionResult) -> MlResult<Vec<OutcomeDistribution>> {
        if result.len() != spec.batch_size() {
            return Err(HalError::InvalidResult(format!(
                "backend returned {} outcomes for {} rows",
                result.len(),
                spec.batch_size()
            ))
            .into());
        }
        result
            .outcomes
            .iter()
            .map(|outcome| OutcomeDistribution::from_outcome(outcome, self.nbqbits))
            .collect()
    }

    /// Runtime driving blocking calls, started on first use.
    fn runtime(&self) -> MlResult<&Runtime> {
        if let Some(runtime) = self.runtime.get() {
            return Ok(runtime);
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        Ok(self.runtime.get_or_init(|| runtime))
    }
}

impl fmt::Debug for CircuitML {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitML")
            .field("nbqbits", &self.nbqbits)
            .field("nbparams", &self.nbparams)
            .field("nbfeatures", &self.nbfeatures)
            .field("backend", &self.backend.name())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// One Y rotation per qubit from the features, then from the parameters.
    fn encode(
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
        CircuitML::new(encode, 2, 2, None).unwrap()
    }

    #[test]
    fn test_run_exact_rows() {
        let qc = engine();
        let x = array![[0.0, 0.0], [std::f64::consts::PI, 0.0]];
        let dists = qc
            .run(&ParameterVector::zeros(2), Some(&Features::from(&x)), None)
            .unwrap();

        assert_eq!(dists.len(), 2);
        assert!((dists[0].as_slice()[0] - 1.0).abs() < 1e-12);
        // Qubit 0 flipped: basis index 1
        assert!((dists[1].as_slice()[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_run_without_features() {
        let qc = engine();
        let dists = qc.run(&ParameterVector::zeros(2), None, None).unwrap();
        assert_eq!(dists.len(), 1);
    }

    #[test]
    fn test_params_length_mismatch() {
        let qc = engine();
        let err = qc.run(&ParameterVector::zeros(3), None, None).unwrap_err();
        assert!(matches!(err, MlError::Dimension(_)));
    }

    #[test]
    fn test_feature_width_is_checked() {
        let qc = engine();
        let narrow = array![[0.1]];
        let err = qc
            .run(&ParameterVector::zeros(2), Some(&Features::from(&narrow)), None)
            .unwrap_err();
        assert!(matches!(err, MlError::Dimension(_)));

        let qc = engine().with_nbfeatures(2);
        let wide = array![[0.1, 0.2, 0.3]];
        let err = qc
            .run(&ParameterVector::zeros(2), Some(&Features::from(&wide)), None)
            .unwrap_err();
        assert!(matches!(err, MlError::Dimension(_)));
    }

    #[test]
    fn test_unread_feature_columns_are_rejected() {
        let qc = engine();
        let wide = array![[0.1, 0.2, 0.3]];
        let err = qc
            .run(&ParameterVector::zeros(2), Some(&Features::from(&wide)), None)
            .unwrap_err();
        assert!(matches!(err, MlError::Dimension(_)));

        // Exact width passes, also when the wrapper is reused
        let exact = array![[0.1, 0.2]];
        let features = Features::from(&exact);
        assert!(qc.run(&ParameterVector::zeros(2), Some(&features), None).is_ok());
        assert!(qc.run(&ParameterVector::zeros(2), Some(&features), None).is_ok());
    }

    fn always_measured(
        qc: &CircuitML,
        _: Option<&Features<'_>>,
        _: &ParameterVector,
        _: Option<u32>,
    ) -> MlResult<CircuitSpec> {
        let mut bdr = qc.circuit_builder(1)?;
        bdr.measure_all()?;
        Ok(bdr.circuit()?)
    }

    fn never_measured(
        qc: &CircuitML,
        _: Option<&Features<'_>>,
        _: &ParameterVector,
        _: Option<u32>,
    ) -> MlResult<CircuitSpec> {
        Ok(qc.circuit_builder(1)?.circuit()?)
    }

    #[test]
    fn test_measurement_must_match_shots() {
        let qc = CircuitML::new(always_measured, 1, 0, None).unwrap();
        assert!(matches!(
            qc.run(&ParameterVector::zeros(0), None, None),
            Err(MlError::InvalidState(_))
        ));

        let qc = CircuitML::new(never_measured, 1, 0, None).unwrap();
        assert!(matches!(
            qc.run(&ParameterVector::zeros(0), None, Some(100)),
            Err(MlError::InvalidState(_))
        ));
    }

    #[test]
    fn test_random_params_are_seeded_and_bounded() {
        let qc = engine();
        let a = qc.random_params(3);
        assert_eq!(a, qc.random_params(3));
        assert_eq!(a.len(), 2);
        assert!(a.iter().all(|v| (0.0..TAU).contains(v)));
    }

    #[tokio::test]
    async fn test_run_async() {
        let qc = engine();
        let dists = qc
            .run_async(&ParameterVector::zeros(2), None, Some(64))
            .await
            .unwrap();
        assert_eq!(dists.len(), 1);
        assert!((dists[0].as_slice()[0] - 1.0).abs() < 1e-12);
    }
}
