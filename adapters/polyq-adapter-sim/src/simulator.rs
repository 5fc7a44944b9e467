//! Simulator backend implementation.

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};
use uuid::Uuid;

use polyq_hal::{
    Backend, BackendAvailability, BackendConfig, BackendFactory, Capabilities, Counts,
    ExecutionResult, HalError, HalResult, Job, JobId, JobStatus, Outcome, ValidationResult,
};
use polyq_ir::{Bitstring, CircuitSpec};

use crate::statevector::Statevector;

/// Default register limit (~16 MB of amplitudes per row).
const DEFAULT_MAX_QUBITS: u32 = 20;

/// Finished jobs nobody collected are dropped after this many seconds.
const JOB_RETENTION_SECS: i64 = 60;

/// Job data for the simulator.
struct SimJob {
    job: Job,
    result: Option<ExecutionResult>,
}

/// Local simulator backend.
///
/// Every batch row is simulated on its own statevector. With `shots = None`
/// the row's exact basis-state probabilities are returned; with `Some(n)` the
/// row is measured `n` times and the counts are returned.
pub struct SimulatorBackend {
    /// Backend configuration.
    config: BackendConfig,
    /// Cached capabilities.
    capabilities: Capabilities,
    /// Submitted jobs until their outcome is reported.
    jobs: Arc<Mutex<FxHashMap<String, SimJob>>>,
    /// Sampling source.
    rng: Mutex<StdRng>,
    /// Artificial delay applied before every execution.
    latency: Option<Duration>,
}

impl SimulatorBackend {
    /// Create a new simulator backend with default settings.
    pub fn new() -> Self {
        Self::with_max_qubits(DEFAULT_MAX_QUBITS)
    }

    /// Create a simulator with custom max qubits.
    pub fn with_max_qubits(max_qubits: u32) -> Self {
        Self {
            config: BackendConfig::new("simulator"),
            capabilities: Capabilities::simulator(max_qubits),
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            rng: Mutex::new(StdRng::from_entropy()),
            latency: None,
        }
    }

    /// Make sampling reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Delay every execution by `latency`, emulating a remote device.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Rename the backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.capabilities.name = name.clone();
        self.config.name = name;
        self
    }

    fn check_limits(&self, circuit: &CircuitSpec, shots: Option<u32>) -> HalResult<()> {
        if circuit.num_qubits() > self.capabilities.num_qubits {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit has {} qubits but simulator only supports {}",
                circuit.num_qubits(),
                self.capabilities.num_qubits
            )));
        }
        if let Some(n) = shots.filter(|&n| n > self.capabilities.max_shots) {
            return Err(HalError::InvalidShots(format!(
                "{n} shots exceed the limit of {}",
                self.capabilities.max_shots
            )));
        }
        Ok(())
    }

    /// Run simulation synchronously.
    ///
    /// No capability validation happens here; [`Backend::execute`] validates
    /// first.
    #[instrument(skip(self, circuit), fields(qubits = circuit.num_qubits(), rows = circuit.batch_size()))]
    pub fn run(&self, circuit: &CircuitSpec, shots: Option<u32>) -> HalResult<ExecutionResult> {
        let start = Instant::now();
        let num_qubits = circuit.num_qubits() as usize;

        debug!(
            "Starting simulation: {} ops, shots {:?}",
            circuit.num_ops(),
            shots
        );

        let mut outcomes = Vec::with_capacity(circuit.batch_size());
        for row in 0..circuit.batch_size() {
            let mut sv = Statevector::new(num_qubits);
            for op in circuit.ops() {
                sv.apply(op, row)?;
            }
            let probs = sv.probabilities();

            let outcome = match shots {
                None => Outcome::Probabilities(probs),
                Some(n) => Outcome::Counts(self.sample_counts(&probs, num_qubits, n)?),
            };
            outcomes.push(outcome);
        }

        let elapsed = start.elapsed();
        debug!("Simulation completed in {:?}", elapsed);

        Ok(ExecutionResult::new(outcomes, shots).with_execution_time(elapsed.as_millis() as u64))
    }

    /// Measure a row `shots` times.
    fn sample_counts(&self, probs: &[f64], num_qubits: usize, shots: u32) -> HalResult<Counts> {
        let dist = WeightedIndex::new(probs)
            .map_err(|e| HalError::Backend(format!("cannot sample statevector: {e}")))?;

        let mut tally = vec![0u64; probs.len()];
        {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            for _ in 0..shots {
                tally[dist.sample(&mut *rng)] += 1;
            }
        }

        Ok(tally
            .into_iter()
            .enumerate()
            .filter(|&(_, count)| count > 0)
            .map(|(index, count)| (Bitstring::from_index(index, num_qubits).to_string(), count))
            .collect())
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn lock_jobs(&self) -> std::sync::MutexGuard<'_, FxHashMap<String, SimJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        Ok(BackendAvailability::always_available())
    }

    async fn validate(
        &self,
        circuit: &CircuitSpec,
        shots: Option<u32>,
    ) -> HalResult<ValidationResult> {
        let mut reasons = self.capabilities.violations(circuit, shots);
        if shots.is_some() && !circuit.is_measured() {
            reasons.push("sampling requires a measured circuit".into());
        }
        if reasons.is_empty() {
            Ok(ValidationResult::Valid)
        } else {
            Ok(ValidationResult::Invalid { reasons })
        }
    }

    #[instrument(skip(self, circuit))]
    async fn submit(&self, circuit: &CircuitSpec, shots: Option<u32>) -> HalResult<JobId> {
        self.check_limits(circuit, shots)?;

        let job_id = JobId::new(Uuid::new_v4().to_string());
        let mut job = Job::new(job_id.clone(), circuit.batch_size(), shots);
        job.transition(JobStatus::Running);

        {
            let mut jobs = self.lock_jobs();
            let now = Utc::now();
            let retention = TimeDelta::seconds(JOB_RETENTION_SECS);
            jobs.retain(|_, j| !j.job.expired(now, retention));
            jobs.insert(job_id.0.clone(), SimJob { job, result: None });
        }
        debug!("Submitted job: {}", job_id);

        self.simulate_latency().await;
        let outcome = self.run(circuit, shots);

        let mut jobs = self.lock_jobs();
        if let Some(sim_job) = jobs.get_mut(&job_id.0) {
            // A cancel during the latency window wins.
            match outcome {
                Ok(result) => {
                    if sim_job.job.transition(JobStatus::Completed) {
                        sim_job.result = Some(result);
                    }
                }
                Err(e) => {
                    sim_job.job.transition(JobStatus::Failed(e.to_string()));
                }
            }
        }

        Ok(job_id)
    }

    /// A failed or cancelled job is forgotten once its status is reported.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let mut jobs = self.lock_jobs();
        let status = jobs
            .get(&job_id.0)
            .map(|j| j.job.status.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        if matches!(status, JobStatus::Failed(_) | JobStatus::Cancelled) {
            jobs.remove(&job_id.0);
        }
        Ok(status)
    }

    /// Hand out the outcome of a finished job; the job is forgotten afterwards.
    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let mut jobs = self.lock_jobs();
        let sim_job = jobs
            .get(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        if !sim_job.job.status.is_terminal() {
            return Err(HalError::Backend(format!(
                "job {job_id} is not finished ({})",
                sim_job.job.status
            )));
        }

        let finished = jobs
            .remove(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        match finished.job.status {
            JobStatus::Failed(msg) => Err(HalError::JobFailed(msg)),
            JobStatus::Cancelled => Err(HalError::JobCancelled),
            _ => finished
                .result
                .ok_or_else(|| HalError::JobNotFound(job_id.0.clone())),
        }
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let mut jobs = self.lock_jobs();
        let sim_job = jobs
            .get_mut(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        sim_job.job.transition(JobStatus::Cancelled);
        Ok(())
    }

    /// Direct path: no job bookkeeping, no polling.
    async fn execute(
        &self,
        circuit: &CircuitSpec,
        shots: Option<u32>,
    ) -> HalResult<ExecutionResult> {
        self.check_limits(circuit, shots)?;
        if let ValidationResult::Invalid { reasons } = self.validate(circuit, shots).await? {
            return Err(HalError::InvalidCircuit(reasons.join("; ")));
        }
        self.simulate_latency().await;
        self.run(circuit, shots)
    }
}

impl BackendFactory for SimulatorBackend {
    /// Recognized extra keys: `max_qubits`, `seed`, `latency_ms`.
    fn from_config(config: BackendConfig) -> HalResult<Self> {
        let max_qubits = match config.extra_u64("max_qubits")? {
            Some(n) => u32::try_from(n)
                .map_err(|_| HalError::Configuration(format!("max_qubits {n} is too large")))?,
            None => DEFAULT_MAX_QUBITS,
        };

        let mut backend = Self::with_max_qubits(max_qubits).with_name(config.name.clone());
        if let Some(seed) = config.extra_u64("seed")? {
            backend = backend.with_seed(seed);
        }
        if let Some(ms) = config.extra_u64("latency_ms")? {
            backend = backend.with_latency(Duration::from_millis(ms));
        }
        backend.config = config;
        Ok(backend)
    }
}
