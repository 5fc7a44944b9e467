//! Derivative-free minimizers for the training loop.
//!
//! Every optimizer sees the loss only through function evaluations and is
//! capped by an evaluation budget. When the budget runs out the best point
//! seen so far is returned as a normal result; an evaluation error or a
//! cancellation aborts the run.

mod bfgs;
mod nelder_mead;
mod spsa;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::data::ParameterVector;
use crate::error::{MlError, MlResult};

pub use bfgs::Bfgs;
pub use nelder_mead::NelderMead;
pub use spsa::Spsa;

/// Result of an optimization run.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Best parameters seen.
    pub optimal_params: ParameterVector,
    /// Objective value at `optimal_params`.
    pub optimal_value: f64,
    /// Number of function evaluations.
    pub num_evaluations: usize,
    /// Number of iterations of the outer loop.
    pub num_iterations: usize,
    /// Objective value of every evaluation, in order.
    pub history: Vec<f64>,
    /// Whether the method met its own stopping criterion before the budget ran out.
    pub converged: bool,
}

/// Trait for optimizers.
pub trait Optimizer {
    /// Minimize `objective` from `initial` with at most `budget` evaluations.
    fn minimize<F>(
        &self,
        objective: F,
        initial: ParameterVector,
        budget: usize,
        cancel: Option<&CancelToken>,
    ) -> MlResult<OptimizationResult>
    where
        F: FnMut(&ParameterVector) -> MlResult<f64>;
}

/// Cooperative cancellation flag, checked between evaluations.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Optimization method selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// Bounded-step Nelder-Mead simplex.
    #[default]
    NelderMead,
    /// Simultaneous perturbation stochastic approximation.
    Spsa,
    /// Quasi-Newton with finite-difference gradients.
    Bfgs,
}

impl Method {
    /// All methods, in display order.
    pub const ALL: [Method; 3] = [Method::NelderMead, Method::Spsa, Method::Bfgs];

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Method::NelderMead => "nelder-mead",
            Method::Spsa => "spsa",
            Method::Bfgs => "bfgs",
        }
    }

    /// Run the method with its default settings.
    ///
    /// `seed` drives the stochastic methods.
    pub fn minimize<F>(
        &self,
        objective: F,
        initial: ParameterVector,
        budget: usize,
        seed: u64,
        cancel: Option<&CancelToken>,
    ) -> MlResult<OptimizationResult>
    where
        F: FnMut(&ParameterVector) -> MlResult<f64>,
    {
        match self {
            Method::NelderMead => NelderMead::new().minimize(objective, initial, budget, cancel),
            Method::Spsa => Spsa::new()
                .with_seed(seed)
                .minimize(objective, initial, budget, cancel),
            Method::Bfgs => Bfgs::new().minimize(objective, initial, budget, cancel),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = MlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "nelder-mead" | "neldermead" => Ok(Method::NelderMead),
            "spsa" => Ok(Method::Spsa),
            "bfgs" => Ok(Method::Bfgs),
            other => Err(MlError::InvalidConfig(format!(
                "unknown optimization method '{other}' (expected one of: nelder-mead, spsa, bfgs)"
            ))),
        }
    }
}

/// Why an optimizer loop stopped early.
pub(crate) enum Stop {
    /// The evaluation budget is spent.
    Budget,
    /// An evaluation failed or the run was cancelled.
    Failed(MlError),
}

impl From<MlError> for Stop {
    fn from(err: MlError) -> Self {
        Stop::Failed(err)
    }
}

/// Budget, cancellation and best-point bookkeeping shared by all methods.
pub(crate) struct Tracker<'a, F> {
    objective: F,
    budget: usize,
    cancel: Option<&'a CancelToken>,
    best: Option<(Vec<f64>, f64)>,
    history: Vec<f64>,
}

impl<'a, F> Tracker<'a, F>
where
    F: FnMut(&ParameterVector) -> MlResult<f64>,
{
    pub(crate) fn new(objective: F, budget: usize, cancel: Option<&'a CancelToken>) -> Self {
        Self {
            objective,
            budget,
            cancel,
            best: None,
            history: Vec::new(),
        }
    }

    /// Evaluate the objective at `x`.
    ///
    /// NaN losses are reported as `+∞` so comparisons stay total.
    pub(crate) fn eval(&mut self, x: &[f64]) -> Result<f64, Stop> {
        if self.history.len() >= self.budget {
            return Err(Stop::Budget);
        }
        if self.cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(Stop::Failed(MlError::Cancelled));
        }

        let raw = (self.objective)(&ParameterVector::from(x))?;
        let value = if raw.is_nan() { f64::INFINITY } else { raw };
        self.history.push(value);

        if self.best.as_ref().is_none_or(|(_, best)| value < *best) {
            self.best = Some((x.to_vec(), value));
        }
        Ok(value)
    }

    /// Turn the loop outcome into a result.
    pub(crate) fn finish(
        self,
        outcome: Result<usize, Stop>,
        initial: ParameterVector,
    ) -> MlResult<OptimizationResult> {
        let (num_iterations, converged) = match outcome {
            Ok(iterations) => (iterations, true),
            Err(Stop::Budget) => (self.history.len(), false),
            Err(Stop::Failed(err)) => return Err(err),
        };

        let (optimal_params, optimal_value) = match self.best {
            Some((x, value)) => (ParameterVector::new(x), value),
            None => (initial, f64::INFINITY),
        };

        Ok(OptimizationResult {
            optimal_params,
            optimal_value,
            num_evaluations: self.history.len(),
            num_iterations,
            history: self.history,
            converged,
        })
    }
}
