//! SPSA (Simultaneous Perturbation Stochastic Approximation) optimizer.
//!
//! Estimates the gradient from two evaluations along a random ±1 direction,
//! which suits shot-noisy objectives.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{CancelToken, OptimizationResult, Optimizer, Stop, Tracker};
use crate::data::ParameterVector;
use crate::error::MlResult;

/// SPSA optimizer configuration.
#[derive(Debug, Clone)]
pub struct Spsa {
    /// Maximum number of iterations.
    pub maxiter: usize,
    /// Initial step size.
    pub a: f64,
    /// Perturbation size.
    pub c: f64,
    /// Learning rate decay parameter.
    pub alpha: f64,
    /// Perturbation decay parameter.
    pub gamma: f64,
    /// Seed of the perturbation directions.
    pub seed: u64,
}

impl Default for Spsa {
    fn default() -> Self {
        Self {
            maxiter: 1000,
            a: 0.2,
            c: 0.1,
            alpha: 0.602,
            gamma: 0.101,
            seed: 42,
        }
    }
}

impl Spsa {
    /// Create a new SPSA optimizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum iterations.
    pub fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    /// Set the perturbation seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set step and perturbation sizes.
    pub fn with_gains(mut self, a: f64, c: f64) -> Self {
        self.a = a;
        self.c = c;
        self
    }

    fn search<F>(&self, tracker: &mut Tracker<'_, F>, mut x: Vec<f64>) -> Result<usize, Stop>
    where
        F: FnMut(&ParameterVector) -> MlResult<f64>,
    {
        let n = x.len();
        tracker.eval(&x)?;
        if n == 0 {
            return Ok(0);
        }

        let mut rng = StdRng::seed_from_u64(self.seed);

        for k in 0..self.maxiter {
            let a_k = self.a / ((k + 1) as f64).powf(self.alpha);
            let c_k = self.c / ((k + 1) as f64).powf(self.gamma);

            let delta: Vec<f64> = (0..n)
                .map(|_| if rng.gen_bool(0.5) { 1.0 } else { -1.0 })
                .collect();

            let x_plus: Vec<f64> = x.iter().zip(&delta).map(|(xi, di)| xi + c_k * di).collect();
            let x_minus: Vec<f64> = x.iter().zip(&delta).map(|(xi, di)| xi - c_k * di).collect();

            let f_plus = tracker.eval(&x_plus)?;
            let f_minus = tracker.eval(&x_minus)?;
            if !(f_plus - f_minus).is_finite() {
                continue;
            }

            for (xi, di) in x.iter_mut().zip(&delta) {
                *xi -= a_k * (f_plus - f_minus) / (2.0 * c_k * di);
            }

            tracker.eval(&x)?;
        }

        Ok(self.maxiter)
    }
}

impl Optimizer for Spsa {
    fn minimize<F>(
        &self,
        objective: F,
        initial: ParameterVector,
        budget: usize,
        cancel: Option<&CancelToken>,
    ) -> MlResult<OptimizationResult>
    where
        F: FnMut(&ParameterVector) -> MlResult<f64>,
    {
        let mut tracker = Tracker::new(objective, budget, cancel);
        let outcome = self.search(&mut tracker, initial.to_vec());
        tracker.finish(outcome, initial)
    }
}
