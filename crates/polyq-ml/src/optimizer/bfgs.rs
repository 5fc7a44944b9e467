//! BFGS quasi-Newton optimizer driven by finite differences.
//!
//! Gradients come from central differences (`2n` evaluations each), so the
//! method needs nothing beyond function values. It is meant for exact
//! (shot-free) objectives; with sampling noise prefer SPSA.

use ndarray::{Array1, Array2, Axis};

use super::{CancelToken, OptimizationResult, Optimizer, Stop, Tracker};
use crate::data::ParameterVector;
use crate::error::MlResult;

/// Sufficient-decrease constant of the Armijo condition.
const ARMIJO_C1: f64 = 1e-4;

/// BFGS optimizer configuration.
#[derive(Debug, Clone)]
pub struct Bfgs {
    /// Maximum number of iterations.
    pub maxiter: usize,
    /// Stop once the gradient norm falls below this.
    pub gtol: f64,
    /// Finite-difference step.
    pub eps: f64,
    /// Longest step tried by the line search.
    pub max_step: f64,
    /// Line search halvings before giving up.
    pub max_backtracks: usize,
}

impl Default for Bfgs {
    fn default() -> Self {
        Self {
            maxiter: 200,
            gtol: 1e-5,
            eps: 1e-4,
            max_step: 1.0,
            max_backtracks: 12,
        }
    }
}

impl Bfgs {
    /// Create a new BFGS optimizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum iterations.
    pub fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    /// Set the gradient tolerance.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.gtol = gtol;
        self
    }

    fn gradient<F>(&self, tracker: &mut Tracker<'_, F>, x: &Array1<f64>) -> Result<Array1<f64>, Stop>
    where
        F: FnMut(&ParameterVector) -> MlResult<f64>,
    {
        let mut grad = Array1::zeros(x.len());
        let mut probe = x.to_vec();
        for i in 0..x.len() {
            probe[i] = x[i] + self.eps;
            let f_plus = tracker.eval(&probe)?;
            probe[i] = x[i] - self.eps;
            let f_minus = tracker.eval(&probe)?;
            probe[i] = x[i];
            grad[i] = (f_plus - f_minus) / (2.0 * self.eps);
        }
        Ok(grad)
    }

    fn search<F>(&self, tracker: &mut Tracker<'_, F>, x: Vec<f64>) -> Result<usize, Stop>
    where
        F: FnMut(&ParameterVector) -> MlResult<f64>,
    {
        let n = x.len();
        let mut f_x = tracker.eval(&x)?;
        let mut x = Array1::from(x);
        if n == 0 {
            return Ok(0);
        }

        let mut grad = self.gradient(tracker, &x)?;
        let mut h_inv = Array2::<f64>::eye(n);

        for iteration in 0..self.maxiter {
            let grad_norm = grad.dot(&grad).sqrt();
            if !grad_norm.is_finite() || grad_norm < self.gtol {
                return Ok(iteration);
            }

            let mut direction = -h_inv.dot(&grad);
            let mut slope = grad.dot(&direction);
            if slope >= 0.0 {
                // Curvature estimate went bad: fall back to steepest descent
                h_inv = Array2::eye(n);
                direction = -grad.clone();
                slope = -grad_norm * grad_norm;
            }
            let dir_norm = direction.dot(&direction).sqrt();
            if dir_norm > self.max_step {
                let scale = self.max_step / dir_norm;
                direction *= scale;
                slope *= scale;
            }

            // Backtracking line search
            let mut t: f64 = 1.0;
            let mut accepted = None;
            for _ in 0..self.max_backtracks {
                let candidate = &x + &(t * &direction);
                let f_candidate = tracker.eval(&candidate.to_vec())?;
                if f_candidate <= f_x + ARMIJO_C1 * t * slope {
                    accepted = Some((candidate, f_candidate));
                    break;
                }
                t *= 0.5;
            }
            let Some((x_new, f_new)) = accepted else {
                return Ok(iteration);
            };

            let grad_new = self.gradient(tracker, &x_new)?;
            let s = &x_new - &x;
            let y = &grad_new - &grad;
            let sy = s.dot(&y);
            if sy > 1e-12 {
                let rho = 1.0 / sy;
                let s_col = s.view().insert_axis(Axis(1));
                let y_row = y.view().insert_axis(Axis(0));
                let left = Array2::<f64>::eye(n) - rho * s_col.dot(&y_row);
                let s_outer = s_col.dot(&s.view().insert_axis(Axis(0)));
                h_inv = left.dot(&h_inv).dot(&left.t()) + rho * s_outer;
            }

            x = x_new;
            f_x = f_new;
            grad = grad_new;
        }

        Ok(self.maxiter)
    }
}

impl Optimizer for Bfgs {
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
