//! Nelder-Mead simplex search with a bounded step radius.
//!
//! Reflections are clipped to a radius `rho` around the centroid. When the
//! simplex collapses (spread below `tol`) it is rebuilt around the best
//! vertex with a halved radius, until `rho` reaches `rho_end`.

use super::{OptimizationResult, Optimizer, Stop, Tracker};
use crate::data::ParameterVector;
use crate::error::MlResult;

/// Nelder-Mead optimizer configuration.
#[derive(Debug, Clone)]
pub struct NelderMead {
    /// Maximum number of iterations.
    pub maxiter: usize,
    /// Convergence tolerance on the simplex value spread.
    pub tol: f64,
    /// Initial step radius.
    pub rho_begin: f64,
    /// Final step radius.
    pub rho_end: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            maxiter: 1000,
            tol: 1e-6,
            rho_begin: 0.5,
            rho_end: 1e-4,
        }
    }
}

impl NelderMead {
    /// Create a new optimizer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum iterations.
    pub fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set step radius bounds.
    pub fn with_step(mut self, rho_begin: f64, rho_end: f64) -> Self {
        self.rho_begin = rho_begin;
        self.rho_end = rho_end;
        self
    }

    fn search<F>(&self, tracker: &mut Tracker<'_, F>, x: Vec<f64>) -> Result<usize, Stop>
    where
        F: FnMut(&ParameterVector) -> MlResult<f64>,
    {
        let n = x.len();
        let f_x = tracker.eval(&x)?;
        if n == 0 {
            return Ok(0);
        }

        let mut rho = self.rho_begin;
        let (mut simplex, mut f_simplex) = initial_simplex(tracker, x, f_x, rho)?;

        for iteration in 0..self.maxiter {
            let mut indices: Vec<usize> = (0..=n).collect();
            indices.sort_by(|&a, &b| f_simplex[a].total_cmp(&f_simplex[b]));

            let best_idx = indices[0];
            let worst_idx = indices[n];

            let spread = f_simplex[worst_idx] - f_simplex[best_idx];
            if spread < self.tol && rho <= self.rho_end {
                return Ok(iteration);
            }

            // Collapsed simplex: restart around the best vertex with a smaller radius
            if spread < self.tol {
                rho = (rho * 0.5).max(self.rho_end);
                let best = simplex[best_idx].clone();
                let f_best = f_simplex[best_idx];
                (simplex, f_simplex) = initial_simplex(tracker, best, f_best, rho)?;
                continue;
            }

            let mut centroid = vec![0.0; n];
            for &idx in &indices[..n] {
                for (c, v) in centroid.iter_mut().zip(&simplex[idx]) {
                    *c += v;
                }
            }
            for c in &mut centroid {
                *c /= n as f64;
            }

            // Reflection, clipped to the step radius
            let reflected: Vec<f64> = centroid
                .iter()
                .zip(&simplex[worst_idx])
                .map(|(c, w)| {
                    let diff = c - w;
                    c + diff.clamp(-rho, rho)
                })
                .collect();
            let f_reflected = tracker.eval(&reflected)?;

            if f_reflected < f_simplex[best_idx] {
                let expanded: Vec<f64> = centroid
                    .iter()
                    .zip(&reflected)
                    .map(|(c, r)| c + 2.0 * (r - c))
                    .collect();
                let f_expanded = tracker.eval(&expanded)?;

                if f_expanded < f_reflected {
                    simplex[worst_idx] = expanded;
                    f_simplex[worst_idx] = f_expanded;
                } else {
                    simplex[worst_idx] = reflected;
                    f_simplex[worst_idx] = f_reflected;
                }
            } else if f_reflected < f_simplex[indices[n - 1]] {
                simplex[worst_idx] = reflected;
                f_simplex[worst_idx] = f_reflected;
            } else {
                let contracted: Vec<f64> = centroid
                    .iter()
                    .zip(&simplex[worst_idx])
                    .map(|(c, w)| 0.5 * (c + w))
                    .collect();
                let f_contracted = tracker.eval(&contracted)?;

                if f_contracted < f_simplex[worst_idx] {
                    simplex[worst_idx] = contracted;
                    f_simplex[worst_idx] = f_contracted;
                } else {
                    // Shrink towards the best vertex
                    let best = simplex[best_idx].clone();
                    for i in 0..=n {
                        if i != best_idx {
                            for (v, b) in simplex[i].iter_mut().zip(&best) {
                                *v = 0.5 * (b + *v);
                            }
                            f_simplex[i] = tracker.eval(&simplex[i])?;
                        }
                    }
                }
            }
        }

        Ok(self.maxiter)
    }
}

/// Vertex `x` plus one vertex offset by `rho` along each axis.
fn initial_simplex<F>(
    tracker: &mut Tracker<'_, F>,
    x: Vec<f64>,
    f_x: f64,
    rho: f64,
) -> Result<(Vec<Vec<f64>>, Vec<f64>), Stop>
where
    F: FnMut(&ParameterVector) -> MlResult<f64>,
{
    let n = x.len();
    let mut simplex = Vec::with_capacity(n + 1);
    let mut f_simplex = Vec::with_capacity(n + 1);

    for i in 0..n {
        let mut point = x.clone();
        point[i] += rho;
        f_simplex.push(tracker.eval(&point)?);
        simplex.push(point);
    }
    simplex.insert(0, x);
    f_simplex.insert(0, f_x);

    Ok((simplex, f_simplex))
}

impl Optimizer for NelderMead {
    fn minimize<F>(
        &self,
        objective: F,
        initial: ParameterVector,
        budget: usize,
        cancel: Option<&super::CancelToken>,
    ) -> MlResult<OptimizationResult>
    where
        F: FnMut(&ParameterVector) -> MlResult<f64>,
    {
        let mut tracker = Tracker::new(objective, budget, cancel);
        let outcome = self.search(&mut tracker, initial.to_vec());
        tracker.finish(outcome, initial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MlError;
    use crate::optimizer::CancelToken;

    fn quadratic(p: &ParameterVector) -> MlResult<f64> {
        Ok((p[0] - 1.0).powi(2) + (p[1] - 2.0).powi(2))
    }

    #[test]
    fn test_nelder_mead_simple() {
        let result = NelderMead::new()
            .minimize(quadratic, ParameterVector::zeros(2), 500, None)
            .unwrap();

        assert!(result.optimal_value < 0.01);
        assert!((result.optimal_params[0] - 1.0).abs() < 0.1);
        assert!((result.optimal_params[1] - 2.0).abs() < 0.1);
    }

    #[test]
    fn test_nelder_mead_rosenbrock() {
        let result = NelderMead::new()
            .minimize(
                |p: &ParameterVector| {
                    Ok((1.0 - p[0]).powi(2) + 100.0 * (p[1] - p[0].powi(2)).powi(2))
                },
                ParameterVector::zeros(2),
                1000,
                None,
            )
            .unwrap();

        // Rosenbrock is hard, just check we improved
        assert!(result.optimal_value < 1.0);
    }

    #[test]
    fn test_budget_is_respected() {
        let mut calls = 0;
        let result = NelderMead::new()
            .minimize(
                |p: &ParameterVector| {
                    calls += 1;
                    quadratic(p)
                },
                ParameterVector::zeros(2),
                7,
                None,
            )
            .unwrap();

        assert_eq!(calls, 7);
        assert_eq!(result.num_evaluations, 7);
        assert!(!result.converged);
        assert_eq!(
            result.optimal_value,
            result.history.iter().copied().fold(f64::INFINITY, f64::min)
        );
    }

    #[test]
    fn test_errors_abort() {
        let result = NelderMead::new().minimize(
            |_: &ParameterVector| Err(MlError::InvalidState("boom".into())),
            ParameterVector::zeros(2),
            10,
            None,
        );
        assert!(matches!(result, Err(MlError::InvalidState(_))));
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let result = NelderMead::new().minimize(quadratic, ParameterVector::zeros(2), 10, Some(&token));
        assert!(matches!(result, Err(MlError::Cancelled)));
    }
}
