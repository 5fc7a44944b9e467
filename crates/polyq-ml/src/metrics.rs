//! Training loss and evaluation metrics.

use ndarray::ArrayView2;

/// Smallest probability fed to the logarithm.
pub const PROB_FLOOR: f64 = 1e-12;

/// Mean negative log-likelihood of the true labels.
///
/// `probs` holds one row of label probabilities per sample; `labels[i]` is
/// the true label of row `i`. Probabilities are floored at [`PROB_FLOOR`] so
/// a confident mistake costs a large but finite loss.
pub fn cross_entropy(probs: ArrayView2<'_, f64>, labels: &[usize]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let total: f64 = probs
        .rows()
        .into_iter()
        .zip(labels)
        .map(|(row, &label)| -row[label].max(PROB_FLOOR).ln())
        .sum();
    total / labels.len() as f64
}

/// Fraction of predictions equal to the truth.
pub fn accuracy(predicted: &[usize], truth: &[usize]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(truth)
        .filter(|(p, t)| p == t)
        .count();
    correct as f64 / truth.len() as f64
}
