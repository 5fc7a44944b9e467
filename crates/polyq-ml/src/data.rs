//! Feature batches and parameter vectors.

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{MlError, MlResult};

/// A batch of input samples: rows are samples, columns are features.
///
/// Column selection is bounds-checked so a circuit callback that reads a
/// feature the dataset does not have fails with [`MlError::Dimension`].
/// The widest column read is recorded, so a batch with columns the callback
/// never touches can be rejected too.
#[derive(Debug)]
pub struct Features<'a> {
    data: ArrayView2<'a, f64>,
    /// Highest column index read plus one; 0 when nothing was read.
    used: AtomicUsize,
}

impl<'a> Features<'a> {
    /// Wrap a feature matrix.
    pub fn new(data: ArrayView2<'a, f64>) -> Self {
        Self {
            data,
            used: AtomicUsize::new(0),
        }
    }

    /// Number of leading columns read since the last reset.
    pub fn columns_used(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }

    pub(crate) fn reset_usage(&self) {
        self.used.store(0, Ordering::Relaxed);
    }

    fn mark_used(&self, width: usize) {
        self.used.fetch_max(width, Ordering::Relaxed);
    }

    /// Number of samples.
    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of features per sample.
    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    /// The underlying matrix. Counts as reading every column.
    pub fn view(&self) -> ArrayView2<'a, f64> {
        self.mark_used(self.ncols());
        self.data
    }

    /// Columns `cols`, in the given order, as a `nrows × cols.len()` operand.
    pub fn select(&self, cols: &[usize]) -> MlResult<Array2<f64>> {
        if let Some(&bad) = cols.iter().find(|&&c| c >= self.ncols()) {
            return Err(MlError::Dimension(format!(
                "feature column {bad} requested from a batch with {} columns",
                self.ncols()
            )));
        }
        if let Some(&widest) = cols.iter().max() {
            self.mark_used(widest + 1);
        }
        Ok(self.data.select(Axis(1), cols))
    }

    /// Column `col` as a one-column operand.
    pub fn column(&self, col: usize) -> MlResult<Array2<f64>> {
        self.select(&[col])
    }
}

impl Clone for Features<'_> {
    fn clone(&self) -> Self {
        Self {
            data: self.data,
            used: AtomicUsize::new(self.columns_used()),
        }
    }
}

impl<'a> From<ArrayView2<'a, f64>> for Features<'a> {
    fn from(data: ArrayView2<'a, f64>) -> Self {
        Self::new(data)
    }
}

impl<'a> From<&'a Array2<f64>> for Features<'a> {
    fn from(data: &'a Array2<f64>) -> Self {
        Self::new(data.view())
    }
}

/// Trainable circuit parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterVector(Vec<f64>);

impl ParameterVector {
    /// Wrap raw parameter values.
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// `len` zeros.
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    /// Parameters `indices`, in the given order, as a `1 × indices.len()`
    /// operand broadcast over the batch.
    pub fn select(&self, indices: &[usize]) -> MlResult<Array2<f64>> {
        let values = indices
            .iter()
            .map(|&i| {
                self.0.get(i).copied().ok_or_else(|| {
                    MlError::Dimension(format!(
                        "parameter {i} requested from a vector of length {}",
                        self.0.len()
                    ))
                })
            })
            .collect::<MlResult<Vec<f64>>>()?;
        let len = values.len();
        Array2::from_shape_vec((1, len), values)
            .map_err(|e| MlError::Dimension(e.to_string()))
    }

    /// Every parameter as a `1 × len` operand.
    pub fn all(&self) -> Array2<f64> {
        Array2::from_shape_fn((1, self.0.len()), |(_, j)| self.0[j])
    }

    /// Consume into the raw values.
    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }
}

impl Deref for ParameterVector {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for ParameterVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl From<&[f64]> for ParameterVector {
    fn from(values: &[f64]) -> Self {
        Self(values.to_vec())
    }
}
