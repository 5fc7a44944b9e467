//! Mapping between class labels and measured bitstrings.
//!
//! Label `i` is read off the probability of bitstring `i`. Bitstrings that
//! belong to no label are discarded and the label masses are renormalized,
//! so every row of label probabilities sums to 1:
//!
//! ```text
//!   p(label i) = m_i / Σ_j m_j        m_i = mass of bitstring i
//!   p(label i) = 1 / L                when Σ_j m_j == 0
//! ```

use ndarray::{Array2, ArrayView1};

use polyq_ir::Bitstring;

use crate::distribution::OutcomeDistribution;
use crate::error::{MlError, MlResult};

/// Ordered bitstrings, one per class label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    bitstrings: Vec<Bitstring>,
}

impl LabelMap {
    /// Build a label map for a `num_qubits`-qubit circuit.
    ///
    /// Bitstrings must be non-empty, distinct and `num_qubits` long.
    pub fn new<S: AsRef<str>>(bitstrings: &[S], num_qubits: u32) -> MlResult<Self> {
        if bitstrings.is_empty() {
            return Err(MlError::Dimension("label map needs at least one bitstring".into()));
        }

        let mut parsed: Vec<Bitstring> = Vec::with_capacity(bitstrings.len());
        for s in bitstrings {
            let bitstring = Bitstring::parse(s.as_ref())?;
            if bitstring.len() != num_qubits as usize {
                return Err(MlError::Dimension(format!(
                    "bitstring '{bitstring}' has {} bits, circuit measures {num_qubits} qubits",
                    bitstring.len()
                )));
            }
            if parsed.contains(&bitstring) {
                return Err(MlError::Dimension(format!(
                    "bitstring '{bitstring}' is assigned to more than one label"
                )));
            }
            parsed.push(bitstring);
        }

        Ok(Self { bitstrings: parsed })
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.bitstrings.len()
    }

    /// Whether the map is empty (never true for a constructed map).
    pub fn is_empty(&self) -> bool {
        self.bitstrings.is_empty()
    }

    /// Bitstrings in label order.
    pub fn bitstrings(&self) -> &[Bitstring] {
        &self.bitstrings
    }

    /// Bitstrings in label order, as strings.
    pub fn to_strings(&self) -> Vec<String> {
        self.bitstrings.iter().map(ToString::to_string).collect()
    }

    /// Label probabilities of one sample.
    pub fn reduce(&self, dist: &OutcomeDistribution) -> Vec<f64> {
        let masses: Vec<f64> = self
            .bitstrings
            .iter()
            .map(|b| dist.probability(b))
            .collect();
        let total: f64 = masses.iter().sum();

        if total > 0.0 {
            masses.into_iter().map(|m| m / total).collect()
        } else {
            vec![1.0 / self.len() as f64; self.len()]
        }
    }

    /// Label probabilities of a batch: one row per sample, one column per label.
    pub fn reduce_batch(&self, dists: &[OutcomeDistribution]) -> Array2<f64> {
        let mut out = Array2::zeros((dists.len(), self.len()));
        for (mut row, dist) in out.rows_mut().into_iter().zip(dists) {
            for (cell, p) in row.iter_mut().zip(self.reduce(dist)) {
                *cell = p;
            }
        }
        out
    }
}

/// Index of the largest entry; ties go to the lowest index.
pub fn argmax(row: ArrayView1<'_, f64>) -> usize {
    let mut best = 0;
    for (i, &p) in row.iter().enumerate().skip(1) {
        if p > row[best] {
            best = i;
        }
    }
    best
}
