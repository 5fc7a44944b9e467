//! Per-sample probability distributions over measured bitstrings.

use polyq_hal::{Counts, HalError, Outcome};
use polyq_ir::Bitstring;

use crate::error::MlResult;

/// Slack allowed on an exact probability vector before it is rejected.
const EXACT_SUM_TOLERANCE: f64 = 1e-6;

/// Probability mass of every basis state for one sample.
///
/// Dense, indexed by basis index (qubit `k` is bit `k`). Entries are
/// non-negative and sum to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeDistribution {
    probs: Vec<f64>,
    num_qubits: u32,
}

impl OutcomeDistribution {
    /// Build from exact basis-state probabilities.
    pub fn from_probabilities(probs: Vec<f64>, num_qubits: u32) -> MlResult<Self> {
        let expected = 1usize << num_qubits;
        if probs.len() != expected {
            return Err(invalid(format!(
                "expected {expected} probabilities for {num_qubits} qubits, got {}",
                probs.len()
            )));
        }
        if probs.iter().any(|p| !p.is_finite() || *p < -EXACT_SUM_TOLERANCE) {
            return Err(invalid("probabilities must be finite and non-negative"));
        }

        let total: f64 = probs.iter().map(|p| p.max(0.0)).sum();
        if (total - 1.0).abs() > EXACT_SUM_TOLERANCE {
            return Err(invalid(format!("probabilities sum to {total}")));
        }

        Ok(Self {
            probs: probs.into_iter().map(|p| p.max(0.0) / total).collect(),
            num_qubits,
        })
    }

    /// Build a frequency estimate from measurement counts.
    pub fn from_counts(counts: &Counts, num_qubits: u32) -> MlResult<Self> {
        let total = counts.total();
        if total == 0 {
            return Err(invalid("no shots were recorded"));
        }

        let mut probs = vec![0.0; 1usize << num_qubits];
        for (bitstring, count) in counts.iter() {
            let parsed = Bitstring::parse(bitstring)
                .map_err(|e| invalid(format!("unreadable outcome: {e}")))?;
            if parsed.len() != num_qubits as usize {
                return Err(invalid(format!(
                    "outcome '{bitstring}' does not have {num_qubits} bits"
                )));
            }
            probs[parsed.index()] += count as f64 / total as f64;
        }

        Ok(Self { probs, num_qubits })
    }

    /// Build from a raw backend outcome.
    pub fn from_outcome(outcome: &Outcome, num_qubits: u32) -> MlResult<Self> {
        match outcome {
            Outcome::Probabilities(probs) => Self::from_probabilities(probs.clone(), num_qubits),
            Outcome::Counts(counts) => Self::from_counts(counts, num_qubits),
        }
    }

    /// Number of measured qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Mass of `bitstring` (0 when its length does not match).
    pub fn probability(&self, bitstring: &Bitstring) -> f64 {
        if bitstring.len() != self.num_qubits as usize {
            return 0.0;
        }
        self.probs[bitstring.index()]
    }

    /// Mass of every basis state, indexed by basis index.
    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }

    /// Iterate over `(bitstring, probability)` pairs with non-zero mass.
    pub fn iter(&self) -> impl Iterator<Item = (Bitstring, f64)> + '_ {
        let n = self.num_qubits as usize;
        self.probs
            .iter()
            .enumerate()
            .filter(|(_, p)| **p > 0.0)
            .map(move |(i, p)| (Bitstring::from_index(i, n), *p))
    }
}

fn invalid(msg: impl Into<String>) -> crate::error::MlError {
    HalError::InvalidResult(msg.into()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MlError;

    #[test]
    fn test_exact_probabilities() {
        let dist = OutcomeDistribution::from_probabilities(vec![0.5, 0.0, 0.25, 0.25], 2).unwrap();
        assert_eq!(dist.probability(&Bitstring::parse("01").unwrap()), 0.25);
        assert_eq!(dist.probability(&Bitstring::parse("10").unwrap()), 0.0);
        assert_eq!(dist.iter().count(), 3);
    }

    #[test]
    fn test_exact_probabilities_rejects_bad_vectors() {
        assert!(OutcomeDistribution::from_probabilities(vec![1.0, 0.0], 2).is_err());
        assert!(OutcomeDistribution::from_probabilities(vec![0.7, 0.7], 1).is_err());
        assert!(matches!(
            OutcomeDistribution::from_probabilities(vec![f64::NAN, 1.0], 1),
            Err(MlError::BackendExecution(HalError::InvalidResult(_)))
        ));
    }

    #[test]
    fn test_counts_become_frequencies() {
        let counts: Counts = [("00".to_string(), 30), ("11".to_string(), 70)]
            .into_iter()
            .collect();
        let dist = OutcomeDistribution::from_counts(&counts, 2).unwrap();

        assert!((dist.as_slice()[0] - 0.3).abs() < 1e-12);
        assert!((dist.as_slice()[3] - 0.7).abs() < 1e-12);
        assert!((dist.as_slice().iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_counts_must_be_non_empty_and_well_formed() {
        assert!(OutcomeDistribution::from_counts(&Counts::new(), 1).is_err());

        let counts: Counts = [("101".to_string(), 1)].into_iter().collect();
        assert!(OutcomeDistribution::from_counts(&counts, 2).is_err());
    }
}
