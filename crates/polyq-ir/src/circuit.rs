//! Finalized, backend-agnostic circuit description.

use serde::{Deserialize, Serialize};

use crate::gate::GateKind;
use crate::operation::Operation;

/// An immutable batched circuit produced by [`Builder::circuit`].
///
/// A spec covers a whole batch of samples: fixed gates and parameter angles
/// are shared by every row, feature angles carry one value per row. Backends
/// execute row `r` by taking [`Operation::angle`] at `r` for every operation.
///
/// [`Builder::circuit`]: crate::Builder::circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitSpec {
    num_qubits: u32,
    batch_size: usize,
    ops: Vec<Operation>,
    measured: bool,
}

impl CircuitSpec {
    pub(crate) fn new(
        num_qubits: u32,
        batch_size: usize,
        ops: Vec<Operation>,
        measured: bool,
    ) -> Self {
        Self {
            num_qubits,
            batch_size,
            ops,
            measured,
        }
    }

    /// Number of qubits in the register.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Number of samples the circuit is broadcast over.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Operations in application order.
    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    /// Number of operations.
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// Whether every qubit is measured at the end.
    pub fn is_measured(&self) -> bool {
        self.measured
    }

    /// Iterate over the gate kinds used, in order (with repeats).
    pub fn gates(&self) -> impl Iterator<Item = GateKind> + '_ {
        self.ops.iter().map(|op| op.gate)
    }

    /// Number of parametrized operations.
    pub fn num_parameterized(&self) -> usize {
        self.gates().filter(GateKind::is_parameterized).count()
    }

    /// Circuit depth: the longest chain of operations sharing a qubit.
    pub fn depth(&self) -> usize {
        let mut levels = vec![0_usize; self.num_qubits as usize];
        for op in &self.ops {
            let level = op
                .qubits
                .iter()
                .map(|q| levels[q.index()])
                .max()
                .unwrap_or(0)
                + 1;
            for q in &op.qubits {
                levels[q.index()] = level;
            }
        }
        levels.into_iter().max().unwrap_or(0)
    }
}
