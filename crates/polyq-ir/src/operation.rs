//! Batched circuit operations.

use serde::{Deserialize, Serialize};

use crate::gate::GateKind;
use crate::qubit::QubitId;

/// Angle source of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// Fixed gate without an angle.
    None,
    /// One angle shared by every sample of the batch (a parameter slice).
    Shared(f64),
    /// One angle per sample (a feature slice); length equals the batch size.
    Batch(Vec<f64>),
}

impl Operand {
    /// Angle applied to batch row `row`, if the operand carries one.
    pub fn angle(&self, row: usize) -> Option<f64> {
        match self {
            Operand::None => None,
            Operand::Shared(theta) => Some(*theta),
            Operand::Batch(angles) => angles.get(row).copied(),
        }
    }
}

/// One gate application, broadcast across the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// The gate.
    pub gate: GateKind,
    /// Target qubits; for controlled gates the control comes first.
    pub qubits: Vec<QubitId>,
    /// Angle operand.
    pub operand: Operand,
}

impl Operation {
    /// A fixed single-qubit gate.
    pub fn fixed(gate: GateKind, qubit: QubitId) -> Self {
        Self {
            gate,
            qubits: vec![qubit],
            operand: Operand::None,
        }
    }

    /// A fixed two-qubit gate.
    pub fn two_qubit(gate: GateKind, first: QubitId, second: QubitId) -> Self {
        Self {
            gate,
            qubits: vec![first, second],
            operand: Operand::None,
        }
    }

    /// A parametrized single-qubit gate.
    pub fn parameterized(gate: GateKind, qubit: QubitId, operand: Operand) -> Self {
        Self {
            gate,
            qubits: vec![qubit],
            operand,
        }
    }

    /// Angle for batch row `row`.
    pub fn angle(&self, row: usize) -> Option<f64> {
        self.operand.angle(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::RotationAxis;

    #[test]
    fn test_shared_operand_broadcasts() {
        let op = Operation::parameterized(
            GateKind::Rotation(RotationAxis::X),
            QubitId(0),
            Operand::Shared(0.5),
        );
        assert_eq!(op.angle(0), Some(0.5));
        assert_eq!(op.angle(99), Some(0.5));
    }

    #[test]
    fn test_batch_operand_per_row() {
        let operand = Operand::Batch(vec![0.1, 0.2]);
        assert_eq!(operand.angle(1), Some(0.2));
        assert_eq!(operand.angle(2), None);
        assert_eq!(Operand::None.angle(0), None);
    }
}
