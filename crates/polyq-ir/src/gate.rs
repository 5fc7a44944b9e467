//! Gate kinds understood by the builder and the backends.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis of a single-qubit rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationAxis {
    /// Rotation around X.
    X,
    /// Rotation around Y.
    Y,
    /// Rotation around Z.
    Z,
}

impl fmt::Display for RotationAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationAxis::X => write!(f, "x"),
            RotationAxis::Y => write!(f, "y"),
            RotationAxis::Z => write!(f, "z"),
        }
    }
}

/// The kind of a gate in a [`CircuitSpec`](crate::CircuitSpec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateKind {
    /// Parametrized rotation; the angle comes from the operation operand.
    Rotation(RotationAxis),
    /// Hadamard gate.
    H,
    /// Pauli-X gate.
    X,
    /// Controlled-Z gate.
    CZ,
    /// Controlled-X (CNOT) gate.
    CX,
}

impl GateKind {
    /// OpenQASM 3 style gate name.
    pub fn name(&self) -> &'static str {
        match self {
            GateKind::Rotation(RotationAxis::X) => "rx",
            GateKind::Rotation(RotationAxis::Y) => "ry",
            GateKind::Rotation(RotationAxis::Z) => "rz",
            GateKind::H => "h",
            GateKind::X => "x",
            GateKind::CZ => "cz",
            GateKind::CX => "cx",
        }
    }

    /// Number of qubits the gate acts on.
    pub fn num_qubits(&self) -> u32 {
        match self {
            GateKind::Rotation(_) | GateKind::H | GateKind::X => 1,
            GateKind::CZ | GateKind::CX => 2,
        }
    }

    /// Whether the gate takes an angle operand.
    pub fn is_parameterized(&self) -> bool {
        matches!(self, GateKind::Rotation(_))
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_names() {
        assert_eq!(GateKind::Rotation(RotationAxis::Y).name(), "ry");
        assert_eq!(GateKind::CZ.to_string(), "cz");
    }

    #[test]
    fn test_gate_arity() {
        assert_eq!(GateKind::Rotation(RotationAxis::Z).num_qubits(), 1);
        assert_eq!(GateKind::CX.num_qubits(), 2);
        assert!(GateKind::Rotation(RotationAxis::X).is_parameterized());
        assert!(!GateKind::H.is_parameterized());
    }
}
