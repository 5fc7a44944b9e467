//! Backend capability descriptions.

use serde::{Deserialize, Serialize};

use polyq_ir::{CircuitSpec, GateKind, RotationAxis};

/// Static description of what a backend can execute.
///
/// Capabilities are cached at backend construction and never require I/O.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the backend.
    pub name: String,
    /// Number of qubits available.
    pub num_qubits: u32,
    /// Supported gate set (OpenQASM 3 naming convention).
    pub gate_set: GateSet,
    /// Maximum number of shots per batch row.
    pub max_shots: u32,
    /// Maximum number of batch rows per job. `None` means no limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_batch_size: Option<usize>,
    /// Whether exact probabilities (`shots = None`) can be returned.
    pub supports_exact: bool,
    /// Whether this is a simulator or emulator (`true`) vs real hardware (`false`).
    pub is_simulator: bool,
    /// Additional capability flags, e.g. `"statevector"`, `"sampling"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Capabilities {
    /// Create capabilities for a statevector simulator.
    pub fn simulator(num_qubits: u32) -> Self {
        Self {
            name: "simulator".into(),
            num_qubits,
            gate_set: GateSet::universal(),
            max_shots: 1_000_000,
            max_batch_size: None,
            supports_exact: true,
            is_simulator: true,
            features: vec!["statevector".into(), "sampling".into()],
        }
    }

    /// Create capabilities for a sampling-only device.
    pub fn hardware(
        name: impl Into<String>,
        num_qubits: u32,
        gate_set: GateSet,
        max_shots: u32,
    ) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            gate_set,
            max_shots,
            max_batch_size: None,
            supports_exact: false,
            is_simulator: false,
            features: vec!["sampling".into()],
        }
    }

    /// Set the batch row limit.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = Some(max_batch_size);
        self
    }

    /// Reasons why `circuit` cannot run with `shots` on this backend.
    ///
    /// An empty list means the circuit is acceptable.
    pub fn violations(&self, circuit: &CircuitSpec, shots: Option<u32>) -> Vec<String> {
        let mut reasons = Vec::new();

        if circuit.num_qubits() > self.num_qubits {
            reasons.push(format!(
                "circuit uses {} qubits, backend has {}",
                circuit.num_qubits(),
                self.num_qubits
            ));
        }
        if let Some(max) = self.max_batch_size {
            if circuit.batch_size() > max {
                reasons.push(format!(
                    "batch of {} rows exceeds the limit of {max}",
                    circuit.batch_size()
                ));
            }
        }
        match shots {
            None if !self.supports_exact => {
                reasons.push("exact execution is not supported".into());
            }
            Some(0) => reasons.push("shots must be positive".into()),
            Some(n) if n > self.max_shots => {
                reasons.push(format!("{n} shots exceed the limit of {}", self.max_shots));
            }
            _ => {}
        }

        let mut unsupported: Vec<&str> = circuit
            .gates()
            .filter(|g| !self.gate_set.contains(*g))
            .map(|g| g.name())
            .collect();
        unsupported.sort_unstable();
        unsupported.dedup();
        if !unsupported.is_empty() {
            reasons.push(format!("unsupported gates: {}", unsupported.join(", ")));
        }

        reasons
    }
}

/// Set of gate names a backend executes natively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSet {
    /// Gate names.
    pub gates: Vec<String>,
}

impl GateSet {
    /// Every gate the builder can emit.
    pub fn universal() -> Self {
        Self::from_kinds([
            GateKind::Rotation(RotationAxis::X),
            GateKind::Rotation(RotationAxis::Y),
            GateKind::Rotation(RotationAxis::Z),
            GateKind::H,
            GateKind::X,
            GateKind::CZ,
            GateKind::CX,
        ])
    }

    /// Build a gate set from gate kinds.
    pub fn from_kinds(kinds: impl IntoIterator<Item = GateKind>) -> Self {
        Self {
            gates: kinds.into_iter().map(|k| k.name().to_string()).collect(),
        }
    }

    /// Whether `gate` is in the set.
    pub fn contains(&self, gate: GateKind) -> bool {
        self.gates.iter().any(|g| g == gate.name())
    }
}
