//! Error types for the IR crate.

use crate::qubit::QubitId;
use thiserror::Error;

/// Errors that can occur while building or inspecting a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Operand shape does not match the targeted qubits or the batch.
    #[error("Dimension mismatch: {0}")]
    Dimension(String),

    /// Operation is not allowed in the current builder state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Qubit index outside the circuit register.
    #[error("Qubit {qubit} out of range for a {num_qubits}-qubit circuit{}", format_gate_context(.gate_name))]
    QubitOutOfRange {
        /// The offending qubit.
        qubit: QubitId,
        /// Size of the register.
        num_qubits: u32,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Bitstring contains something other than `0` and `1`, or is empty.
    #[error("Invalid bitstring '{0}'")]
    InvalidBitstring(String),
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
