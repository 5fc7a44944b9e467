//! Batched circuit builder.
//!
//! A [`Builder`] accumulates gate layers for a fixed register over a whole
//! batch of samples, then finalizes into an immutable [`CircuitSpec`].
//!
//! Operands are 2-D matrices with one column per targeted qubit. A matrix with
//! `batch_size` rows gives every sample its own angle (feature data); a single
//! row is broadcast to the whole batch (trainable parameters).
//!
//! ```text
//!   new() ──→ Accumulating ──(rotate / cz / measure_all ...)──→ Accumulating
//!                   │
//!                   └──circuit()──→ Finalized   (every further call fails)
//! ```
//!
//! # Example
//!
//! ```rust
//! use ndarray::array;
//! use polyq_ir::{Builder, QubitId, RotationAxis};
//!
//! let features = array![[0.1, 0.2], [0.3, 0.4], [0.5, 0.6]];
//! let params = array![[1.0, -1.0]];
//!
//! let mut bdr = Builder::new(2, 3).unwrap();
//! bdr.allin_y(features.view())
//!     .unwrap()
//!     .cz(QubitId(0), QubitId(1))
//!     .unwrap()
//!     .rotate(RotationAxis::X, &[QubitId(0), QubitId(1)], params.view())
//!     .unwrap();
//!
//! let spec = bdr.circuit().unwrap();
//! assert_eq!(spec.num_qubits(), 2);
//! assert_eq!(spec.batch_size(), 3);
//! assert!(bdr.circuit().is_err());
//! ```

use ndarray::ArrayView2;
use std::f64::consts::FRAC_PI_2;

use crate::circuit::CircuitSpec;
use crate::error::{IrError, IrResult};
use crate::gate::{GateKind, RotationAxis};
use crate::operation::{Operand, Operation};
use crate::qubit::QubitId;

/// Lifecycle of a [`Builder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Gates may still be appended.
    Accumulating,
    /// `circuit()` was called; the builder is spent.
    Finalized,
}

/// Single-use accumulator of batched circuit operations.
#[derive(Debug)]
pub struct Builder {
    num_qubits: u32,
    batch_size: usize,
    ops: Vec<Operation>,
    measured: bool,
    state: BuilderState,
}

impl Builder {
    /// Create a builder over `num_qubits` qubits and `batch_size` samples.
    pub fn new(num_qubits: u32, batch_size: usize) -> IrResult<Self> {
        if num_qubits == 0 {
            return Err(IrError::Dimension(
                "a circuit needs at least one qubit".into(),
            ));
        }
        if batch_size == 0 {
            return Err(IrError::Dimension("batch size must be at least 1".into()));
        }
        Ok(Self {
            num_qubits,
            batch_size,
            ops: Vec::new(),
            measured: false,
            state: BuilderState::Accumulating,
        })
    }

    /// Number of qubits in the register.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Number of samples in the batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// Number of operations appended so far.
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    // =========================================================================
    // Rotations
    // =========================================================================

    /// Rotate each of `qubits` around `axis`.
    ///
    /// `values` has one column per qubit and either `batch_size` rows or a
    /// single broadcast row.
    pub fn rotate(
        &mut self,
        axis: RotationAxis,
        qubits: &[QubitId],
        values: ArrayView2<'_, f64>,
    ) -> IrResult<&mut Self> {
        self.ensure_accumulating()?;
        let gate = GateKind::Rotation(axis);

        if values.ncols() != qubits.len() {
            return Err(IrError::Dimension(format!(
                "{gate} layer targets {} qubits but operand has {} columns",
                qubits.len(),
                values.ncols()
            )));
        }
        let broadcast = match values.nrows() {
            1 => true,
            n if n == self.batch_size => false,
            n => {
                return Err(IrError::Dimension(format!(
                    "{gate} operand has {n} rows, expected 1 or the batch size {}",
                    self.batch_size
                )));
            }
        };
        for &qubit in qubits {
            self.check_qubit(qubit, gate)?;
        }

        for (&qubit, column) in qubits.iter().zip(values.columns()) {
            let operand = if broadcast {
                Operand::Shared(column[0])
            } else {
                Operand::Batch(column.to_vec())
            };
            self.ops.push(Operation::parameterized(gate, qubit, operand));
        }
        Ok(self)
    }

    /// X rotation on a single qubit from a one-column operand.
    pub fn input(&mut self, qubit: QubitId, values: ArrayView2<'_, f64>) -> IrResult<&mut Self> {
        self.rotate(RotationAxis::X, &[qubit], values)
    }

    /// X rotation on every qubit, column `k` driving qubit `k`.
    pub fn allin(&mut self, values: ArrayView2<'_, f64>) -> IrResult<&mut Self> {
        let qubits = self.all_qubits();
        self.rotate(RotationAxis::X, &qubits, values)
    }

    /// Y rotation on every qubit, column `k` driving qubit `k`.
    pub fn allin_y(&mut self, values: ArrayView2<'_, f64>) -> IrResult<&mut Self> {
        let qubits = self.all_qubits();
        self.rotate(RotationAxis::Y, &qubits, values)
    }

    /// Z rotation on every qubit, column `k` driving qubit `k`.
    pub fn allin_z(&mut self, values: ArrayView2<'_, f64>) -> IrResult<&mut Self> {
        let qubits = self.all_qubits();
        self.rotate(RotationAxis::Z, &qubits, values)
    }

    /// Fixed X rotation of π/2 on every qubit.
    pub fn alldiam(&mut self) -> IrResult<&mut Self> {
        self.ensure_accumulating()?;
        for qubit in self.all_qubits() {
            self.ops.push(Operation::parameterized(
                GateKind::Rotation(RotationAxis::X),
                qubit,
                Operand::Shared(FRAC_PI_2),
            ));
        }
        Ok(self)
    }

    // =========================================================================
    // Fixed gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push_fixed(GateKind::H, qubit)
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.push_fixed(GateKind::X, qubit)
    }

    /// Apply the default entangling gate (controlled-Z) between two qubits.
    pub fn entangle(&mut self, a: QubitId, b: QubitId) -> IrResult<&mut Self> {
        self.cz(a, b)
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, a: QubitId, b: QubitId) -> IrResult<&mut Self> {
        self.push_two_qubit(GateKind::CZ, a, b)
    }

    /// Apply CNOT (CX) gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.push_two_qubit(GateKind::CX, control, target)
    }

    // =========================================================================
    // Measurement and finalization
    // =========================================================================

    /// Measure every qubit at the end of the circuit.
    ///
    /// Only meaningful for finite-shot execution; without it backends return
    /// exact probabilities.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        self.ensure_accumulating()?;
        self.measured = true;
        Ok(self)
    }

    /// Finalize the accumulated operations into a [`CircuitSpec`].
    pub fn circuit(&mut self) -> IrResult<CircuitSpec> {
        self.ensure_accumulating()?;
        self.state = BuilderState::Finalized;
        Ok(CircuitSpec::new(
            self.num_qubits,
            self.batch_size,
            std::mem::take(&mut self.ops),
            self.measured,
        ))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn all_qubits(&self) -> Vec<QubitId> {
        (0..self.num_qubits).map(QubitId).collect()
    }

    fn ensure_accumulating(&self) -> IrResult<()> {
        match self.state {
            BuilderState::Accumulating => Ok(()),
            BuilderState::Finalized => Err(IrError::InvalidState(
                "builder was already finalized by circuit()".into(),
            )),
        }
    }

    fn check_qubit(&self, qubit: QubitId, gate: GateKind) -> IrResult<()> {
        if qubit.0 >= self.num_qubits {
            return Err(IrError::QubitOutOfRange {
                qubit,
                num_qubits: self.num_qubits,
                gate_name: Some(gate.name().to_string()),
            });
        }
        Ok(())
    }

    fn push_fixed(&mut self, gate: GateKind, qubit: QubitId) -> IrResult<&mut Self> {
        self.ensure_accumulating()?;
        self.check_qubit(qubit, gate)?;
        self.ops.push(Operation::fixed(gate, qubit));
        Ok(self)
    }

    fn push_two_qubit(&mut self, gate: GateKind, a: QubitId, b: QubitId) -> IrResult<&mut Self> {
        self.ensure_accumulating()?;
        self.check_qubit(a, gate)?;
        self.check_qubit(b, gate)?;
        if a == b {
            return Err(IrError::Dimension(format!(
                "{gate} needs two distinct qubits, got {a} twice"
            )));
        }
        self.ops.push(Operation::two_qubit(gate, a, b));
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_feature_operand_is_per_row() {
        let x = array![[0.1, 0.2], [0.3, 0.4]];
        let mut bdr = Builder::new(2, 2).unwrap();
        bdr.allin(x.view()).unwrap();
        let spec = bdr.circuit().unwrap();

        assert_eq!(spec.num_ops(), 2);
        assert_eq!(spec.ops()[0].qubits, vec![QubitId(0)]);
        assert_eq!(spec.ops()[0].operand, Operand::Batch(vec![0.1, 0.3]));
        assert_eq!(spec.ops()[1].operand, Operand::Batch(vec![0.2, 0.4]));
    }

    #[test]
    fn test_param_operand_is_broadcast() {
        let p = array![[0.7, -0.7]];
        let mut bdr = Builder::new(2, 5).unwrap();
        bdr.allin_y(p.view()).unwrap();
        let spec = bdr.circuit().unwrap();

        assert_eq!(spec.ops()[1].operand, Operand::Shared(-0.7));
        assert_eq!(spec.ops()[1].angle(4), Some(-0.7));
        assert_eq!(
            spec.ops()[0].gate,
            GateKind::Rotation(RotationAxis::Y)
        );
    }

    #[test]
    fn test_operand_shape_mismatch() {
        let mut bdr = Builder::new(2, 3).unwrap();

        let wrong_cols = array![[0.1, 0.2, 0.3]];
        assert!(matches!(
            bdr.allin(wrong_cols.view()),
            Err(IrError::Dimension(_))
        ));

        let wrong_rows = array![[0.1, 0.2], [0.3, 0.4]];
        assert!(matches!(
            bdr.allin(wrong_rows.view()),
            Err(IrError::Dimension(_))
        ));
        assert_eq!(bdr.num_ops(), 0);
    }

    #[test]
    fn test_qubit_out_of_range() {
        let mut bdr = Builder::new(2, 1).unwrap();
        let result = bdr.cz(QubitId(0), QubitId(2));
        assert!(matches!(
            result,
            Err(IrError::QubitOutOfRange { num_qubits: 2, .. })
        ));
        assert!(matches!(
            bdr.cz(QubitId(1), QubitId(1)),
            Err(IrError::Dimension(_))
        ));
    }

    #[test]
    fn test_finalized_builder_rejects_appends() {
        let mut bdr = Builder::new(1, 1).unwrap();
        bdr.h(QubitId(0)).unwrap();
        let spec = bdr.circuit().unwrap();
        assert_eq!(spec.num_ops(), 1);
        assert_eq!(bdr.state(), BuilderState::Finalized);

        assert!(matches!(bdr.h(QubitId(0)), Err(IrError::InvalidState(_))));
        assert!(matches!(bdr.measure_all(), Err(IrError::InvalidState(_))));
        assert!(matches!(bdr.circuit(), Err(IrError::InvalidState(_))));
    }

    #[test]
    fn test_measure_all_marks_spec() {
        let mut bdr = Builder::new(3, 1).unwrap();
        bdr.alldiam().unwrap().measure_all().unwrap();
        let spec = bdr.circuit().unwrap();
        assert!(spec.is_measured());
        assert_eq!(spec.num_parameterized(), 3);
    }

    #[test]
    fn test_depth() {
        let mut bdr = Builder::new(3, 1).unwrap();
        bdr.h(QubitId(0))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .cx(QubitId(1), QubitId(2))
            .unwrap()
            .x(QubitId(0))
            .unwrap();
        assert_eq!(bdr.circuit().unwrap().depth(), 3);
    }

    #[test]
    fn test_empty_register_rejected() {
        assert!(matches!(Builder::new(0, 1), Err(IrError::Dimension(_))));
        assert!(matches!(Builder::new(1, 0), Err(IrError::Dimension(_))));
    }
}
