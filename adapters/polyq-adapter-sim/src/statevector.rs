//! Statevector simulation engine.

use num_complex::Complex64;
use std::f64::consts::FRAC_1_SQRT_2;

use polyq_hal::{HalError, HalResult};
use polyq_ir::{GateKind, Operation, RotationAxis};

/// A statevector representing a quantum state.
///
/// Qubit `k` is bit `k` of the amplitude index.
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let size = 1 << num_qubits;
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); size];
        amplitudes[0] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Apply one operation as seen by batch row `row`.
    pub fn apply(&mut self, op: &Operation, row: usize) -> HalResult<()> {
        let qubits: Vec<usize> = op.qubits.iter().map(|q| q.index()).collect();
        if qubits.iter().any(|&q| q >= self.num_qubits) {
            return Err(HalError::InvalidCircuit(format!(
                "{} targets a qubit outside the {}-qubit register",
                op.gate, self.num_qubits
            )));
        }

        match op.gate {
            GateKind::Rotation(axis) => {
                let theta = op.angle(row).ok_or_else(|| {
                    HalError::InvalidCircuit(format!("{} has no angle for batch row {row}", op.gate))
                })?;
                match axis {
                    RotationAxis::X => self.apply_rx(qubits[0], theta),
                    RotationAxis::Y => self.apply_ry(qubits[0], theta),
                    RotationAxis::Z => self.apply_rz(qubits[0], theta),
                }
            }
            GateKind::H => self.apply_h(qubits[0]),
            GateKind::X => self.apply_x(qubits[0]),
            GateKind::CZ => self.apply_cz(qubits[0], qubits[1]),
            GateKind::CX => self.apply_cx(qubits[0], qubits[1]),
        }
        Ok(())
    }

    /// Probability of every basis state, indexed by basis index.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(Complex64::norm_sqr).collect()
    }

    // =========================================================================
    // Single-qubit gate implementations
    // =========================================================================

    fn apply_x(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                self.amplitudes.swap(i, j);
            }
        }
    }

    fn apply_h(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = FRAC_1_SQRT_2 * (a + b);
                self.amplitudes[j] = FRAC_1_SQRT_2 * (a - b);
            }
        }
    }

    fn apply_rx(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        let neg_i_s = Complex64::new(0.0, -s);
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a + neg_i_s * b;
                self.amplitudes[j] = neg_i_s * a + c * b;
            }
        }
    }

    fn apply_ry(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = c * a - s * b;
                self.amplitudes[j] = s * a + c * b;
            }
        }
    }

    fn apply_rz(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase_0 = Complex64::from_polar(1.0, -theta / 2.0);
        let phase_1 = Complex64::from_polar(1.0, theta / 2.0);
        for i in 0..(1 << self.num_qubits) {
            if i & mask == 0 {
                self.amplitudes[i] *= phase_0;
            } else {
                self.amplitudes[i] *= phase_1;
            }
        }
    }

    // =========================================================================
    // Two-qubit gate implementations
    // =========================================================================

    fn apply_cx(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..(1 << self.num_qubits) {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                let j = i | tgt_mask;
                self.amplitudes.swap(i, j);
            }
        }
    }

    fn apply_cz(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..(1 << self.num_qubits) {
            if (i & ctrl_mask != 0) && (i & tgt_mask != 0) {
                self.amplitudes[i] = -self.amplitudes[i];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyq_ir::{Operand, QubitId};
    use std::f64::consts::PI;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    fn rotation(axis: RotationAxis, qubit: u32, operand: Operand) -> Operation {
        Operation::parameterized(GateKind::Rotation(axis), QubitId(qubit), operand)
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2);
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(1.0, 0.0)));
        assert_eq!(sv.probabilities(), vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_bell_state() {
        let mut sv = Statevector::new(2);
        sv.apply(&Operation::fixed(GateKind::H, QubitId(0)), 0).unwrap();
        sv.apply(
            &Operation::two_qubit(GateKind::CX, QubitId(0), QubitId(1)),
            0,
        )
        .unwrap();

        let probs = sv.probabilities();
        assert!((probs[0] - 0.5).abs() < 1e-12);
        assert!(probs[1].abs() < 1e-12);
        assert!(probs[2].abs() < 1e-12);
        assert!((probs[3] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ry_pi_flips_qubit_one() {
        let mut sv = Statevector::new(2);
        sv.apply(&rotation(RotationAxis::Y, 1, Operand::Shared(PI)), 0)
            .unwrap();
        // Qubit 1 set: basis index 0b10
        assert!((sv.probabilities()[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_batch_rows_use_their_own_angle() {
        let op = rotation(RotationAxis::X, 0, Operand::Batch(vec![0.0, PI]));

        let mut row0 = Statevector::new(1);
        row0.apply(&op, 0).unwrap();
        let mut row1 = Statevector::new(1);
        row1.apply(&op, 1).unwrap();

        assert!((row0.probabilities()[0] - 1.0).abs() < 1e-12);
        assert!((row1.probabilities()[1] - 1.0).abs() < 1e-12);

        let mut row2 = Statevector::new(1);
        assert!(matches!(
            row2.apply(&op, 2),
            Err(HalError::InvalidCircuit(_))
        ));
    }

    #[test]
    fn test_rz_preserves_probabilities() {
        let mut sv = Statevector::new(1);
        sv.apply(&Operation::fixed(GateKind::H, QubitId(0)), 0).unwrap();
        sv.apply(&rotation(RotationAxis::Z, 0, Operand::Shared(1.234)), 0)
            .unwrap();
        let probs = sv.probabilities();
        assert!((probs[0] - 0.5).abs() < 1e-12);
        assert!((probs[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_cz_phase_only_on_11() {
        let mut sv = Statevector::new(2);
        sv.apply_x(0);
        sv.apply_x(1);
        sv.apply_cz(0, 1);
        assert!(approx_eq(sv.amplitudes[3], Complex64::new(-1.0, 0.0)));
    }

    #[test]
    fn test_out_of_range_qubit() {
        let mut sv = Statevector::new(1);
        let op = Operation::fixed(GateKind::X, QubitId(3));
        assert!(sv.apply(&op, 0).is_err());
    }
}
