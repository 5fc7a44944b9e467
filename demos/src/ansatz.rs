//! Classifier circuits used by the demos.
//!
//! Each circuit comes as a construction callback plus a constructor that
//! binds it to a backend. The callbacks measure exactly when shots are
//! requested.

use std::sync::Arc;

use polyq_hal::Backend;
use polyq_ir::{CircuitSpec, QubitId};
use polyq_ml::{CircuitML, Features, MlResult, ParameterVector};

/// Label bitstrings of the XOR circuit (label 0, label 1).
pub const XOR_BITSTRINGS: [&str; 2] = ["00", "01"];

/// Trainable parameters of the XOR circuit.
pub const XOR_PARAMS: usize = 4;

/// Label bitstrings of the iris circuit, one per class.
pub const IRIS_BITSTRINGS: [&str; 3] = ["00", "01", "10"];

/// Trainable parameters of the iris circuit.
pub const IRIS_PARAMS: usize = 8;

/// XOR classifier on two qubits.
///
/// ```text
/// q0: ─RY(x0)──●──RY(p0)──■──RY(p2)─
///              │          │
/// q1: ─RY(x1)──X──RY(p1)──■──RY(p3)─
/// ```
///
/// The CNOT writes the feature parity onto qubit 1, which carries the label.
pub fn xor_encoder(
    qc: &CircuitML,
    x: Option<&Features<'_>>,
    p: &ParameterVector,
    shots: Option<u32>,
) -> MlResult<CircuitSpec> {
    let batch = x.map_or(1, |x| x.nrows());
    let mut bdr = qc.circuit_builder(batch)?;
    if let Some(x) = x {
        bdr.allin_y(x.select(&[0, 1])?.view())?;
    }
    bdr.cx(QubitId(0), QubitId(1))?;
    bdr.allin_y(p.select(&[0, 1])?.view())?;
    bdr.entangle(QubitId(0), QubitId(1))?;
    bdr.allin_y(p.select(&[2, 3])?.view())?;
    if shots.is_some() {
        bdr.measure_all()?;
    }
    Ok(bdr.circuit()?)
}

/// Iris-style classifier: four features on two qubits, two re-uploading
/// layers.
pub fn iris_encoder(
    qc: &CircuitML,
    x: Option<&Features<'_>>,
    p: &ParameterVector,
    shots: Option<u32>,
) -> MlResult<CircuitSpec> {
    let batch = x.map_or(1, |x| x.nrows());
    let mut bdr = qc.circuit_builder(batch)?;

    if let Some(x) = x {
        bdr.allin_y(x.select(&[0, 1])?.view())?;
    }
    bdr.allin_y(p.select(&[0, 1])?.view())?;
    bdr.entangle(QubitId(0), QubitId(1))?;

    if let Some(x) = x {
        bdr.allin(x.select(&[2, 3])?.view())?;
    }
    bdr.allin_y(p.select(&[2, 3])?.view())?;
    bdr.cx(QubitId(0), QubitId(1))?;

    bdr.allin_y(p.select(&[4, 5])?.view())?;
    bdr.entangle(QubitId(0), QubitId(1))?;
    bdr.allin(p.select(&[6, 7])?.view())?;

    if shots.is_some() {
        bdr.measure_all()?;
    }
    Ok(bdr.circuit()?)
}

/// XOR engine on `backend` (the local simulator when `None`).
pub fn xor_circuit(backend: Option<Arc<dyn Backend>>) -> MlResult<CircuitML> {
    Ok(CircuitML::new(xor_encoder, 2, XOR_PARAMS, backend)?.with_nbfeatures(2))
}

/// Iris engine on `backend` (the local simulator when `None`).
pub fn iris_circuit(backend: Option<Arc<dyn Backend>>) -> MlResult<CircuitML> {
    Ok(CircuitML::new(iris_encoder, 2, IRIS_PARAMS, backend)?.with_nbfeatures(4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_xor_parity_with_known_params() {
        let qc = xor_circuit(None).unwrap();
        let x = array![[0.0, 0.0], [0.0, PI], [PI, 0.0], [PI, PI]];
        // Half-turn on qubit 0 keeps mass in the labelled slice for every corner
        let params = ParameterVector::new(vec![FRAC_PI_2, 0.0, 0.0, 0.0]);

        let dists = qc.run(&params, Some(&Features::from(&x)), None).unwrap();
        let p1: Vec<f64> = dists
            .iter()
            .map(|d| {
                let s = d.as_slice();
                // "01" is basis index 2
                s[2] / (s[0] + s[2])
            })
            .collect();

        assert!(p1[0] < 1e-9);
        assert!((p1[1] - 1.0).abs() < 1e-9);
        assert!((p1[2] - 1.0).abs() < 1e-9);
        assert!(p1[3] < 1e-9);
    }

    #[test]
    fn test_iris_circuit_shapes() {
        let qc = iris_circuit(None).unwrap();
        assert_eq!(qc.nbparams(), IRIS_PARAMS);

        let x = array![[0.1, 0.2, 0.3, 0.4], [1.0, 1.1, 1.2, 1.3]];
        let spec = qc
            .make_circuit(&ParameterVector::zeros(IRIS_PARAMS), Some(&Features::from(&x)), Some(100))
            .unwrap();
        assert_eq!(spec.batch_size(), 2);
        assert!(spec.is_measured());

        let narrow = array![[0.1, 0.2]];
        assert!(
            qc.run(&ParameterVector::zeros(IRIS_PARAMS), Some(&Features::from(&narrow)), None)
                .is_err()
        );
    }
}
