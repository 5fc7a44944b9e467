//! polyq Circuit Representation
//!
//! This crate provides the backend-agnostic circuit layer of polyq: a
//! batched [`Builder`] that user circuit functions drive, and the immutable
//! [`CircuitSpec`] it produces for backend adapters to execute.
//!
//! # Overview
//!
//! A circuit is built once per (parameter vector, feature batch) pair rather
//! than once per sample. Rotation operands are matrices whose rows are batch
//! samples and whose columns are the targeted qubits, so a single builder call
//! encodes a feature column for every sample at once.
//!
//! # Core Components
//!
//! - **Qubits**: [`QubitId`] addresses a qubit in the register
//! - **Gates**: [`GateKind`] with parametrized [`RotationAxis`] rotations
//! - **Operations**: [`Operation`] pairs a gate with its [`Operand`]
//! - **Builder**: [`Builder`] accumulates operations, single use
//! - **Spec**: [`CircuitSpec`] finalized batched circuit
//! - **Bitstrings**: [`Bitstring`] measurement outcomes, qubit `k` at position `k`
//!
//! # Example: A Two-Qubit Encoding Circuit
//!
//! ```rust
//! use ndarray::array;
//! use polyq_ir::{Builder, QubitId};
//!
//! // Two samples, two features each
//! let x = array![[0.5, -0.5], [1.0, 0.0]];
//! // Two trainable angles shared by the batch
//! let theta = array![[0.3, 0.9]];
//!
//! let mut bdr = Builder::new(2, 2).unwrap();
//! bdr.allin_y(x.view()).unwrap();
//! bdr.cz(QubitId(0), QubitId(1)).unwrap();
//! bdr.allin(theta.view()).unwrap();
//!
//! let spec = bdr.circuit().unwrap();
//! assert_eq!(spec.num_ops(), 5);
//! assert!(!spec.is_measured());
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `rx`, `ry`, `rz` | 1 | Rotations, angle from a feature or parameter operand |
//! | `h` | 1 | Hadamard gate |
//! | `x` | 1 | Pauli-X gate |
//! | `cz` | 2 | Controlled-Z, the default entangler |
//! | `cx` | 2 | Controlled-NOT (CNOT) |

pub mod bitstring;
pub mod builder;
pub mod circuit;
pub mod error;
pub mod gate;
pub mod operation;
pub mod qubit;

pub use bitstring::Bitstring;
pub use builder::{Builder, BuilderState};
pub use circuit::CircuitSpec;
pub use error::{IrError, IrResult};
pub use gate::{GateKind, RotationAxis};
pub use operation::{Operand, Operation};
pub use qubit::QubitId;
