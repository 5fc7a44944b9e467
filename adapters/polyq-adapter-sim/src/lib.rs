//! polyq Local Statevector Simulator
//!
//! This crate provides the local backend used to train and evaluate
//! classifiers. Each batch row is simulated on its own statevector, which
//! gives exact results but is limited to ~20-25 qubits.
//!
//! # Modes
//!
//! - **Exact** (`shots = None`): full basis-state probability vector per row
//! - **Sampling** (`shots = Some(n)`): `n` measurements per row, returned as
//!   counts; requires a circuit finalized after `measure_all`
//!
//! # Performance
//!
//! | Qubits | Memory per row | Simulation Speed |
//! |--------|----------------|------------------|
//! | 10 | ~16 KB | Instant |
//! | 15 | ~512 KB | Fast |
//! | 20 | ~16 MB | Moderate |
//!
//! # Example
//!
//! ```ignore
//! use ndarray::array;
//! use polyq_adapter_sim::SimulatorBackend;
//! use polyq_hal::Backend;
//! use polyq_ir::{Builder, QubitId};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SimulatorBackend::new().with_seed(42);
//!
//!     let mut bdr = Builder::new(2, 2)?;
//!     bdr.allin(array![[0.1, 0.2], [1.0, 2.0]].view())?
//!         .cz(QubitId(0), QubitId(1))?
//!         .measure_all()?;
//!     let circuit = bdr.circuit()?;
//!
//!     let result = backend.execute(&circuit, Some(1000)).await?;
//!     println!("Row outcomes: {:?}", result.outcomes);
//!     Ok(())
//! }
//! ```

mod simulator;
mod statevector;

pub use simulator::SimulatorBackend;
