//! polyq Variational Classifier
//!
//! This crate turns a circuit-construction function into a trainable
//! classifier. It has three layers:
//!
//! - [`CircuitML`]: runs a parametrized circuit on a whole feature batch with
//!   one backend call and returns an [`OutcomeDistribution`] per sample
//! - [`Classifier`]: maps bitstrings to labels, minimizes the cross-entropy
//!   with a derivative-free [`Method`] and decodes predictions
//! - [`optimizer`]: Nelder-Mead, SPSA and finite-difference BFGS under an
//!   evaluation budget
//!
//! # Example
//!
//! ```ignore
//! use ndarray::array;
//! use polyq_ml::{CircuitML, Classifier, ClassifierConfig, Features, Method, MlResult, ParameterVector};
//! use polyq_ir::{CircuitSpec, QubitId};
//!
//! fn simple(qc: &CircuitML, x: Option<&Features<'_>>, p: &ParameterVector, shots: Option<u32>) -> MlResult<CircuitSpec> {
//!     let x = x.expect("features");
//!     let mut bdr = qc.circuit_builder(x.nrows())?;
//!     bdr.allin_y(x.select(&[0, 1])?.view())?
//!         .cz(QubitId(0), QubitId(1))?
//!         .allin_y(p.select(&[0, 1])?.view())?;
//!     if shots.is_some() {
//!         bdr.measure_all()?;
//!     }
//!     Ok(bdr.circuit()?)
//! }
//!
//! let qc = CircuitML::new(simple, 2, 2, None)?;
//! let mut model = Classifier::new(qc, &["00", "01"], ClassifierConfig::default())?;
//!
//! let x = array![[-1.0, -1.0], [1.0, 1.0]];
//! model.fit(x.view(), &[0, 1], Method::NelderMead)?;
//! let labels = model.predict_label(x.view())?;
//! ```

pub mod circuitml;
pub mod classifier;
pub mod config;
pub mod data;
pub mod distribution;
pub mod error;
pub mod labels;
pub mod metrics;
pub mod optimizer;

pub use circuitml::{CircuitML, MakeCircuit};
pub use classifier::{Classifier, FitOptions, FitReport, TrainedModel, decode_labels};
pub use config::{ClassifierConfig, ShotSchedule};
pub use data::{Features, ParameterVector};
pub use distribution::OutcomeDistribution;
pub use error::{MlError, MlResult};
pub use labels::LabelMap;
pub use optimizer::{CancelToken, Method, OptimizationResult, Optimizer};
