//! polyq Hardware Abstraction Layer
//!
//! This crate provides the single interface through which polyq executes
//! batched circuits, so the same circuit function runs unmodified on an exact
//! simulator, a shot-sampling simulator, or a remote device.
//!
//! # Overview
//!
//! The HAL abstracts away backend-specific details, providing:
//! - A common [`Backend`] trait for execution and job management
//! - [`Capabilities`] to describe qubit counts, gate sets and shot limits
//! - Unified result handling via [`ExecutionResult`], [`Outcome`] and [`Counts`]
//! - A [`BackendRegistry`] to create backends by name from [`BackendConfig`]
//!
//! # Implementing a Custom Backend
//!
//! ```ignore
//! use polyq_hal::{
//!     Backend, BackendAvailability, Capabilities, ExecutionResult, HalResult,
//!     JobId, JobStatus,
//! };
//! use polyq_ir::CircuitSpec;
//! use async_trait::async_trait;
//!
//! struct MyBackend {
//!     capabilities: Capabilities,
//! }
//!
//! #[async_trait]
//! impl Backend for MyBackend {
//!     fn name(&self) -> &str { "my_backend" }
//!
//!     fn capabilities(&self) -> &Capabilities {
//!         &self.capabilities
//!     }
//!
//!     async fn availability(&self) -> HalResult<BackendAvailability> {
//!         Ok(BackendAvailability::always_available())
//!     }
//!
//!     async fn submit(&self, circuit: &CircuitSpec, shots: Option<u32>) -> HalResult<JobId> {
//!         // Translate every batch row and enqueue it on the device
//!         # todo!()
//!     }
//!
//!     async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
//!         # todo!()
//!     }
//!
//!     async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
//!         // One Outcome per batch row
//!         # todo!()
//!     }
//!
//!     async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
//!         # todo!()
//!     }
//! }
//! ```

pub mod backend;
pub mod capability;
pub mod error;
pub mod job;
pub mod registry;
pub mod result;

pub use backend::{Backend, BackendAvailability, BackendConfig, BackendFactory, ValidationResult};
pub use capability::{Capabilities, GateSet};
pub use error::{HalError, HalResult};
pub use job::{Job, JobId, JobStatus};
pub use registry::BackendRegistry;
pub use result::{Counts, ExecutionResult, Outcome};
