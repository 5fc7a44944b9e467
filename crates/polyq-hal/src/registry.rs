//! Backend registry for managing available backends.
//!
//! The [`BackendRegistry`] lets driver code pick a backend by name at runtime
//! ("train on `sim`, evaluate on `sampler`") without naming concrete types.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::backend::{Backend, BackendConfig, BackendFactory};
use crate::error::{HalError, HalResult};

/// Factory function type for registered backends.
type Factory = Box<dyn Fn(BackendConfig) -> HalResult<Arc<dyn Backend>> + Send + Sync>;

/// Central registry of backend factories keyed by name.
pub struct BackendRegistry {
    factories: FxHashMap<String, Factory>,
}

impl BackendRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: FxHashMap::default(),
        }
    }

    /// Register a backend type that can be built from configuration.
    pub fn register<B>(&mut self, name: impl Into<String>)
    where
        B: BackendFactory + 'static,
    {
        let name = name.into();
        debug!("Registering backend: {}", name);
        let factory: Factory = Box::new(|config: BackendConfig| {
            let backend: Arc<dyn Backend> = Arc::new(B::from_config(config)?);
            Ok(backend)
        });
        self.factories.insert(name, factory);
    }

    /// Register a backend factory with a custom constructor.
    pub fn register_factory(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(BackendConfig) -> HalResult<Arc<dyn Backend>> + Send + Sync + 'static,
    ) {
        let name = name.into();
        debug!("Registering factory backend: {}", name);
        self.factories.insert(name, Box::new(factory));
    }

    /// Create a backend by name.
    pub fn create(&self, name: &str, config: BackendConfig) -> HalResult<Arc<dyn Backend>> {
        match self.factories.get(name) {
            Some(factory) => factory(config),
            None => Err(HalError::BackendUnavailable(format!(
                "No backend registered with name '{name}' (available: {})",
                self.available().join(", ")
            ))),
        }
    }

    /// Names of all registered backends, sorted.
    pub fn available(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether a backend is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendAvailability;
    use crate::capability::Capabilities;
    use crate::job::{JobId, JobStatus};
    use crate::result::ExecutionResult;
    use async_trait::async_trait;
    use polyq_ir::CircuitSpec;

    struct NullBackend {
        name: String,
        capabilities: Capabilities,
    }

    #[async_trait]
    impl Backend for NullBackend {
        fn name(&self) -> &str {
            &self.name
        }

        fn capabilities(&self) -> &Capabilities {
            &self.capabilities
        }

        async fn availability(&self) -> HalResult<BackendAvailability> {
            Ok(BackendAvailability::unavailable("offline"))
        }

        async fn submit(&self, _circuit: &CircuitSpec, _shots: Option<u32>) -> HalResult<JobId> {
            Err(HalError::BackendUnavailable("offline".into()))
        }

        async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
            Err(HalError::JobNotFound(job_id.0.clone()))
        }

        async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
            Err(HalError::JobNotFound(job_id.0.clone()))
        }

        async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
            Err(HalError::JobNotFound(job_id.0.clone()))
        }
    }

    impl BackendFactory for NullBackend {
        fn from_config(config: BackendConfig) -> HalResult<Self> {
            Ok(Self {
                name: config.name,
                capabilities: Capabilities::simulator(2),
            })
        }
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = BackendRegistry::new();
        registry.register::<NullBackend>("null");

        assert!(registry.contains("null"));
        let backend = registry.create("null", BackendConfig::new("null-1")).unwrap();
        assert_eq!(backend.name(), "null-1");
    }

    #[test]
    fn test_unknown_backend() {
        let mut registry = BackendRegistry::new();
        registry.register::<NullBackend>("null");

        let err = registry
            .create("ibm", BackendConfig::new("ibm"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("available: null"));
    }
}
