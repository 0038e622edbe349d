//! Backend registry: construct-once map of selector -> LLM client handle.
//!
//! Replaces ambient per-process client caches with an explicitly owned
//! registry built at startup and shared by `Arc`. No interior mutability:
//! after `build()` the set of backends is fixed, so concurrent sessions can
//! read it without coordination.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SessionError;
use crate::llm::LlmClient;

/// Immutable selector -> client map, shared across sessions.
///
/// **Interaction**: Built once by the embedding application (e.g. the CLI),
/// passed into `Session::open`; `get` clones the `Arc` handle so expensive
/// clients are constructed exactly once.
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn LlmClient>>,
}

impl BackendRegistry {
    /// Starts an empty registry builder.
    pub fn builder() -> BackendRegistryBuilder {
        BackendRegistryBuilder {
            backends: HashMap::new(),
        }
    }

    /// Looks up a backend by selector.
    pub fn get(&self, selector: &str) -> Result<Arc<dyn LlmClient>, SessionError> {
        self.backends.get(selector).cloned().ok_or_else(|| {
            SessionError::Configuration(format!(
                "unknown backend selector: {} (registered: {})",
                selector,
                self.selectors().join(", ")
            ))
        })
    }

    /// Registered selector names, sorted for stable error messages.
    pub fn selectors(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Builder for `BackendRegistry`; registration happens only here.
pub struct BackendRegistryBuilder {
    backends: HashMap<String, Arc<dyn LlmClient>>,
}

impl BackendRegistryBuilder {
    /// Registers a client under a selector name. Later registrations of the
    /// same selector replace earlier ones.
    pub fn register(mut self, selector: impl Into<String>, client: Arc<dyn LlmClient>) -> Self {
        self.backends.insert(selector.into(), client);
        self
    }

    /// Finalizes the registry. At least one backend must be registered.
    pub fn build(self) -> Result<BackendRegistry, SessionError> {
        if self.backends.is_empty() {
            return Err(SessionError::Configuration(
                "no backends registered".to_string(),
            ));
        }
        Ok(BackendRegistry {
            backends: self.backends,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;

    /// **Scenario**: a registered backend is returned; the same Arc is shared.
    #[test]
    fn get_returns_registered_handle() {
        let client: Arc<dyn LlmClient> = Arc::new(MockLlm::repeating("x"));
        let registry = BackendRegistry::builder()
            .register("mock", Arc::clone(&client))
            .build()
            .unwrap();
        let got = registry.get("mock").unwrap();
        assert!(Arc::ptr_eq(&got, &client));
    }

    /// **Scenario**: unknown selector is a Configuration error naming the
    /// registered selectors.
    #[test]
    fn get_unknown_selector_is_configuration_error() {
        let registry = BackendRegistry::builder()
            .register("mock", Arc::new(MockLlm::repeating("x")) as Arc<dyn LlmClient>)
            .build()
            .unwrap();
        let err = registry.get("gpt-x").unwrap_err();
        match err {
            SessionError::Configuration(msg) => assert!(msg.contains("mock")),
            other => panic!("expected Configuration, got {:?}", other),
        }
    }

    /// **Scenario**: an empty registry fails to build.
    #[test]
    fn empty_registry_rejected() {
        assert!(matches!(
            BackendRegistry::builder().build(),
            Err(SessionError::Configuration(_))
        ));
    }
}
