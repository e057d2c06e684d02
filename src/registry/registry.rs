use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::target::{Decomposer, SecondaryPattern, TargetUrl};

use super::extract::{self, ValidationError, is_secure_variant};
use super::traits::Backend;
use super::types::{ArgumentSet, NotifierDescriptor};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
}

/// Backend selected for a scheme
#[derive(Clone)]
pub struct Resolution {
    backend: Arc<dyn Backend>,
    secure: bool,
}

impl Resolution {
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn descriptor(&self) -> &NotifierDescriptor {
        self.backend.descriptor()
    }

    pub fn secure(&self) -> bool {
        self.secure
    }
}

/// Registry mapping schemes to backends
///
/// Populated once at start; shared read-only afterwards.
#[derive(Clone, Default)]
pub struct SchemaRegistry {
    backends: BTreeMap<&'static str, Arc<dyn Backend>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            backends: BTreeMap::new(),
        }
    }

    /// Register a backend under its descriptor's scheme, replacing any previous entry
    pub fn register(&mut self, backend: Arc<dyn Backend>) {
        let scheme = backend.descriptor().scheme;
        if self.backends.insert(scheme, backend).is_some() {
            debug!(scheme, "Replaced registered backend");
        }
    }

    pub fn resolve(&self, scheme: &str) -> Result<Resolution, RegistryError> {
        let scheme = scheme.to_lowercase();

        if let Some(backend) = self.backends.get(scheme.as_str()) {
            return Ok(Resolution {
                backend: backend.clone(),
                secure: false,
            });
        }

        scheme
            .strip_suffix('s')
            .and_then(|base| self.backends.get(base))
            .filter(|backend| is_secure_variant(backend.descriptor(), &scheme))
            .map(|backend| Resolution {
                backend: backend.clone(),
                secure: true,
            })
            .ok_or_else(|| RegistryError::UnsupportedScheme(scheme.clone()))
    }

    pub fn extract(
        &self,
        resolution: &Resolution,
        target: &TargetUrl,
    ) -> Result<ArgumentSet, ValidationError> {
        extract::extract(resolution.descriptor(), target)
    }

    pub fn has_scheme(&self, scheme: &str) -> bool {
        self.resolve(scheme).is_ok()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &NotifierDescriptor> {
        self.backends.values().map(|b| b.descriptor())
    }

    pub fn secondary_patterns(&self) -> impl Iterator<Item = &SecondaryPattern> {
        self.descriptors().filter_map(|d| d.rescue.as_ref())
    }

    /// Decomposer carrying every registered secondary pattern
    pub fn decomposer(&self, default_scheme: &str) -> Decomposer<'_> {
        Decomposer::new(default_scheme).with_patterns(self.secondary_patterns())
    }

    /// Create registry with the bundled backends
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        crate::backends::register_defaults(&mut registry);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::{HttpSettings, Notifier, NotifyError};
    use crate::registry::types::{FieldRule, FieldSource};

    struct Stub(NotifierDescriptor);

    impl Backend for Stub {
        fn descriptor(&self) -> &NotifierDescriptor {
            &self.0
        }

        fn build(
            &self,
            _args: &ArgumentSet,
            _http: &HttpSettings,
        ) -> Result<Box<dyn Notifier>, NotifyError> {
            Err(NotifyError::Transport("stub".to_string()))
        }
    }

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register(Arc::new(Stub(
            NotifierDescriptor::new("web", "web")
                .secure_variant()
                .field(FieldRule::required("host", FieldSource::Host)),
        )));
        registry.register(Arc::new(Stub(NotifierDescriptor::new("plain", "plain"))));
        registry
    }

    #[test]
    fn test_resolve_exact() {
        let registry = registry();
        let resolution = registry.resolve("WEB").unwrap();
        assert_eq!(resolution.descriptor().backend, "web");
        assert!(!resolution.secure());
    }

    #[test]
    fn test_resolve_secure_variant() {
        let registry = registry();
        let resolution = registry.resolve("webs").unwrap();
        assert_eq!(resolution.descriptor().scheme, "web");
        assert!(resolution.secure());

        // Only descriptors that opt in get the secure variant
        assert_eq!(
            registry.resolve("plains").err(),
            Some(RegistryError::UnsupportedScheme("plains".to_string()))
        );
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = registry();
        assert!(matches!(
            registry.resolve("bogus"),
            Err(RegistryError::UnsupportedScheme(s)) if s == "bogus"
        ));
        assert!(!registry.has_scheme("s"));
    }

    #[test]
    fn test_defaults_registered() {
        let registry = SchemaRegistry::with_defaults();
        for scheme in ["json", "jsons", "pover", "tgram", "pbul", "prowl"] {
            assert!(registry.has_scheme(scheme), "{scheme} should resolve");
        }
        assert_eq!(registry.secondary_patterns().count(), 1);
    }
}
