use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::score::{RawScore, ScoreKind};

use super::backend::DetectorBackend;

/// Thread-safe registry of detector backends.
///
/// Backends are wrapped in `Mutex` because `DetectorBackend::detect`
/// takes `&mut self`.
pub struct BackendRegistry {
    backends: HashMap<String, Arc<Mutex<dyn DetectorBackend>>>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: DetectorBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, Arc::new(Mutex::new(backend)));
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.backends.contains_key(name) {
            return Err(anyhow!("backend '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    /// Get backend by name.
    pub fn get(&self, name: &str) -> Option<Arc<Mutex<dyn DetectorBackend>>> {
        self.backends.get(name).cloned()
    }

    /// Get default backend.
    pub fn default_backend(&self) -> Option<Arc<Mutex<dyn DetectorBackend>>> {
        self.default_name.as_ref().and_then(|name| self.get(name))
    }

    /// List registered backends.
    pub fn list(&self) -> Vec<String> {
        self.backends.keys().cloned().collect()
    }

    /// Select a backend producing the requested score kind.
    ///
    /// Prefers the default backend when it matches.
    pub fn backend_for_kind(&self, kind: ScoreKind) -> Result<Arc<Mutex<dyn DetectorBackend>>> {
        if let Some(default_backend) = self.default_backend() {
            let matches = {
                let guard = default_backend
                    .lock()
                    .map_err(|_| anyhow!("default backend lock poisoned"))?;
                guard.kind() == kind
            };
            if matches {
                return Ok(default_backend);
            }
        }

        for backend in self.backends.values() {
            let matches = {
                let guard = backend
                    .lock()
                    .map_err(|_| anyhow!("backend lock poisoned"))?;
                guard.kind() == kind
            };
            if matches {
                return Ok(backend.clone());
            }
        }

        Err(anyhow!("no registered backend produces {:?} scores", kind))
    }

    /// Run detection using the default backend.
    pub fn detect(&self, pixels: &[u8], width: u32, height: u32) -> Result<Option<RawScore>> {
        let backend = self
            .default_backend()
            .ok_or_else(|| anyhow!("no backend registered"))?;
        let mut guard = backend
            .lock()
            .map_err(|_| anyhow!("backend lock poisoned"))?;
        guard.detect(pixels, width, height)
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
    use crate::detect::synthetic::ScriptedBackend;

    #[test]
    fn first_registered_backend_is_the_default() {
        let mut registry = BackendRegistry::new();
        registry.register(ScriptedBackend::new("scripted-ear", vec![Some(0.3)]));
        let backend = registry.default_backend().expect("default backend");
        assert_eq!(backend.lock().expect("lock").name(), "scripted-ear");
    }

    #[test]
    fn lookup_by_kind_finds_a_matching_backend() {
        let mut registry = BackendRegistry::new();
        registry.register(ScriptedBackend::new("scripted-ear", vec![Some(0.3)]));
        assert!(registry.backend_for_kind(ScoreKind::GeometricRatio).is_ok());
        assert!(registry
            .backend_for_kind(ScoreKind::ClassifierConfidence)
            .is_err());
    }

    #[test]
    fn set_default_rejects_unknown_names() {
        let mut registry = BackendRegistry::new();
        assert!(registry.set_default("nope").is_err());
    }
}
