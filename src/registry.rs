//! Per-run cache of model handles.

use crate::backend::{LanguageModel, ModelFactory};
use crate::config::{ModelDefinition, ModelSpec};
use crate::error::{ChainError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Instantiates the models a config declares, building each at most once.
///
/// A registry belongs to a single chain execution; it is never shared
/// between runs. If two definitions share a name, the later one wins.
pub struct ModelRegistry {
    defs: HashMap<String, ModelSpec>,
    cache: HashMap<String, Arc<dyn LanguageModel>>,
    factory: Arc<dyn ModelFactory>,
}

impl ModelRegistry {
    pub fn new<'a>(
        definitions: impl IntoIterator<Item = &'a ModelDefinition>,
        factory: Arc<dyn ModelFactory>,
    ) -> Self {
        let defs = definitions
            .into_iter()
            .map(|d| (d.name.clone(), d.spec.clone()))
            .collect();
        Self {
            defs,
            cache: HashMap::new(),
            factory,
        }
    }

    /// The handle for a declared model, built on first use.
    pub fn get(&mut self, name: &str) -> Result<Arc<dyn LanguageModel>> {
        if let Some(model) = self.cache.get(name) {
            return Ok(Arc::clone(model));
        }
        let spec = self
            .defs
            .get(name)
            .ok_or_else(|| ChainError::UnknownModel(name.to_string()))?;
        tracing::debug!(model = name, provider = %spec.provider, "building model");
        let model = self.factory.build(spec)?;
        self.cache.insert(name.to_string(), Arc::clone(&model));
        Ok(model)
    }

    /// A fresh handle for an inline definition. Never cached.
    pub fn from_inline(&self, spec: &ModelSpec) -> Result<Arc<dyn LanguageModel>> {
        tracing::debug!(model = %spec.model, provider = %spec.provider, "building inline model");
        self.factory.build(spec)
    }

    /// Whether `name` was declared.
    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("declared", &self.defs.len())
            .field("cached", &self.cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockFactory, MockModel, ProviderFactory};
    use serde_json::json;

    fn def(name: &str, model: &str) -> ModelDefinition {
        ModelDefinition {
            name: name.into(),
            spec: ModelSpec::new("ollama", model),
        }
    }

    fn counting_factory() -> Arc<MockFactory> {
        Arc::new(MockFactory::new(|spec| {
            Arc::new(MockModel::fixed(spec.model.clone())) as Arc<dyn LanguageModel>
        }))
    }

    #[test]
    fn test_get_caches_instances() {
        let factory = counting_factory();
        let defs = [def("foo", "bar")];
        let mut registry = ModelRegistry::new(&defs, factory.clone());

        let first = registry.get("foo").unwrap();
        let second = registry.get("foo").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.builds(), 1);
    }

    #[test]
    fn test_get_unknown_model_ref() {
        let mut registry = ModelRegistry::new(&[], counting_factory());
        let Err(err) = registry.get("missing") else {
            panic!("undeclared model resolved");
        };
        assert_eq!(err.to_string(), "unknown modelRef: missing");
    }

    #[test]
    fn test_from_inline_never_cached() {
        let factory = counting_factory();
        let registry = ModelRegistry::new(&[], factory.clone());
        let spec = ModelSpec::new("ollama", "inline-model")
            .with_base_url("http://ollama")
            .with_param("temperature", json!(0.0));

        let a = registry.from_inline(&spec).unwrap();
        let b = registry.from_inline(&spec).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(factory.builds(), 2);
    }

    #[test]
    fn test_factory_receives_full_spec() {
        let seen = Arc::new(std::sync::Mutex::new(None));
        let captured = Arc::clone(&seen);
        let factory = Arc::new(MockFactory::new(move |spec| {
            *captured.lock().unwrap() = Some(spec.clone());
            Arc::new(MockModel::fixed("ok")) as Arc<dyn LanguageModel>
        }));
        let defs = [ModelDefinition {
            name: "demo".into(),
            spec: ModelSpec::new("ollama", "llm")
                .with_base_url("http://local")
                .with_param("temperature", json!(0.1)),
        }];
        let mut registry = ModelRegistry::new(&defs, factory);
        registry.get("demo").unwrap();

        let spec = seen.lock().unwrap().clone().unwrap();
        assert_eq!(spec.model, "llm");
        assert_eq!(spec.base_url.as_deref(), Some("http://local"));
        assert_eq!(spec.params["temperature"], json!(0.1));
    }

    #[test]
    fn test_later_definition_wins() {
        let defs = [def("m", "first"), def("m", "second")];
        let mut registry = ModelRegistry::new(&defs, counting_factory());
        assert!(registry.contains("m"));
        assert!(registry.get("m").is_ok());
        assert_eq!(registry.defs["m"].model, "second");
    }

    #[test]
    fn test_unsupported_provider_on_get() {
        let defs = [ModelDefinition {
            name: "bad".into(),
            spec: ModelSpec::new("not-ollama", "foo"),
        }];
        let factory = Arc::new(ProviderFactory::new(reqwest::Client::new()));
        let mut registry = ModelRegistry::new(&defs, factory);
        let Err(err) = registry.get("bad") else {
            panic!("unsupported provider built a model");
        };
        assert_eq!(err.to_string(), "unsupported provider: not-ollama");
        assert!(!registry.cache.contains_key("bad"));
    }
}
