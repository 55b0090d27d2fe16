//! Mock backends for testing without a live LLM.
//!
//! [`MockModel`] returns one fixed response, [`FnModel`]
//! computes the response from the prompt, and [`MockFactory`] plugs either
//! into a [`ChainRunner`](crate::runner::ChainRunner) in place of the real
//! providers.
//!
//! # Example
//!
//! ```
//! use chainrunner::backend::{FnModel, LanguageModel, MockFactory};
//! use std::sync::Arc;
//!
//! let factory = MockFactory::new(|_spec| {
//!     Arc::new(FnModel::new("upper", |p: &str| p.to_uppercase())) as Arc<dyn LanguageModel>
//! });
//! assert_eq!(factory.builds(), 0);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::{LanguageModel, ModelFactory};
use crate::config::ModelSpec;
use crate::error::Result;

/// A test model that answers every prompt with the same text.
#[derive(Debug, Clone)]
pub struct MockModel {
    response: String,
}

impl MockModel {
    pub fn fixed(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn invoke(&self, _prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A model whose response is a function of the prompt.
pub struct FnModel<F> {
    name: String,
    respond: F,
}

impl<F> FnModel<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    pub fn new(name: impl Into<String>, respond: F) -> Self {
        Self {
            name: name.into(),
            respond,
        }
    }
}

#[async_trait]
impl<F> LanguageModel for FnModel<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    async fn invoke(&self, prompt: &str) -> Result<String> {
        Ok((self.respond)(prompt))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

type BuildFn = dyn Fn(&ModelSpec) -> Arc<dyn LanguageModel> + Send + Sync;

/// A [`ModelFactory`] backed by a closure, counting how often it builds.
pub struct MockFactory {
    build: Box<BuildFn>,
    builds: AtomicUsize,
}

impl MockFactory {
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&ModelSpec) -> Arc<dyn LanguageModel> + Send + Sync + 'static,
    {
        Self {
            build: Box::new(build),
            builds: AtomicUsize::new(0),
        }
    }

    /// Number of handles built so far.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}

impl ModelFactory for MockFactory {
    fn build(&self, spec: &ModelSpec) -> Result<Arc<dyn LanguageModel>> {
        self.builds.fetch_add(1, Ordering::Relaxed);
        Ok((self.build)(spec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fixed_response() {
        let mock = MockModel::fixed("Hello!");
        assert_eq!(mock.invoke("anything").await.unwrap(), "Hello!");
        assert_eq!(mock.invoke("something else").await.unwrap(), "Hello!");
    }

    #[tokio::test]
    async fn test_fn_model_uses_prompt() {
        let model = FnModel::new("upper", |p: &str| p.to_uppercase());
        assert_eq!(model.invoke("Echo: test").await.unwrap(), "ECHO: TEST");
        assert_eq!(model.name(), "upper");
    }

    #[test]
    fn test_mock_factory_counts_builds() {
        let factory = MockFactory::new(|spec| {
            Arc::new(MockModel::fixed(spec.model.clone())) as Arc<dyn LanguageModel>
        });
        let spec = ModelSpec::new("anything", "m");
        factory.build(&spec).unwrap();
        factory.build(&spec).unwrap();
        assert_eq!(factory.builds(), 2);
    }
}
