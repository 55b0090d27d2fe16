//! Language-model backends and provider dispatch.
//!
//! A chain only ever asks a model one thing: turn a prompt into text. The
//! [`LanguageModel`] trait is that capability. Which implementation a
//! config's `provider` tag maps to is decided by a [`ModelFactory`].
//!
//! ```text
//! ModelSpec ──► ModelFactory::build() ──► Arc<dyn LanguageModel>
//!                      │                          │
//!               ProviderFactory              invoke(prompt)
//!                "ollama" ──► OllamaModel    /api/chat
//! ```

pub mod mock;
pub mod ollama;

pub use mock::{FnModel, MockFactory, MockModel};
pub use ollama::OllamaModel;

use crate::config::ModelSpec;
use crate::error::{ChainError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

/// A model that answers a prompt with text.
///
/// This trait is object-safe and designed to be used as `Arc<dyn LanguageModel>`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send `prompt` and return the model's full text response.
    async fn invoke(&self, prompt: &str) -> Result<String>;

    /// Human-readable name for logging and diagnostics.
    fn name(&self) -> &str;
}

/// Builds model handles from [`ModelSpec`]s.
///
/// [`ModelRegistry`](crate::registry::ModelRegistry) delegates every build
/// to a factory, so tests and embedders can swap in their own backends.
pub trait ModelFactory: Send + Sync {
    fn build(&self, spec: &ModelSpec) -> Result<Arc<dyn LanguageModel>>;
}

/// Provider tags understood by [`ProviderFactory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ollama,
}

impl Provider {
    /// Look up a provider by its config tag.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "ollama" => Ok(Provider::Ollama),
            other => Err(ChainError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// The default factory: real HTTP backends sharing one client.
#[derive(Debug, Clone)]
pub struct ProviderFactory {
    client: Client,
}

impl ProviderFactory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl ModelFactory for ProviderFactory {
    fn build(&self, spec: &ModelSpec) -> Result<Arc<dyn LanguageModel>> {
        match Provider::from_tag(&spec.provider)? {
            Provider::Ollama => Ok(Arc::new(OllamaModel::new(self.client.clone(), spec))),
        }
    }
}
