//! Runner configuration shared across chain executions.
//!
//! [`ChainRunner`] carries the HTTP client, the model factory, the schema,
//! optional timeouts and an optional event handler. Build it once and use
//! it for any number of runs; every run gets its own model registry and
//! variable environment, so concurrent runs do not interfere.

use crate::backend::{ModelFactory, ProviderFactory};
use crate::config::ConfigSchema;
use crate::error::Result;
use crate::events::EventHandler;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Executes chain configs.
///
/// # Example
///
/// ```
/// use chainrunner::ChainRunner;
/// use std::time::Duration;
///
/// let runner = ChainRunner::builder()
///     .timeout(Duration::from_secs(120))
///     .command_timeout(Duration::from_secs(30))
///     .build()
///     .unwrap();
/// ```
pub struct ChainRunner {
    /// Builds model handles for LLM steps. Default: [`ProviderFactory`].
    pub(crate) factory: Arc<dyn ModelFactory>,
    /// Schema for structural checks. `None` means the built-in schema.
    pub(crate) schema: Option<Arc<ConfigSchema>>,
    /// Limit on each command step. `None` waits indefinitely.
    pub(crate) command_timeout: Option<Duration>,
    /// Optional event handler for step lifecycle events.
    pub(crate) event_handler: Option<Arc<dyn EventHandler>>,
}

impl ChainRunner {
    /// Create a new builder.
    pub fn builder() -> ChainRunnerBuilder {
        ChainRunnerBuilder::default()
    }

    /// The schema used for structural validation.
    pub fn schema(&self) -> Result<&ConfigSchema> {
        match &self.schema {
            Some(schema) => Ok(schema.as_ref()),
            None => ConfigSchema::builtin(),
        }
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout
    }
}

impl std::fmt::Debug for ChainRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainRunner")
            .field("custom_schema", &self.schema.is_some())
            .field("command_timeout", &self.command_timeout)
            .field("has_event_handler", &self.event_handler.is_some())
            .finish()
    }
}

/// Builder for [`ChainRunner`].
#[derive(Default)]
pub struct ChainRunnerBuilder {
    client: Option<Client>,
    timeout: Option<Duration>,
    factory: Option<Arc<dyn ModelFactory>>,
    schema: Option<Arc<ConfigSchema>>,
    command_timeout: Option<Duration>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl ChainRunnerBuilder {
    /// Set the HTTP client used by the default model factory.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the HTTP request timeout. Default: none.
    ///
    /// Ignored when a custom `Client` is provided via `.client()` (the
    /// custom client's own timeout applies) or a custom factory is set.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the provider dispatch, e.g. with a
    /// [`MockFactory`](crate::backend::MockFactory) in tests.
    pub fn model_factory(mut self, factory: Arc<dyn ModelFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Validate against a caller-supplied schema instead of the built-in one.
    pub fn schema(mut self, schema: ConfigSchema) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    /// Kill command steps that run longer than `timeout`. Default: none.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Set the event handler.
    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the runner.
    ///
    /// Fails only if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<ChainRunner> {
        let factory = match self.factory {
            Some(factory) => factory,
            None => {
                let client = match self.client {
                    Some(client) => client,
                    None => {
                        let mut builder = Client::builder();
                        if let Some(timeout) = self.timeout {
                            builder = builder.timeout(timeout);
                        }
                        builder.build()?
                    }
                };
                Arc::new(ProviderFactory::new(client)) as Arc<dyn ModelFactory>
            }
        };
        Ok(ChainRunner {
            factory,
            schema: self.schema,
            command_timeout: self.command_timeout,
            event_handler: self.event_handler,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_runner_uses_builtin_schema() {
        let runner = ChainRunner::builder().build().unwrap();
        assert!(runner.schema().is_ok());
        assert!(runner.command_timeout().is_none());
    }

    #[test]
    fn test_custom_schema_is_used() {
        let schema = ConfigSchema::from_value(&json!({"type": "object", "required": ["x"]})).unwrap();
        let runner = ChainRunner::builder().schema(schema).build().unwrap();
        assert_eq!(runner.schema().unwrap().check(&json!({})).len(), 1);
    }

    #[test]
    fn test_timeouts_are_recorded() {
        let runner = ChainRunner::builder()
            .timeout(Duration::from_secs(120))
            .command_timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(runner.command_timeout(), Some(Duration::from_secs(5)));
    }
}
