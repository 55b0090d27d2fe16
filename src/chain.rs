//! Sequential execution of a validated chain config.
//!
//! Steps run one at a time in ascending step-number order. Each step's
//! trimmed output is coerced to its declared type and bound under its
//! output name, where later steps' templates can see it. The first failing
//! step aborts the run; nothing already done is undone.

use crate::{
    coerce::coerce,
    command::run_command,
    config::{self, ChainConfig, ModelSource, StepAction},
    error::Result,
    events::{emit, Event},
    registry::ModelRegistry,
    runner::ChainRunner,
    template::{placeholders, render},
    value::{Value, Variables},
    ChainError,
};
use serde_json::Value as Document;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    /// Value bound by the last step.
    pub result: Value,
    /// `userRequest` plus every step output, in execution order.
    pub variables: Variables,
}

impl ChainRunner {
    /// Validate and run a config document, returning the final value.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use chainrunner::ChainRunner;
    /// use serde_json::json;
    ///
    /// # async fn demo() -> chainrunner::Result<()> {
    /// let config = json!({
    ///     "steps": [{
    ///         "step": 1,
    ///         "inputs": ["userRequest"],
    ///         "outputs": {"echoed": "string"},
    ///         "command": ["echo", "{{userRequest}}"]
    ///     }]
    /// });
    /// let runner = ChainRunner::builder().build()?;
    /// let result = runner.run(&config, "hello").await?;
    /// assert_eq!(result.to_string(), "hello");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(&self, doc: &Document, user_request: &str) -> Result<Value> {
        Ok(self.run_all(doc, user_request).await?.result)
    }

    /// Validate and run a config document, returning every binding.
    pub async fn run_all(&self, doc: &Document, user_request: &str) -> Result<ChainOutcome> {
        let config = config::validate_with_schema(self.schema()?, doc)?;
        self.execute(&config, user_request).await
    }

    /// Load a JSON or YAML config file, then validate and run it.
    pub async fn run_file(&self, path: impl AsRef<Path>, user_request: &str) -> Result<ChainOutcome> {
        let doc = config::load_config(path)?;
        self.run_all(&doc, user_request).await
    }

    /// Run an already-typed config.
    ///
    /// The structural schema check is skipped, but the semantic checks
    /// still run before any step does.
    #[instrument(skip_all, fields(steps = config.steps.len()))]
    pub async fn execute(&self, config: &ChainConfig, user_request: &str) -> Result<ChainOutcome> {
        config::check_semantics(config)?;

        let mut registry = ModelRegistry::new(&config.models, Arc::clone(&self.factory));
        let mut vars = Variables::seeded(user_request);
        let mut last_output: Option<&str> = None;

        info!("chain started");
        for step in config.ordered_steps() {
            let (out_name, out_type) = step.output()?;
            let action = step.action()?;

            emit(
                &self.event_handler,
                Event::StepStart {
                    step: step.step,
                    kind: action.kind(),
                },
            );
            debug!(step = step.step, kind = action.kind(), output = out_name, "running step");

            let outcome = match self.dispatch(step.step, action, &mut registry, &vars).await {
                Ok(raw) => coerce(&raw, out_type),
                Err(e) => Err(e),
            };

            emit(
                &self.event_handler,
                Event::StepEnd {
                    step: step.step,
                    output: out_name.to_string(),
                    value: outcome.as_ref().ok().cloned(),
                },
            );

            let value = outcome.map_err(|e| {
                debug!(step = step.step, error = %e, "step failed");
                e
            })?;
            vars.insert(out_name, value);
            last_output = Some(out_name);
        }

        let result = last_output
            .and_then(|name| vars.get(name))
            .cloned()
            .ok_or(ChainError::EmptyChain)?;
        info!(result = %result, "chain completed");

        Ok(ChainOutcome {
            result,
            variables: vars,
        })
    }

    /// Run one step and return its trimmed raw output.
    async fn dispatch(
        &self,
        step: i64,
        action: StepAction<'_>,
        registry: &mut ModelRegistry,
        vars: &Variables,
    ) -> Result<String> {
        match action {
            StepAction::Llm { prompt, model } => {
                debug!(step, vars = ?placeholders(prompt), "rendering prompt");
                let prompt = render(prompt, vars)?;
                let handle = match model {
                    ModelSource::Ref(name) => registry.get(name)?,
                    ModelSource::Inline(spec) => registry.from_inline(spec)?,
                };
                let response = handle.invoke(&prompt).await?;
                emit(
                    &self.event_handler,
                    Event::ModelResponse {
                        step,
                        model: handle.name().to_string(),
                        chars: response.chars().count(),
                    },
                );
                Ok(response.trim().to_string())
            }
            StepAction::Command { argv } => {
                let argv = argv
                    .iter()
                    .map(|arg| render(arg, vars))
                    .collect::<Result<Vec<_>>>()?;
                debug!(step, ?argv, "running command");
                let output = run_command(&argv, self.command_timeout).await?;
                if !output.stderr.trim().is_empty() {
                    debug!(step, stderr = %output.stderr.trim(), "command wrote to stderr");
                }
                emit(
                    &self.event_handler,
                    Event::CommandFinished {
                        step,
                        program: argv[0].clone(),
                    },
                );
                Ok(output.stdout.trim().to_string())
            }
        }
    }
}
