//! Cross-field rules the schema cannot express.

use super::{ChainConfig, ConfigSchema, ModelSource, StepAction};
use crate::error::{ChainError, Result};
use crate::value::USER_REQUEST;
use serde_json::Value;
use std::collections::HashSet;

/// Validate a config document against the built-in schema, then semantically.
pub fn validate_config(doc: &Value) -> Result<ChainConfig> {
    validate_with_schema(ConfigSchema::builtin()?, doc)
}

/// Validate a config document against `schema`, then semantically.
///
/// Structural violations are all reported together and stop validation
/// before any semantic rule runs. Semantic rules fail on the first
/// violation.
pub fn validate_with_schema(schema: &ConfigSchema, doc: &Value) -> Result<ChainConfig> {
    schema.validate(doc)?;
    let config: ChainConfig = serde_json::from_value(doc.clone())
        .map_err(|e| ChainError::InvalidConfig(e.to_string()))?;
    check_semantics(&config)?;
    Ok(config)
}

/// Check the rules that span fields or steps.
///
/// Model names must be unique. Then, walking steps in ascending step order:
/// step numbers must be unique, every input must be `userRequest` or the
/// output of an earlier step, and an LLM step's `modelRef` must name a
/// declared model (or the step must carry an inline `model`).
pub fn check_semantics(config: &ChainConfig) -> Result<()> {
    let mut models: HashSet<&str> = HashSet::new();
    for def in &config.models {
        if !models.insert(def.name.as_str()) {
            return Err(ChainError::DuplicateModel(def.name.clone()));
        }
    }

    let mut seen_steps: HashSet<i64> = HashSet::new();
    let mut known: HashSet<&str> = HashSet::from([USER_REQUEST]);

    for step in config.ordered_steps() {
        if !seen_steps.insert(step.step) {
            return Err(ChainError::DuplicateStep(step.step));
        }

        if let Some(input) = step.inputs.iter().find(|i| !known.contains(i.as_str())) {
            return Err(ChainError::UnknownInput {
                step: step.step,
                input: input.clone(),
            });
        }

        if let StepAction::Llm {
            model: ModelSource::Ref(name),
            ..
        } = step.action()?
        {
            if !models.contains(name) {
                return Err(ChainError::UnresolvedModelRef {
                    step: step.step,
                    name: name.to_string(),
                });
            }
        }

        let (out_name, _) = step.output()?;
        known.insert(out_name);
    }

    Ok(())
}
