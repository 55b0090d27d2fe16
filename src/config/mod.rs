//! Chain configuration: typed model, loading, and validation.
//!
//! A config document goes through three stages:
//!
//! ```text
//! text ──► loader::parse_config ──► serde_json::Value
//!                                        │
//!                         schema::ConfigSchema::check   (structural)
//!                                        │
//!                              ChainConfig (typed)
//!                                        │
//!                         validate::check_semantics     (cross-field)
//! ```

pub mod loader;
pub mod schema;
pub mod validate;

pub use loader::{load_config, load_json, parse_config};
pub use schema::{ConfigSchema, SchemaViolation};
pub use validate::{check_semantics, validate_config, validate_with_schema};

use crate::error::{ChainError, Result};
use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Root configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainConfig {
    /// Named, reusable model declarations.
    #[serde(default)]
    pub models: Vec<ModelDefinition>,
    /// Steps in declaration order. Execution order is by step number.
    pub steps: Vec<StepDef>,
}

impl ChainConfig {
    /// Steps sorted by ascending step number (stable for equal numbers).
    pub fn ordered_steps(&self) -> Vec<&StepDef> {
        let mut steps: Vec<&StepDef> = self.steps.iter().collect();
        steps.sort_by_key(|s| s.step);
        steps
    }
}

/// How to build a model backend: provider tag, model id, and options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpec {
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Provider-specific options, passed through untouched.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl ModelSpec {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            base_url: None,
            params: Map::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// A [`ModelSpec`] registered under a name steps can refer to.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelDefinition {
    pub name: String,
    #[serde(flatten)]
    pub spec: ModelSpec,
}

/// One step as written in the config.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDef {
    /// Ordering key. Integral floats such as `2.0` are accepted.
    #[serde(deserialize_with = "step_number")]
    pub step: i64,
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Output name to declared type. Exactly one entry in a valid config.
    pub outputs: IndexMap<String, String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub model_ref: Option<String>,
    #[serde(default)]
    pub model: Option<ModelSpec>,
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

/// JSON Schema's `integer` admits any number with a zero fractional part,
/// so the typed config must take `1.0` wherever the schema does.
fn step_number<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(n) => Ok(n),
        Raw::Float(x) if x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 => {
            Ok(x as i64)
        }
        Raw::Float(x) => Err(de::Error::custom(format!(
            "step number must be an integer, got {x}"
        ))),
    }
}

/// Where an LLM step gets its model from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelSource<'a> {
    /// A name in the config's `models` list.
    Ref(&'a str),
    /// A definition written directly on the step.
    Inline(&'a ModelSpec),
}

/// What a step does once resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepAction<'a> {
    Llm {
        prompt: &'a str,
        model: ModelSource<'a>,
    },
    Command {
        argv: &'a [String],
    },
}

impl StepAction<'_> {
    /// Short label for logs and events.
    pub fn kind(&self) -> &'static str {
        match self {
            StepAction::Llm { .. } => "llm",
            StepAction::Command { .. } => "command",
        }
    }
}

impl StepDef {
    /// The single declared `(name, type)` output pair.
    pub fn output(&self) -> Result<(&str, &str)> {
        let mut iter = self.outputs.iter();
        match (iter.next(), iter.next()) {
            (Some((name, ty)), None) => Ok((name.as_str(), ty.as_str())),
            _ => Err(ChainError::InvalidConfig(format!(
                "step {} must declare exactly one output, found {}",
                self.step,
                self.outputs.len()
            ))),
        }
    }

    /// Resolve which kind of step this is.
    ///
    /// A `systemPrompt` makes it an LLM step; `modelRef` takes precedence
    /// over an inline `model`.
    pub fn action(&self) -> Result<StepAction<'_>> {
        if let Some(prompt) = &self.system_prompt {
            let model = match (&self.model_ref, &self.model) {
                (Some(name), _) => ModelSource::Ref(name),
                (None, Some(spec)) => ModelSource::Inline(spec),
                (None, None) => return Err(ChainError::MissingModel { step: self.step }),
            };
            return Ok(StepAction::Llm { prompt, model });
        }
        match &self.command {
            Some(argv) => Ok(StepAction::Command { argv }),
            None => Err(ChainError::InvalidConfig(format!(
                "step {} has neither systemPrompt nor command",
                self.step
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(value: Value) -> StepDef {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_ordered_steps_sorts_by_number() {
        let cfg: ChainConfig = serde_json::from_value(json!({
            "steps": [
                {"step": 3, "inputs": [], "outputs": {"c": "string"}, "command": ["true"]},
                {"step": 1, "inputs": [], "outputs": {"a": "string"}, "command": ["true"]},
                {"step": 2, "inputs": [], "outputs": {"b": "string"}, "command": ["true"]}
            ]
        }))
        .unwrap();
        let order: Vec<i64> = cfg.ordered_steps().iter().map(|s| s.step).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_step_number_accepts_integral_float() {
        let s = step(json!({
            "step": 2.0, "inputs": [], "outputs": {"r": "string"}, "command": ["true"]
        }));
        assert_eq!(s.step, 2);
    }

    #[test]
    fn test_step_number_rejects_fraction() {
        let result: std::result::Result<StepDef, _> = serde_json::from_value(json!({
            "step": 1.5, "inputs": [], "outputs": {"r": "string"}, "command": ["true"]
        }));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("step number must be an integer"));
    }

    #[test]
    fn test_model_definition_deserializes_camel_case() {
        let def: ModelDefinition = serde_json::from_value(json!({
            "name": "local",
            "provider": "ollama",
            "model": "llama3.2",
            "baseUrl": "http://gpu-box:11434",
            "params": {"temperature": 0.1}
        }))
        .unwrap();
        assert_eq!(def.name, "local");
        assert_eq!(def.spec.base_url.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(def.spec.params["temperature"], json!(0.1));
    }

    #[test]
    fn test_action_prefers_model_ref() {
        let s = step(json!({
            "step": 1, "inputs": [], "outputs": {"r": "string"},
            "systemPrompt": "hi", "modelRef": "named",
            "model": {"provider": "ollama", "model": "inline"}
        }));
        assert_eq!(
            s.action().unwrap(),
            StepAction::Llm { prompt: "hi", model: ModelSource::Ref("named") }
        );
    }

    #[test]
    fn test_action_llm_without_model_fails() {
        let s = step(json!({
            "step": 4, "inputs": [], "outputs": {"r": "string"}, "systemPrompt": "hi"
        }));
        assert!(matches!(s.action(), Err(ChainError::MissingModel { step: 4 })));
    }

    #[test]
    fn test_action_command() {
        let s = step(json!({
            "step": 1, "inputs": [], "outputs": {"r": "string"}, "command": ["echo", "x"]
        }));
        let action = s.action().unwrap();
        assert_eq!(action.kind(), "command");
        assert!(matches!(action, StepAction::Command { argv } if argv.len() == 2));
    }

    #[test]
    fn test_output_requires_exactly_one() {
        let s = step(json!({
            "step": 1, "inputs": [], "outputs": {"a": "string", "b": "number"}, "command": ["x"]
        }));
        assert!(s.output().is_err());
        let s = step(json!({
            "step": 1, "inputs": [], "outputs": {"a": "number"}, "command": ["x"]
        }));
        assert_eq!(s.output().unwrap(), ("a", "number"));
    }
}
