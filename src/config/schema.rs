//! Structural validation against the config JSON Schema.
//!
//! The default schema ships inside the crate and is compiled once per
//! process. Callers with their own schema can compile it with
//! [`ConfigSchema::from_value`] or [`ConfigSchema::from_file`].

use crate::config::loader::load_json;
use crate::error::{ChainError, Result};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

/// Source of the embedded default schema.
pub const BUILTIN_SCHEMA: &str = include_str!("../../schema/config.schema.json");

static BUILTIN: Lazy<std::result::Result<ConfigSchema, String>> = Lazy::new(|| {
    let doc: Value = serde_json::from_str(BUILTIN_SCHEMA).map_err(|e| e.to_string())?;
    ConfigSchema::from_value(&doc).map_err(|e| e.to_string())
});

/// A compiled config schema.
pub struct ConfigSchema {
    validator: jsonschema::Validator,
}

impl ConfigSchema {
    /// The embedded default schema, shared by the whole process.
    pub fn builtin() -> Result<&'static ConfigSchema> {
        BUILTIN
            .as_ref()
            .map_err(|msg| ChainError::SchemaCompile(msg.clone()))
    }

    /// Compile a schema document.
    pub fn from_value(schema: &Value) -> Result<Self> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| ChainError::SchemaCompile(e.to_string()))?;
        Ok(Self { validator })
    }

    /// Read and compile a schema file (strict JSON).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_value(&load_json(path)?)
    }

    /// Every structural violation in `instance`, sorted by path.
    pub fn check(&self, instance: &Value) -> Vec<SchemaViolation> {
        let mut violations: Vec<SchemaViolation> = self
            .validator
            .iter_errors(instance)
            .map(|err| SchemaViolation {
                path: InstancePath::resolve(&err.instance_path.to_string(), instance),
                message: err.to_string(),
            })
            .collect();
        violations.sort();
        violations
    }

    /// `Ok(())` or [`ChainError::Schema`] carrying all violations.
    pub fn validate(&self, instance: &Value) -> Result<()> {
        let violations = self.check(instance);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ChainError::Schema { violations })
        }
    }
}

impl fmt::Debug for ConfigSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSchema").finish_non_exhaustive()
    }
}

/// One structural problem: where it is and what is wrong.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SchemaViolation {
    pub path: InstancePath,
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A location inside the config document, rendered as `$.steps[0].outputs`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstancePath(pub Vec<PathSegment>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl InstancePath {
    /// Convert a JSON Pointer (`/steps/0/outputs`) into segments.
    ///
    /// Numeric tokens are array indices only where `instance` holds an array
    /// at that point; otherwise they are object keys.
    pub fn resolve(pointer: &str, instance: &Value) -> Self {
        let mut segments = Vec::new();
        let mut current = Some(instance);

        for raw in pointer.split('/').skip(1) {
            let token = raw.replace("~1", "/").replace("~0", "~");
            match current {
                Some(Value::Array(items)) => match token.parse::<usize>() {
                    Ok(idx) => {
                        current = items.get(idx);
                        segments.push(PathSegment::Index(idx));
                    }
                    Err(_) => {
                        current = None;
                        segments.push(PathSegment::Key(token));
                    }
                },
                Some(Value::Object(map)) => {
                    current = map.get(&token);
                    segments.push(PathSegment::Key(token));
                }
                _ => {
                    current = None;
                    segments.push(PathSegment::Key(token));
                }
            }
        }
        InstancePath(segments)
    }
}

impl Ord for PathSegment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (PathSegment::Index(a), PathSegment::Index(b)) => a.cmp(b),
            (PathSegment::Key(a), PathSegment::Key(b)) => a.cmp(b),
            (PathSegment::Index(_), PathSegment::Key(_)) => Ordering::Less,
            (PathSegment::Key(_), PathSegment::Index(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for PathSegment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InstancePath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for InstancePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for seg in &self.0 {
            match seg {
                PathSegment::Key(k) => write!(f, ".{k}")?,
                PathSegment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn builtin() -> &'static ConfigSchema {
        ConfigSchema::builtin().unwrap()
    }

    fn command_step(n: i64) -> Value {
        json!({
            "step": n,
            "inputs": ["userRequest"],
            "outputs": {"result": "string"},
            "command": ["echo", "{{userRequest}}"]
        })
    }

    #[test]
    fn test_builtin_accepts_command_config() {
        let cfg = json!({"steps": [command_step(1)]});
        assert!(builtin().check(&cfg).is_empty());
    }

    #[test]
    fn test_builtin_accepts_llm_steps() {
        let cfg = json!({
            "models": [{"name": "m", "provider": "ollama", "model": "llama3.2", "params": {"temperature": 0}}],
            "steps": [
                {"step": 1, "inputs": [], "outputs": {"a": "string"}, "systemPrompt": "x", "modelRef": "m"},
                {"step": 2, "inputs": [], "outputs": {"b": "number"}, "systemPrompt": "y",
                 "model": {"provider": "ollama", "model": "stub"}}
            ]
        });
        assert!(builtin().check(&cfg).is_empty());
    }

    #[test]
    fn test_empty_steps_rejected() {
        let violations = builtin().check(&json!({"steps": []}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path.to_string(), "$.steps");
    }

    #[test]
    fn test_missing_steps_rejected() {
        let violations = builtin().check(&json!({"models": []}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path.to_string(), "$");
    }

    #[test]
    fn test_step_without_prompt_or_command_rejected() {
        let cfg = json!({"steps": [
            {"step": 1, "inputs": [], "outputs": {"r": "string"}, "modelRef": "m"}
        ]});
        let violations = builtin().check(&cfg);
        assert!(!violations.is_empty());
        assert_eq!(violations[0].path.to_string(), "$.steps[0]");
    }

    #[test]
    fn test_prompt_and_command_together_rejected() {
        let mut step = command_step(1);
        step["systemPrompt"] = json!("hi");
        step["modelRef"] = json!("m");
        assert!(!builtin().check(&json!({"steps": [step]})).is_empty());
    }

    #[test]
    fn test_bad_output_type_rejected() {
        let mut step = command_step(1);
        step["outputs"] = json!({"result": "boolean"});
        let violations = builtin().check(&json!({"steps": [step]}));
        assert_eq!(violations[0].path.to_string(), "$.steps[0].outputs.result");
    }

    #[test]
    fn test_two_outputs_rejected() {
        let mut step = command_step(1);
        step["outputs"] = json!({"a": "string", "b": "string"});
        let violations = builtin().check(&json!({"steps": [step]}));
        assert_eq!(violations[0].path.to_string(), "$.steps[0].outputs");
    }

    #[test]
    fn test_violations_sorted_by_path() {
        let mut bad_late = command_step(2);
        bad_late["step"] = json!("two");
        let mut bad_early = command_step(1);
        bad_early["inputs"] = json!("not-a-list");
        let mut steps: Vec<Value> = (3..12).map(command_step).collect();
        steps.insert(0, bad_early);
        steps.push(bad_late); // index 10
        let violations = builtin().check(&json!({"steps": steps}));
        let paths: Vec<String> = violations.iter().map(|v| v.path.to_string()).collect();
        assert_eq!(paths, vec!["$.steps[0].inputs", "$.steps[10].step"]);
    }

    #[test]
    fn test_validate_wraps_violations() {
        let err = builtin().validate(&json!({"steps": []})).unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().starts_with("schema validation failed: $.steps: "));
    }

    #[test]
    fn test_instance_path_numeric_object_key() {
        let doc = json!({"outputs": {"0": "x"}, "steps": [1]});
        assert_eq!(InstancePath::resolve("/outputs/0", &doc).to_string(), "$.outputs.0");
        assert_eq!(InstancePath::resolve("/steps/0", &doc).to_string(), "$.steps[0]");
        assert_eq!(InstancePath::resolve("", &doc).to_string(), "$");
    }

    #[test]
    fn test_custom_schema() {
        let schema = ConfigSchema::from_value(&json!({"type": "object", "required": ["x"]})).unwrap();
        assert_eq!(schema.check(&json!({})).len(), 1);
        assert!(schema.check(&json!({"x": 1})).is_empty());
    }

    #[test]
    fn test_invalid_schema_fails_to_compile() {
        let err = ConfigSchema::from_value(&json!({"type": 12})).unwrap_err();
        assert!(matches!(err, ChainError::SchemaCompile(_)));
    }
}
