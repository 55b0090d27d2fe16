//! Reading config text into an untyped document.
//!
//! JSON is tried first. With the `yaml` feature (on by default), text that
//! is not JSON is then parsed as YAML, so hand-written configs can use the
//! friendlier syntax.

use crate::error::{ChainError, Result};
use serde_json::Value;
use std::path::Path;

/// Parse config text as JSON, falling back to YAML.
///
/// If both parsers reject the text, the YAML error is returned. Without the
/// `yaml` feature the JSON error is returned.
///
/// # Example
///
/// ```
/// use chainrunner::config::parse_config;
///
/// let doc = parse_config(r#"{"steps": []}"#).unwrap();
/// assert!(doc["steps"].is_array());
/// ```
pub fn parse_config(text: &str) -> Result<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(value),
        Err(json_err) => parse_fallback(text, json_err),
    }
}

#[cfg(feature = "yaml")]
fn parse_fallback(text: &str, json_err: serde_json::Error) -> Result<Value> {
    tracing::debug!(error = %json_err, "config is not JSON, trying YAML");
    Ok(serde_yaml::from_str::<Value>(text)?)
}

#[cfg(not(feature = "yaml"))]
fn parse_fallback(_text: &str, json_err: serde_json::Error) -> Result<Value> {
    Err(ChainError::Json(json_err))
}

/// Read and parse a config file (JSON or YAML).
pub fn load_config(path: impl AsRef<Path>) -> Result<Value> {
    let text = read(path.as_ref())?;
    parse_config(&text)
}

/// Read a strict JSON file (no YAML fallback). Used for schema documents.
pub fn load_json(path: impl AsRef<Path>) -> Result<Value> {
    let text = read(path.as_ref())?;
    Ok(serde_json::from_str(&text)?)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ChainError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_parse_json() {
        let doc = parse_config(r#"{"steps": [{"step": 1}]}"#).unwrap();
        assert_eq!(doc["steps"][0]["step"], json!(1));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_parse_yaml_fallback() {
        let text = r#"
steps:
  - step: 1
    inputs: [userRequest]
    outputs: {result: string}
    command:
      - echo
      - "{{userRequest}}"
"#;
        let doc = parse_config(text).unwrap();
        assert_eq!(doc["steps"][0]["outputs"], json!({"result": "string"}));
        assert_eq!(doc["steps"][0]["command"][1], json!("{{userRequest}}"));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_unparseable_reports_yaml_error() {
        let err = parse_config("steps: [unclosed").unwrap_err();
        assert!(matches!(err, ChainError::Yaml(_)));
        assert!(err.is_load_error());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"foo": "bar"}}"#).unwrap();
        let doc = load_config(file.path()).unwrap();
        assert_eq!(doc, json!({"foo": "bar"}));
    }

    #[test]
    fn test_load_json_rejects_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "foo: bar").unwrap();
        assert!(matches!(load_json(file.path()), Err(ChainError::Json(_))));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_config("/definitely/not/here.json").unwrap_err();
        assert!(err.is_load_error());
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
