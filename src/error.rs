use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::config::schema::SchemaViolation;

/// Errors produced while loading, validating or running a chain.
///
/// Variants fall into three groups: load errors (the config never became a
/// document), configuration errors (fixable only by editing the config) and
/// runtime errors (an otherwise valid chain failed at a step).
#[derive(Error, Debug)]
pub enum ChainError {
    // --- load ---
    /// The config file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The text is not valid JSON (and no YAML fallback was available).
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The text is neither valid JSON nor valid YAML.
    #[cfg(feature = "yaml")]
    #[error("YAML parsing failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // --- configuration ---
    /// Structural schema violations, sorted by path.
    #[error("schema validation failed: {}", format_violations(.violations))]
    Schema { violations: Vec<SchemaViolation> },

    /// The schema document itself could not be compiled.
    #[error("invalid schema: {0}")]
    SchemaCompile(String),

    /// The document passed the schema but could not be interpreted.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("duplicate step number: {0}")]
    DuplicateStep(i64),

    #[error("duplicate model name: {0}")]
    DuplicateModel(String),

    #[error("step {step} references unknown input '{input}'")]
    UnknownInput { step: i64, input: String },

    #[error("step {step} references unknown modelRef '{name}'")]
    UnresolvedModelRef { step: i64, name: String },

    #[error("step {step} missing model or modelRef for LLM step")]
    MissingModel { step: i64 },

    /// Registry lookup of a name that was never declared.
    #[error("unknown modelRef: {0}")]
    UnknownModel(String),

    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// A `{{name}}` placeholder had no binding.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    // --- runtime ---
    /// Low-level HTTP transport failure (connection refused, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The model provider answered with a non-success status code.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The backend answered but the call still failed.
    #[error("model '{model}' failed: {message}")]
    Backend { model: String, message: String },

    /// The command could not be started at all.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited non-zero (or was killed by a signal).
    #[error("command '{program}' exited with {}: {stderr}", describe_status(.status))]
    CommandFailed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("command '{program}' timed out after {timeout:?}")]
    CommandTimeout { program: String, timeout: Duration },

    #[error("cannot convert output to number: {0:?}")]
    NotANumber(String),

    #[error("unsupported output type: {0}")]
    UnsupportedOutputType(String),

    #[error("no steps to execute")]
    EmptyChain,

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl ChainError {
    /// Whether this error can only be fixed by editing the configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ChainError::Schema { .. }
                | ChainError::SchemaCompile(_)
                | ChainError::InvalidConfig(_)
                | ChainError::DuplicateStep(_)
                | ChainError::DuplicateModel(_)
                | ChainError::UnknownInput { .. }
                | ChainError::UnresolvedModelRef { .. }
                | ChainError::MissingModel { .. }
                | ChainError::UnknownModel(_)
                | ChainError::UnsupportedProvider(_)
                | ChainError::UnknownVariable(_)
        )
    }

    /// Whether the config never made it past reading and parsing.
    pub fn is_load_error(&self) -> bool {
        match self {
            ChainError::Io { .. } | ChainError::Json(_) => true,
            #[cfg(feature = "yaml")]
            ChainError::Yaml(_) => true,
            _ => false,
        }
    }
}

fn format_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, ChainError>;
