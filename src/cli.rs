//! Command-line front ends: `chainrunner` and `validate-config`.
//!
//! The binaries in `src/bin` only parse arguments and wire up stdout and
//! stderr; everything they do lives here so it can be tested.

use crate::config::{self, ConfigSchema, SchemaViolation};
use crate::error::Result;
use crate::runner::ChainRunner;
use crate::ChainError;
use anyhow::Context;
use clap::{Args, Parser, ValueEnum};
use serde_json::Value as Document;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging flags shared by both binaries.
#[derive(Debug, Clone, Args)]
pub struct LogArgs {
    /// Log level filter (RUST_LOG takes precedence when set)
    #[arg(long, env = "CHAINRUNNER_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Install the global tracing subscriber. Logs go to stderr.
pub fn init_logging(args: &LogArgs) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let result = match args.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
    };

    if result.is_ok() {
        tracing::debug!("Logging initialized with level: {}", args.log_level);
    }
}

/// Run a config-defined chain
#[derive(Debug, Parser)]
#[command(name = "chainrunner")]
#[command(version, about, long_about = None)]
pub struct RunCli {
    /// Path to config JSON or YAML
    #[arg(short, long)]
    pub config: PathBuf,

    /// Initial user request string
    #[arg(short, long)]
    pub input: String,

    /// HTTP timeout for model calls, in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Kill command steps that run longer than this, in seconds
    #[arg(long, value_name = "SECS")]
    pub command_timeout: Option<u64>,

    #[command(flatten)]
    pub log: LogArgs,
}

impl RunCli {
    /// Build a runner honoring the timeout flags.
    pub fn runner(&self) -> Result<ChainRunner> {
        let mut builder = ChainRunner::builder();
        if let Some(secs) = self.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.command_timeout {
            builder = builder.command_timeout(Duration::from_secs(secs));
        }
        builder.build()
    }
}

/// Run the chain and report like the `chainrunner` binary. Returns the exit code.
///
/// The result goes to `out`. Configuration errors are labeled
/// `CONFIG ERROR`, everything else `ERROR`; both exit 1.
pub async fn run_chain(
    args: &RunCli,
    runner: &ChainRunner,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> u8 {
    match runner.run_file(&args.config, &args.input).await {
        Ok(outcome) => {
            let _ = writeln!(out, "{}", outcome.result);
            0
        }
        Err(e) if e.is_config_error() => {
            let _ = writeln!(err, "CONFIG ERROR: {e}");
            1
        }
        Err(e) => {
            let _ = writeln!(err, "ERROR: {e}");
            1
        }
    }
}

/// Validate a chain config without running it
#[derive(Debug, Parser)]
#[command(name = "validate-config")]
#[command(version, about, long_about = None)]
pub struct ValidateCli {
    /// Path to config JSON or YAML
    pub config: PathBuf,

    /// JSON Schema to validate against instead of the built-in one
    #[arg(long)]
    pub schema: Option<PathBuf>,

    #[command(flatten)]
    pub log: LogArgs,
}

/// Validate and report like the `validate-config` binary. Returns the exit code.
///
/// 0: valid. 1: structural or semantic violations. 2: the config or schema
/// could not be loaded.
pub fn validate(args: &ValidateCli, out: &mut dyn Write, err: &mut dyn Write) -> u8 {
    let doc = match load_document(&args.config) {
        Ok(doc) => doc,
        Err(e) => {
            let _ = writeln!(err, "ERROR: {e:#}");
            return 2;
        }
    };

    let custom = match load_schema(args.schema.as_deref()) {
        Ok(schema) => schema,
        Err(e) => {
            let _ = writeln!(err, "ERROR: {e:#}");
            return 2;
        }
    };
    let schema = match custom.as_ref() {
        Some(schema) => schema,
        None => match ConfigSchema::builtin() {
            Ok(schema) => schema,
            Err(e) => {
                let _ = writeln!(err, "ERROR: {e}");
                return 2;
            }
        },
    };

    match config::validate_with_schema(schema, &doc) {
        Ok(_) => {
            let _ = writeln!(out, "OK: configuration is valid.");
            0
        }
        Err(ChainError::Schema { violations }) => {
            report_violations(&violations, err);
            1
        }
        Err(e) if e.is_config_error() => {
            let _ = writeln!(err, "CONFIG ERROR: {e}");
            1
        }
        Err(e) => {
            let _ = writeln!(err, "ERROR: {e}");
            2
        }
    }
}

fn report_violations(violations: &[SchemaViolation], err: &mut dyn Write) {
    let _ = writeln!(err, "CONFIG VALIDATION ERRORS:");
    for violation in violations {
        let _ = writeln!(err, " - {violation}");
    }
}

fn load_document(path: &Path) -> anyhow::Result<Document> {
    if !path.exists() {
        anyhow::bail!("file not found: {}", path.display());
    }
    config::load_config(path).with_context(|| "failed to load config".to_string())
}

fn load_schema(path: Option<&Path>) -> anyhow::Result<Option<ConfigSchema>> {
    path.map(|p| {
        ConfigSchema::from_file(p)
            .with_context(|| format!("failed to load schema {}", p.display()))
    })
    .transpose()
}
