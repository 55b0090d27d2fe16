//! # chainrunner
//!
//! Run a declaratively configured, numbered sequence of steps. Each step
//! either sends a templated prompt to a language model or runs a local
//! command, and its output becomes a variable later steps can use.
//!
//! ## Core Concepts
//!
//! - **[`ChainConfig`]** — the config document: optional named models and a
//!   non-empty list of steps, loaded from JSON or YAML.
//! - **Validation** — a JSON Schema check ([`ConfigSchema`]) followed by
//!   cross-field rules ([`config::check_semantics`]): unique step numbers,
//!   inputs that refer only to earlier outputs, resolvable model refs.
//! - **[`ChainRunner`]** — executes steps in ascending step order, rendering
//!   `{{name}}` placeholders from the [`Variables`] accumulated so far.
//! - **[`LanguageModel`]** — the one capability an LLM step needs: prompt in,
//!   text out. [`OllamaModel`] is the built-in provider.
//! - **[`Value`]** — a step output coerced to its declared type (`string`
//!   or `number`).
//!
//! ## Quick Start
//!
//! ```no_run
//! use chainrunner::ChainRunner;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = json!({
//!         "models": [{"name": "local", "provider": "ollama", "model": "llama3.2:3b"}],
//!         "steps": [
//!             {
//!                 "step": 1,
//!                 "inputs": ["userRequest"],
//!                 "outputs": {"summary": "string"},
//!                 "systemPrompt": "Summarize in one sentence: {{userRequest}}",
//!                 "modelRef": "local"
//!             },
//!             {
//!                 "step": 2,
//!                 "inputs": ["summary"],
//!                 "outputs": {"words": "number"},
//!                 "command": ["sh", "-c", "echo \"$1\" | wc -w", "sh", "{{summary}}"]
//!             }
//!         ]
//!     });
//!
//!     let runner = ChainRunner::builder().build()?;
//!     let words = runner.run(&config, "Rust is a systems programming language.").await?;
//!     println!("{words}");
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod chain;
pub mod cli;
pub mod coerce;
pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod registry;
pub mod runner;
pub mod template;
pub mod value;

pub use backend::{LanguageModel, MockFactory, MockModel, ModelFactory, OllamaModel, ProviderFactory};
pub use chain::ChainOutcome;
pub use config::{ChainConfig, ConfigSchema, ModelDefinition, ModelSpec, StepDef};
pub use error::{ChainError, Result};
pub use events::{Event, EventHandler};
pub use registry::ModelRegistry;
pub use runner::{ChainRunner, ChainRunnerBuilder};
pub use value::{Value, Variables};
