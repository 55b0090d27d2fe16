//! Event hooks for chain execution.
//!
//! Provides an optional, non-intrusive way to observe a run. The runner
//! emits events as steps start, as commands and models finish, and as each
//! step's output is bound. Implement [`EventHandler`] to receive them for
//! progress display or auditing.

use crate::value::Value;
use std::sync::Arc;

/// Events emitted during chain execution.
#[derive(Debug, Clone)]
pub enum Event {
    /// A step is about to run.
    StepStart {
        /// Step number from the config.
        step: i64,
        /// `"llm"` or `"command"`.
        kind: &'static str,
    },
    /// An LLM step received its response.
    ModelResponse {
        step: i64,
        /// Backend name (the model id for real providers).
        model: String,
        /// Response length in characters, before trimming.
        chars: usize,
    },
    /// A command step's process exited successfully.
    CommandFinished {
        step: i64,
        /// The program that ran (first argv element).
        program: String,
    },
    /// A step finished: its output was bound, or it failed.
    StepEnd {
        step: i64,
        /// Output name the value was bound to.
        output: String,
        /// The coerced value, or `None` if the step failed.
        value: Option<Value>,
    },
}

/// Handler for chain lifecycle events.
///
/// This is entirely optional; runs work without an event handler.
///
/// # Example
///
/// ```
/// use chainrunner::events::{Event, EventHandler};
///
/// struct PrintHandler;
///
/// impl EventHandler for PrintHandler {
///     fn on_event(&self, event: Event) {
///         match event {
///             Event::StepStart { step, kind } => eprintln!("[start] step {step} ({kind})"),
///             Event::StepEnd { step, value, .. } => eprintln!("[end] step {step} ok={}", value.is_some()),
///             _ => {}
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    /// Called when the runner emits an event.
    fn on_event(&self, event: Event);
}

/// Emit an event if a handler is present. No-op otherwise.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: Event) {
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
///
/// # Example
///
/// ```
/// use chainrunner::events::{Event, FnEventHandler};
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnEventHandler(|event: Event| {
///     if let Event::StepStart { step, .. } = event {
///         eprintln!("running step {step}");
///     }
/// }));
/// ```
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}
