//! Backend for Ollama's native chat API.
//!
//! [`OllamaModel`] sends the rendered prompt as a single user message to
//! `/api/chat` with streaming disabled and returns `message.content`.

use super::LanguageModel;
use crate::config::ModelSpec;
use crate::error::Result;
use crate::ChainError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};

/// Used when a model spec has no `baseUrl`.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// `params` keys that belong on the request body rather than in `options`.
const TOP_LEVEL_PARAMS: &[&str] = &["format", "keep_alive", "think"];

/// A model served by Ollama.
///
/// `params` from the config are passed through verbatim: `format`,
/// `keep_alive` and `think` go on the request body, every other key into
/// the `options` object (`temperature`, `num_ctx`, `seed`, ...).
#[derive(Debug, Clone)]
pub struct OllamaModel {
    client: Client,
    base_url: String,
    model: String,
    params: Map<String, Value>,
}

impl OllamaModel {
    pub fn new(client: Client, spec: &ModelSpec) -> Self {
        let base_url = spec.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        Self {
            client,
            base_url: normalize_base_url(base_url),
            model: spec.model.clone(),
            params: spec.params.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the JSON body for `/api/chat`.
    fn build_chat_body(&self, prompt: &str) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": false,
        });

        let mut options = Map::new();
        for (key, value) in &self.params {
            if TOP_LEVEL_PARAMS.contains(&key.as_str()) {
                body[key.as_str()] = value.clone();
            } else {
                options.insert(key.clone(), value.clone());
            }
        }
        if !options.is_empty() {
            body["options"] = Value::Object(options);
        }
        body
    }

    /// Send a non-streaming request and parse the response.
    async fn send_request(&self, url: &str, body: &Value) -> Result<Value> {
        let resp = self.client.post(url).json(body).send().await.map_err(|e| {
            ChainError::Backend {
                model: self.model.clone(),
                message: format!("failed to connect to LLM at {}: {}", url, e),
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ChainError::HttpError {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let body = self.build_chat_body(prompt);
        let json_resp = self.send_request(&url, &body).await?;

        if let Some(err) = json_resp.get("error").and_then(|v| v.as_str()) {
            return Err(ChainError::Backend {
                model: self.model.clone(),
                message: err.to_string(),
            });
        }

        json_resp
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| ChainError::Backend {
                model: self.model.clone(),
                message: "response has no message.content".to_string(),
            })
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Strip known provider path suffixes from a base URL.
/// e.g., "http://localhost:11434/api" -> "http://localhost:11434"
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    for suffix in &["/api/generate", "/api/chat", "/api"] {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    trimmed.to_string()
}
