//! Text-generation client.
//!
//! Optional collaborator that produces the external narrative candidate.
//! The contract is deliberately narrow: the call may fail, and on failure
//! the composer proceeds with the deterministic candidate. No state is
//! retained between invocations.

use crate::config::TextGenConfig;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// System prompt sent with every generation request.
const SYSTEM_PROMPT: &str = "You are a predictive-maintenance explainer. \
    Use only provided evidence. Do not invent diagnostics.";

#[derive(Debug, Clone, Error)]
pub enum TextGenError {
    #[error("text generation is disabled")]
    Disabled,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("empty response from model")]
    EmptyResponse,
}

/// Generic text-generation interface. Real implementation is HTTP-backed;
/// fakes are used in tests.
pub trait TextGenClient: Send + Sync {
    /// Generate a short narrative from structured facts.
    fn generate(&self, entity: &str, risk: &str, signals: &str) -> Result<String, TextGenError>;
}

/// HTTP client for an ollama-style `/api/generate` endpoint.
pub struct HttpTextGenClient {
    config: TextGenConfig,
    client: reqwest::blocking::Client,
}

impl HttpTextGenClient {
    pub fn new(config: TextGenConfig) -> Result<Self, TextGenError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TextGenError::Http(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn build_prompt(entity: &str, risk: &str, signals: &str) -> String {
        format!(
            "{}\n\nEntity: {}\nRisk: {}\nTop signals:\n{}\nWrite 2 concise sentences for control-room operators.",
            SYSTEM_PROMPT, entity, risk, signals
        )
    }
}

impl TextGenClient for HttpTextGenClient {
    fn generate(&self, entity: &str, risk: &str, signals: &str) -> Result<String, TextGenError> {
        if !self.config.enabled {
            return Err(TextGenError::Disabled);
        }

        let body = serde_json::json!({
            "model": self.config.model,
            "prompt": Self::build_prompt(entity, risk, signals),
            "stream": false,
        });

        let response = self
            .client
            .post(format!("{}/api/generate", self.config.endpoint))
            .json(&body)
            .send()
            .map_err(|e| TextGenError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TextGenError::Http(format!(
                "generation request failed: {}",
                response.status()
            )));
        }

        let json: Value = response
            .json()
            .map_err(|e| TextGenError::Http(e.to_string()))?;
        let text = json
            .get("response")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(TextGenError::EmptyResponse);
        }

        debug!("Text generation returned {} chars", text.len());
        Ok(text)
    }
}

/// Fake client returning a canned reply. Used by unit and integration tests.
pub struct FakeTextGenClient {
    reply: Result<String, TextGenError>,
}

impl FakeTextGenClient {
    pub fn with_reply(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err(TextGenError::Http("connection refused".to_string())),
        }
    }
}

impl TextGenClient for FakeTextGenClient {
    fn generate(&self, _entity: &str, _risk: &str, _signals: &str) -> Result<String, TextGenError> {
        self.reply.clone()
    }
}
